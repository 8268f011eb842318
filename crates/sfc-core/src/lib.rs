pub mod error;
pub mod financing;
pub mod time_value;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::SfcError;
pub use financing::analysis::{analyze, analyze_contract};
pub use financing::contract::{AnalyzeRequest, Configuration, Contract, Period};
pub use types::*;

/// Standard result type for all SFC operations
pub type SfcResult<T> = Result<T, SfcError>;
