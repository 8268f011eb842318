//! ASC 606 significant financing component engine for prepaid
//! license + support contracts.

pub mod allocation;
pub mod amortization;
pub mod analysis;
pub mod contract;
pub mod journal;
pub mod present_value;
pub mod significance;
