pub mod file;
pub mod stdin;

use serde_json::Value;

use sfc_core::financing::contract::{AnalyzeRequest, Contract};
use sfc_core::SfcError;

/// Load JSON from `--input` or piped stdin.
pub fn read_input_value(path: Option<&str>, what: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json_value(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(SfcError::MissingInput(format!("--input <file.json> or stdin required for {what}")).into())
    }
}

/// Accept either the request envelope (`{"contract_data": ...}`) or a bare
/// contract object.
pub fn parse_request(value: Value) -> Result<AnalyzeRequest, Box<dyn std::error::Error>> {
    let is_envelope = value
        .as_object()
        .map(|m| m.contains_key("contract_data"))
        .unwrap_or(false);
    if is_envelope {
        Ok(serde_json::from_value(value)?)
    } else {
        let contract: Contract = serde_json::from_value(value)?;
        Ok(AnalyzeRequest {
            contract_data: Some(contract),
            ..Default::default()
        })
    }
}
