use napi::Result as NapiResult;
use napi_derive::napi;

use sfc_core::financing::contract::{validate_contract, AnalyzeRequest, Contract};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Financing analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_contract(request_json: String) -> NapiResult<String> {
    let request: AnalyzeRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let output = sfc_core::analyze_contract(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Returns the warning list as a JSON array. Hard failures reject.
#[napi]
pub fn validate_contract_json(contract_json: String) -> NapiResult<String> {
    let contract: Contract = serde_json::from_str(&contract_json).map_err(to_napi_error)?;
    let warnings = validate_contract(&contract).map_err(to_napi_error)?;
    serde_json::to_string(&warnings).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn financing_sensitivity(input_json: String) -> NapiResult<String> {
    let input: sfc_core::scenarios::sensitivity::FinancingSensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sfc_core::scenarios::sensitivity::sweep(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
