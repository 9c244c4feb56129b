//! Response shape validation.
//!
//! Enforces the documented response contract before anything downstream
//! touches the payload. Checks run in a fixed order and short-circuit on the
//! first failure, so the reported error always names the outermost problem.

use serde_json::Value;
use thiserror::Error;

/// Which response contract the server speaks.
///
/// `V2` (the default) carries a server-side `current_date` used to advance
/// the query window; the legacy `V1` contract omits it and the window never
/// moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiContract {
    V1,
    #[default]
    V2,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("API response is not a JSON object")]
    NotAMapping,

    #[error("API response is missing the `{0}` key")]
    MissingKey(&'static str),

    #[error("API response key `{key}` is not of the expected type ({expected})")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },
}

/// A validated response: the homework records (possibly empty, still
/// untyped; field checks belong to translation) and the server clock to
/// advance the query window to, when the contract carries one.
#[derive(Debug, Clone)]
pub struct StatusBatch {
    pub homeworks: Vec<Value>,
    pub current_date: Option<i64>,
}

/// Check a raw response against the API contract.
pub fn validate(raw: &Value, contract: ApiContract) -> Result<StatusBatch, ValidateError> {
    let map = raw.as_object().ok_or(ValidateError::NotAMapping)?;

    if !map.contains_key("homeworks") {
        return Err(ValidateError::MissingKey("homeworks"));
    }
    if contract == ApiContract::V2 && !map.contains_key("current_date") {
        return Err(ValidateError::MissingKey("current_date"));
    }

    let homeworks = map["homeworks"]
        .as_array()
        .ok_or(ValidateError::WrongType {
            key: "homeworks",
            expected: "array",
        })?
        .clone();

    let current_date = match contract {
        ApiContract::V2 => Some(map["current_date"].as_i64().ok_or(
            ValidateError::WrongType {
                key: "current_date",
                expected: "integer",
            },
        )?),
        ApiContract::V1 => None,
    };

    Ok(StatusBatch {
        homeworks,
        current_date,
    })
}
