//! Status-to-message translation.
//!
//! Maps one homework record to the notification text shown to the user. Pure:
//! same record in, same message out.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("work item is missing the `{0}` field")]
    MissingField(&'static str),

    #[error("unknown review status `{0}`")]
    UnknownStatus(String),
}

/// Fixed verdict text for a review status, as shown to the user.
pub fn verdict_for(status: &str) -> Option<&'static str> {
    match status {
        "approved" => Some("Работа проверена: ревьюеру всё понравилось. Ура!"),
        "reviewing" => Some("Работа взята на проверку ревьюером."),
        "rejected" => Some("Работа проверена: у ревьюера есть замечания."),
        _ => None,
    }
}

/// Build the status-change notification for one homework record.
///
/// Requires `homework_name` and `status` string fields, and a status with a
/// known verdict.
pub fn render_status_change(item: &Value) -> Result<String, TranslateError> {
    let name = item
        .get("homework_name")
        .and_then(Value::as_str)
        .ok_or(TranslateError::MissingField("homework_name"))?;
    let status = item
        .get("status")
        .and_then(Value::as_str)
        .ok_or(TranslateError::MissingField("status"))?;
    let verdict =
        verdict_for(status).ok_or_else(|| TranslateError::UnknownStatus(status.to_string()))?;

    Ok(format!(
        "Изменился статус проверки работы \"{name}\". {verdict}"
    ))
}
