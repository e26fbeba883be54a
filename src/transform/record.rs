//! Login event to output record.
//!
//! The record is built in one step from a fully validated payload, so no
//! caller ever sees a half-populated row.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::security::masking::mask;
use crate::validation::payload::LoginEventPayload;
use crate::validation::version::normalize_version;

use super::clock::Clock;

/// One `user_logins` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub user_id: String,
    pub device_type: String,
    pub masked_ip: String,
    pub masked_device_id: String,
    pub locale: String,
    pub app_version_numeric: i64,
    pub ingest_date: NaiveDate,
}

/// Transform a decoded payload, stamping today's date from `clock`.
pub fn transform(
    payload: LoginEventPayload,
    clock: &dyn Clock,
) -> Result<OutputRecord, ValidationError> {
    let app_version_numeric = normalize_version(&payload.app_version)?;

    Ok(OutputRecord {
        masked_ip: mask(&payload.ip),
        masked_device_id: mask(&payload.device_id),
        user_id: payload.user_id,
        device_type: payload.device_type,
        locale: payload.locale,
        app_version_numeric,
        ingest_date: clock.today(),
    })
}

/// Decode a raw JSON body and transform it.
///
/// Field-presence problems and version problems are reported together, so a
/// body missing `ip` with `app_version = "beta"` names both fields.
pub fn transform_body(body: &str, clock: &dyn Clock) -> Result<OutputRecord, ValidationError> {
    match LoginEventPayload::decode(body) {
        Ok(payload) => transform(payload, clock),
        Err(mut err) => {
            if let Some(version) = raw_version(body) {
                if let Err(version_err) = normalize_version(&version) {
                    err.issues.extend(version_err.issues);
                }
            }
            Err(err)
        }
    }
}

/// `app_version` as a string, when the body is an object that has one.
fn raw_version(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get(crate::validation::version::VERSION_FIELD)?
        .as_str()
        .map(str::to_string)
}
