//! Schema-validated decode of login-event payloads.
//!
//! The body is parsed once into a JSON value and every required member is
//! checked before anything is built, so a rejected payload reports all of
//! its problems at once instead of the first one encountered.

use serde_json::{Map, Value};

use crate::error::{FieldIssue, FieldProblem, ValidationError};

/// Pseudo-field used when the body as a whole is unusable.
pub const BODY_FIELD: &str = "body";

/// Members every payload must carry, as strings.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "user_id",
    "device_type",
    "ip",
    "device_id",
    "locale",
    "app_version",
];

/// A decoded login event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEventPayload {
    pub user_id: String,
    pub device_type: String,
    pub ip: String,
    pub device_id: String,
    pub locale: String,
    pub app_version: String,
}

impl LoginEventPayload {
    /// Decode a JSON body.
    pub fn decode(body: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(body).map_err(|e| {
            ValidationError::single(BODY_FIELD, FieldProblem::InvalidJson(e.to_string()))
        })?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::single(BODY_FIELD, FieldProblem::NotAnObject))?;

        let mut issues = Vec::new();
        let mut take = |name: &str| match required_string(obj, name) {
            Ok(s) => s,
            Err(issue) => {
                issues.push(issue);
                String::new()
            }
        };

        let payload = Self {
            user_id: take("user_id"),
            device_type: take("device_type"),
            ip: take("ip"),
            device_id: take("device_id"),
            locale: take("locale"),
            app_version: take("app_version"),
        };

        if issues.is_empty() {
            Ok(payload)
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn required_string(obj: &Map<String, Value>, name: &str) -> Result<String, FieldIssue> {
    match obj.get(name) {
        None | Some(Value::Null) => Err(FieldIssue::new(name, FieldProblem::Missing)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(FieldIssue::new(name, FieldProblem::NotAString)),
    }
}
