//! Governance request models and boundary validation

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Request to evaluate an action on a resource by a principal
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_request_context", skip_on_field_errors = false))]
pub struct GovernanceRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "requestId is required"))]
    pub request_id: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "resourceId is required"))]
    pub resource_id: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "action is required"))]
    pub action: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "principal is required"))]
    pub principal: String,

    /// Free-form evaluation context, must be a JSON object when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl GovernanceRequest {
    /// Context as a mapping, empty when absent
    pub fn context_map(&self) -> Map<String, Value> {
        match &self.context {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }
}

/// Outcome recorded on an audit signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Allowed,
    Denied,
}

impl AuditOutcome {
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed {
            Self::Allowed
        } else {
            Self::Denied
        }
    }
}

/// Normalized record of an evaluated action
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_signal_metadata", skip_on_field_errors = false))]
pub struct AuditSignal {
    /// ISO-8601 timestamp
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "timestamp is required"))]
    pub timestamp: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "action is required"))]
    pub action: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "principal is required"))]
    pub principal: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "resource is required"))]
    pub resource: String,

    pub outcome: AuditOutcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// Extension fields passed through to the schema registry
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn validate_request_context(request: &GovernanceRequest) -> Result<(), ValidationError> {
    require_mapping(request.context.as_ref(), "context")
}

fn validate_signal_metadata(signal: &AuditSignal) -> Result<(), ValidationError> {
    require_mapping(signal.metadata.as_ref(), "metadata")
}

/// Absent and null are fine; anything but an object is not
fn require_mapping(value: Option<&Value>, field: &'static str) -> Result<(), ValidationError> {
    match value {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(_) => {
            let mut err = ValidationError::new("not_a_mapping");
            err.message = Some(format!("{} must be an object when present", field).into());
            Err(err)
        }
    }
}

/// Identifiers made only of whitespace count as missing
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// Validate a bare identifier passed on its own (principal, resource id)
pub fn require_identifier(field: &str, value: &str) -> Result<(), String> {
    not_blank(value).map_err(|_| format!("{} is required", field))
}

/// Parse an ISO-8601 timestamp. RFC 3339 forms keep their offset; local
/// date-times and bare dates are read as UTC.
pub fn parse_iso8601(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|err| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
                .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
                .map(|naive| naive.and_utc())
                .map_err(|_| err)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> GovernanceRequest {
        serde_json::from_value(value).unwrap()
    }

    fn valid_request() -> Value {
        json!({
            "requestId": "req-1",
            "resourceId": "db-prod",
            "action": "write",
            "principal": "alice",
            "context": { "env": "prod" }
        })
    }

    #[test]
    fn test_valid_request_passes() {
        let req = request(valid_request());
        assert!(req.validate().is_ok());
        assert_eq!(req.context_map().get("env"), Some(&json!("prod")));
    }

    #[test]
    fn test_missing_request_id_names_field() {
        let mut body = valid_request();
        body.as_object_mut().unwrap().remove("requestId");
        let err = request(body).validate().unwrap_err();
        assert!(err.to_string().contains("requestId"));
    }

    #[test]
    fn test_empty_principal_names_field() {
        let mut body = valid_request();
        body["principal"] = json!("");
        let err = request(body).validate().unwrap_err();
        assert!(err.to_string().contains("principal"));
    }

    #[test]
    fn test_array_context_names_field() {
        let mut body = valid_request();
        body["context"] = json!(["env", "prod"]);
        let err = request(body).validate().unwrap_err();
        assert!(err.to_string().contains("context"));
    }

    #[test]
    fn test_absent_context_is_empty_mapping() {
        let mut body = valid_request();
        body.as_object_mut().unwrap().remove("context");
        let req = request(body);
        assert!(req.validate().is_ok());
        assert!(req.context_map().is_empty());
    }

    #[test]
    fn test_audit_signal_keeps_extension_fields() {
        let signal: AuditSignal = serde_json::from_value(json!({
            "timestamp": "2026-01-01T00:00:00Z",
            "action": "read",
            "principal": "bob",
            "resource": "bucket-7",
            "outcome": "denied",
            "ticket": "SEC-12"
        }))
        .unwrap();

        assert!(signal.validate().is_ok());
        assert_eq!(signal.outcome, AuditOutcome::Denied);
        assert_eq!(signal.extra.get("ticket"), Some(&json!("SEC-12")));

        let round = serde_json::to_value(&signal).unwrap();
        assert_eq!(round["ticket"], json!("SEC-12"));
        assert!(round.get("metadata").is_none());
    }

    #[test]
    fn test_audit_signal_metadata_must_be_mapping() {
        let signal: AuditSignal = serde_json::from_value(json!({
            "timestamp": "2026-01-01T00:00:00Z",
            "action": "read",
            "principal": "bob",
            "resource": "bucket-7",
            "outcome": "allowed",
            "metadata": "oops"
        }))
        .unwrap();

        let err = signal.validate().unwrap_err();
        assert!(err.to_string().contains("metadata"));
    }

    #[test]
    fn test_blank_identifiers_are_missing() {
        let mut body = valid_request();
        body["principal"] = json!("   ");
        body["requestId"] = json!("\t");
        let err = request(body).validate().unwrap_err().to_string();
        assert!(err.contains("principal is required"));
        assert!(err.contains("requestId is required"));

        let signal: AuditSignal = serde_json::from_value(json!({
            "timestamp": "2026-01-01T00:00:00Z",
            "action": "read",
            "principal": " ",
            "resource": "bucket-7",
            "outcome": "allowed"
        }))
        .unwrap();
        assert!(signal.validate().unwrap_err().to_string().contains("principal"));
    }

    #[test]
    fn test_parse_iso8601_forms() {
        let utc = |s: &str| parse_iso8601(s).unwrap().to_rfc3339();

        assert_eq!(utc("2026-03-01T12:00:00Z"), "2026-03-01T12:00:00+00:00");
        assert_eq!(utc("2026-03-01T14:00:00+02:00"), "2026-03-01T12:00:00+00:00");
        assert_eq!(utc("2026-03-01T12:00:00"), "2026-03-01T12:00:00+00:00");
        assert_eq!(utc("2026-03-01T12:00:00.250"), "2026-03-01T12:00:00.250+00:00");
        assert_eq!(utc("2026-03-01T12:00"), "2026-03-01T12:00:00+00:00");
        assert_eq!(utc("2026-03-01"), "2026-03-01T00:00:00+00:00");

        assert!(parse_iso8601("yesterday").is_err());
        assert!(parse_iso8601("2026-13-01T00:00:00").is_err());
    }

    #[test]
    fn test_require_identifier() {
        assert!(require_identifier("principal", "alice").is_ok());
        assert_eq!(
            require_identifier("principal", "  ").unwrap_err(),
            "principal is required"
        );
    }
}
