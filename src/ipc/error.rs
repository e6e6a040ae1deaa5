use serde_json::json;

use crate::relations::RelationError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Maps the relationship core's typed failures onto wire error codes. Plain
/// store failures fall back to the operation-specific code the caller picks.
pub fn relation_err(id: &str, fallback_code: &str, e: RelationError) -> serde_json::Value {
    let code = match &e {
        RelationError::InvalidReference(_) => "invalid_reference",
        RelationError::NotFound(_) => "not_found",
        RelationError::StillReferenced(_) => "still_referenced",
        RelationError::Store(_) => fallback_code,
    };
    err(id, code, e.to_string(), None)
}
