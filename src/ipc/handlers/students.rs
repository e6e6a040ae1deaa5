use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::relations;
use crate::store::Record;
use serde_json::{json, Value};

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return ok(&req.id, json!({ "students": [] }));
    };

    match store.fetch_all("students") {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing name", None),
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }
    let email = match req.params.get("email").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing email", None),
    };
    if email.is_empty() {
        return err(&req.id, "bad_params", "email must not be empty", None);
    }

    let mut fields = Record::new();
    fields.insert("name".to_string(), Value::String(name));
    fields.insert("email".to_string(), Value::String(email));
    if let Some(phone) = req.params.get("phone").and_then(|v| v.as_str()) {
        fields.insert("phone".to_string(), Value::String(phone.to_string()));
    }
    if let Some(code) = req.params.get("referralCode").and_then(|v| v.as_str()) {
        fields.insert("referral_code".to_string(), Value::String(code.to_string()));
    }

    match store.insert("students", &fields) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "students" })),
        ),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };

    let mut patch = Record::new();
    if let Some(name) = req.params.get("name").and_then(|v| v.as_str()) {
        let name = name.trim();
        if name.is_empty() {
            return err(&req.id, "bad_params", "name must not be empty", None);
        }
        patch.insert("name".to_string(), Value::String(name.to_string()));
    }
    if let Some(email) = req.params.get("email").and_then(|v| v.as_str()) {
        let email = email.trim();
        if email.is_empty() {
            return err(&req.id, "bad_params", "email must not be empty", None);
        }
        patch.insert("email".to_string(), Value::String(email.to_string()));
    }
    if let Some(phone) = req.params.get("phone").and_then(|v| v.as_str()) {
        patch.insert("phone".to_string(), Value::String(phone.to_string()));
    }
    if let Some(code) = req.params.get("referralCode").and_then(|v| v.as_str()) {
        patch.insert("referral_code".to_string(), Value::String(code.to_string()));
    }

    match store.update("students", student_id, &patch) {
        Ok(Some(student)) => ok(&req.id, json!({ "student": student })),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };

    // Purchases and withdrawals keep their student rows; deletion is blocked
    // until those are dealt with, and the UI says so.
    match store.delete_by_id("students", student_id) {
        Ok(0) => err(&req.id, "not_found", "student not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) if relations::is_foreign_key_violation(&e) => err(
            &req.id,
            "still_referenced",
            "cannot delete student: it is still referenced by other records",
            None,
        ),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
