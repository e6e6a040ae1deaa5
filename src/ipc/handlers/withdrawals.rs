use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::Record;
use serde_json::{json, Value};

const STATUSES: [&str; 3] = ["pending", "approved", "rejected"];

fn handle_withdrawals_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return ok(&req.id, json!({ "withdrawals": [] }));
    };

    let mut stmt = match store.conn().prepare(
        "SELECT
           w.id, w.student_id, w.amount, w.status, w.created_at,
           s.name AS student_name, s.email AS student_email
         FROM withdrawals w
         JOIN students s ON s.id = w.student_id
         ORDER BY w.created_at DESC",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([], crate::store::row_to_record)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(withdrawals) => ok(&req.id, json!({ "withdrawals": withdrawals })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_withdrawals_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let amount = match req.params.get("amount").and_then(|v| v.as_f64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing amount", None),
    };
    if amount <= 0.0 {
        return err(&req.id, "bad_params", "amount must be positive", None);
    }

    match store.fetch_by_id("students", student_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return err(
                &req.id,
                "invalid_reference",
                format!("student {student_id} does not exist"),
                None,
            )
        }
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    // Every withdrawal starts pending; only updateStatus moves it on.
    let mut fields = Record::new();
    fields.insert("student_id".to_string(), Value::String(student_id.to_string()));
    fields.insert("amount".to_string(), json!(amount));
    fields.insert("status".to_string(), Value::String("pending".to_string()));

    match store.insert("withdrawals", &fields) {
        Ok(withdrawal) => ok(&req.id, json!({ "withdrawal": withdrawal })),
        Err(e) => err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "withdrawals" })),
        ),
    }
}

fn handle_withdrawals_update_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(withdrawal_id) = req.params.get("withdrawalId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing withdrawalId", None);
    };
    let Some(status) = req.params.get("status").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing status", None);
    };
    if !STATUSES.contains(&status) {
        return err(
            &req.id,
            "bad_params",
            format!("status must be one of {}", STATUSES.join(", ")),
            None,
        );
    }

    let mut patch = Record::new();
    patch.insert("status".to_string(), Value::String(status.to_string()));

    match store.update("withdrawals", withdrawal_id, &patch) {
        Ok(Some(withdrawal)) => ok(&req.id, json!({ "withdrawal": withdrawal })),
        Ok(None) => err(&req.id, "not_found", "withdrawal not found", None),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "withdrawals.list" => Some(handle_withdrawals_list(state, req)),
        "withdrawals.create" => Some(handle_withdrawals_create(state, req)),
        "withdrawals.updateStatus" => Some(handle_withdrawals_update_status(state, req)),
        _ => None,
    }
}
