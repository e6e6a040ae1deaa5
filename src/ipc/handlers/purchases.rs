use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::Record;
use serde_json::{json, Value};

fn handle_purchases_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return ok(&req.id, json!({ "purchases": [] }));
    };

    // Buyer, package, and optional referrer display fields ride along so the
    // list view needs no follow-up lookups.
    let mut stmt = match store.conn().prepare(
        "SELECT
           pu.id, pu.student_id, pu.package_id, pu.amount, pu.affiliate_id, pu.created_at,
           s.name AS student_name, s.email AS student_email,
           p.title AS package_title, p.price AS package_price,
           r.name AS referrer_name
         FROM purchases pu
         JOIN students s ON s.id = pu.student_id
         JOIN packages p ON p.id = pu.package_id
         LEFT JOIN students r ON r.id = pu.affiliate_id
         ORDER BY pu.created_at DESC",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([], crate::store::row_to_record)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(purchases) => ok(&req.id, json!({ "purchases": purchases })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_purchases_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(package_id) = req.params.get("packageId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing packageId", None);
    };
    let amount = match req.params.get("amount").and_then(|v| v.as_f64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing amount", None),
    };
    if amount < 0.0 {
        return err(&req.id, "bad_params", "amount must not be negative", None);
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
    match store.fetch_by_id("packages", package_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return err(
                &req.id,
                "invalid_reference",
                format!("package {package_id} does not exist"),
                None,
            )
        }
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    let mut fields = Record::new();
    fields.insert("student_id".to_string(), Value::String(student_id.to_string()));
    fields.insert("package_id".to_string(), Value::String(package_id.to_string()));
    fields.insert("amount".to_string(), json!(amount));
    if let Some(affiliate) = req.params.get("affiliateId").and_then(|v| v.as_str()) {
        fields.insert("affiliate_id".to_string(), Value::String(affiliate.to_string()));
    }

    match store.insert("purchases", &fields) {
        Ok(purchase) => ok(&req.id, json!({ "purchase": purchase })),
        Err(e) => err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "purchases" })),
        ),
    }
}

fn handle_purchases_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(purchase_id) = req.params.get("purchaseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing purchaseId", None);
    };

    let mut patch = Record::new();
    if let Some(amount) = req.params.get("amount") {
        let Some(amount) = amount.as_f64() else {
            return err(&req.id, "bad_params", "amount must be a number", None);
        };
        if amount < 0.0 {
            return err(&req.id, "bad_params", "amount must not be negative", None);
        }
        patch.insert("amount".to_string(), json!(amount));
    }
    if let Some(affiliate) = req.params.get("affiliateId") {
        match affiliate.as_str() {
            Some(id) => {
                patch.insert("affiliate_id".to_string(), Value::String(id.to_string()));
            }
            None if affiliate.is_null() => {
                patch.insert("affiliate_id".to_string(), Value::Null);
            }
            None => return err(&req.id, "bad_params", "affiliateId must be a string", None),
        }
    }

    match store.update("purchases", purchase_id, &patch) {
        Ok(Some(purchase)) => ok(&req.id, json!({ "purchase": purchase })),
        Ok(None) => err(&req.id, "not_found", "purchase not found", None),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "purchases.list" => Some(handle_purchases_list(state, req)),
        "purchases.create" => Some(handle_purchases_create(state, req)),
        "purchases.update" => Some(handle_purchases_update(state, req)),
        _ => None,
    }
}
