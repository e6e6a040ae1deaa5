use crate::ipc::error::{err, ok, relation_err};
use crate::ipc::types::{AppState, Request};
use crate::relations;
use crate::store::Record;
use serde_json::{json, Value};

fn handle_packages_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return ok(&req.id, json!({ "packages": [] }));
    };

    let cols = match store.link_columns() {
        Ok(c) => c,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    // Course counts ride along so the list view can show bundle sizes.
    let sql = format!(
        "SELECT
           p.id, p.title, p.description, p.price, p.thumbnail_url, p.created_at,
           (SELECT COUNT(*) FROM package_courses pc WHERE pc.{} = p.id) AS course_count
         FROM packages p
         ORDER BY p.created_at DESC",
        cols.package_id
    );
    let mut stmt = match store.conn().prepare(&sql) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([], crate::store::row_to_record)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(packages) => ok(&req.id, json!({ "packages": packages })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_packages_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(package_id) = req.params.get("packageId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing packageId", None);
    };

    let package = match store.fetch_by_id("packages", package_id) {
        Ok(Some(p)) => p,
        Ok(None) => return err(&req.id, "not_found", "package not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let cols = match store.link_columns() {
        Ok(c) => c,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    // The detail view wants each linked course with its video count.
    let sql = format!(
        "SELECT
           c.id, c.title, c.description, c.created_at,
           (SELECT COUNT(*) FROM course_videos v WHERE v.course_id = c.id) AS video_count
         FROM package_courses pc
         JOIN courses c ON c.id = pc.{}
         WHERE pc.{} = ?
         ORDER BY c.created_at DESC",
        cols.course_id, cols.package_id
    );
    let mut stmt = match store.conn().prepare(&sql) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let courses = stmt
        .query_map([package_id], crate::store::row_to_record)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match courses {
        Ok(courses) => ok(&req.id, json!({ "package": package, "courses": courses })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_packages_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let title = match req.params.get("title").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing title", None),
    };
    if title.is_empty() {
        return err(&req.id, "bad_params", "title must not be empty", None);
    }
    let price = match req.params.get("price").and_then(|v| v.as_f64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing price", None),
    };
    if price < 0.0 {
        return err(&req.id, "bad_params", "price must not be negative", None);
    }

    let mut fields = Record::new();
    fields.insert("title".to_string(), Value::String(title));
    fields.insert("price".to_string(), json!(price));
    if let Some(description) = req.params.get("description").and_then(|v| v.as_str()) {
        fields.insert("description".to_string(), Value::String(description.to_string()));
    }
    if let Some(thumbnail) = req.params.get("thumbnailUrl").and_then(|v| v.as_str()) {
        fields.insert(
            "thumbnail_url".to_string(),
            Value::String(thumbnail.to_string()),
        );
    }

    match store.insert("packages", &fields) {
        Ok(package) => ok(&req.id, json!({ "package": package })),
        Err(e) => err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "packages" })),
        ),
    }
}

fn handle_packages_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(package_id) = req.params.get("packageId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing packageId", None);
    };

    let mut patch = Record::new();
    if let Some(title) = req.params.get("title").and_then(|v| v.as_str()) {
        let title = title.trim();
        if title.is_empty() {
            return err(&req.id, "bad_params", "title must not be empty", None);
        }
        patch.insert("title".to_string(), Value::String(title.to_string()));
    }
    if let Some(price) = req.params.get("price") {
        let Some(price) = price.as_f64() else {
            return err(&req.id, "bad_params", "price must be a number", None);
        };
        if price < 0.0 {
            return err(&req.id, "bad_params", "price must not be negative", None);
        }
        patch.insert("price".to_string(), json!(price));
    }
    if let Some(description) = req.params.get("description").and_then(|v| v.as_str()) {
        patch.insert("description".to_string(), Value::String(description.to_string()));
    }
    if let Some(thumbnail) = req.params.get("thumbnailUrl").and_then(|v| v.as_str()) {
        patch.insert(
            "thumbnail_url".to_string(),
            Value::String(thumbnail.to_string()),
        );
    }

    match store.update("packages", package_id, &patch) {
        Ok(Some(package)) => ok(&req.id, json!({ "package": package })),
        Ok(None) => err(&req.id, "not_found", "package not found", None),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_packages_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(package_id) = req.params.get("packageId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing packageId", None);
    };

    match relations::delete_package(store, package_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => relation_err(&req.id, "db_delete_failed", e),
    }
}

fn handle_packages_courses(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return ok(&req.id, json!({ "courses": [] }));
    };
    let Some(package_id) = req.params.get("packageId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing packageId", None);
    };

    match relations::courses_for_package(store, package_id) {
        Ok(courses) => ok(&req.id, json!({ "courses": courses })),
        Err(e) => relation_err(&req.id, "db_query_failed", e),
    }
}

fn handle_packages_link_course(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(package_id) = req.params.get("packageId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing packageId", None);
    };
    let Some(course_id) = req.params.get("courseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };

    match relations::link_course(store, package_id, course_id) {
        Ok(outcome) => ok(
            &req.id,
            json!({ "link": outcome.link, "created": outcome.created }),
        ),
        Err(e) => relation_err(&req.id, "db_insert_failed", e),
    }
}

fn handle_packages_unlink_course(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(package_id) = req.params.get("packageId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing packageId", None);
    };
    let Some(course_id) = req.params.get("courseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };

    match relations::unlink_course(store, package_id, course_id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => relation_err(&req.id, "db_delete_failed", e),
    }
}

fn handle_packages_set_courses(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(package_id) = req.params.get("packageId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing packageId", None);
    };
    let Some(course_ids) = req.params.get("courseIds").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing courseIds", None);
    };
    let mut selected = Vec::with_capacity(course_ids.len());
    for value in course_ids {
        match value.as_str() {
            Some(id) => selected.push(id.to_string()),
            None => return err(&req.id, "bad_params", "courseIds must be strings", None),
        }
    }

    match relations::set_package_courses(store, package_id, &selected) {
        Ok(outcome) => match serde_json::to_value(&outcome) {
            Ok(v) => ok(&req.id, v),
            Err(e) => err(&req.id, "internal", e.to_string(), None),
        },
        Err(e) => relation_err(&req.id, "db_tx_failed", e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "packages.list" => Some(handle_packages_list(state, req)),
        "packages.get" => Some(handle_packages_get(state, req)),
        "packages.create" => Some(handle_packages_create(state, req)),
        "packages.update" => Some(handle_packages_update(state, req)),
        "packages.delete" => Some(handle_packages_delete(state, req)),
        "packages.courses" => Some(handle_packages_courses(state, req)),
        "packages.linkCourse" => Some(handle_packages_link_course(state, req)),
        "packages.unlinkCourse" => Some(handle_packages_unlink_course(state, req)),
        "packages.setCourses" => Some(handle_packages_set_courses(state, req)),
        _ => None,
    }
}
