use crate::ipc::error::{err, ok, relation_err};
use crate::ipc::types::{AppState, Request};
use crate::relations;
use crate::store::Record;
use serde_json::{json, Value};

fn handle_courses_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return ok(&req.id, json!({ "courses": [] }));
    };

    // Correlated subquery keeps the count per course without join fan-out.
    let mut stmt = match store.conn().prepare(
        "SELECT
           c.id, c.title, c.description, c.created_at,
           (SELECT COUNT(*) FROM course_videos v WHERE v.course_id = c.id) AS video_count
         FROM courses c
         ORDER BY c.created_at DESC",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([], crate::store::row_to_record)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(courses) => ok(&req.id, json!({ "courses": courses })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_courses_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = req.params.get("courseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };

    let course = match store.fetch_by_id("courses", course_id) {
        Ok(Some(c)) => c,
        Ok(None) => return err(&req.id, "not_found", "course not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let mut stmt = match store.conn().prepare(
        "SELECT * FROM course_videos WHERE course_id = ? ORDER BY created_at DESC",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let videos = stmt
        .query_map([course_id], crate::store::row_to_record)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match videos {
        Ok(videos) => ok(&req.id, json!({ "course": course, "videos": videos })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_courses_create(state: &mut AppState, req: &Request) -> serde_json::Value {
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

    let mut fields = Record::new();
    fields.insert("title".to_string(), Value::String(title));
    if let Some(description) = req.params.get("description").and_then(|v| v.as_str()) {
        fields.insert("description".to_string(), Value::String(description.to_string()));
    }

    match store.insert("courses", &fields) {
        Ok(course) => ok(&req.id, json!({ "course": course })),
        Err(e) => err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "courses" })),
        ),
    }
}

fn handle_courses_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = req.params.get("courseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };

    let mut patch = Record::new();
    if let Some(title) = req.params.get("title").and_then(|v| v.as_str()) {
        let title = title.trim();
        if title.is_empty() {
            return err(&req.id, "bad_params", "title must not be empty", None);
        }
        patch.insert("title".to_string(), Value::String(title.to_string()));
    }
    if let Some(description) = req.params.get("description").and_then(|v| v.as_str()) {
        patch.insert("description".to_string(), Value::String(description.to_string()));
    }

    match store.update("courses", course_id, &patch) {
        Ok(Some(course)) => ok(&req.id, json!({ "course": course })),
        Ok(None) => err(&req.id, "not_found", "course not found", None),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_courses_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = req.params.get("courseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };

    match relations::delete_course(store, course_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => relation_err(&req.id, "db_delete_failed", e),
    }
}

fn handle_courses_dependencies(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = req.params.get("courseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };

    let deps = relations::check_course_dependencies(store, course_id);
    match serde_json::to_value(&deps) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "internal", e.to_string(), None),
    }
}

fn handle_courses_packages(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return ok(&req.id, json!({ "packages": [] }));
    };
    let Some(course_id) = req.params.get("courseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };

    match relations::packages_for_course(store, course_id) {
        Ok(packages) => ok(&req.id, json!({ "packages": packages })),
        Err(e) => relation_err(&req.id, "db_query_failed", e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.get" => Some(handle_courses_get(state, req)),
        "courses.create" => Some(handle_courses_create(state, req)),
        "courses.update" => Some(handle_courses_update(state, req)),
        "courses.delete" => Some(handle_courses_delete(state, req)),
        "courses.dependencies" => Some(handle_courses_dependencies(state, req)),
        "courses.packages" => Some(handle_courses_packages(state, req)),
        _ => None,
    }
}
