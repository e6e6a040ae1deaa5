use crate::ipc::error::{err, ok, relation_err};
use crate::ipc::types::{AppState, Request};
use crate::relations;
use crate::store::Record;
use serde_json::{json, Value};

fn handle_videos_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return ok(&req.id, json!({ "videos": [] }));
    };
    let Some(course_id) = req.params.get("courseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };

    // Listing an unknown course is an error, not an empty list; the UI would
    // otherwise render a ghost course page.
    match store.fetch_by_id("courses", course_id) {
        Ok(Some(_)) => {}
        Ok(None) => return err(&req.id, "not_found", "course not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

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
        Ok(videos) => ok(&req.id, json!({ "videos": videos })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_videos_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = req.params.get("courseId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing courseId", None);
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
    if let Some(embed) = req.params.get("videoEmbed").and_then(|v| v.as_str()) {
        fields.insert("video_embed".to_string(), Value::String(embed.to_string()));
    }
    // A course_id smuggled in through the payload is overridden by the
    // validated parameter inside the relations call.
    if let Some(stale) = req.params.get("course_id").and_then(|v| v.as_str()) {
        fields.insert("course_id".to_string(), Value::String(stale.to_string()));
    }

    match relations::create_video_for_course(store, course_id, fields) {
        Ok(video) => ok(&req.id, json!({ "video": video })),
        Err(e) => relation_err(&req.id, "db_insert_failed", e),
    }
}

fn handle_videos_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(video_id) = req.params.get("videoId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing videoId", None);
    };

    // A video is scoped to exactly one course for life; course_id is not
    // patchable here.
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
    if let Some(embed) = req.params.get("videoEmbed").and_then(|v| v.as_str()) {
        patch.insert("video_embed".to_string(), Value::String(embed.to_string()));
    }

    match store.update("course_videos", video_id, &patch) {
        Ok(Some(video)) => ok(&req.id, json!({ "video": video })),
        Ok(None) => err(&req.id, "not_found", "video not found", None),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_videos_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(video_id) = req.params.get("videoId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing videoId", None);
    };

    match store.delete_by_id("course_videos", video_id) {
        Ok(0) => err(&req.id, "not_found", "video not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "videos.list" => Some(handle_videos_list(state, req)),
        "videos.create" => Some(handle_videos_create(state, req)),
        "videos.update" => Some(handle_videos_update(state, req)),
        "videos.delete" => Some(handle_videos_delete(state, req)),
        _ => None,
    }
}
