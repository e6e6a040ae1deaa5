use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::relations;
use serde_json::json;

fn handle_audit_video_relationships(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.db.as_ref() else {
        return ok(
            &req.id,
            json!({ "totalVideos": 0, "validVideos": 0, "orphanedVideos": [] }),
        );
    };

    let audit = relations::audit_video_relationships(store);
    match serde_json::to_value(&audit) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "internal", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "audit.videoRelationships" => Some(handle_audit_video_relationships(state, req)),
        _ => None,
    }
}
