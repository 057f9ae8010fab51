use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::session::Session;
use serde_json::json;
use uuid::Uuid;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "sessions": state.sessions.len(),
            "exportDir": state.config.export_dir.to_string_lossy(),
        }),
    )
}

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = Uuid::new_v4().to_string();
    let session = Session::new(
        state.config.default_layout,
        state.config.occupied_seat_policy,
    );
    let layout = session.layout();
    state.sessions.insert(session_id.clone(), session);
    tracing::info!(session = %session_id, rows = layout.rows, cols = layout.cols, "session opened");
    ok(
        &req.id,
        json!({
            "sessionId": session_id,
            "layout": layout,
            "occupiedSeatPolicy": state.config.occupied_seat_policy.as_str(),
        }),
    )
}

fn handle_session_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match get_required_str(&req.params, "sessionId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    if state.sessions.remove(&session_id).is_none() {
        return err(
            &req.id,
            "unknown_session",
            "session not found",
            Some(json!({ "sessionId": session_id })),
        );
    }
    tracing::info!(session = %session_id, "session closed");
    ok(&req.id, json!({ "closed": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.open" => Some(handle_session_open(state, req)),
        "session.close" => Some(handle_session_close(state, req)),
        _ => None,
    }
}
