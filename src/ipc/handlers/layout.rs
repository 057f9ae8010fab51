use crate::ipc::helpers::{get_required_u8, with_session, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::seat::Layout;
use crate::session::Session;
use serde_json::json;

fn orphans_json(session: &Session) -> Vec<serde_json::Value> {
    session
        .orphaned_seats()
        .into_iter()
        .map(|(seat, student)| json!({ "seat": seat, "student": student }))
        .collect()
}

fn layout_get(
    _session_id: &str,
    session: &mut Session,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "layout": session.layout(),
        "seatCount": session.layout().seat_count(),
    }))
}

fn layout_update(
    session_id: &str,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let rows = get_required_u8(params, "rows")?;
    let cols = get_required_u8(params, "cols")?;
    let layout = Layout::new(rows, cols)?;
    session.set_layout(layout);

    let orphans = orphans_json(session);
    if !orphans.is_empty() {
        tracing::warn!(session = %session_id, orphans = orphans.len(), "layout leaves assignments outside the grid");
    }
    tracing::info!(session = %session_id, rows, cols, "layout updated");
    Ok(json!({
        "layout": layout,
        "seatCount": layout.seat_count(),
        "orphanedSeats": orphans,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "layout.get" => Some(with_session(state, req, layout_get)),
        "layout.update" => Some(with_session(state, req, layout_update)),
        _ => None,
    }
}
