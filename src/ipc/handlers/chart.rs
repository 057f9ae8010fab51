use crate::chart;
use crate::error::SeatingError;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_bool, get_required_str, session_mut, with_session, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::session::Session;
use serde_json::json;
use std::path::PathBuf;

fn export_xlsx(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let out_dir = params
        .get("outDir")
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.export_dir.clone());
    let include_summary = get_bool(params, "includeSummary", true);
    let (session_id, session) = session_mut(state, params)?;
    if session.seats.is_empty() {
        return Err(SeatingError::EmptyAssignment.into());
    }

    let export = chart::write_seating_chart(session, &out_dir, include_summary).map_err(|e| {
        tracing::error!(session = %session_id, dir = %out_dir.display(), error = %e, "export failed");
        HandlerErr {
            code: "io_failed",
            message: format!("{:#}", e),
            details: Some(json!({ "path": out_dir.to_string_lossy() })),
        }
    })?;
    tracing::info!(
        session = %session_id,
        path = %export.path.display(),
        seats = export.seats_exported,
        "seating chart exported"
    );
    Ok(json!({
        "path": export.path.to_string_lossy(),
        "fileName": export.path.file_name().map(|n| n.to_string_lossy().to_string()),
        "seatsExported": export.seats_exported,
        "sheetCount": export.sheet_count,
    }))
}

fn handle_export_xlsx(state: &mut AppState, req: &Request) -> serde_json::Value {
    match export_xlsx(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn import_seating_chart(
    session_id: &str,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(get_required_str(params, "path")?);
    let seats = chart::read_seating_chart(&path).map_err(|e| {
        tracing::warn!(session = %session_id, path = %path.display(), error = %e, "chart import failed");
        HandlerErr {
            code: "import_failed",
            message: format!("{:#}", e),
            details: Some(json!({ "path": path.to_string_lossy() })),
        }
    })?;
    let n = seats.len();
    session.seats.replace_all(seats);
    tracing::info!(session = %session_id, seats = n, "seating chart imported");
    Ok(json!({ "seatsImported": n }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.xlsx" => Some(handle_export_xlsx(state, req)),
        "import.seatingChart" => Some(with_session(state, req, import_seating_chart)),
        _ => None,
    }
}
