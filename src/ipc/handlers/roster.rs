use crate::import;
use crate::ipc::helpers::{get_bool, get_required_str, with_session, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::roster::example_roster;
use crate::session::Session;
use serde_json::json;
use std::path::PathBuf;

fn import_result(session: &Session) -> serde_json::Value {
    json!({
        "imported": session.roster.len(),
        "students": session.roster.list(),
    })
}

fn roster_import(
    session_id: &str,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(raw) = params.get("names").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("missing names"));
    };
    let names: Vec<&str> = raw.iter().filter_map(|v| v.as_str()).collect();
    let n = session
        .roster
        .import_roster(names, get_bool(params, "dedupe", false));
    tracing::info!(session = %session_id, students = n, source = "list", "roster imported");
    Ok(import_result(session))
}

fn roster_import_text(
    session_id: &str,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(text) = params.get("text").and_then(|v| v.as_str()) else {
        return Err(HandlerErr::bad_params("missing text"));
    };
    let names = import::parse_text_roster(text);
    let n = session
        .roster
        .import_roster(names, get_bool(params, "dedupe", false));
    tracing::info!(session = %session_id, students = n, source = "text", "roster imported");
    Ok(import_result(session))
}

fn roster_import_file(
    session_id: &str,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(get_required_str(params, "path")?);
    // Parse fully before touching the roster so a bad file keeps the old one.
    let names = import::read_roster_file(&path).map_err(|e| {
        tracing::warn!(session = %session_id, path = %path.display(), error = %e, "roster import failed");
        HandlerErr {
            code: "import_failed",
            message: format!("{:#}", e),
            details: Some(json!({ "path": path.to_string_lossy() })),
        }
    })?;
    let n = session
        .roster
        .import_roster(names, get_bool(params, "dedupe", false));
    tracing::info!(session = %session_id, students = n, path = %path.display(), "roster imported");
    Ok(import_result(session))
}

fn roster_load_example(
    session_id: &str,
    session: &mut Session,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let n = session.roster.import_roster(example_roster(), false);
    tracing::info!(session = %session_id, students = n, source = "example", "roster imported");
    Ok(import_result(session))
}

fn roster_list(
    _session_id: &str,
    session: &mut Session,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let students: Vec<serde_json::Value> = session
        .roster
        .list()
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "seat": session.seats.seat_of(name),
            })
        })
        .collect();
    Ok(json!({
        "total": session.roster.len(),
        "students": students,
        "unassigned": session.unassigned_students(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.import" => Some(with_session(state, req, roster_import)),
        "roster.importText" => Some(with_session(state, req, roster_import_text)),
        "roster.importFile" => Some(with_session(state, req, roster_import_file)),
        "roster.loadExample" => Some(with_session(state, req, roster_load_example)),
        "roster.list" => Some(with_session(state, req, roster_list)),
        _ => None,
    }
}
