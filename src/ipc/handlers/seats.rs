use crate::ipc::helpers::{get_required_str, with_session, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::seat::SeatId;
use crate::session::Session;
use serde_json::json;

fn seats_assign(
    session_id: &str,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student = get_required_str(params, "student")?;
    let seat: SeatId = get_required_str(params, "seat")?.parse()?;
    let placement = session.assign(&student, seat)?;
    if let Some(displaced) = &placement.displaced {
        tracing::info!(session = %session_id, %seat, student = %student, displaced = %displaced, "seat reassigned");
    } else {
        tracing::info!(session = %session_id, %seat, student = %student, "seat assigned");
    }
    Ok(json!({
        "seat": placement.seat,
        "student": student,
        "displaced": placement.displaced,
        "inRoster": session.roster.contains(&student),
    }))
}

fn seats_randomize_one(
    session_id: &str,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student = get_required_str(params, "student")?;
    let seat = session.randomize_one(&student, &mut rand::thread_rng())?;
    tracing::info!(session = %session_id, %seat, student = %student, "seat assigned at random");
    Ok(json!({ "seat": seat, "student": student }))
}

fn seats_remove(
    session_id: &str,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student = get_required_str(params, "student")?;
    let removed = session.seats.remove(&student);
    tracing::info!(session = %session_id, student = %student, removed, "student removed from seats");
    Ok(json!({ "student": student, "removed": removed }))
}

fn seats_randomize_all(
    session_id: &str,
    session: &mut Session,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let assigned = session.randomize_all(&mut rand::thread_rng())?;
    let unassigned = session.unassigned_students();
    tracing::info!(session = %session_id, assigned, unassigned = unassigned.len(), "seats randomized");
    Ok(json!({
        "assigned": assigned,
        "unassigned": unassigned,
    }))
}

fn seats_clear(
    session_id: &str,
    session: &mut Session,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let cleared = session.seats.len();
    session.seats.clear();
    tracing::info!(session = %session_id, cleared, "seats cleared");
    Ok(json!({ "cleared": cleared }))
}

fn seats_list(
    _session_id: &str,
    session: &mut Session,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let assignments: Vec<serde_json::Value> = session
        .seats
        .iter()
        .map(|(seat, student)| json!({ "seat": seat, "student": student }))
        .collect();
    let orphans: Vec<serde_json::Value> = session
        .orphaned_seats()
        .into_iter()
        .map(|(seat, student)| json!({ "seat": seat, "student": student }))
        .collect();
    Ok(json!({
        "layout": session.layout(),
        "assignments": assignments,
        "grid": session.seating_grid(),
        "orphanedSeats": orphans,
        "summary": session.summary(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "seats.assign" => Some(with_session(state, req, seats_assign)),
        "seats.randomizeOne" => Some(with_session(state, req, seats_randomize_one)),
        "seats.remove" => Some(with_session(state, req, seats_remove)),
        "seats.randomizeAll" => Some(with_session(state, req, seats_randomize_all)),
        "seats.clear" => Some(with_session(state, req, seats_clear)),
        "seats.list" => Some(with_session(state, req, seats_list)),
        _ => None,
    }
}
