use crate::error::SeatingError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::Session;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<SeatingError> for HandlerErr {
    fn from(e: SeatingError) -> Self {
        Self {
            code: e.code(),
            details: e.details(),
            message: e.to_string(),
        }
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_bool(params: &serde_json::Value, key: &str, default: bool) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

pub fn get_required_u8(params: &serde_json::Value, key: &str) -> Result<u8, HandlerErr> {
    let v = params
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    u8::try_from(v).map_err(|_| HandlerErr::bad_params(format!("{} out of range", key)))
}

pub fn session_mut<'a>(
    state: &'a mut AppState,
    params: &serde_json::Value,
) -> Result<(String, &'a mut Session), HandlerErr> {
    let session_id = get_required_str(params, "sessionId")?;
    match state.sessions.get_mut(&session_id) {
        Some(session) => Ok((session_id, session)),
        None => Err(HandlerErr {
            code: "unknown_session",
            message: "session not found; open one with session.open".to_string(),
            details: Some(serde_json::json!({ "sessionId": session_id })),
        }),
    }
}

/// Runs `f` against the session named by `params.sessionId` and wraps the outcome.
pub fn with_session<F>(state: &mut AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&str, &mut Session, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    let result = session_mut(state, &req.params)
        .and_then(|(session_id, session)| f(&session_id, session, &req.params));
    match result {
        Ok(value) => ok(&req.id, value),
        Err(error) => {
            tracing::debug!(method = %req.method, code = error.code, message = %error.message, "request failed");
            error.response(&req.id)
        }
    }
}
