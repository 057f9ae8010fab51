use std::collections::HashMap;

use serde::Deserialize;

use crate::config::Config;
use crate::session::Session;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Sidecar state: one `Session` per open session id.
pub struct AppState {
    pub config: Config,
    pub sessions: HashMap<String, Session>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
        }
    }
}
