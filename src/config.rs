use crate::seat::Layout;
use crate::seatmap::OccupiedSeatPolicy;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "seatingd.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub export_dir: PathBuf,
    pub default_layout: Layout,
    pub occupied_seat_policy: OccupiedSeatPolicy,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export_dir: std::env::temp_dir().join("seatingd-exports"),
            default_layout: Layout::default(),
            occupied_seat_policy: OccupiedSeatPolicy::Overwrite,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    export_dir: Option<String>,
    default_rows: Option<u8>,
    default_cols: Option<u8>,
    occupied_seat_policy: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then `seatingd.toml`, then `SEATINGD_*` environment variables.
///
/// A config file that exists but does not parse is skipped; the parse error is
/// handed back so it can be logged once logging is up.
pub fn load_config() -> (Config, Option<anyhow::Error>) {
    let path = std::env::var("SEATINGD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));
    let (file_cfg, file_err) = match read_file_config(&path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (FileConfig::default(), Some(e)),
    };
    let env: Vec<(String, String)> = std::env::vars()
        .filter(|(k, _)| k.starts_with("SEATINGD_"))
        .collect();
    (resolve(file_cfg, &env), file_err)
}

fn read_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Ok(FileConfig::default());
    };
    toml::from_str::<FileConfig>(&raw)
        .with_context(|| format!("invalid config file {}", path.to_string_lossy()))
}

fn resolve(file_cfg: FileConfig, env: &[(String, String)]) -> Config {
    let mut cfg = Config::default();
    let lookup = |key: &str| {
        env.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(v) = lookup("SEATINGD_EXPORT_DIR").or(file_cfg.export_dir) {
        cfg.export_dir = PathBuf::from(v);
    }

    let rows = lookup("SEATINGD_DEFAULT_ROWS")
        .and_then(|v| v.parse::<u8>().ok())
        .or(file_cfg.default_rows)
        .unwrap_or(cfg.default_layout.rows);
    let cols = lookup("SEATINGD_DEFAULT_COLS")
        .and_then(|v| v.parse::<u8>().ok())
        .or(file_cfg.default_cols)
        .unwrap_or(cfg.default_layout.cols);
    if let Ok(layout) = Layout::new(rows, cols) {
        cfg.default_layout = layout;
    }

    if let Some(policy) = lookup("SEATINGD_OCCUPIED_SEAT_POLICY")
        .or(file_cfg.occupied_seat_policy)
        .and_then(|v| v.parse::<OccupiedSeatPolicy>().ok())
    {
        cfg.occupied_seat_policy = policy;
    }

    if let Some(v) = lookup("SEATINGD_LOG").or(file_cfg.log_filter) {
        cfg.log_filter = v;
    }
    cfg
}
