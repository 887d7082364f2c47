// ── Plug-in settings ──────────────────────────────────────────────────────────
//
// Reads `<host data folder>\PlugIns\becky2nvda.json`.
// No `unsafe` — pure safe Rust + serde_json.  Every field has a default, so
// a missing file or missing keys simply mean "use the defaults".

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{error::Result, logging};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// The host documents no maximum for message IDs; its own sample code uses
/// 256-byte buffers.
pub const DEFAULT_MESSAGE_ID_CAPACITY: usize = 256;
/// No documented maximum for charset names either.
pub const DEFAULT_CHARSET_NAME_CAPACITY: usize = 256;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Capacities outside this range are clamped.
pub const MIN_CAPACITY: usize = 16;
pub const MAX_CAPACITY: usize = 4096;

const PLUGIN_DIR: &str = "PlugIns";
const FILE_NAME: &str = "becky2nvda.json";

// ── On-disk type ──────────────────────────────────────────────────────────────

/// Root of the JSON settings file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `tracing_subscriber::EnvFilter` directives, e.g. `"debug"` or
    /// `"becky2nvda::query=trace"`.
    pub log_filter: String,
    /// Buffer handed to `BKA_GetNextMail`.
    pub message_id_capacity: usize,
    /// Buffer handed to `BKA_GetCharSet`.
    pub charset_name_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            message_id_capacity: DEFAULT_MESSAGE_ID_CAPACITY,
            charset_name_capacity: DEFAULT_CHARSET_NAME_CAPACITY,
        }
    }
}

/// Buffer sizes used when querying the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub message_id_capacity: usize,
    pub charset_name_capacity: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Settings::default().limits()
    }
}

fn clamp_capacity(name: &str, value: usize) -> usize {
    let clamped = value.clamp(MIN_CAPACITY, MAX_CAPACITY);
    if clamped != value {
        warn!(setting = name, value, clamped, "capacity out of range");
    }
    clamped
}

impl Settings {
    /// Capacities, clamped to `MIN_CAPACITY..=MAX_CAPACITY`.
    pub fn limits(&self) -> Limits {
        Limits {
            message_id_capacity: clamp_capacity("message_id_capacity", self.message_id_capacity),
            charset_name_capacity: clamp_capacity(
                "charset_name_capacity",
                self.charset_name_capacity,
            ),
        }
    }
}

// ── Path ──────────────────────────────────────────────────────────────────────

/// `<data_folder>\PlugIns\becky2nvda.json`.
pub fn settings_path(data_folder: &Path) -> PathBuf {
    data_folder.join(PLUGIN_DIR).join(FILE_NAME)
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Read and parse the settings file at `path`.
///
/// A missing file is not an error: it yields the defaults.
pub fn read(path: &Path) -> Result<Settings> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&data)?)
}

/// Like `read`, but any failure is logged and replaced by the defaults.
pub fn load(data_folder: Option<&Path>) -> Settings {
    let Some(folder) = data_folder else {
        return Settings::default();
    };
    let path = settings_path(folder);
    read(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring settings file");
        Settings::default()
    })
}

// ── Apply ─────────────────────────────────────────────────────────────────────

/// Load the settings under `data_folder`, switch logging to their filter and
/// return the buffer limits queries should use from now on.
///
/// A filter that does not parse is logged and the previous one kept.
pub fn configure(data_folder: Option<&Path>) -> Limits {
    let settings = load(data_folder);
    if let Err(e) = logging::set_filter(&settings.log_filter) {
        warn!(filter = %settings.log_filter, error = %e, "keeping previous log filter");
    }
    settings.limits()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
