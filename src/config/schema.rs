/// Configuration schema and defaults for collections-console.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[api]`, `[session]`, `[dashboard]`, `[display]`, `[widget]`, `[server]`,
/// and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level console configuration.
///
/// Maps directly to the `~/.collections-console/config.toml` and
/// `.collections-console.toml` file schemas. All sections and fields are
/// optional; missing values fall back to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub dashboard: DashboardConfig,
    pub display: DisplayConfig,
    pub widget: WidgetConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Admin backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin of the admin REST API (`/api/v1/...` is appended per request).
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

/// Where the bearer token is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the token store. Empty means
    /// `~/.collections-console/session.json`.
    pub token_file: String,
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Dashboard refresh and navigation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Seconds between automatic refresh cycles.
    pub refresh_interval_secs: u64,
    /// Seconds an alert banner stays in the alert container.
    pub alert_dismiss_secs: u64,
    /// Route the user is sent to after logout.
    pub login_route: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
            alert_dismiss_secs: 5,
            login_route: "/login".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Date rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// UTC offset (hours) dates and times are rendered in. Defaults to JST.
    pub utc_offset_hours: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 9,
        }
    }
}

// ---------------------------------------------------------------------------
// [widget]
// ---------------------------------------------------------------------------

/// Restriction widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Origin of the restriction endpoints (`/line/...`).
    pub api_base_url: String,
    /// Probe `check_restriction` first and only fetch the message template
    /// when the probe reports a restriction.
    pub precheck: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://ai-collections.herokuapp.com".to_string(),
            precheck: false,
        }
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Embedded dashboard server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `collections-console serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9750".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostics log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append diagnostic events to `~/.collections-console/events.jsonl`.
    pub enabled: bool,
    /// Also print diagnostic events to stderr.
    pub echo_stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            echo_stderr: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML
// ---------------------------------------------------------------------------

impl ConsoleConfig {
    /// Annotated default config written by `collections-console config init`.
    pub fn default_toml() -> String {
        r#"# collections-console configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (COLLECTIONS_*)
#   2. Project config (.collections-console.toml in current directory)
#   3. User global config (~/.collections-console/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:5000"

[session]
token_file = ""                      # empty = ~/.collections-console/session.json

[dashboard]
refresh_interval_secs = 300          # auto refresh every 5 minutes
alert_dismiss_secs = 5
login_route = "/login"

[display]
utc_offset_hours = 9                 # JST

[widget]
api_base_url = "https://ai-collections.herokuapp.com"
precheck = false                     # true = probe check_restriction before fetching the message

[server]
addr = "127.0.0.1:9750"
open_browser = true

[logging]
enabled = true
echo_stderr = false
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
