/// Configuration system for collections-console.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::ConsoleConfig::default()`]
/// 2. **User global config**: `~/.collections-console/config.toml`
/// 3. **Project local config**: `.collections-console.toml` in the current
///    working directory
/// 4. **Environment variables**: `COLLECTIONS_*` overrides (highest precedence)
///
/// Each TOML layer is deserialized with defaults for missing keys and
/// replaces the previous layer; environment variables then override
/// individual fields.
///
/// # Usage
///
/// ```rust,ignore
/// use collections_console::config;
///
/// let cfg = config::load();
/// println!("polling {} every {}s", cfg.api.base_url, cfg.dashboard.refresh_interval_secs);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::ConsoleConfig;

/// Name of the per-user state directory under the home directory.
const STATE_DIR: &str = ".collections-console";

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved console configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A malformed file never stops the console from
/// starting with defaults.
fn load_toml_file(path: Option<PathBuf>) -> Option<ConsoleConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Per-user state directory: `~/.collections-console/`.
pub fn state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(STATE_DIR))
}

/// Path to the user global config: `~/.collections-console/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("config.toml"))
}

/// Path to the project local config in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".collections-console.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Resolve where the session token lives.
pub fn token_file(config: &ConsoleConfig) -> Option<PathBuf> {
    if config.session.token_file.trim().is_empty() {
        state_dir().map(|dir| dir.join("session.json"))
    } else {
        Some(PathBuf::from(&config.session.token_file))
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `COLLECTIONS_API_URL`: admin API origin
/// - `COLLECTIONS_TOKEN_FILE`: token store path
/// - `COLLECTIONS_REFRESH_SECS`: auto refresh interval
/// - `COLLECTIONS_UTC_OFFSET`: display offset in hours
/// - `COLLECTIONS_WIDGET_API_URL`: restriction endpoint origin
/// - `COLLECTIONS_WIDGET_PRECHECK`: probe before fetching the message
/// - `COLLECTIONS_SERVER_ADDR`: dashboard listen address
/// - `COLLECTIONS_LOGGING`: diagnostics log on/off
fn apply_env_overrides(config: &mut ConsoleConfig) {
    if let Ok(val) = std::env::var("COLLECTIONS_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("COLLECTIONS_TOKEN_FILE")
        && !val.is_empty()
    {
        config.session.token_file = val;
    }
    if let Ok(val) = std::env::var("COLLECTIONS_REFRESH_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.dashboard.refresh_interval_secs = secs;
    }
    if let Ok(val) = std::env::var("COLLECTIONS_UTC_OFFSET")
        && let Ok(hours) = val.parse::<i32>()
    {
        config.display.utc_offset_hours = hours;
    }
    if let Ok(val) = std::env::var("COLLECTIONS_WIDGET_API_URL")
        && !val.is_empty()
    {
        config.widget.api_base_url = val;
    }
    if let Ok(val) = std::env::var("COLLECTIONS_WIDGET_PRECHECK") {
        config.widget.precheck = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("COLLECTIONS_SERVER_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
    if let Ok(val) = std::env::var("COLLECTIONS_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.collections-console/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create state directory")?;
    }

    fs::write(&path, ConsoleConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `dashboard.refresh_interval_secs`. When no
/// global file exists yet, the defaults are written out first.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&ConsoleConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The existing value's type decides how `raw_value` is parsed; unknown
/// leaves are stored as strings.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("YES"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn token_file_defaults_to_state_dir() {
        let config = ConsoleConfig::default();
        if let Some(path) = token_file(&config) {
            assert!(path.ends_with(".collections-console/session.json"));
        }
    }

    #[test]
    fn token_file_honours_explicit_path() {
        let mut config = ConsoleConfig::default();
        config.session.token_file = "/tmp/console-token.json".to_string();
        assert_eq!(
            token_file(&config),
            Some(PathBuf::from("/tmp/console-token.json"))
        );
    }

    #[test]
    fn set_toml_value_updates_integer() {
        let mut root: toml::Value = toml::from_str(
            r#"
[dashboard]
refresh_interval_secs = 300
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "dashboard.refresh_interval_secs", "60").unwrap();
        let dashboard = root["dashboard"].as_table().unwrap();
        assert_eq!(dashboard["refresh_interval_secs"].as_integer(), Some(60));
    }

    #[test]
    fn set_toml_value_updates_bool_and_string() {
        let mut root: toml::Value = toml::from_str(
            r#"
[widget]
precheck = false
api_base_url = "https://example.test"
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "widget.precheck", "on").unwrap();
        set_toml_value(&mut root, "widget.api_base_url", "https://other.test").unwrap();
        let widget = root["widget"].as_table().unwrap();
        assert_eq!(widget["precheck"].as_bool(), Some(true));
        assert_eq!(widget["api_base_url"].as_str(), Some("https://other.test"));
    }

    #[test]
    fn set_toml_value_rejects_bad_integer_and_missing_section() {
        let mut root: toml::Value = toml::from_str(
            r#"
[dashboard]
alert_dismiss_secs = 5
"#,
        )
        .unwrap();
        assert!(set_toml_value(&mut root, "dashboard.alert_dismiss_secs", "soon").is_err());
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
    }
}
