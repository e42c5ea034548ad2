//! CLI command implementations for the collections console.
//!
//! Provides subcommand handlers for:
//! - `collections-console serve`: run the dashboard server with auto refresh
//! - `collections-console refresh`: one refresh cycle, printed as text/json/html
//! - `collections-console company <id>`: company detail lookup
//! - `collections-console login <token>` / `logout`: session token management
//! - `collections-console check <url>`: run the restriction widget against a page URL
//! - `collections-console health`: check config, session and API reachability
//! - `collections-console config show|init|set|reset`: configuration management

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::api::{HttpClient, RequestOptions, Transport, UreqTransport};
use crate::config::{self, ConsoleConfig};
use crate::dashboard::charts::ChartSlot;
use crate::dashboard::page;
use crate::dashboard::{Dashboard, DashboardSettings, DashboardSummary, RefreshOutcome, RefreshStep};
use crate::diagnostics::Diagnostics;
use crate::dom::Document;
use crate::session::{FileTokenStore, TokenStore};
use crate::web::{self, WebContext};
use crate::widget::overlay::{self, ActionEffect};
use crate::widget::{RestrictionChecker, WidgetOutcome};

/// Output format for the refresh command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("html") => Self::Html,
            _ => Self::Text,
        }
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

fn token_store(config: &ConsoleConfig) -> Result<Arc<FileTokenStore>> {
    let path = config::token_file(config).context("could not determine home directory")?;
    Ok(Arc::new(FileTokenStore::new(path)))
}

fn build_dashboard(config: &ConsoleConfig, diagnostics: &Diagnostics) -> Result<Arc<Dashboard>> {
    let tokens: Arc<dyn TokenStore> = token_store(config)?;
    let transport: Arc<dyn Transport> = Arc::new(UreqTransport);
    let client = HttpClient::new(&config.api.base_url, transport, tokens);
    Ok(Arc::new(Dashboard::new(
        client,
        DashboardSettings::from_config(config),
        diagnostics.clone(),
    )))
}

// ---------------------------------------------------------------------------
// collections-console serve
// ---------------------------------------------------------------------------

/// Load the dashboard once, then serve it until interrupted.
pub fn run_serve(addr: Option<&str>, open_browser: bool) -> Result<()> {
    let config = config::load();
    let diagnostics = Diagnostics::from_config(&config);
    let dashboard = build_dashboard(&config, &diagnostics)?;

    let outcome = dashboard.refresh();
    println!("{}", describe_outcome(&outcome));

    let addr = addr.unwrap_or(config.server.addr.as_str()).to_string();
    let open = open_browser && config.server.open_browser;
    let ctx = WebContext {
        dashboard,
        config,
        transport: Arc::new(UreqTransport),
        diagnostics,
    };
    web::serve(&ctx, &addr, open)
}

// ---------------------------------------------------------------------------
// collections-console refresh
// ---------------------------------------------------------------------------

/// Run one refresh cycle and print what the dashboard shows.
pub fn run_refresh(format: OutputFormat) -> Result<()> {
    let config = config::load();
    let diagnostics = Diagnostics::from_config(&config);
    let dashboard = build_dashboard(&config, &diagnostics)?;

    let outcome = dashboard.refresh();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&dashboard.summary())?);
        }
        OutputFormat::Html => println!("{}", dashboard.body_html()),
        OutputFormat::Text => {
            println!("{}", describe_outcome(&outcome));
            println!();
            print_summary(&dashboard.summary());
        }
    }

    Ok(())
}

/// One-line, colored description of a refresh outcome.
fn describe_outcome(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Completed => format!("{} dashboard refreshed", "✓".green().bold()),
        RefreshOutcome::Failed {
            step,
            status,
            error,
        } => {
            let status = status.map(|s| format!(" [{s}]")).unwrap_or_default();
            format!(
                "{} refresh failed at {}{}: {}",
                "✗".red().bold(),
                step,
                status,
                error
            )
        }
        RefreshOutcome::AlreadyRunning => {
            format!("{} refresh already in progress", "·".dimmed())
        }
    }
}

fn print_summary(summary: &DashboardSummary) {
    println!("{}", "Overview".bold().cyan());
    println!("{}", "=".repeat(50));
    for (id, value) in &summary.cards {
        let label = page::CARDS
            .iter()
            .find(|(card, _)| *card == id.as_str())
            .map(|(_, label)| *label)
            .unwrap_or(id.as_str());
        println!("  {} {}", pad(label, 16).bold(), value);
    }
    println!();

    println!("{}", "Companies".bold().cyan());
    if summary.companies.is_empty() {
        println!("  {}", "no companies".dimmed());
    }
    for (i, row) in summary.companies.iter().enumerate() {
        let cell = |n: usize| row.get(n).map(String::as_str).unwrap_or("");
        let line = format!(
            "  {} {} {} {} {}",
            pad(&truncate(cell(0), 20), 20),
            pad(&truncate(cell(1), 12), 12),
            pad(cell(2), 8),
            pad(cell(3), 10),
            cell(4),
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
    println!();

    for chart in &summary.charts {
        println!("{}", chart.title.bold().cyan());
        let format = chart.slot.tick_format();
        for (label, value) in chart.labels.iter().zip(&chart.values) {
            println!("  {} {}", pad(label, 12), format.apply(*value));
        }
        println!();
    }
    for slot in ChartSlot::ALL {
        if !summary.charts.iter().any(|c| c.slot == slot) {
            println!("{} {}", slot.title().bold().cyan(), "(no data)".dimmed());
        }
    }

    println!("{}", "Recent activity".bold().cyan());
    if summary.activities.is_empty() {
        println!("  {}", "no activity".dimmed());
    }
    for activity in &summary.activities {
        println!(
            "  {} {} {}",
            activity.time.dimmed(),
            activity.title.bold(),
            activity.description
        );
    }

    if !summary.alerts.is_empty() {
        println!();
        for alert in &summary.alerts {
            println!("{} {}", "!".red().bold(), alert.red());
        }
    }
}

// ---------------------------------------------------------------------------
// collections-console company
// ---------------------------------------------------------------------------

/// Fetch one company and print the detail fields.
pub fn run_company(company_id: i64) -> Result<()> {
    let config = config::load();
    let diagnostics = Diagnostics::from_config(&config);
    let dashboard = build_dashboard(&config, &diagnostics)?;

    if !dashboard.view_company(company_id) {
        let alerts = dashboard.summary().alerts;
        let reason = alerts
            .last()
            .cloned()
            .unwrap_or_else(|| format!("company {company_id} not found"));
        anyhow::bail!(reason);
    }

    let fields = dashboard.read_document(|doc| {
        page::MODAL_FIELDS
            .iter()
            .map(|(id, label)| {
                let value = doc
                    .get_element_by_id(id)
                    .map(|node| doc.text_content(node))
                    .unwrap_or_default();
                (*label, value)
            })
            .collect::<Vec<_>>()
    });

    println!("{}", "Company".bold().cyan());
    println!("{}", "=".repeat(40));
    for (label, value) in fields {
        println!("  {} {}", pad(label, 12).bold(), value);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// collections-console login | logout
// ---------------------------------------------------------------------------

/// Store a bearer token for later API calls.
pub fn run_login(token: &str) -> Result<()> {
    let config = config::load();
    let store = token_store(&config)?;
    store.set(token.trim())?;
    println!(
        "{} Token saved to {}",
        "✓".green().bold(),
        store.path().display()
    );
    Ok(())
}

/// End the session server-side and clear the stored token.
pub fn run_logout() -> Result<()> {
    let config = config::load();
    let diagnostics = Diagnostics::from_config(&config);
    let dashboard = build_dashboard(&config, &diagnostics)?;

    let route = dashboard.logout();
    println!("{} Logged out", "✓".green().bold());
    println!("  {} {}", "Next:".dimmed(), route);
    Ok(())
}

// ---------------------------------------------------------------------------
// collections-console check
// ---------------------------------------------------------------------------

/// Run the restriction widget against `page_url` and print what the page
/// would show.
pub fn run_check(page_url: &str, precheck: bool) -> Result<()> {
    let config = config::load();
    let diagnostics = Diagnostics::from_config(&config);
    let checker = RestrictionChecker::from_config(
        &config,
        Arc::new(UreqTransport),
        page_url,
        diagnostics,
    );
    let checker = if precheck {
        checker.with_precheck(true)
    } else {
        checker
    };

    println!("{}", "Restriction Check".bold().cyan());
    println!("{}", "=".repeat(40));
    let content_type = checker
        .content_type()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unclassified".to_string());
    println!("  {} {}", pad("Content type", 14).bold(), content_type);
    println!(
        "  {} {}",
        pad("LINE user", 14).bold(),
        checker.line_user_id().unwrap_or_else(|| "-".to_string())
    );

    let mut doc = Document::new();
    let body = doc.body();
    doc.append(body, "main");
    let outcome = checker.init(&mut doc);

    let result = match &outcome {
        WidgetOutcome::Unclassified => "no check (unknown product page)".dimmed(),
        WidgetOutcome::NoUserId => "no check (line_user_id missing)".dimmed(),
        WidgetOutcome::NotRestricted => "not restricted".green(),
        WidgetOutcome::Restricted { .. } => "restricted".red().bold(),
        WidgetOutcome::Failed { error } => format!("failed open: {error}").yellow(),
    };
    println!("  {} {}", pad("Result", 14).bold(), result);

    if let WidgetOutcome::Restricted { overlay: root } = outcome {
        println!();
        let text_of = |tag: &str| {
            doc.find(root, |el| el.tag() == tag)
                .map(|node| doc.text_content(node))
                .unwrap_or_default()
        };
        println!("  {}", text_of("h1").bold());
        println!("  {}", text_of("p"));
        for button in overlay::action_buttons(&doc) {
            let label = doc.text_content(button);
            match overlay::activate(&doc, button) {
                Some(ActionEffect::OpenInNewTab(uri)) => {
                    println!("  [{}] {}", label, uri.dimmed());
                }
                None => println!("  [{}]", label),
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// collections-console health
// ---------------------------------------------------------------------------

/// Check config files, session token, diagnostics log and API reachability.
pub fn run_health() -> Result<()> {
    println!("{}", "Collections Console Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.collections-console/config.toml found"
        } else {
            "not found (run `collections-console config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".collections-console.toml found"
        } else {
            "none (optional)"
        },
    );

    let store = token_store(&cfg)?;
    let has_token = store.get().is_some();
    print_health_item(
        "Session token",
        has_token,
        &if has_token {
            format!("stored in {}", store.path().display())
        } else {
            "none (run `collections-console login <token>`)".to_string()
        },
    );

    let tokens: Arc<dyn TokenStore> = store;
    let client = HttpClient::new(&cfg.api.base_url, Arc::new(UreqTransport), tokens);
    let probe = client.fetch::<serde_json::Value>(
        RefreshStep::Overview.path(),
        RequestOptions::get(),
    );
    let (api_ok, api_detail) = match probe {
        Ok(_) => (true, format!("reachable at {}", cfg.api.base_url)),
        Err(e) => (false, format!("{} ({e})", cfg.api.base_url)),
    };
    print_health_item("Admin API", api_ok, &api_detail);

    print_health_item("Widget API", true, &cfg.widget.api_base_url);

    let log_path = config::state_dir().map(|dir| dir.join("events.jsonl"));
    let log_exists = log_path.as_ref().map(|p| p.exists()).unwrap_or(false);
    print_health_item(
        "Diagnostics log",
        cfg.logging.enabled,
        &match (cfg.logging.enabled, log_path) {
            (false, _) => "disabled".to_string(),
            (true, Some(path)) if log_exists => path.display().to_string(),
            (true, _) => "no events yet".to_string(),
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// collections-console config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.collections-console/config.toml");
    print_source(project_exists, ".collections-console.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "COLLECTIONS_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.collections-console/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point the console at your API.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Truncate to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Left-align to `width` characters (by char count, not bytes).
fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{s}{}", " ".repeat(width.saturating_sub(len)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("株式会社サンプル", 4), "株式会…");
    }

    #[test]
    fn test_pad_counts_chars() {
        assert_eq!(pad("総収益", 5), "総収益  ");
        assert_eq!(pad("toolong", 3), "toolong");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("html")), OutputFormat::Html);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Text
        );
    }

    #[test]
    fn test_describe_outcome() {
        colored::control::set_override(false);
        assert_eq!(
            describe_outcome(&RefreshOutcome::Completed),
            "✓ dashboard refreshed"
        );
        let failed = RefreshOutcome::Failed {
            step: RefreshStep::Companies,
            status: Some(500),
            error: "HTTP error! status: 500".to_string(),
        };
        assert_eq!(
            describe_outcome(&failed),
            "✗ refresh failed at companies [500]: HTTP error! status: 500"
        );
    }
}
