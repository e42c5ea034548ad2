use anyhow::Result;
use clap::{Parser, Subcommand};

use collections_console::cli;

#[derive(Debug, Parser)]
#[command(name = "collections-console")]
#[command(about = "Admin dashboard and LINE restriction checker for AI Collections")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the admin dashboard with periodic refresh
    Serve {
        /// Listen address (defaults to server.addr from config)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open the dashboard in a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Run one refresh cycle and print the dashboard
    Refresh {
        /// Output format: text (default), json, html
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one company's details
    Company {
        /// Company id
        id: i64,
    },
    /// Store a bearer token for the admin API
    Login {
        /// Token issued by the admin login
        token: String,
    },
    /// End the admin session and clear the stored token
    Logout,
    /// Run the restriction widget against a product page URL
    Check {
        /// Page URL, including the line_user_id query parameter
        page_url: String,
        /// Probe check_restriction before fetching the message
        #[arg(long)]
        precheck: bool,
    },
    /// Check config, session token and API reachability
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config to ~/.collections-console/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Set a single value, e.g. `dashboard.refresh_interval_secs 60`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr, no_browser } => cli::run_serve(addr.as_deref(), !no_browser),
        Commands::Refresh { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_refresh(fmt)
        }
        Commands::Company { id } => cli::run_company(id),
        Commands::Login { token } => cli::run_login(&token),
        Commands::Logout => cli::run_logout(),
        Commands::Check { page_url, precheck } => cli::run_check(&page_url, precheck),
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
