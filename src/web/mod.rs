//! Embedded web server for the admin dashboard.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - The dashboard page rendered from the shared server-side document
//! - Action endpoints the page script calls for `data-action` clicks
//! - A product page with the restriction widget applied
//! - A JSON snapshot of the dashboard
//!
//! Launched via `collections-console serve` (default: `http://127.0.0.1:9750`).

mod frontend;
mod handlers;

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::api::Transport;
use crate::config::ConsoleConfig;
use crate::dashboard::Dashboard;
use crate::diagnostics::Diagnostics;
use crate::utils::query::{path_of, percent_decode};

const SOURCE: &str = "server";

/// Everything a request handler can reach.
pub struct WebContext {
    pub dashboard: Arc<Dashboard>,
    pub config: ConsoleConfig,
    /// Transport for the widget's restriction endpoints.
    pub transport: Arc<dyn Transport>,
    pub diagnostics: Diagnostics,
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server on the given address.
///
/// Blocks the current thread. Requests are handled sequentially; the
/// auto-refresh timer runs on its own thread for as long as the server does.
pub fn serve(ctx: &WebContext, addr: &str, open: bool) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("collections console running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    let _timer = ctx.dashboard.start_auto_refresh();

    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        ctx.dashboard.expire_alerts(Instant::now());

        let reply = match dispatch(ctx, &method, &url) {
            Ok(reply) => reply,
            Err(e) => {
                ctx.diagnostics
                    .error(SOURCE, format!("{method} {url} failed: {e:#}"));
                Reply::error(&e)
            }
        };
        let status = reply.status;
        let _ = request.respond(reply.into_response());

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(ctx: &WebContext, method: &Method, url: &str) -> Result<Reply> {
    let path = path_of(url);

    match (method, path) {
        // Pages
        (&Method::Get, "/") | (&Method::Get, "/index.html") => handlers::index(ctx),
        (&Method::Get, "/login") => handlers::login(),
        (&Method::Get, "/widget") => handlers::widget(ctx, url),

        // Actions
        (&Method::Post, "/refresh") => handlers::refresh(ctx),
        (&Method::Post, "/logout") => handlers::logout(ctx),
        (&Method::Get, "/search") => handlers::search(ctx, url),
        (&Method::Get, "/date-filter") => handlers::date_filter(ctx, url),
        (&Method::Post, "/modal/close") => handlers::close_modal(ctx),
        (&Method::Get, p) if p.starts_with("/section/") => {
            handlers::section(ctx, &percent_decode(&p["/section/".len()..]))
        }
        (m, p) if p.starts_with("/companies/") => match (m, company_route(p)) {
            (&Method::Get, Some((id, false))) => handlers::view_company(ctx, id),
            (&Method::Post, Some((id, true))) => handlers::edit_company(ctx, id),
            _ => Ok(Reply::not_found()),
        },

        // API
        (&Method::Get, "/api/summary") => handlers::summary(ctx),

        // 404
        _ => Ok(Reply::not_found()),
    }
}

/// `/companies/<id>` → `(id, false)`, `/companies/<id>/edit` → `(id, true)`.
fn company_route(path: &str) -> Option<(i64, bool)> {
    let rest = path.strip_prefix("/companies/")?;
    let (id, edit) = match rest.strip_suffix("/edit") {
        Some(id) => (id, true),
        None => (rest, false),
    };
    id.parse().ok().map(|id| (id, edit))
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// A handler's answer, converted to a `tiny_http` response at the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// Target of a redirect.
    pub location: Option<String>,
}

impl Reply {
    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_HTML,
            body,
            location: None,
        }
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Self::json_status(200, value)
    }

    pub fn json_status<T: Serialize>(status: u16, value: &T) -> Result<Self> {
        let body = serde_json::to_string(value).context("failed to serialize response")?;
        Ok(Self {
            status,
            content_type: CONTENT_TYPE_JSON,
            body,
            location: None,
        })
    }

    /// 303 See Other, so the browser follows with a GET.
    pub fn redirect(location: String) -> Self {
        Self {
            status: 303,
            content_type: CONTENT_TYPE_HTML,
            body: String::new(),
            location: Some(location),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: CONTENT_TYPE_JSON,
            body: r#"{"error": "not found"}"#.to_string(),
            location: None,
        }
    }

    fn error(err: &anyhow::Error) -> Self {
        Self {
            status: 500,
            content_type: CONTENT_TYPE_JSON,
            body: serde_json::json!({ "error": format!("{err:#}") }).to_string(),
            location: None,
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let mut resp = Response::from_data(self.body.into_bytes())
            .with_status_code(StatusCode(self.status));
        if let Ok(header) = Header::from_bytes("Content-Type", self.content_type) {
            resp.add_header(header);
        }
        if let Some(location) = self.location
            && let Ok(header) = Header::from_bytes("Location", location.as_bytes())
        {
            resp.add_header(header);
        }
        resp
    }
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HttpClient, ScriptedTransport};
    use crate::dashboard::DashboardSettings;
    use crate::session::{MemoryTokenStore, TokenStore};
    use crate::utils::query::encode_uri_component;
    use serde_json::{Value, json};

    fn context() -> (WebContext, Arc<ScriptedTransport>, Arc<MemoryTokenStore>) {
        let transport = Arc::new(ScriptedTransport::new());
        let tokens = Arc::new(MemoryTokenStore::with_token("tok"));
        let store: Arc<dyn TokenStore> = tokens.clone();
        let client = HttpClient::new("http://api.test", transport.clone(), store);
        let diagnostics = Diagnostics::in_memory();
        let dashboard = Arc::new(Dashboard::new(
            client,
            DashboardSettings::default(),
            diagnostics.clone(),
        ));
        let ctx = WebContext {
            dashboard,
            config: ConsoleConfig::default(),
            transport: transport.clone(),
            diagnostics,
        };
        (ctx, transport, tokens)
    }

    fn json_body(reply: &Reply) -> Value {
        serde_json::from_str(&reply.body).unwrap()
    }

    #[test]
    fn index_serves_rendered_document() {
        let (ctx, _, _) = context();
        let reply = dispatch(&ctx, &Method::Get, "/").unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, CONTENT_TYPE_HTML);
        assert!(reply.body.contains("id=\"companies-table-body\""));
        assert!(reply.body.contains("data-reload-secs=\"300\""));
    }

    #[test]
    fn refresh_reports_failed_step() {
        let (ctx, transport, _) = context();
        transport.respond("GET", "/api/v1/dashboard/overview", 500, "");
        let reply = dispatch(&ctx, &Method::Post, "/refresh").unwrap();
        let body = json_body(&reply);
        assert_eq!(body["outcome"], "failed");
        assert_eq!(body["status"], 500);
    }

    #[test]
    fn logout_redirects_to_login() {
        let (ctx, _, tokens) = context();
        let reply = dispatch(&ctx, &Method::Post, "/logout").unwrap();
        assert_eq!(reply.status, 303);
        assert_eq!(reply.location.as_deref(), Some("/login"));
        assert_eq!(tokens.get(), None);
    }

    #[test]
    fn search_returns_visible_count() {
        let (ctx, _, _) = context();
        let reply = dispatch(&ctx, &Method::Get, "/search?q=acme").unwrap();
        let body = json_body(&reply);
        assert_eq!(body["visible"], 0);
        assert!(body["html"].is_string());
    }

    #[test]
    fn date_filter_records_range() {
        let (ctx, _, _) = context();
        dispatch(&ctx, &Method::Get, "/date-filter?range=30d").unwrap();
        assert_eq!(ctx.dashboard.date_range().as_deref(), Some("30d"));
    }

    #[test]
    fn section_route_switches_section() {
        let (ctx, _, _) = context();
        let reply = dispatch(&ctx, &Method::Get, "/section/companies-section").unwrap();
        assert_eq!(json_body(&reply)["section"], "companies-section");
        let hidden = ctx.dashboard.read_document(|doc| {
            let overview = doc.get_element_by_id("overview-section").unwrap();
            doc.is_hidden(overview)
        });
        assert!(hidden);
    }

    #[test]
    fn company_routes() {
        let (ctx, transport, _) = context();
        transport.respond_json(
            "GET",
            "/api/v1/companies/7",
            &json!({"success": true, "company": {"id": 7, "name": "Acme", "status": "active"}}),
        );

        let reply = dispatch(&ctx, &Method::Get, "/companies/7").unwrap();
        assert_eq!(json_body(&reply)["shown"], true);

        let reply = dispatch(&ctx, &Method::Post, "/companies/7/edit").unwrap();
        assert_eq!(json_body(&reply)["ok"], true);

        assert_eq!(dispatch(&ctx, &Method::Get, "/companies/x").unwrap().status, 404);
        assert_eq!(dispatch(&ctx, &Method::Get, "/companies/7/edit").unwrap().status, 404);
    }

    #[test]
    fn widget_page_shows_overlay_for_restricted_user() {
        let (ctx, transport, _) = context();
        let path = format!(
            "/line/restriction_message/{}",
            encode_uri_component("AI予定秘書")
        );
        transport.respond_json(
            "POST",
            &path,
            &json!({
                "restricted": true,
                "message": {"template": {"title": "制限中", "text": "本文", "actions": []}}
            }),
        );
        let page = encode_uri_component("https://p.test/schedule?line_user_id=U1");
        let reply = dispatch(&ctx, &Method::Get, &format!("/widget?page={page}")).unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("line-restriction-message"));
        assert!(reply.body.contains("制限中"));
    }

    #[test]
    fn widget_requires_page() {
        let (ctx, _, _) = context();
        assert_eq!(dispatch(&ctx, &Method::Get, "/widget").unwrap().status, 400);
    }

    #[test]
    fn summary_and_unknown_routes() {
        let (ctx, _, _) = context();
        let reply = dispatch(&ctx, &Method::Get, "/api/summary").unwrap();
        assert!(json_body(&reply)["cards"].is_array());
        assert_eq!(dispatch(&ctx, &Method::Get, "/nope").unwrap().status, 404);
        assert_eq!(dispatch(&ctx, &Method::Get, "/refresh").unwrap().status, 404);
    }

    #[test]
    fn company_route_parsing() {
        assert_eq!(company_route("/companies/12"), Some((12, false)));
        assert_eq!(company_route("/companies/12/edit"), Some((12, true)));
        assert_eq!(company_route("/companies/"), None);
    }
}
