//! Request handlers for the dashboard server.
//!
//! Every handler turns one browser action into a [`UiEvent`] for the shared
//! [`Dashboard`](crate::dashboard::Dashboard) and answers with either the
//! re-rendered page, a JSON acknowledgement or a redirect.

use anyhow::Result;
use serde::Serialize;

use crate::dashboard::{EventOutcome, RefreshOutcome, UiEvent};
use crate::dom::{Document, html};
use crate::utils::query::query_param;
use crate::widget::RestrictionChecker;

use super::{Reply, WebContext, frontend};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SearchResponse {
    visible: usize,
    /// Re-rendered `<tbody>` contents with hidden rows marked.
    html: String,
}

#[derive(Serialize)]
struct DateFilterResponse {
    range: String,
}

#[derive(Serialize)]
struct SectionResponse {
    section: String,
}

#[derive(Serialize)]
struct CompanyResponse {
    company_id: i64,
    shown: bool,
}

#[derive(Serialize)]
struct AckResponse {
    ok: bool,
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// GET /: the dashboard page as currently rendered.
pub fn index(ctx: &WebContext) -> Result<Reply> {
    let body = ctx.dashboard.body_html();
    let reload = ctx.dashboard.settings().refresh_interval.as_secs();
    Ok(Reply::html(frontend::dashboard_page(&body, reload)))
}

/// GET /login
pub fn login() -> Result<Reply> {
    Ok(Reply::html(frontend::login_page()))
}

/// GET /widget?page=<url>: a placeholder product page with the restriction
/// widget run against it.
pub fn widget(ctx: &WebContext, url: &str) -> Result<Reply> {
    let Some(page_url) = query_param(url, "page").filter(|p| !p.is_empty()) else {
        return Reply::json_status(400, &serde_json::json!({ "error": "missing page parameter" }));
    };

    let mut doc = product_document(&page_url);
    let checker = RestrictionChecker::from_config(
        &ctx.config,
        ctx.transport.clone(),
        &page_url,
        ctx.diagnostics.clone(),
    );
    checker.init(&mut doc);

    let body = html::inner_html(&doc, doc.body());
    Ok(Reply::html(frontend::widget_page(&body)))
}

fn product_document(page_url: &str) -> Document {
    let mut doc = Document::new();
    let body = doc.body();
    let main = doc.append(body, "main");
    doc.add_class(main, "container py-5");
    let heading = doc.append(main, "h1");
    doc.set_text(heading, "AIコレクションズ");
    let source = doc.append(main, "p");
    doc.add_class(source, "text-muted");
    doc.set_text(source, page_url);
    doc
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// POST /refresh
pub fn refresh(ctx: &WebContext) -> Result<Reply> {
    let outcome = match ctx.dashboard.handle(UiEvent::Refresh) {
        EventOutcome::Refreshed(outcome) => outcome,
        _ => RefreshOutcome::AlreadyRunning,
    };
    Reply::json(&outcome)
}

/// POST /logout: always ends on the login route.
pub fn logout(ctx: &WebContext) -> Result<Reply> {
    let location = match ctx.dashboard.handle(UiEvent::Logout) {
        EventOutcome::Redirect(location) => location,
        _ => ctx.dashboard.settings().login_route.clone(),
    };
    Ok(Reply::redirect(location))
}

/// GET /search?q=<term>
pub fn search(ctx: &WebContext, url: &str) -> Result<Reply> {
    let term = query_param(url, "q").unwrap_or_default();
    let visible = match ctx.dashboard.handle(UiEvent::Search(term)) {
        EventOutcome::Filtered { visible } => visible,
        _ => 0,
    };
    let html = ctx
        .dashboard
        .fragment_html("companies-table-body")
        .unwrap_or_default();
    Reply::json(&SearchResponse { visible, html })
}

/// GET /date-filter?range=<7d|30d|90d>
pub fn date_filter(ctx: &WebContext, url: &str) -> Result<Reply> {
    let range = query_param(url, "range").unwrap_or_default();
    ctx.dashboard.handle(UiEvent::DateFilter(range.clone()));
    Reply::json(&DateFilterResponse { range })
}

/// GET /section/<id>
pub fn section(ctx: &WebContext, section_id: &str) -> Result<Reply> {
    ctx.dashboard
        .handle(UiEvent::Navigate(section_id.to_string()));
    Reply::json(&SectionResponse {
        section: section_id.to_string(),
    })
}

/// GET /companies/<id>
pub fn view_company(ctx: &WebContext, company_id: i64) -> Result<Reply> {
    let shown = matches!(
        ctx.dashboard.handle(UiEvent::ViewCompany(company_id)),
        EventOutcome::CompanyShown(true)
    );
    Reply::json(&CompanyResponse { company_id, shown })
}

/// POST /companies/<id>/edit
pub fn edit_company(ctx: &WebContext, company_id: i64) -> Result<Reply> {
    ctx.dashboard.handle(UiEvent::EditCompany(company_id));
    Reply::json(&AckResponse { ok: true })
}

/// POST /modal/close
pub fn close_modal(ctx: &WebContext) -> Result<Reply> {
    ctx.dashboard.handle(UiEvent::CloseModal);
    Reply::json(&AckResponse { ok: true })
}

/// GET /api/summary
pub fn summary(ctx: &WebContext) -> Result<Reply> {
    Reply::json(&ctx.dashboard.summary())
}
