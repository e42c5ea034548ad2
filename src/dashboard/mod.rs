//! Admin dashboard controller.
//!
//! [`Dashboard`] is the application context: it owns the page document, the
//! chart slots, the refresh-in-progress guard and the API client, and is
//! shared as `Arc<Dashboard>` between the auto-refresh thread and the HTTP
//! server. UI events arrive as [`UiEvent`] values, either resolved from a
//! clicked element's `data-action` attribute or built directly by callers.
//!
//! # Refresh cycle
//!
//! `Idle → Loading → (Success | Error) → Idle`. The steps run strictly in
//! sequence: overview cards, companies table, revenue / cancellation /
//! notification charts, activity feed. The first failing step aborts the
//! rest, logs one diagnostic event and shows one banner. Sections rendered
//! before the failure keep their new content and later sections keep their
//! previous content; nothing is rolled back or cleared.
//!
//! Only one refresh runs at a time. A refresh requested while another is in
//! flight is skipped and reports [`RefreshOutcome::AlreadyRunning`].

pub mod charts;
pub mod filter;
pub mod page;
pub mod render;
pub mod scheduler;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::FixedOffset;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::types::{
    ActivitiesResponse, CancellationResponse, CompaniesResponse, CompanyResponse,
    NotificationResponse, OverviewResponse, RevenueResponse,
};
use crate::api::{ApiError, HttpClient, RequestOptions};
use crate::config::ConsoleConfig;
use crate::diagnostics::Diagnostics;
use crate::dom::{Document, NodeId, html};
use crate::utils::format::display_offset;

use charts::{ChartInstance, ChartRegistry, ChartSlot};
use render::AlertKind;
use scheduler::AutoRefresh;

const SOURCE: &str = "dashboard";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Behavioural knobs taken from the `[dashboard]` and `[display]` sections.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub refresh_interval: Duration,
    pub alert_ttl: Duration,
    pub login_route: String,
    pub offset: FixedOffset,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from_config(&ConsoleConfig::default())
    }
}

impl DashboardSettings {
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            refresh_interval: Duration::from_secs(config.dashboard.refresh_interval_secs.max(1)),
            alert_ttl: Duration::from_secs(config.dashboard.alert_dismiss_secs),
            login_route: config.dashboard.login_route.clone(),
            offset: display_offset(config.display.utc_offset_hours),
        }
    }
}

// ---------------------------------------------------------------------------
// Refresh outcome
// ---------------------------------------------------------------------------

/// One fetch of the refresh cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStep {
    Overview,
    Companies,
    RevenueChart,
    CancellationChart,
    NotificationChart,
    Activities,
}

impl RefreshStep {
    pub const ALL: [RefreshStep; 6] = [
        Self::Overview,
        Self::Companies,
        Self::RevenueChart,
        Self::CancellationChart,
        Self::NotificationChart,
        Self::Activities,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Overview => "/api/v1/dashboard/overview",
            Self::Companies => "/api/v1/companies",
            Self::RevenueChart => "/api/v1/dashboard/revenue",
            Self::CancellationChart => "/api/v1/dashboard/cancellation",
            Self::NotificationChart => "/api/v1/dashboard/notification",
            Self::Activities => "/api/v1/dashboard/activities",
        }
    }
}

impl fmt::Display for RefreshStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Overview => "overview",
            Self::Companies => "companies",
            Self::RevenueChart => "revenue chart",
            Self::CancellationChart => "cancellation chart",
            Self::NotificationChart => "notification chart",
            Self::Activities => "activities",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Completed,
    Failed {
        step: RefreshStep,
        status: Option<u16>,
        error: String,
    },
    AlreadyRunning,
}

/// Coarse controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    Idle,
    Loading,
}

struct StepFailure {
    step: RefreshStep,
    error: ApiError,
}

/// Clears the refresh flag when the cycle ends, even on panic.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// UI events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Refresh,
    Logout,
    Navigate(String),
    Search(String),
    DateFilter(String),
    ViewCompany(i64),
    EditCompany(i64),
    CloseModal,
}

impl UiEvent {
    /// Event for a value change on the input with id `element_id`.
    pub fn from_input(element_id: &str, value: &str) -> Option<Self> {
        match element_id {
            "search-input" => Some(Self::Search(value.to_string())),
            "date-filter" => Some(Self::DateFilter(value.to_string())),
            _ => None,
        }
    }
}

/// Resolve a click on `node` to the event of the nearest element (itself or
/// an ancestor) carrying `data-action`.
pub fn event_for_click(doc: &Document, node: NodeId) -> Option<UiEvent> {
    let mut current = Some(node);
    while let Some(id) = current {
        let el = doc.get(id)?;
        if let Some(action) = el.attr("data-action") {
            let company = || el.attr("data-company-id").and_then(|v| v.parse().ok());
            return match action {
                "refresh" => Some(UiEvent::Refresh),
                "logout" => Some(UiEvent::Logout),
                "navigate" => el
                    .attr("data-target")
                    .map(|target| UiEvent::Navigate(target.to_string())),
                "view-company" => company().map(UiEvent::ViewCompany),
                "edit-company" => company().map(UiEvent::EditCompany),
                "close-modal" => Some(UiEvent::CloseModal),
                _ => None,
            };
        }
        current = el.parent();
    }
    None
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Refreshed(RefreshOutcome),
    /// Navigate the browser to this location.
    Redirect(String),
    Filtered { visible: usize },
    CompanyShown(bool),
    Updated,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Plain snapshot of what the page currently shows.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub cards: Vec<(String, String)>,
    pub companies: Vec<Vec<String>>,
    pub charts: Vec<ChartSummary>,
    pub activities: Vec<ActivitySummary>,
    pub alerts: Vec<String>,
    pub last_refresh: Option<RefreshOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSummary {
    pub slot: ChartSlot,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivitySummary {
    pub title: String,
    pub description: String,
    pub time: String,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

struct PendingAlert {
    node: NodeId,
    expires_at: Instant,
}

/// Mutable page state guarded by one lock.
struct Page {
    document: Document,
    alerts: Vec<PendingAlert>,
    date_range: Option<String>,
    location: Option<String>,
}

pub struct Dashboard {
    client: HttpClient,
    settings: DashboardSettings,
    diagnostics: Diagnostics,
    page: Mutex<Page>,
    charts: Mutex<ChartRegistry>,
    refreshing: AtomicBool,
    last_refresh: Mutex<Option<RefreshOutcome>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Dashboard {
    /// Context over the standard host page.
    pub fn new(client: HttpClient, settings: DashboardSettings, diagnostics: Diagnostics) -> Self {
        Self::with_document(client, settings, diagnostics, page::host_document())
    }

    /// Context over a caller-supplied page.
    pub fn with_document(
        client: HttpClient,
        settings: DashboardSettings,
        diagnostics: Diagnostics,
        document: Document,
    ) -> Self {
        Self {
            client,
            settings,
            diagnostics,
            page: Mutex::new(Page {
                document,
                alerts: Vec::new(),
                date_range: None,
                location: None,
            }),
            charts: Mutex::new(ChartRegistry::new()),
            refreshing: AtomicBool::new(false),
            last_refresh: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    // -- Refresh cycle --

    /// Run one refresh cycle.
    pub fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            self.diagnostics
                .info(SOURCE, "refresh skipped: another refresh is in progress");
            return RefreshOutcome::AlreadyRunning;
        };

        self.update_document(render::show_loading);

        let outcome = match self.run_steps() {
            Ok(()) => RefreshOutcome::Completed,
            Err(StepFailure { step, error }) => {
                self.diagnostics.error(
                    SOURCE,
                    format!("dashboard load failed at {step} ({}): {error}", step.path()),
                );
                self.show_alert(AlertKind::Danger, render::DASHBOARD_LOAD_FAILED);
                RefreshOutcome::Failed {
                    step,
                    status: error.status(),
                    error: error.to_string(),
                }
            }
        };

        self.update_document(render::hide_loading);
        *lock(&self.last_refresh) = Some(outcome.clone());
        outcome
    }

    fn run_steps(&self) -> Result<(), StepFailure> {
        let offset = self.settings.offset;

        let overview: OverviewResponse = self.fetch_step(RefreshStep::Overview)?;
        self.update_document(|doc| render::update_overview_cards(doc, &overview));

        let companies: CompaniesResponse = self.fetch_step(RefreshStep::Companies)?;
        self.update_document(|doc| render::update_companies_table(doc, &companies, offset));

        let revenue: RevenueResponse = self.fetch_step(RefreshStep::RevenueChart)?;
        self.with_charts(|doc, reg| charts::update_revenue_chart(doc, reg, &revenue));

        let cancellation: CancellationResponse =
            self.fetch_step(RefreshStep::CancellationChart)?;
        self.with_charts(|doc, reg| charts::update_cancellation_chart(doc, reg, &cancellation));

        let notification: NotificationResponse =
            self.fetch_step(RefreshStep::NotificationChart)?;
        self.with_charts(|doc, reg| charts::update_notification_chart(doc, reg, &notification));

        let activities: ActivitiesResponse = self.fetch_step(RefreshStep::Activities)?;
        let items: &[_] = if activities.success {
            activities.activities.as_slice()
        } else {
            &[]
        };
        self.update_document(|doc| render::update_activity_feed(doc, items, offset));

        Ok(())
    }

    fn fetch_step<T: DeserializeOwned>(&self, step: RefreshStep) -> Result<T, StepFailure> {
        self.client
            .fetch(step.path(), RequestOptions::get())
            .map_err(|error| StepFailure { step, error })
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub fn state(&self) -> RefreshState {
        if self.is_refreshing() {
            RefreshState::Loading
        } else {
            RefreshState::Idle
        }
    }

    pub fn last_refresh(&self) -> Option<RefreshOutcome> {
        lock(&self.last_refresh).clone()
    }

    /// Start the periodic refresh timer; dropping the handle cancels it.
    pub fn start_auto_refresh(self: &Arc<Self>) -> AutoRefresh {
        let dashboard = Arc::clone(self);
        AutoRefresh::spawn(self.settings.refresh_interval, move || {
            dashboard.expire_alerts(Instant::now());
            dashboard.refresh();
        })
    }

    // -- Events --

    /// Handle one UI event.
    pub fn handle(&self, event: UiEvent) -> EventOutcome {
        match event {
            UiEvent::Refresh => EventOutcome::Refreshed(self.refresh()),
            UiEvent::Logout => EventOutcome::Redirect(self.logout()),
            UiEvent::Navigate(section) => {
                self.show_section(&section);
                EventOutcome::Updated
            }
            UiEvent::Search(term) => EventOutcome::Filtered {
                visible: self.search(&term),
            },
            UiEvent::DateFilter(range) => {
                self.filter_by_date(&range);
                EventOutcome::Updated
            }
            UiEvent::ViewCompany(id) => EventOutcome::CompanyShown(self.view_company(id)),
            UiEvent::EditCompany(id) => {
                self.edit_company(id);
                EventOutcome::Updated
            }
            UiEvent::CloseModal => {
                self.update_document(render::hide_company_modal);
                EventOutcome::Updated
            }
        }
    }

    /// Handle a click on `node`; `None` when nothing in its ancestry is
    /// bound to an action.
    pub fn click(&self, node: NodeId) -> Option<EventOutcome> {
        let event = self.read_document(|doc| event_for_click(doc, node))?;
        Some(self.handle(event))
    }

    /// Handle a click on the element with id `element_id`.
    pub fn click_id(&self, element_id: &str) -> Option<EventOutcome> {
        let node = self.read_document(|doc| doc.get_element_by_id(element_id))?;
        self.click(node)
    }

    /// Handle a value change on the input with id `element_id`.
    pub fn input(&self, element_id: &str, value: &str) -> Option<EventOutcome> {
        let event = UiEvent::from_input(element_id, value)?;
        Some(self.handle(event))
    }

    // -- Operations --

    pub fn show_section(&self, section_id: &str) {
        self.update_document(|doc| render::show_section(doc, section_id));
    }

    /// Filter the companies table; returns the number of visible rows.
    pub fn search(&self, term: &str) -> usize {
        self.update_document(|doc| filter::filter_rows(doc, term))
    }

    /// Record the selected date range. No filtering is applied yet.
    pub fn filter_by_date(&self, range: &str) {
        lock(&self.page).date_range = Some(range.to_string());
        self.diagnostics
            .info(SOURCE, format!("date filter selected: {range}"));
    }

    pub fn date_range(&self) -> Option<String> {
        lock(&self.page).date_range.clone()
    }

    /// Fetch one company and show it in the modal. Returns whether the
    /// modal was filled.
    pub fn view_company(&self, company_id: i64) -> bool {
        let path = format!("/api/v1/companies/{company_id}");
        match self.client.fetch::<CompanyResponse>(&path, RequestOptions::get()) {
            Ok(CompanyResponse {
                success: true,
                company: Some(company),
            }) => {
                let offset = self.settings.offset;
                self.update_document(|doc| render::display_company_details(doc, &company, offset));
                true
            }
            Ok(_) => false,
            Err(err) => {
                self.diagnostics
                    .error(SOURCE, format!("company {company_id} detail failed: {err}"));
                self.show_alert(AlertKind::Danger, render::COMPANY_LOAD_FAILED);
                false
            }
        }
    }

    /// Entry point for editing a company; only records the request.
    pub fn edit_company(&self, company_id: i64) {
        self.diagnostics
            .info(SOURCE, format!("edit requested for company {company_id}"));
    }

    /// End the session. The token is cleared and the login route returned
    /// whether or not the server-side logout succeeds.
    pub fn logout(&self) -> String {
        let result = self
            .client
            .fetch::<serde_json::Value>("/api/v1/security/logout", RequestOptions::post());
        if let Err(err) = result {
            self.diagnostics.error(SOURCE, format!("logout failed: {err}"));
        }

        if let Err(err) = self.client.tokens().clear() {
            self.diagnostics
                .error(SOURCE, format!("failed to clear session token: {err:#}"));
        }

        let route = self.settings.login_route.clone();
        lock(&self.page).location = Some(route.clone());
        route
    }

    /// Where the page was last told to navigate, if anywhere.
    pub fn location(&self) -> Option<String> {
        lock(&self.page).location.clone()
    }

    // -- Alerts --

    /// Append a banner that expires after the configured TTL.
    pub fn show_alert(&self, kind: AlertKind, message: &str) -> Option<NodeId> {
        let mut page = lock(&self.page);
        let node = render::show_alert(&mut page.document, kind, message)?;
        let expires_at = Instant::now() + self.settings.alert_ttl;
        page.alerts.push(PendingAlert { node, expires_at });
        Some(node)
    }

    pub fn show_error(&self, message: &str) -> Option<NodeId> {
        self.show_alert(AlertKind::Danger, message)
    }

    pub fn show_success(&self, message: &str) -> Option<NodeId> {
        self.show_alert(AlertKind::Success, message)
    }

    /// Remove banners whose expiry is at or before `now`. Returns how many
    /// were removed.
    pub fn expire_alerts(&self, now: Instant) -> usize {
        let mut page = lock(&self.page);
        let Page {
            document, alerts, ..
        } = &mut *page;

        let before = alerts.len();
        alerts.retain(|alert| {
            if alert.expires_at > now {
                return true;
            }
            if document.has_class(alert.node, "alert") {
                document.remove(alert.node);
            }
            false
        });
        before - alerts.len()
    }

    // -- Document access --

    /// Run `f` against the page document.
    pub fn read_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&lock(&self.page).document)
    }

    fn update_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut lock(&self.page).document)
    }

    fn with_charts<R>(&self, f: impl FnOnce(&mut Document, &mut ChartRegistry) -> R) -> R {
        let mut page = lock(&self.page);
        let mut charts = lock(&self.charts);
        f(&mut page.document, &mut charts)
    }

    /// Inner HTML of `<body>`.
    pub fn body_html(&self) -> String {
        self.read_document(|doc| html::inner_html(doc, doc.body()))
    }

    /// Inner HTML of the element with id `element_id`.
    pub fn fragment_html(&self, element_id: &str) -> Option<String> {
        self.read_document(|doc| {
            doc.get_element_by_id(element_id)
                .map(|node| html::inner_html(doc, node))
        })
    }

    pub fn chart(&self, slot: ChartSlot) -> Option<ChartInstance> {
        lock(&self.charts).get(slot).cloned()
    }

    pub fn summary(&self) -> DashboardSummary {
        let (cards, companies, activities, alerts) = self.read_document(|doc| {
            let cards = render::CARD_IDS
                .iter()
                .filter_map(|id| render::card_value(doc, id).map(|v| (id.to_string(), v)))
                .collect();
            (
                cards,
                render::table_rows(doc),
                activity_summaries(doc),
                render::alert_messages(doc),
            )
        });

        let charts = {
            let registry = lock(&self.charts);
            ChartSlot::ALL
                .iter()
                .filter_map(|&slot| registry.get(slot))
                .map(|chart| ChartSummary {
                    slot: chart.slot,
                    title: chart.slot.title().to_string(),
                    labels: chart.config.labels().to_vec(),
                    values: chart.config.values().to_vec(),
                })
                .collect()
        };

        DashboardSummary {
            cards,
            companies,
            charts,
            activities,
            alerts,
            last_refresh: self.last_refresh(),
        }
    }
}

fn activity_summaries(doc: &Document) -> Vec<ActivitySummary> {
    let text = |item: NodeId, class: &str| {
        doc.descendant_with_class(item, class)
            .map(|node| doc.text_content(node))
            .unwrap_or_default()
    };
    doc.elements_by_class("activity-item")
        .into_iter()
        .map(|item| ActivitySummary {
            title: text(item, "activity-title"),
            description: text(item, "activity-description"),
            time: text(item, "activity-time"),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
