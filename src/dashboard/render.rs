//! Document renderers: overview cards, companies table, activity feed,
//! company modal, loading indicator, alert banners and section navigation.
//!
//! Every renderer is a full replace of its target container. A missing
//! target element is skipped silently.

use chrono::FixedOffset;

use crate::api::types::{Activity, CompaniesResponse, Company, OverviewResponse};
use crate::dom::{Document, NodeId};
use crate::utils::format::{
    format_date_ja, format_datetime_ja, format_plain_number, format_yen, parse_timestamp,
};

/// Placeholder for absent optional fields.
pub const NOT_SET: &str = "未設定";

/// Banner shown when a refresh fails.
pub const DASHBOARD_LOAD_FAILED: &str = "ダッシュボードの読み込みに失敗しました";

/// Banner shown when the company detail fetch fails.
pub const COMPANY_LOAD_FAILED: &str = "企業詳細の取得に失敗しました";

/// Card ids in display order.
pub const CARD_IDS: [&str; 6] = [
    "total-companies",
    "active-subscriptions",
    "total-revenue",
    "pending-cancellations",
    "trial-users",
    "monthly-growth",
];

// ---------------------------------------------------------------------------
// Overview cards
// ---------------------------------------------------------------------------

pub fn update_overview_cards(doc: &mut Document, data: &OverviewResponse) {
    if !data.success {
        return;
    }
    let stats = &data.statistics;

    update_card(doc, "total-companies", &stats.total_companies.to_string());
    update_card(doc, "active-subscriptions", &stats.active_subscriptions.to_string());
    update_card(doc, "total-revenue", &format_yen(stats.total_revenue));
    update_card(doc, "pending-cancellations", &stats.pending_cancellations.to_string());
    update_card(doc, "trial-users", &stats.trial_users.to_string());
    update_card(
        doc,
        "monthly-growth",
        &format!("{}%", format_plain_number(stats.monthly_growth)),
    );
}

/// Write `value` into the `.card-value` of card `card_id`.
pub fn update_card(doc: &mut Document, card_id: &str, value: &str) {
    let Some(card) = doc.get_element_by_id(card_id) else {
        return;
    };
    if let Some(value_node) = doc.descendant_with_class(card, "card-value") {
        doc.set_text(value_node, value);
    }
}

/// Current text of a card's value, if the card exists.
pub fn card_value(doc: &Document, card_id: &str) -> Option<String> {
    let card = doc.get_element_by_id(card_id)?;
    let value = doc.descendant_with_class(card, "card-value")?;
    Some(doc.text_content(value))
}

// ---------------------------------------------------------------------------
// Companies table
// ---------------------------------------------------------------------------

pub fn update_companies_table(doc: &mut Document, data: &CompaniesResponse, offset: FixedOffset) {
    if !data.success {
        return;
    }
    let Some(body) = doc.get_element_by_id("companies-table-body") else {
        return;
    };

    doc.clear_children(body);
    for company in &data.companies {
        append_company_row(doc, body, company, offset);
    }
}

fn append_company_row(doc: &mut Document, body: NodeId, company: &Company, offset: FixedOffset) {
    let row = doc.append(body, "tr");
    doc.set_attr(row, "data-company-id", company.id.to_string());

    let name = doc.append(row, "td");
    doc.set_text(name, company.name.as_str());

    let industry = doc.append(row, "td");
    doc.set_text(industry, company.industry().unwrap_or(NOT_SET));

    let employees = doc.append(row, "td");
    doc.set_text(employees, employee_text(company));

    let status_cell = doc.append(row, "td");
    let badge = doc.append(status_cell, "span");
    doc.add_class(badge, "badge");
    doc.add_class(badge, company.status.badge_class());
    doc.set_text(badge, company.status.label());

    let created = doc.append(row, "td");
    doc.set_text(created, created_text(company, offset));

    let actions = doc.append(row, "td");
    for (action, class, label) in [
        ("view-company", "btn btn-sm btn-primary", "詳細"),
        ("edit-company", "btn btn-sm btn-warning", "編集"),
    ] {
        let button = doc.append(actions, "button");
        doc.add_class(button, class);
        doc.set_attr(button, "type", "button");
        doc.set_attr(button, "data-action", action);
        doc.set_attr(button, "data-company-id", company.id.to_string());
        doc.set_text(button, label);
    }
}

fn employee_text(company: &Company) -> String {
    company
        .employee_count()
        .map(|n| n.to_string())
        .unwrap_or_else(|| NOT_SET.to_string())
}

fn created_text(company: &Company, offset: FixedOffset) -> String {
    match company.created_at.as_deref() {
        Some(raw) if !raw.is_empty() => parse_timestamp(raw, offset)
            .map(|dt| format_date_ja(&dt))
            .unwrap_or_else(|| raw.to_string()),
        _ => NOT_SET.to_string(),
    }
}

/// Rows currently in the companies table, as cell texts.
pub fn table_rows(doc: &Document) -> Vec<Vec<String>> {
    let Some(body) = doc.get_element_by_id("companies-table-body") else {
        return Vec::new();
    };
    doc.children(body)
        .iter()
        .map(|&row| {
            doc.children(row)
                .iter()
                .map(|&cell| doc.text_content(cell).trim().to_string())
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Activity feed
// ---------------------------------------------------------------------------

pub fn update_activity_feed(doc: &mut Document, activities: &[Activity], offset: FixedOffset) {
    let Some(feed) = doc.get_element_by_id("activity-feed") else {
        return;
    };

    doc.clear_children(feed);
    for activity in activities {
        let kind = activity.kind();
        let item = doc.append(feed, "div");
        doc.add_class(item, "activity-item");

        let icon_box = doc.append(item, "div");
        doc.add_class(icon_box, "activity-icon");
        doc.add_class(icon_box, kind.icon_class());
        let icon = doc.append(icon_box, "i");
        doc.add_class(icon, kind.icon());

        let content = doc.append(item, "div");
        doc.add_class(content, "activity-content");
        for (class, text) in [
            ("activity-title", activity.title.clone()),
            ("activity-description", activity.description.clone()),
            ("activity-time", activity_time(&activity.timestamp, offset)),
        ] {
            let node = doc.append(content, "div");
            doc.add_class(node, class);
            doc.set_text(node, text);
        }
    }
}

fn activity_time(raw: &str, offset: FixedOffset) -> String {
    parse_timestamp(raw, offset)
        .map(|dt| format_datetime_ja(&dt))
        .unwrap_or_else(|| raw.to_string())
}

// ---------------------------------------------------------------------------
// Company modal
// ---------------------------------------------------------------------------

pub fn display_company_details(doc: &mut Document, company: &Company, offset: FixedOffset) {
    let Some(modal) = doc.get_element_by_id("company-modal") else {
        return;
    };

    if let Some(title) = doc.descendant_with_class(modal, "modal-title") {
        doc.set_text(title, company.name.as_str());
    }

    let fields = [
        ("company-id", company.id.to_string()),
        ("company-name", company.name.clone()),
        (
            "company-industry",
            company.industry().unwrap_or(NOT_SET).to_string(),
        ),
        ("company-employees", employee_text(company)),
        ("company-status", company.status.label().to_string()),
        ("company-created", created_text(company, offset)),
    ];
    for (id, text) in fields {
        let field = doc.find(modal, |el| el.id() == Some(id));
        if let Some(field) = field {
            doc.set_text(field, text);
        }
    }

    doc.add_class(modal, "show");
    doc.set_display(modal, "block");
}

pub fn hide_company_modal(doc: &mut Document) {
    if let Some(modal) = doc.get_element_by_id("company-modal") {
        doc.remove_class(modal, "show");
        doc.set_display(modal, "none");
    }
}

// ---------------------------------------------------------------------------
// Loading indicator and alerts
// ---------------------------------------------------------------------------

pub fn show_loading(doc: &mut Document) {
    if let Some(loading) = doc.get_element_by_id("loading") {
        doc.set_display(loading, "block");
    }
}

pub fn hide_loading(doc: &mut Document) {
    if let Some(loading) = doc.get_element_by_id("loading") {
        doc.set_display(loading, "none");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Danger,
    Success,
}

impl AlertKind {
    fn class(self) -> &'static str {
        match self {
            Self::Danger => "alert-danger",
            Self::Success => "alert-success",
        }
    }
}

/// Append a dismissible banner to `#alert-container`.
pub fn show_alert(doc: &mut Document, kind: AlertKind, message: &str) -> Option<NodeId> {
    let container = doc.get_element_by_id("alert-container")?;
    let alert = doc.append(container, "div");
    doc.add_class(alert, "alert");
    doc.add_class(alert, kind.class());
    doc.add_class(alert, "alert-dismissible fade show");
    doc.set_attr(alert, "role", "alert");
    doc.set_own_text(alert, message);

    let close = doc.append(alert, "button");
    doc.set_attr(close, "type", "button");
    doc.add_class(close, "btn-close");
    doc.set_attr(close, "data-bs-dismiss", "alert");
    Some(alert)
}

/// Messages of the banners currently shown.
pub fn alert_messages(doc: &Document) -> Vec<String> {
    let Some(container) = doc.get_element_by_id("alert-container") else {
        return Vec::new();
    };
    doc.children(container)
        .iter()
        .filter_map(|&alert| doc.get(alert).and_then(|el| el.text()))
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Show one `.dashboard-section` and mark its nav link active.
pub fn show_section(doc: &mut Document, section_id: &str) {
    for section in doc.elements_by_class("dashboard-section") {
        doc.set_display(section, "none");
    }
    if let Some(target) = doc.get_element_by_id(section_id) {
        doc.set_display(target, "block");
    }

    for link in doc.elements_by_class("nav-link") {
        doc.remove_class(link, "active");
    }
    let body = doc.body();
    if let Some(link) = doc.find(body, |el| el.attr("data-target") == Some(section_id)) {
        doc.add_class(link, "active");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
