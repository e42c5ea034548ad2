//! Host page template.
//!
//! Builds the element tree the dashboard binds to: navigation, the action
//! buttons, the alert container and loading indicator, the six overview
//! cards, the companies table, the three chart canvases, the activity feed
//! and the company modal. Element ids are the contract between the page and
//! the renderers.

use crate::dom::{Document, NodeId};

/// Sections reachable from the navigation bar: `(section id, nav label)`.
pub const SECTIONS: [(&str, &str); 4] = [
    ("overview-section", "概要"),
    ("companies-section", "企業管理"),
    ("analytics-section", "分析"),
    ("activity-section", "アクティビティ"),
];

/// Overview cards as `(id, label)`.
pub const CARDS: [(&str, &str); 6] = [
    ("total-companies", "総企業数"),
    ("active-subscriptions", "アクティブ契約"),
    ("total-revenue", "総収益"),
    ("pending-cancellations", "解約予定"),
    ("trial-users", "トライアル"),
    ("monthly-growth", "月次成長率"),
];

const TABLE_HEADERS: [&str; 6] = ["企業名", "業種", "従業員数", "ステータス", "登録日", "操作"];

const DATE_RANGES: [(&str, &str); 4] = [
    ("", "全期間"),
    ("7d", "過去7日"),
    ("30d", "過去30日"),
    ("90d", "過去90日"),
];

/// Company modal fields as `(dd id, label)`.
pub const MODAL_FIELDS: [(&str, &str); 6] = [
    ("company-id", "ID"),
    ("company-name", "企業名"),
    ("company-industry", "業種"),
    ("company-employees", "従業員数"),
    ("company-status", "ステータス"),
    ("company-created", "登録日"),
];

/// A fresh dashboard page.
pub fn host_document() -> Document {
    let mut doc = Document::new();
    let body = doc.body();

    build_navbar(&mut doc, body);

    let main = doc.append(body, "main");
    doc.add_class(main, "container-fluid");

    let alerts = append_with_id(&mut doc, main, "div", "alert-container");
    doc.add_class(alerts, "alert-area");

    let loading = append_with_id(&mut doc, main, "div", "loading");
    doc.add_class(loading, "loading-indicator");
    doc.set_text(loading, "読み込み中...");
    doc.set_display(loading, "none");

    let overview = section(&mut doc, main, 0);
    build_cards(&mut doc, overview);

    let companies = section(&mut doc, main, 1);
    build_companies(&mut doc, companies);

    let analytics = section(&mut doc, main, 2);
    for canvas_id in ["revenue-chart", "cancellation-chart", "notification-chart"] {
        let wrap = doc.append(analytics, "div");
        doc.add_class(wrap, "chart-container");
        append_with_id(&mut doc, wrap, "canvas", canvas_id);
    }

    let activity = section(&mut doc, main, 3);
    let feed = append_with_id(&mut doc, activity, "div", "activity-feed");
    doc.add_class(feed, "activity-feed");

    build_modal(&mut doc, body);
    doc
}

fn append_with_id(doc: &mut Document, parent: NodeId, tag: &str, id: &str) -> NodeId {
    let node = doc.append(parent, tag);
    doc.set_attr(node, "id", id);
    node
}

fn build_navbar(doc: &mut Document, body: NodeId) {
    let nav = doc.append(body, "nav");
    doc.add_class(nav, "navbar navbar-dark bg-dark");

    let brand = doc.append(nav, "span");
    doc.add_class(brand, "navbar-brand");
    doc.set_text(brand, "AIコレクションズ 管理ダッシュボード");

    let links = doc.append(nav, "ul");
    doc.add_class(links, "nav");
    for (i, (target, label)) in SECTIONS.iter().enumerate() {
        let item = doc.append(links, "li");
        doc.add_class(item, "nav-item");
        let link = doc.append(item, "a");
        doc.add_class(link, "nav-link");
        if i == 0 {
            doc.add_class(link, "active");
        }
        doc.set_attr(link, "href", format!("#{target}"));
        doc.set_attr(link, "data-target", *target);
        doc.set_attr(link, "data-action", "navigate");
        doc.set_text(link, *label);
    }

    let tools = doc.append(nav, "div");
    doc.add_class(tools, "navbar-tools");
    for (id, action, class, label) in [
        ("refresh-btn", "refresh", "btn btn-outline-light btn-sm", "更新"),
        ("logout-btn", "logout", "btn btn-outline-danger btn-sm", "ログアウト"),
    ] {
        let button = append_with_id(doc, tools, "button", id);
        doc.add_class(button, class);
        doc.set_attr(button, "type", "button");
        doc.set_attr(button, "data-action", action);
        doc.set_text(button, label);
    }
}

fn section(doc: &mut Document, main: NodeId, index: usize) -> NodeId {
    let (id, label) = SECTIONS[index];
    let node = append_with_id(doc, main, "section", id);
    doc.add_class(node, "dashboard-section");
    let heading = doc.append(node, "h2");
    doc.set_text(heading, label);
    node
}

fn build_cards(doc: &mut Document, parent: NodeId) {
    let row = doc.append(parent, "div");
    doc.add_class(row, "card-grid");
    for (id, label) in CARDS {
        let card = append_with_id(doc, row, "div", id);
        doc.add_class(card, "card stat-card");
        let title = doc.append(card, "div");
        doc.add_class(title, "card-title");
        doc.set_text(title, label);
        let value = doc.append(card, "div");
        doc.add_class(value, "card-value");
        doc.set_text(value, "-");
    }
}

fn build_companies(doc: &mut Document, parent: NodeId) {
    let tools = doc.append(parent, "div");
    doc.add_class(tools, "table-tools");

    let search = append_with_id(doc, tools, "input", "search-input");
    doc.add_class(search, "form-control");
    doc.set_attr(search, "type", "search");
    doc.set_attr(search, "placeholder", "企業を検索...");

    let filter = append_with_id(doc, tools, "select", "date-filter");
    doc.add_class(filter, "form-select");
    for (value, label) in DATE_RANGES {
        let option = doc.append(filter, "option");
        doc.set_attr(option, "value", value);
        doc.set_text(option, label);
    }

    let table = doc.append(parent, "table");
    doc.add_class(table, "table table-striped");
    let head = doc.append(table, "thead");
    let head_row = doc.append(head, "tr");
    for header in TABLE_HEADERS {
        let th = doc.append(head_row, "th");
        doc.set_text(th, header);
    }
    append_with_id(doc, table, "tbody", "companies-table-body");
}

fn build_modal(doc: &mut Document, body: NodeId) {
    let modal = append_with_id(doc, body, "div", "company-modal");
    doc.add_class(modal, "modal fade");
    doc.set_attr(modal, "tabindex", "-1");
    doc.set_display(modal, "none");

    let dialog = doc.append(modal, "div");
    doc.add_class(dialog, "modal-dialog");
    let content = doc.append(dialog, "div");
    doc.add_class(content, "modal-content");

    let header = doc.append(content, "div");
    doc.add_class(header, "modal-header");
    let title = doc.append(header, "h5");
    doc.add_class(title, "modal-title");
    let close = doc.append(header, "button");
    doc.add_class(close, "btn-close");
    doc.set_attr(close, "type", "button");
    doc.set_attr(close, "data-action", "close-modal");

    let body_node = doc.append(content, "div");
    doc.add_class(body_node, "modal-body");
    let list = doc.append(body_node, "dl");
    for (id, label) in MODAL_FIELDS {
        let dt = doc.append(list, "dt");
        doc.set_text(dt, label);
        append_with_id(doc, list, "dd", id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
