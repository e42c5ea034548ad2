/// Restriction widget tests.
///
/// Runs the widget against product page URLs with a scripted restriction
/// API and checks the request it sends and what happens to the page:
/// overlay for restricted users, untouched page otherwise, and fail-open
/// behavior on every kind of error.
use std::sync::Arc;

use collections_console::api::ScriptedTransport;
use collections_console::diagnostics::{Diagnostics, Level};
use collections_console::dom::{Document, NodeId};
use collections_console::utils::query::encode_uri_component;
use collections_console::widget::overlay::{self, ActionEffect, OVERLAY_ID};
use collections_console::widget::{ContentType, RestrictionChecker, WidgetOutcome};
use serde_json::json;

const API: &str = "https://restriction.test";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn message_path(content_type: ContentType) -> String {
    format!(
        "/line/restriction_message/{}",
        encode_uri_component(content_type.label())
    )
}

fn check_path(content_type: ContentType) -> String {
    format!(
        "/line/check_restriction/{}",
        encode_uri_component(content_type.label())
    )
}

fn checker(page_url: &str) -> (RestrictionChecker, Arc<ScriptedTransport>, Diagnostics) {
    let transport = Arc::new(ScriptedTransport::new());
    let diagnostics = Diagnostics::in_memory();
    let checker = RestrictionChecker::new(API, transport.clone(), page_url, diagnostics.clone());
    (checker, transport, diagnostics)
}

fn product_page() -> (Document, NodeId) {
    let mut doc = Document::new();
    let main = doc.append(doc.body(), "main");
    let p = doc.append(main, "p");
    doc.set_text(p, "product content");
    (doc, main)
}

fn restricted_body() -> serde_json::Value {
    json!({
        "restricted": true,
        "message": {
            "template": {
                "title": "ご利用制限のお知らせ",
                "text": "このサービスは現在ご利用いただけません。",
                "actions": [
                    {"type": "uri", "label": "公式LINEを追加", "uri": "https://line.me/R/ti/p/@ai"},
                    {"type": "message", "label": "閉じる"}
                ]
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Restricted
// ---------------------------------------------------------------------------

#[test]
fn restricted_user_gets_overlay() {
    let (checker, transport, _) =
        checker("https://ai-collections.test/ai_accounting_secretary?line_user_id=U123");
    transport.respond_json(
        "POST",
        &message_path(ContentType::AccountingSecretary),
        &restricted_body(),
    );
    let (mut doc, main) = product_page();

    let outcome = checker.init(&mut doc);
    let WidgetOutcome::Restricted { overlay: root } = outcome else {
        panic!("expected overlay, got {outcome:?}");
    };

    assert!(doc.is_hidden(main));
    assert_eq!(doc.get_element_by_id(OVERLAY_ID), Some(root));
    let h1 = doc.find(root, |el| el.tag() == "h1").unwrap();
    assert_eq!(doc.text_content(h1), "ご利用制限のお知らせ");

    let buttons = overlay::action_buttons(&doc);
    assert_eq!(buttons.len(), 2);
    assert_eq!(
        overlay::activate(&doc, buttons[0]),
        Some(ActionEffect::OpenInNewTab("https://line.me/R/ti/p/@ai".into()))
    );
    assert_eq!(overlay::activate(&doc, buttons[1]), None);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(
        requests[0].url,
        format!("{API}{}", message_path(ContentType::AccountingSecretary))
    );
    assert_eq!(requests[0].body.as_deref(), Some(r#"{"line_user_id":"U123"}"#));
    assert_eq!(requests[0].header("Content-Type"), Some("application/json"));
}

#[test]
fn user_id_is_decoded_from_query() {
    let (checker, transport, _) =
        checker("https://x.test/schedule?foo=1&line_user_id=U%2B1+2#top");
    assert_eq!(checker.line_user_id().as_deref(), Some("U+1 2"));

    transport.respond_json(
        "POST",
        &message_path(ContentType::ScheduleSecretary),
        &json!({"restricted": false}),
    );
    let (mut doc, _) = product_page();
    checker.init(&mut doc);
    assert_eq!(
        transport.requests()[0].body.as_deref(),
        Some(r#"{"line_user_id":"U+1 2"}"#)
    );
}

// ---------------------------------------------------------------------------
// Not restricted / no request
// ---------------------------------------------------------------------------

#[test]
fn unrestricted_user_leaves_page_untouched() {
    let (checker, transport, _) = checker("https://x.test/task?line_user_id=U1");
    transport.respond_json(
        "POST",
        &message_path(ContentType::TaskConcierge),
        &json!({"restricted": false}),
    );
    let (mut doc, main) = product_page();
    let before = collections_console::dom::html::inner_html(&doc, doc.body());

    assert_eq!(checker.init(&mut doc), WidgetOutcome::NotRestricted);
    assert!(!doc.is_hidden(main));
    assert_eq!(
        collections_console::dom::html::inner_html(&doc, doc.body()),
        before
    );
}

#[test]
fn missing_user_id_makes_no_request() {
    let (checker, transport, diagnostics) = checker("https://x.test/schedule");
    let (mut doc, main) = product_page();

    assert_eq!(checker.init(&mut doc), WidgetOutcome::NoUserId);
    assert!(transport.requests().is_empty());
    assert!(!doc.is_hidden(main));
    assert!(
        diagnostics
            .events()
            .iter()
            .any(|e| e.message.contains("line_user_id not found"))
    );
}

#[test]
fn user_id_in_fragment_is_not_a_query_parameter() {
    let (checker, transport, _) = checker("https://lp.test/schedule#/entry?line_user_id=U1");
    let (mut doc, main) = product_page();

    assert_eq!(checker.line_user_id(), None);
    assert_eq!(checker.init(&mut doc), WidgetOutcome::NoUserId);
    assert!(transport.requests().is_empty());
    assert!(!doc.is_hidden(main));
}

#[test]
fn unclassified_page_makes_no_request() {
    let (checker, transport, _) = checker("https://x.test/pricing?line_user_id=U1");
    let (mut doc, _) = product_page();

    assert_eq!(checker.content_type(), None);
    assert_eq!(checker.init(&mut doc), WidgetOutcome::Unclassified);
    assert!(!checker.check_restriction().restricted);
    assert!(transport.requests().is_empty());
}

// ---------------------------------------------------------------------------
// Fail open
// ---------------------------------------------------------------------------

#[test]
fn network_error_fails_open() {
    let (checker, transport, diagnostics) = checker("https://x.test/schedule?line_user_id=U1");
    transport.fail(
        "POST",
        &message_path(ContentType::ScheduleSecretary),
        "connection refused",
    );
    let (mut doc, main) = product_page();

    let outcome = checker.init(&mut doc);
    assert!(matches!(outcome, WidgetOutcome::Failed { ref error } if error.contains("connection refused")));
    assert!(!doc.is_hidden(main));
    assert!(doc.get_element_by_id(OVERLAY_ID).is_none());
    assert!(diagnostics.events().iter().any(|e| e.level == Level::Error));
}

#[test]
fn server_error_fails_open() {
    let (checker, transport, _) = checker("https://x.test/schedule?line_user_id=U1");
    transport.respond(
        "POST",
        &message_path(ContentType::ScheduleSecretary),
        500,
        r#"{"restricted": true}"#,
    );
    let (mut doc, main) = product_page();

    assert!(matches!(checker.init(&mut doc), WidgetOutcome::Failed { .. }));
    assert!(!doc.is_hidden(main));
}

#[test]
fn malformed_response_fails_open() {
    let (checker, transport, _) = checker("https://x.test/schedule?line_user_id=U1");
    transport.respond(
        "POST",
        &message_path(ContentType::ScheduleSecretary),
        200,
        "not json",
    );
    let (mut doc, main) = product_page();

    assert!(matches!(checker.init(&mut doc), WidgetOutcome::Failed { .. }));
    assert!(!doc.is_hidden(main));
}

// ---------------------------------------------------------------------------
// Precheck
// ---------------------------------------------------------------------------

#[test]
fn precheck_skips_message_for_unrestricted_user() {
    let (checker, transport, _) = checker("https://x.test/schedule?line_user_id=U1");
    let checker = checker.with_precheck(true);
    transport.respond_json(
        "POST",
        &check_path(ContentType::ScheduleSecretary),
        &json!({"restricted": false}),
    );
    let (mut doc, _) = product_page();

    assert_eq!(checker.init(&mut doc), WidgetOutcome::NotRestricted);
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.ends_with(&check_path(ContentType::ScheduleSecretary)));
}

#[test]
fn precheck_then_message_for_restricted_user() {
    let (checker, transport, _) = checker("https://x.test/schedule?line_user_id=U1");
    let checker = checker.with_precheck(true);
    transport.respond_json(
        "POST",
        &check_path(ContentType::ScheduleSecretary),
        &json!({"restricted": true}),
    );
    transport.respond_json(
        "POST",
        &message_path(ContentType::ScheduleSecretary),
        &restricted_body(),
    );
    let (mut doc, main) = product_page();

    assert!(matches!(checker.init(&mut doc), WidgetOutcome::Restricted { .. }));
    assert!(doc.is_hidden(main));
    assert_eq!(transport.requests().len(), 2);
}

#[test]
fn precheck_failure_fails_open() {
    let (checker, transport, _) = checker("https://x.test/schedule?line_user_id=U1");
    let checker = checker.with_precheck(true);
    transport.fail("POST", &check_path(ContentType::ScheduleSecretary), "timeout");
    let (mut doc, main) = product_page();

    assert!(matches!(checker.init(&mut doc), WidgetOutcome::Failed { .. }));
    assert!(!doc.is_hidden(main));
    assert_eq!(transport.requests().len(), 1);
}
