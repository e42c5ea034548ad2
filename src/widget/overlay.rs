//! Full-viewport restriction overlay.

use crate::api::types::MessageTemplate;
use crate::dom::{Document, NodeId};

/// Id of the overlay root.
pub const OVERLAY_ID: &str = "line-restriction-message";

const OVERLAY_CSS: &str = "position: fixed; top: 0; left: 0; width: 100%; height: 100%; \
    background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); display: flex; \
    flex-direction: column; justify-content: center; align-items: center; z-index: 9999; \
    padding: 20px; box-sizing: border-box";

const CARD_CSS: &str = "background: white; border-radius: 20px; padding: 40px; \
    text-align: center; max-width: 500px; box-shadow: 0 20px 40px rgba(0,0,0,0.1)";

const TITLE_CSS: &str =
    "color: #333; margin-bottom: 20px; font-size: 24px; font-weight: bold";

const TEXT_CSS: &str = "color: #666; margin-bottom: 30px; line-height: 1.6; font-size: 16px";

const ACTIONS_CSS: &str = "display: flex; flex-direction: column; gap: 15px";

const BUTTON_CSS: &str = "background: #00B900; color: white; border: none; \
    padding: 15px 30px; border-radius: 10px; font-size: 16px; font-weight: bold; \
    cursor: pointer; transition: background 0.3s";

/// Hide the page's primary content and append the overlay built from
/// `template`. Any earlier overlay is replaced, so the page holds exactly one.
pub fn display_restriction_ui(doc: &mut Document, template: &MessageTemplate) -> NodeId {
    let body = doc.body();
    let primary = doc.first_by_tag("main").unwrap_or(body);
    doc.set_display(primary, "none");

    if let Some(previous) = doc.get_element_by_id(OVERLAY_ID) {
        doc.remove(previous);
    }

    let overlay = doc.append(body, "div");
    doc.set_attr(overlay, "id", OVERLAY_ID);
    set_css(doc, overlay, OVERLAY_CSS);

    let card = doc.append(overlay, "div");
    set_css(doc, card, CARD_CSS);

    let title = doc.append(card, "h1");
    doc.set_text(title, template.title.as_str());
    set_css(doc, title, TITLE_CSS);

    let text = doc.append(card, "p");
    doc.set_text(text, template.text.as_str());
    set_css(doc, text, TEXT_CSS);

    let actions = doc.append(card, "div");
    set_css(doc, actions, ACTIONS_CSS);
    for action in &template.actions {
        let button = doc.append(actions, "button");
        doc.set_attr(button, "type", "button");
        doc.set_text(button, action.label.as_str());
        set_css(doc, button, BUTTON_CSS);
        if let Some(uri) = action.link() {
            doc.set_attr(button, "data-action", "open-uri");
            doc.set_attr(button, "data-uri", uri);
        }
    }

    overlay
}

fn set_css(doc: &mut Document, node: NodeId, css: &str) {
    if let Some(el) = doc.get_mut(node) {
        el.set_css_text(css);
    }
}

/// Effect of activating an overlay button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEffect {
    /// Open the URL in a new browsing context (`_blank`).
    OpenInNewTab(String),
}

/// Effect of clicking `button`; inert buttons yield `None`.
pub fn activate(doc: &Document, button: NodeId) -> Option<ActionEffect> {
    let el = doc.get(button)?;
    match el.attr("data-action") {
        Some("open-uri") => el
            .attr("data-uri")
            .map(|uri| ActionEffect::OpenInNewTab(uri.to_string())),
        _ => None,
    }
}

/// The overlay's buttons in display order.
pub fn action_buttons(doc: &Document) -> Vec<NodeId> {
    match doc.get_element_by_id(OVERLAY_ID) {
        Some(overlay) => doc.find_all(overlay, |el| el.tag() == "button"),
        None => Vec::new(),
    }
}
