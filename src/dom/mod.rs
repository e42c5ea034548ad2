//! In-memory document model.
//!
//! A small arena-backed element tree that the dashboard and the restriction
//! widget render into. It offers the handful of browser-DOM operations the
//! renderers rely on (lookup by id/class/tag, `textContent`, inline style,
//! attributes, child replacement) and serializes to HTML via [`html`].
//!
//! Removed subtrees are freed and their slots reused, so a long-running
//! dashboard that rebuilds its tables every refresh does not grow without
//! bound. A [`NodeId`] must not be kept past the removal of its node: it
//! resolves to `None` until the slot is handed out again.

pub mod html;

use std::collections::BTreeMap;

/// Handle to an element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A single element: tag, attributes, classes, inline style, text, children.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    style: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            style: Vec::new(),
            text: None,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add one or more whitespace-separated classes.
    pub fn add_class(&mut self, classes: &str) -> &mut Self {
        for class in classes.split_whitespace() {
            if !self.has_class(class) {
                self.classes.push(class.to_string());
            }
        }
        self
    }

    pub fn remove_class(&mut self, class: &str) -> &mut Self {
        self.classes.retain(|c| c != class);
        self
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn style_pairs(&self) -> &[(String, String)] {
        &self.style
    }

    /// Set an inline style property; an empty value removes it.
    pub fn set_style(&mut self, property: &str, value: &str) -> &mut Self {
        self.style.retain(|(k, _)| k != property);
        if !value.is_empty() {
            self.style.push((property.to_string(), value.to_string()));
        }
        self
    }

    /// Apply a `cssText`-style declaration block (`a: b; c: d`).
    pub fn set_css_text(&mut self, css: &str) -> &mut Self {
        self.style.clear();
        for declaration in css.split(';') {
            if let Some((property, value)) = declaration.split_once(':') {
                self.set_style(property.trim(), value.trim());
            }
        }
        self
    }

    /// Own text of the element (not including descendants).
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Arena of elements rooted at a `<body>` element.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Option<Element>>,
    free: Vec<usize>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document containing only `<body>`.
    pub fn new() -> Self {
        Self {
            slots: vec![Some(Element::new("body"))],
            free: Vec::new(),
            body: NodeId(0),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn get(&self, node: NodeId) -> Option<&Element> {
        self.slots.get(node.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.slots.get_mut(node.0).and_then(Option::as_mut)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let element = Element::new(tag);
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(element);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(element));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Create an element and append it to `parent`.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let child = self.create_element(tag);
        self.append_child(parent, child);
        child
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.get(parent).is_none() || self.get(child).is_none() || parent == child {
            return;
        }
        self.detach(child);
        if let Some(el) = self.get_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(el) = self.get_mut(parent) {
            el.children.push(child);
        }
    }

    /// Remove and free every child of `node` (`innerHTML = ''`).
    pub fn clear_children(&mut self, node: NodeId) {
        let children = match self.get_mut(node) {
            Some(el) => std::mem::take(&mut el.children),
            None => return,
        };
        for child in children {
            self.free_subtree(child);
        }
    }

    /// Remove `node` from its parent and free it with its descendants.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body {
            return;
        }
        self.detach(node);
        self.free_subtree(node);
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.get(node).and_then(Element::parent) else {
            return;
        };
        if let Some(el) = self.get_mut(parent) {
            el.children.retain(|&c| c != node);
        }
        if let Some(el) = self.get_mut(node) {
            el.parent = None;
        }
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(el) = self.slots.get_mut(current.0).and_then(Option::take) {
                stack.extend(el.children);
                self.free.push(current.0);
            }
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(Element::children).unwrap_or(&[])
    }

    /// Whether `node` is reachable from `<body>`.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.body {
                return true;
            }
            current = self.get(n).and_then(Element::parent);
        }
        false
    }

    // -- Queries --

    /// Depth-first, document-order walk of `root` and its descendants.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let Some(el) = self.get(node) else {
                continue;
            };
            out.push(node);
            stack.extend(el.children.iter().rev().copied());
        }
        out
    }

    /// First element in `root`'s subtree matching `predicate`.
    pub fn find(&self, root: NodeId, predicate: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&node| self.get(node).is_some_and(&predicate))
    }

    /// Every element in `root`'s subtree matching `predicate`.
    pub fn find_all(&self, root: NodeId, predicate: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&node| self.get(node).is_some_and(&predicate))
            .collect()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find(self.body, |el| el.id() == Some(id))
    }

    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.find_all(self.body, |el| el.has_class(class))
    }

    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(self.body, |el| el.tag == tag)
    }

    /// First descendant of `root` (excluding `root`) carrying `class`.
    pub fn descendant_with_class(&self, root: NodeId, class: &str) -> Option<NodeId> {
        self.find_all(root, |el| el.has_class(class))
            .into_iter()
            .find(|&node| node != root)
    }

    /// Concatenated text of `node` and all of its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .into_iter()
            .filter_map(|n| self.get(n).and_then(Element::text))
            .collect()
    }

    // -- Mutation shortcuts (no-ops on freed nodes) --

    /// Replace the element's text; children are removed (`textContent = ...`).
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        self.clear_children(node);
        if let Some(el) = self.get_mut(node) {
            el.text = Some(text.into());
        }
    }

    /// Set the element's own text while keeping its children.
    pub fn set_own_text(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(el) = self.get_mut(node) {
            el.text = Some(text.into());
        }
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.get_mut(node) {
            el.set_attr(name, value);
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node).and_then(|el| el.attr(name))
    }

    pub fn add_class(&mut self, node: NodeId, classes: &str) {
        if let Some(el) = self.get_mut(node) {
            el.add_class(classes);
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.get_mut(node) {
            el.remove_class(class);
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node).is_some_and(|el| el.has_class(class))
    }

    /// Set `style.display`; `""` clears it.
    pub fn set_display(&mut self, node: NodeId, value: &str) {
        if let Some(el) = self.get_mut(node) {
            el.set_style("display", value);
        }
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.get(node)
            .and_then(|el| el.style("display"))
            .is_some_and(|display| display == "none")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let table = doc.append(body, "tbody");
        doc.set_attr(table, "id", "rows");
        for name in ["Acme", "Globex"] {
            let tr = doc.append(table, "tr");
            let td = doc.append(tr, "td");
            doc.set_text(td, name);
        }
        let footer = doc.append(body, "div");
        doc.add_class(footer, "footer muted");
        (doc, table, footer)
    }

    #[test]
    fn lookup_by_id_and_class() {
        let (doc, table, footer) = sample();
        assert_eq!(doc.get_element_by_id("rows"), Some(table));
        assert_eq!(doc.elements_by_class("muted"), vec![footer]);
        assert!(doc.get_element_by_id("missing").is_none());
    }

    #[test]
    fn text_content_concatenates_descendants_in_order() {
        let (doc, table, _) = sample();
        assert_eq!(doc.text_content(table), "AcmeGlobex");
    }

    #[test]
    fn clear_children_frees_and_reuses_slots() {
        let (mut doc, table, _) = sample();
        let before = doc.slots.len();
        doc.clear_children(table);
        assert!(doc.children(table).is_empty());
        for _ in 0..4 {
            doc.append(table, "tr");
        }
        assert_eq!(doc.slots.len(), before);
    }

    #[test]
    fn removed_nodes_resolve_to_none() {
        let (mut doc, table, _) = sample();
        let row = doc.children(table)[0];
        doc.remove(row);
        assert!(doc.get(row).is_none());
        assert_eq!(doc.children(table).len(), 1);
    }

    #[test]
    fn append_child_moves_between_parents() {
        let (mut doc, table, footer) = sample();
        let row = doc.children(table)[0];
        doc.append_child(footer, row);
        assert_eq!(doc.children(table).len(), 1);
        assert_eq!(doc.children(footer), &[row]);
        assert!(doc.is_attached(row));
    }

    #[test]
    fn detached_elements_are_not_found_by_id() {
        let mut doc = Document::new();
        let orphan = doc.create_element("div");
        doc.set_attr(orphan, "id", "orphan");
        assert!(doc.get_element_by_id("orphan").is_none());
        assert!(!doc.is_attached(orphan));
    }

    #[test]
    fn display_and_css_text() {
        let mut doc = Document::new();
        let div = doc.append(doc.body(), "div");
        doc.set_display(div, "none");
        assert!(doc.is_hidden(div));
        doc.set_display(div, "");
        assert!(!doc.is_hidden(div));

        let el = doc.get_mut(div).unwrap();
        el.set_css_text("position: fixed;\n  top: 0;\n  z-index: 9999;");
        assert_eq!(el.style("position"), Some("fixed"));
        assert_eq!(el.style("z-index"), Some("9999"));
        assert_eq!(el.style_pairs().len(), 3);
    }

    #[test]
    fn class_helpers_ignore_duplicates() {
        let mut doc = Document::new();
        let link = doc.append(doc.body(), "a");
        doc.add_class(link, "nav-link active");
        doc.add_class(link, "active");
        assert_eq!(doc.get(link).unwrap().classes().len(), 2);
        doc.remove_class(link, "active");
        assert!(!doc.has_class(link, "active"));
    }
}
