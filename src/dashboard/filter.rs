//! Client-side search over the rendered companies table.

use crate::dom::Document;

/// Show rows of `#companies-table-body` whose full text contains `term`
/// (case-insensitive), hide the rest. Returns the number of visible rows.
///
/// Only toggles `display`; rows are never added, removed or reordered.
pub fn filter_rows(doc: &mut Document, term: &str) -> usize {
    let Some(body) = doc.get_element_by_id("companies-table-body") else {
        return 0;
    };

    let needle = term.to_lowercase();
    let rows = doc.children(body).to_vec();
    let mut visible = 0;
    for row in rows {
        let matches = doc.text_content(row).to_lowercase().contains(&needle);
        doc.set_display(row, if matches { "" } else { "none" });
        if matches {
            visible += 1;
        }
    }
    visible
}
