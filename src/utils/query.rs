//! URL query-string helpers.
//!
//! Covers exactly what the console needs: reading one parameter out of a
//! page URL (form-style decoding) and encoding a path segment the way
//! `encodeURIComponent` does.

/// Return the first value of query parameter `name` in `url`.
///
/// The fragment is dropped before the query is located, so a `?` inside
/// `#...` is not a query string. `+` decodes to a space and `%XX` escapes are
/// decoded. A key without `=` yields an empty value.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let url = url.split('#').next().unwrap_or(url);
    let (_, query) = url.split_once('?')?;

    query.split('&').find_map(|pair| {
        if pair.is_empty() {
            return None;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if form_decode(key) == name {
            Some(form_decode(value))
        } else {
            None
        }
    })
}

/// Strip the query string and fragment from a request URL.
pub fn path_of(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Decode an `application/x-www-form-urlencoded` component.
pub fn form_decode(raw: &str) -> String {
    percent_decode(&raw.replace('+', " "))
}

/// Decode `%XX` escapes. Malformed escapes are kept verbatim; invalid UTF-8
/// is replaced.
pub fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            out.push(hi << 4 | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_uri_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_extracts_value() {
        let url = "https://example.test/ai_schedule?line_user_id=U123&x=1";
        assert_eq!(query_param(url, "line_user_id").as_deref(), Some("U123"));
        assert_eq!(query_param(url, "x").as_deref(), Some("1"));
    }

    #[test]
    fn query_param_decodes_and_ignores_fragment() {
        let url = "/search?q=%E6%A0%AA%E5%BC%8F+co#top";
        assert_eq!(query_param(url, "q").as_deref(), Some("株式 co"));
    }

    #[test]
    fn query_param_missing_or_absent_query() {
        assert_eq!(query_param("https://example.test/task", "line_user_id"), None);
        assert_eq!(query_param("https://example.test/task?foo=bar", "line_user_id"), None);
        assert_eq!(query_param("/p?flag", "flag").as_deref(), Some(""));
    }

    #[test]
    fn query_param_ignores_question_mark_inside_fragment() {
        let url = "https://lp.test/schedule#/entry?line_user_id=U1";
        assert_eq!(query_param(url, "line_user_id"), None);

        let url = "https://lp.test/schedule?a=1#/entry?line_user_id=U1";
        assert_eq!(query_param(url, "line_user_id"), None);
        assert_eq!(query_param(url, "a").as_deref(), Some("1"));
    }

    #[test]
    fn percent_decode_keeps_malformed_escapes() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("a%20b"), "a b");
    }

    #[test]
    fn encode_uri_component_matches_browser_rules() {
        assert_eq!(encode_uri_component("AI予定秘書"), "AI%E4%BA%88%E5%AE%9A%E7%A7%98%E6%9B%B8");
        assert_eq!(encode_uri_component("a b/c?d"), "a%20b%2Fc%3Fd");
        assert_eq!(encode_uri_component("keep-_.!~*'()"), "keep-_.!~*'()");
    }

    #[test]
    fn path_of_strips_query_and_fragment() {
        assert_eq!(path_of("/companies/3?x=1"), "/companies/3");
        assert_eq!(path_of("/section/a#b"), "/section/a");
        assert_eq!(path_of("/"), "/");
    }
}
