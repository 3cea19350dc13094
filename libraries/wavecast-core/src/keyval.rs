//! Line-oriented `key = value` configuration text
//!
//! The format is deliberately small: one `key = value` pair per line,
//! whitespace around the key and `=` is ignored, `#` introduces a trailing
//! comment. Typed accessors fall back to a default when the key is missing
//! or its value does not parse.

use tracing::debug;

/// Look up the raw value for `key`, trimmed of surrounding whitespace and
/// trailing comments. Returns `None` when the key is not present.
///
/// A key only matches a full token: `key` does not match a `keyword = ...`
/// line.
pub fn lookup<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("");
        let rest = line.trim_start();
        let Some(rest) = rest.strip_prefix(key) else {
            continue;
        };
        let rest = rest.trim_start();
        if let Some(value) = rest.strip_prefix('=') {
            return Some(value.trim());
        }
    }
    None
}

/// String value for `key`, or `fallback` when absent.
pub fn str_value(text: &str, key: &str, fallback: &str) -> String {
    match lookup(text, key) {
        Some(value) => {
            debug!(key, value, "keyval");
            value.to_owned()
        }
        None => {
            debug!(key, fallback, "keyval fallback");
            fallback.to_owned()
        }
    }
}

/// Integer value for `key`, or `fallback` when absent or unparsable.
pub fn int_value(text: &str, key: &str, fallback: i64) -> i64 {
    lookup(text, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

/// Real value for `key`, or `fallback` when absent or unparsable.
pub fn real_value(text: &str, key: &str, fallback: f64) -> f64 {
    lookup(text, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

/// Boolean value for `key`; `true` is matched case-insensitively, anything
/// else is `false`. Falls back when the key is absent.
pub fn bool_value(text: &str, key: &str, fallback: bool) -> bool {
    lookup(text, key)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "\
        host = stream.example.net\n\
        port= 8000\n\
        gain =-2.5   # post-amp in dB\n\
        prescan = TRUE\n\
        title_format = %artist% - %title%\n";

    #[test]
    fn basic_lookup() {
        assert_eq!(lookup(CONFIG, "host"), Some("stream.example.net"));
        assert_eq!(lookup(CONFIG, "port"), Some("8000"));
        assert_eq!(lookup(CONFIG, "missing"), None);
    }

    #[test]
    fn trailing_comments_are_stripped() {
        assert_eq!(lookup(CONFIG, "gain"), Some("-2.5"));
        assert_eq!(real_value(CONFIG, "gain", 0.0), -2.5);
    }

    #[test]
    fn key_must_be_followed_by_equals() {
        let text = "keyword = other\nkey = right\n";
        assert_eq!(lookup(text, "key"), Some("right"));
        assert_eq!(lookup(text, "keyword"), Some("other"));
    }

    #[test]
    fn typed_accessors_fall_back() {
        assert_eq!(int_value(CONFIG, "port", 9000), 8000);
        assert_eq!(int_value(CONFIG, "missing", 9000), 9000);
        assert_eq!(int_value(CONFIG, "host", 7), 7);
        assert_eq!(str_value(CONFIG, "missing", "x"), "x");
        assert!(bool_value(CONFIG, "prescan", false));
        assert!(!bool_value(CONFIG, "missing", false));
    }

    #[test]
    fn values_keep_inner_whitespace() {
        assert_eq!(
            lookup(CONFIG, "title_format"),
            Some("%artist% - %title%")
        );
    }

    #[test]
    fn whole_line_comments_are_ignored() {
        let text = "# port = 1234\nport = 8000\n";
        assert_eq!(int_value(text, "port", 0), 8000);
    }
}
