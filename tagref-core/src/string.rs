//! String helpers for deriving class names.

use std::sync::OnceLock;

use regex::Regex;

fn decamelize_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("decamelize pattern is valid"))
}

fn dasherize_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[ _]").expect("dasherize pattern is valid"))
}

/// `innerHTML` → `inner_html`.
pub fn decamelize(s: &str) -> String {
    decamelize_pattern()
        .replace_all(s, "${1}_${2}")
        .to_lowercase()
}

/// `isActive` → `is-active`, `some_name` → `some-name`.
pub fn dasherize(s: &str) -> String {
    dasherize_pattern()
        .replace_all(&decamelize(s), "-")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decamelizes() {
        assert_eq!(decamelize("innerHTML"), "inner_html");
        assert_eq!(decamelize("size160Url"), "size160_url");
        assert_eq!(decamelize("plain"), "plain");
    }

    #[test]
    fn dasherizes() {
        assert_eq!(dasherize("isActive"), "is-active");
        assert_eq!(dasherize("action_name"), "action-name");
        assert_eq!(dasherize("css class name"), "css-class-name");
        assert_eq!(dasherize("already-dashed"), "already-dashed");
    }
}
