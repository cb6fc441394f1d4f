//! The audited filter set available to theme templates.
//!
//! Adding a filter here means reviewing it for DOM/script injection risk;
//! nothing in a template can mark output as safe except `raw_html`, and
//! `raw_html` always runs the sanitizer.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

static SANITIZER: Lazy<ammonia::Builder<'static>> = Lazy::new(|| {
    let mut builder = ammonia::Builder::default();
    // Storefront sections use structural tags ammonia strips by default.
    builder.add_tags(["header", "footer", "main", "section", "nav", "figure", "figcaption"]);
    builder
});

/// Sanitize a string value into markup that is safe to emit unescaped.
/// Templates use it as `{{ body | raw_html | safe }}`.
pub fn raw_html(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let input = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("raw_html expects a string"))?;
    Ok(Value::String(SANITIZER.clean(input).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(input: &str) -> String {
        let value = Value::String(input.to_string());
        match raw_html(&value, &HashMap::new()).unwrap() {
            Value::String(s) => s,
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn strips_script_tags() {
        let out = clean("<p>ok</p><script>alert(1)</script>");
        assert_eq!(out, "<p>ok</p>");
    }

    #[test]
    fn strips_event_handlers() {
        let out = clean("<img src=\"x.png\" onerror=\"alert(1)\">");
        assert!(!out.contains("onerror"));
    }

    #[test]
    fn strips_javascript_urls() {
        let out = clean("<a href=\"javascript:alert(1)\">x</a>");
        assert!(!out.contains("javascript:"));
    }

    #[test]
    fn keeps_structural_markup() {
        let out = clean("<section><h2>Sale</h2><p>now on</p></section>");
        assert_eq!(out, "<section><h2>Sale</h2><p>now on</p></section>");
    }

    #[test]
    fn rejects_non_string_input() {
        let result = raw_html(&Value::Bool(true), &HashMap::new());
        assert!(result.is_err());
    }
}
