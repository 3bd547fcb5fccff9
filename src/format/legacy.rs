//! Legacy `&`-code formatter
//!
//! Translates alternate color codes (`&a`, `&l`, ...) into section-sign codes
//! and accepts JSON chat components in their object, array and string forms.

use serde_json::Value;

use super::{FormatError, FormatResult, TextFormatter};

/// Section sign used by the legacy chat format
pub const SECTION_SIGN: char = '§';

/// Marker introducing an alternate color code
const ALT_CHAR: char = '&';

/// Characters valid after a color code marker
const CODE_CHARS: &str = "0123456789AaBbCcDdEeFfKkLlMmNnOoRrXx";

/// Keys that make a JSON object a chat component
const COMPONENT_KEYS: &[&str] = &["text", "translate", "score", "selector", "keybind", "extra"];

/// Formatter for `&`-coded text and JSON chat components
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyFormatter;

impl LegacyFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl TextFormatter for LegacyFormatter {
    fn colorize(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match chars.peek() {
                Some(&code) if c == ALT_CHAR && CODE_CHARS.contains(code) => {
                    out.push(SECTION_SIGN);
                    out.push(code.to_ascii_lowercase());
                    chars.next();
                }
                _ => out.push(c),
            }
        }

        out
    }

    fn parse_rich_text(&self, raw: &str) -> FormatResult<Value> {
        let value: Value = serde_json::from_str(raw.trim())?;

        match &value {
            Value::String(_) => Ok(value),
            Value::Object(map) if is_component(map) => Ok(value),
            Value::Array(items) if !items.is_empty() && items.iter().all(is_component_value) => {
                Ok(value)
            }
            Value::Object(_) => Err(FormatError::NotAComponent { kind: "object" }),
            Value::Array(_) => Err(FormatError::NotAComponent { kind: "array" }),
            Value::Number(_) => Err(FormatError::NotAComponent { kind: "number" }),
            Value::Bool(_) => Err(FormatError::NotAComponent { kind: "bool" }),
            Value::Null => Err(FormatError::NotAComponent { kind: "null" }),
        }
    }
}

fn is_component(map: &serde_json::Map<String, Value>) -> bool {
    COMPONENT_KEYS.iter().any(|key| map.contains_key(*key))
}

fn is_component_value(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Object(map) => is_component(map),
        _ => false,
    }
}

/// Remove `§x` style codes from text
pub fn strip_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == SECTION_SIGN {
            chars.next();
        } else {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_translates_codes() {
        let formatter = LegacyFormatter::new();
        assert_eq!(formatter.colorize("&aGreen &LBold"), "§aGreen §lBold");
        assert_eq!(formatter.colorize("&6[&cServer&6]"), "§6[§cServer§6]");
    }

    #[test]
    fn test_colorize_leaves_other_ampersands() {
        let formatter = LegacyFormatter::new();
        assert_eq!(formatter.colorize("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(formatter.colorize("&zNope"), "&zNope");
        assert_eq!(formatter.colorize("trailing&"), "trailing&");
    }

    #[test]
    fn test_parse_object_component() {
        let formatter = LegacyFormatter::new();
        let value = formatter
            .parse_rich_text(r#"{"text":"Click","clickEvent":{"action":"open_url","value":"https://example.com"}}"#)
            .unwrap();
        assert_eq!(value["text"], "Click");
    }

    #[test]
    fn test_parse_array_component() {
        let formatter = LegacyFormatter::new();
        assert!(formatter
            .parse_rich_text(r#"["", {"text":"a"}, {"translate":"chat.type.text"}]"#)
            .is_ok());
    }

    #[test]
    fn test_parse_rejects_non_components() {
        let formatter = LegacyFormatter::new();
        assert!(matches!(
            formatter.parse_rich_text(r#"{"foo":1}"#),
            Err(FormatError::NotAComponent { kind: "object" })
        ));
        assert!(matches!(
            formatter.parse_rich_text("[]"),
            Err(FormatError::NotAComponent { kind: "array" })
        ));
        assert!(matches!(
            formatter.parse_rich_text("{not json"),
            Err(FormatError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_strip_codes() {
        assert_eq!(strip_codes("§aHello §lWorld"), "Hello World");
        assert_eq!(strip_codes("plain"), "plain");
    }
}
