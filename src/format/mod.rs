//! Text formatting for announcements
//!
//! Turns an announcement's raw body into transport-ready output. Bodies that
//! look like JSON chat components are parsed as such and attached to the
//! prefix; everything else is colorized legacy text. A body that looks like
//! JSON but fails to parse falls back to colorized legacy text for that one
//! message.

pub mod legacy;

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

use crate::models::looks_like_rich_text;

pub use legacy::{strip_codes, LegacyFormatter, SECTION_SIGN};

/// Result type for formatting operations
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while parsing rich text
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Body is not valid JSON
    #[error("Invalid JSON component: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Body is valid JSON but not a chat component
    #[error("JSON value is not a chat component: {kind}")]
    NotAComponent { kind: &'static str },
}

/// External formatter seam
pub trait TextFormatter: Send + Sync {
    /// Translate legacy color codes
    fn colorize(&self, raw: &str) -> String;

    /// Parse a JSON chat component
    fn parse_rich_text(&self, raw: &str) -> FormatResult<Value>;
}

/// Output handed to a transport
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "lowercase")]
pub enum FormattedMessage {
    /// Text with `§` color codes
    Legacy(String),
    /// JSON chat component tree
    Components(Value),
}

impl FormattedMessage {
    /// Text content without any styling
    pub fn plain_text(&self) -> String {
        match self {
            Self::Legacy(text) => strip_codes(text),
            Self::Components(value) => {
                let mut out = String::new();
                collect_text(value, &mut out);
                strip_codes(&out)
            }
        }
    }

    /// Check if this is a component tree
    pub fn is_components(&self) -> bool {
        matches!(self, Self::Components(_))
    }
}

impl fmt::Display for FormattedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plain_text())
    }
}

fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Array(items) => items.iter().for_each(|item| collect_text(item, out)),
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(extra) = map.get("extra") {
                collect_text(extra, out);
            }
        }
        _ => {}
    }
}

/// A rendered announcement and whether rich-text parsing failed
#[derive(Debug)]
pub struct Rendered {
    pub message: FormattedMessage,
    pub fallback: Option<FormatError>,
}

/// Render an announcement body behind an already colorized prefix
pub fn render(formatter: &dyn TextFormatter, prefix: &str, text: &str) -> Rendered {
    if !looks_like_rich_text(text) {
        return Rendered {
            message: FormattedMessage::Legacy(format!("{prefix}{}", formatter.colorize(text))),
            fallback: None,
        };
    }

    match formatter.parse_rich_text(text) {
        Ok(components) => Rendered {
            message: FormattedMessage::Components(attach_to_prefix(prefix, components)),
            fallback: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Rich text announcement failed to parse, sending as plain text");
            Rendered {
                message: FormattedMessage::Legacy(format!("{prefix}{}", formatter.colorize(text))),
                fallback: Some(e),
            }
        }
    }
}

/// Hang parsed components off the prefix as `extra` children
///
/// With an empty prefix the components are used as they are.
fn attach_to_prefix(prefix: &str, components: Value) -> Value {
    if prefix.is_empty() {
        return components;
    }

    let extra = match components {
        Value::Array(items) => items,
        other => vec![other],
    };

    json!({ "text": prefix, "extra": extra })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_legacy_text() {
        let formatter = LegacyFormatter::new();
        let rendered = render(&formatter, "§6[Info] ", "&aWelcome");
        assert_eq!(
            rendered.message,
            FormattedMessage::Legacy("§6[Info] §aWelcome".to_string())
        );
        assert!(rendered.fallback.is_none());
    }

    #[test]
    fn test_render_rich_text_attaches_to_prefix() {
        let formatter = LegacyFormatter::new();
        let rendered = render(&formatter, "§6[Info] ", r#"{"text":"Vote!","color":"green"}"#);

        let FormattedMessage::Components(value) = &rendered.message else {
            panic!("expected components");
        };
        assert_eq!(value["text"], "§6[Info] ");
        assert_eq!(value["extra"][0]["text"], "Vote!");
        assert_eq!(rendered.message.plain_text(), "[Info] Vote!");
    }

    #[test]
    fn test_render_rich_text_without_prefix() {
        let formatter = LegacyFormatter::new();
        let rendered = render(&formatter, "", r#"[{"text":"a"},{"text":"b"}]"#);
        assert_eq!(
            rendered.message,
            FormattedMessage::Components(json!([{"text": "a"}, {"text": "b"}]))
        );
    }

    #[test]
    fn test_render_broken_json_falls_back() {
        let formatter = LegacyFormatter::new();
        let rendered = render(&formatter, "§6> ", "{broken &cjson");

        assert!(rendered.fallback.is_some());
        assert_eq!(
            rendered.message,
            FormattedMessage::Legacy("§6> {broken §cjson".to_string())
        );
    }

    #[test]
    fn test_plain_text_strips_codes() {
        let message = FormattedMessage::Legacy("§6[§cA§6] §rhello".to_string());
        assert_eq!(message.plain_text(), "[A] hello");
        assert_eq!(message.to_string(), "[A] hello");
        assert!(!message.is_components());
    }

    #[test]
    fn test_formatted_message_serializes_tagged() {
        let message = FormattedMessage::Legacy("hi".to_string());
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({"kind": "legacy", "body": "hi"}));
    }
}
