//! Handle classification.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::browser::RemoteDescriptor;
use crate::protocol::NumberValue;

// ============================================================================
// HandleKind
// ============================================================================

/// What a handle is, decided once from its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleKind {
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// Boolean with its value.
    Boolean(bool),
    /// String with its value.
    String(String),
    /// Number, finite or special.
    Number(NumberValue),
    /// BigInt digits without the `n` suffix.
    Bigint(String),
    /// Symbol description.
    Symbol(String),
    /// Function.
    Function,
    /// RegExp source text.
    Regexp(String),
    /// Date string.
    Date(String),
    /// Error object.
    Error,
    /// DOM node.
    Node,
    /// Window proxy.
    Window,
    /// Array.
    Array,
    /// Plain object.
    Object,
    /// Anything else.
    Unsupported,
}

impl HandleKind {
    /// Classifies a descriptor.
    #[must_use]
    pub fn classify(descriptor: &RemoteDescriptor) -> Self {
        match descriptor.value_type.as_str() {
            "undefined" => Self::Undefined,
            "boolean" => match descriptor.value {
                Some(Value::Bool(b)) => Self::Boolean(b),
                _ => Self::Unsupported,
            },
            "string" => match &descriptor.value {
                Some(Value::String(s)) => Self::String(s.clone()),
                _ => Self::Unsupported,
            },
            "number" => classify_number(descriptor),
            "bigint" => descriptor
                .unserializable_value
                .as_deref()
                .or(descriptor.description.as_deref())
                .map_or(Self::Unsupported, |text| {
                    Self::Bigint(text.strip_suffix('n').unwrap_or(text).to_string())
                }),
            "symbol" => Self::Symbol(symbol_description(
                descriptor.description.as_deref().unwrap_or_default(),
            )),
            "function" => Self::Function,
            "object" => classify_object(descriptor),
            _ => Self::Unsupported,
        }
    }
}

fn classify_number(descriptor: &RemoteDescriptor) -> HandleKind {
    if let Some(text) = descriptor.unserializable_value.as_deref() {
        let special = match text {
            "Infinity" => "+Infinity",
            other => other,
        };
        return HandleKind::Number(NumberValue::Special(special.to_string()));
    }

    match &descriptor.value {
        Some(Value::Number(n)) => HandleKind::Number(NumberValue::Finite(n.clone())),
        _ => HandleKind::Unsupported,
    }
}

fn classify_object(descriptor: &RemoteDescriptor) -> HandleKind {
    let description = || descriptor.description.clone().unwrap_or_default();

    match descriptor.subtype.as_deref() {
        Some("null") => return HandleKind::Null,
        Some("regexp") => return HandleKind::Regexp(description()),
        Some("date") => return HandleKind::Date(description()),
        Some("error") => return HandleKind::Error,
        Some("node") => return HandleKind::Node,
        _ => {}
    }

    match descriptor.class_name.as_deref() {
        Some("Window") => HandleKind::Window,
        Some("Array") => HandleKind::Array,
        Some("Object") => HandleKind::Object,
        _ => HandleKind::Unsupported,
    }
}

/// Extracts `foo` from `Symbol(foo)`; anything else is returned whole.
fn symbol_description(description: &str) -> String {
    description
        .strip_prefix("Symbol(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(description)
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn descriptor(value_type: &str) -> RemoteDescriptor {
        RemoteDescriptor {
            value_type: value_type.to_string(),
            ..RemoteDescriptor::default()
        }
    }

    #[test]
    fn test_primitives() {
        let mut d = descriptor("string");
        d.value = Some(json!("hi"));
        assert_eq!(HandleKind::classify(&d), HandleKind::String("hi".into()));

        let mut d = descriptor("boolean");
        d.value = Some(json!(false));
        assert_eq!(HandleKind::classify(&d), HandleKind::Boolean(false));

        assert_eq!(
            HandleKind::classify(&descriptor("undefined")),
            HandleKind::Undefined
        );
    }

    #[test]
    fn test_special_numbers() {
        for (raw, wire) in [
            ("Infinity", "+Infinity"),
            ("-Infinity", "-Infinity"),
            ("NaN", "NaN"),
            ("-0", "-0"),
        ] {
            let mut d = descriptor("number");
            d.unserializable_value = Some(raw.to_string());
            assert_eq!(
                HandleKind::classify(&d),
                HandleKind::Number(NumberValue::Special(wire.to_string()))
            );
        }
    }

    #[test]
    fn test_bigint_suffix_stripped() {
        let mut d = descriptor("bigint");
        d.unserializable_value = Some("9007199254740993n".to_string());
        assert_eq!(
            HandleKind::classify(&d),
            HandleKind::Bigint("9007199254740993".into())
        );
    }

    #[test]
    fn test_symbol_description() {
        assert_eq!(symbol_description("Symbol(foo)"), "foo");
        assert_eq!(symbol_description("Symbol()"), "");
        assert_eq!(symbol_description("weird"), "weird");
    }

    #[test]
    fn test_object_subtypes_win_over_class() {
        let mut d = descriptor("object");
        d.subtype = Some("error".into());
        d.class_name = Some("Object".into());
        assert_eq!(HandleKind::classify(&d), HandleKind::Error);
    }

    #[test]
    fn test_unknown_class_is_unsupported() {
        let mut d = descriptor("object");
        d.subtype = Some("map".into());
        d.class_name = Some("Map".into());
        assert_eq!(HandleKind::classify(&d), HandleKind::Unsupported);
    }
}
