//! Argument values and reference sigils
//!
//! Raw configuration values are classified once, when the configuration is
//! loaded, into one of three kinds: a literal, a reference to another
//! definition, or a reference to a parameter path.

use crate::error::{DiError, DiResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Prefix marking a definition reference (`"@mailer"`)
pub const DEFINITION_SIGIL: char = '@';

/// Prefix marking a parameter reference (`"&db.host"`)
pub const PARAMETER_SIGIL: char = '&';

/// The pair of prefixes used to classify string arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sigils {
    pub definition: char,
    pub parameter: char,
}

impl Sigils {
    pub const fn new(definition: char, parameter: char) -> Self {
        Self {
            definition,
            parameter,
        }
    }
}

impl Default for Sigils {
    fn default() -> Self {
        Self::new(DEFINITION_SIGIL, PARAMETER_SIGIL)
    }
}

/// A constructor or method argument as declared in a definition
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Passed through unchanged
    Literal(Value),
    /// Built from the definition with this id
    Definition(String),
    /// Looked up at this dotted parameter path
    Parameter(String),
}

impl Argument {
    /// Classify a raw value using the default sigils
    pub fn parse(value: Value) -> DiResult<Self> {
        Self::parse_with(value, Sigils::default())
    }

    /// Classify a raw value
    ///
    /// Only strings can be references, and only their first character is
    /// inspected. A sigil with nothing after it is rejected.
    pub fn parse_with(value: Value, sigils: Sigils) -> DiResult<Self> {
        let text = match value {
            Value::String(text) => text,
            other => return Ok(Argument::Literal(other)),
        };

        let mut chars = text.chars();
        let kind = match chars.next() {
            Some(c) if c == sigils.definition => Argument::Definition,
            Some(c) if c == sigils.parameter => Argument::Parameter,
            _ => return Ok(Argument::Literal(Value::String(text))),
        };

        let rest = chars.as_str();
        if rest.is_empty() {
            return Err(DiError::MalformedReference { value: text });
        }
        Ok(kind(rest.to_string()))
    }

    /// A literal value, never interpreted as a reference
    pub fn literal(value: impl Into<Value>) -> Self {
        Argument::Literal(value.into())
    }

    /// A reference to another definition
    pub fn definition(id: impl Into<String>) -> Self {
        Argument::Definition(id.into())
    }

    /// A reference to a parameter path
    pub fn parameter(path: impl Into<String>) -> Self {
        Argument::Parameter(path.into())
    }

    /// Render back to the raw configuration form
    pub fn to_value_with(&self, sigils: Sigils) -> Value {
        match self {
            Argument::Literal(value) => value.clone(),
            Argument::Definition(id) => Value::String(format!("{}{}", sigils.definition, id)),
            Argument::Parameter(path) => Value::String(format!("{}{}", sigils.parameter, path)),
        }
    }
}

impl From<Value> for Argument {
    /// Wraps the value as a literal without sniffing for sigils
    fn from(value: Value) -> Self {
        Argument::Literal(value)
    }
}

/// Always renders with the default sigils; use [`Argument::to_value_with`]
/// for arguments parsed with custom ones.
impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Literal(value) => write!(f, "{}", value),
            Argument::Definition(id) => write!(f, "{}{}", DEFINITION_SIGIL, id),
            Argument::Parameter(path) => write!(f, "{}{}", PARAMETER_SIGIL, path),
        }
    }
}

impl Serialize for Argument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value_with(Sigils::default()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Argument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Argument::parse(value).map_err(serde::de::Error::custom)
    }
}

/// Classify a list of raw values, failing on the first malformed reference
pub fn parse_all(values: Vec<Value>, sigils: Sigils) -> DiResult<Vec<Argument>> {
    values
        .into_iter()
        .map(|value| Argument::parse_with(value, sigils))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_by_first_character() {
        assert_eq!(
            Argument::parse(json!("@mailer")).unwrap(),
            Argument::Definition("mailer".to_string())
        );
        assert_eq!(
            Argument::parse(json!("&db.host")).unwrap(),
            Argument::Parameter("db.host".to_string())
        );
        assert_eq!(
            Argument::parse(json!("mail@example.com")).unwrap(),
            Argument::Literal(json!("mail@example.com"))
        );
    }

    #[test]
    fn test_non_strings_are_literal() {
        assert_eq!(Argument::parse(json!(42)).unwrap(), Argument::literal(42));
        assert_eq!(Argument::parse(json!(true)).unwrap(), Argument::literal(true));
        assert_eq!(
            Argument::parse(json!(["@a", "&b"])).unwrap(),
            Argument::Literal(json!(["@a", "&b"]))
        );
        assert_eq!(Argument::parse(json!(null)).unwrap(), Argument::Literal(Value::Null));
    }

    #[test]
    fn test_empty_reference_is_malformed() {
        for raw in ["@", "&"] {
            let err = Argument::parse(json!(raw)).unwrap_err();
            assert!(matches!(err, DiError::MalformedReference { ref value } if value == raw));
        }
    }

    #[test]
    fn test_empty_string_is_literal() {
        assert_eq!(Argument::parse(json!("")).unwrap(), Argument::literal(""));
    }

    #[test]
    fn test_custom_sigils() {
        let sigils = Sigils::new('$', '%');
        assert_eq!(
            Argument::parse_with(json!("$logger"), sigils).unwrap(),
            Argument::definition("logger")
        );
        assert_eq!(
            Argument::parse_with(json!("%app.name"), sigils).unwrap(),
            Argument::parameter("app.name")
        );
        assert_eq!(
            Argument::parse_with(json!("@logger"), sigils).unwrap(),
            Argument::literal("@logger")
        );
    }

    #[test]
    fn test_custom_sigils_render_back_with_their_own_prefix() {
        let sigils = Sigils::new('$', '%');
        let argument = Argument::parse_with(json!("$logger"), sigils).unwrap();

        assert_eq!(argument.to_value_with(sigils), json!("$logger"));
        assert_eq!(argument.to_string(), "@logger");
        assert_eq!(
            Argument::parameter("app.name").to_value_with(sigils),
            json!("%app.name")
        );
        assert_eq!(Argument::literal("$x").to_value_with(sigils), json!("$x"));
    }

    #[test]
    fn test_multibyte_sigil() {
        let sigils = Sigils::new('→', '§');
        assert_eq!(
            Argument::parse_with(json!("→cache"), sigils).unwrap(),
            Argument::definition("cache")
        );
        assert!(Argument::parse_with(json!("§"), sigils).is_err());
    }

    #[test]
    fn test_deserialize_rejects_malformed() {
        let args: Vec<Argument> = serde_json::from_value(json!(["@a", 1, "x"])).unwrap();
        assert_eq!(
            args,
            vec![
                Argument::definition("a"),
                Argument::literal(1),
                Argument::literal("x")
            ]
        );

        let err = serde_json::from_value::<Vec<Argument>>(json!(["&"])).unwrap_err();
        assert!(err.to_string().contains("Malformed reference"));
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(Argument::definition("a").to_string(), "@a");
        assert_eq!(Argument::parameter("x.y").to_string(), "&x.y");
        assert_eq!(
            serde_json::to_value(Argument::parameter("x.y")).unwrap(),
            json!("&x.y")
        );
    }
}
