//! Field type tokens.

use std::str::FromStr;

use derive_more::Display;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::RecordType;
use crate::error::{SchemaError, SchemaResult};

/// The type of a single schema field.
///
/// Tokens are written as short strings in schema declarations (`"int"`,
/// `"list[str]"`, `"dict[str, list[int]]"`). Parsing is case-insensitive and
/// ignores surrounding whitespace. [`TypeToken::Record`] never appears in a
/// declaration: it is produced when a record type is synthesized from the
/// outputs of other nodes, and displays as the nested record's name.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TypeToken {
    /// Integral number.
    #[display("int")]
    Int,
    /// Any number.
    #[display("float")]
    Float,
    /// String.
    #[display("str")]
    Str,
    /// Boolean.
    #[display("bool")]
    Bool,
    /// Opaque JSON, including null.
    #[display("any")]
    Any,
    /// Array with unchecked elements.
    #[display("list")]
    List,
    /// Array whose elements all have the given type.
    #[display("list[{_0}]")]
    ListOf(Box<TypeToken>),
    /// Object with unchecked keys and values.
    #[display("dict")]
    Dict,
    /// Object whose keys and values have the given types.
    #[display("dict[{_0}, {_1}]")]
    DictOf(Box<TypeToken>, Box<TypeToken>),
    /// Nested synthesized record.
    #[display("{}", _0.name())]
    Record(RecordType),
}

impl TypeToken {
    /// Returns whether this token is one of the scalar kinds.
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeToken::Int | TypeToken::Float | TypeToken::Str | TypeToken::Bool
        )
    }

    /// Infers the token describing a sample JSON value.
    ///
    /// Arrays and objects infer to the unchecked `list` and `dict` kinds and
    /// null infers to `any`.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => TypeToken::Any,
            Value::Bool(_) => TypeToken::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => TypeToken::Int,
            Value::Number(_) => TypeToken::Float,
            Value::String(_) => TypeToken::Str,
            Value::Array(_) => TypeToken::List,
            Value::Object(_) => TypeToken::Dict,
        }
    }

    fn parse(raw: &str) -> SchemaResult<Self> {
        let token = raw.trim().to_ascii_lowercase();
        let parsed = match token.as_str() {
            "int" => TypeToken::Int,
            "float" => TypeToken::Float,
            "str" | "string" => TypeToken::Str,
            "bool" | "boolean" => TypeToken::Bool,
            "any" | "json" => TypeToken::Any,
            "list" => TypeToken::List,
            "dict" => TypeToken::Dict,
            _ => {
                if let Some(inner) = generic_argument(&token, "list") {
                    TypeToken::ListOf(Box::new(Self::parse(inner)?))
                } else if let Some(inner) = generic_argument(&token, "dict") {
                    let (key, value) = split_pair(inner)?;
                    TypeToken::DictOf(Box::new(Self::parse(key)?), Box::new(Self::parse(value)?))
                } else {
                    return Err(SchemaError::UnsupportedType(raw.trim().to_owned()));
                }
            }
        };
        Ok(parsed)
    }
}

impl FromStr for TypeToken {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TypeToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Returns `inner` for tokens shaped like `name[inner]`.
fn generic_argument<'a>(token: &'a str, name: &str) -> Option<&'a str> {
    token
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('[')?
        .strip_suffix(']')
}

/// Splits `K, V` at the single top-level comma, ignoring commas nested in brackets.
fn split_pair(spec: &str) -> SchemaResult<(&str, &str)> {
    let mut depth = 0usize;
    let mut splits = Vec::new();
    let mut start = 0;

    for (i, c) in spec.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                splits.push(spec[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    splits.push(spec[start..].trim());

    match splits.as_slice() {
        [key, value] if !key.is_empty() && !value.is_empty() => Ok((*key, *value)),
        _ => Err(SchemaError::InvalidDictSpec(format!("dict[{spec}]"))),
    }
}

/// Human-readable name of a JSON value's kind, used in violation messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_scalar_aliases() {
        assert_eq!("int".parse::<TypeToken>(), Ok(TypeToken::Int));
        assert_eq!(" String ".parse::<TypeToken>(), Ok(TypeToken::Str));
        assert_eq!("BOOLEAN".parse::<TypeToken>(), Ok(TypeToken::Bool));
        assert_eq!("json".parse::<TypeToken>(), Ok(TypeToken::Any));
    }

    #[test]
    fn parses_nested_generics() {
        let token: TypeToken = "list[dict[str, list[int]]]".parse().unwrap();
        assert_eq!(
            token,
            TypeToken::ListOf(Box::new(TypeToken::DictOf(
                Box::new(TypeToken::Str),
                Box::new(TypeToken::ListOf(Box::new(TypeToken::Int))),
            )))
        );
        assert_eq!(token.to_string(), "list[dict[str, list[int]]]");
    }

    #[test]
    fn rejects_unknown_and_malformed_tokens() {
        assert_eq!(
            "set[int]".parse::<TypeToken>(),
            Err(SchemaError::UnsupportedType("set[int]".into()))
        );
        assert!(matches!(
            "dict[str]".parse::<TypeToken>(),
            Err(SchemaError::InvalidDictSpec(_))
        ));
        assert!(matches!(
            "dict[str, int, bool]".parse::<TypeToken>(),
            Err(SchemaError::InvalidDictSpec(_))
        ));
        assert!("list[int".parse::<TypeToken>().is_err());
    }

    #[test]
    fn serde_uses_token_text() {
        let token: TypeToken = serde_json::from_value(json!("dict[str, float]")).unwrap();
        assert_eq!(serde_json::to_value(&token).unwrap(), json!("dict[str, float]"));
        assert!(serde_json::from_value::<TypeToken>(json!("tuple")).is_err());
    }

    #[test]
    fn infers_tokens_from_values() {
        assert_eq!(TypeToken::infer(&json!(3)), TypeToken::Int);
        assert_eq!(TypeToken::infer(&json!(3.5)), TypeToken::Float);
        assert_eq!(TypeToken::infer(&json!("x")), TypeToken::Str);
        assert_eq!(TypeToken::infer(&json!([1])), TypeToken::List);
        assert_eq!(TypeToken::infer(&json!({"a": 1})), TypeToken::Dict);
        assert_eq!(TypeToken::infer(&json!(null)), TypeToken::Any);
    }
}
