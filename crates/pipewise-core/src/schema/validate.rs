//! Structural validation of JSON values against type tokens.

use serde_json::{Map, Number, Value};

use super::token::json_kind;
use super::{Schema, TypeToken};
use crate::error::{FieldViolation, ViolationKind};

/// Validates `value` as a record of `schema`.
///
/// Returns the normalized record (declared fields only, in declaration
/// order) or every violation found.
pub(crate) fn validate_record(
    schema: &Schema,
    value: &Value,
) -> Result<Map<String, Value>, Vec<FieldViolation>> {
    let mut violations = Vec::new();
    let record = check_record(schema, value, "", &mut violations);
    match record {
        Some(map) if violations.is_empty() => Ok(map),
        _ => Err(violations),
    }
}

fn check_record(
    schema: &Schema,
    value: &Value,
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Map<String, Value>> {
    let Value::Object(map) = value else {
        violations.push(FieldViolation::new(
            path,
            ViolationKind::NotAnObject {
                found: json_kind(value),
            },
        ));
        return None;
    };

    let mut record = Map::with_capacity(schema.len());
    let mut complete = true;
    for field in schema.iter() {
        let field_path = join(path, &field.name);
        let Some(field_value) = map.get(&field.name) else {
            violations.push(FieldViolation::new(field_path, ViolationKind::Missing));
            complete = false;
            continue;
        };
        match check_value(&field.ty, field_value, &field_path, violations) {
            Some(normalized) => {
                record.insert(field.name.clone(), normalized);
            }
            None => complete = false,
        }
    }

    complete.then_some(record)
}

fn check_value(
    token: &TypeToken,
    value: &Value,
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Value> {
    let normalized = match (token, value) {
        (TypeToken::Any, _) => Some(value.clone()),
        (TypeToken::Int, Value::Number(n)) => integral(n).map(Value::Number),
        (TypeToken::Float, Value::Number(_))
        | (TypeToken::Str, Value::String(_))
        | (TypeToken::Bool, Value::Bool(_))
        | (TypeToken::List, Value::Array(_))
        | (TypeToken::Dict, Value::Object(_)) => Some(value.clone()),
        (TypeToken::ListOf(inner), Value::Array(items)) => {
            return check_list(inner, items, path, violations);
        }
        (TypeToken::DictOf(key, inner), Value::Object(map)) => {
            return check_dict(key, inner, map, path, violations);
        }
        (TypeToken::Record(record), _) => {
            return check_record(record.schema(), value, path, violations).map(Value::Object);
        }
        _ => None,
    };

    if normalized.is_none() {
        let kind = match token {
            TypeToken::Dict | TypeToken::DictOf(..) => ViolationKind::NotAnObject {
                found: json_kind(value),
            },
            _ => ViolationKind::TypeMismatch {
                expected: token.to_string(),
                found: json_kind(value),
            },
        };
        violations.push(FieldViolation::new(path, kind));
    }
    normalized
}

fn check_list(
    inner: &TypeToken,
    items: &[Value],
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Value> {
    let checked: Vec<Option<Value>> = items
        .iter()
        .enumerate()
        .map(|(i, item)| check_value(inner, item, &format!("{path}[{i}]"), violations))
        .collect();
    checked
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

fn check_dict(
    key: &TypeToken,
    inner: &TypeToken,
    map: &Map<String, Value>,
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Value> {
    let mut checked = Map::with_capacity(map.len());
    let mut complete = true;
    for (name, item) in map {
        let item_path = join(path, name);
        if !key_matches(key, name) {
            violations.push(FieldViolation::new(
                item_path.clone(),
                ViolationKind::InvalidKey {
                    expected: key.to_string(),
                },
            ));
            complete = false;
        }
        match check_value(inner, item, &item_path, violations) {
            Some(normalized) => {
                checked.insert(name.clone(), normalized);
            }
            None => complete = false,
        }
    }
    complete.then_some(Value::Object(checked))
}

/// JSON object keys are always strings; scalar key types are read from them.
fn key_matches(key: &TypeToken, name: &str) -> bool {
    match key {
        TypeToken::Str | TypeToken::Any => true,
        TypeToken::Int => name.parse::<i64>().is_ok(),
        TypeToken::Float => name.parse::<f64>().is_ok(),
        TypeToken::Bool => matches!(name, "true" | "false"),
        _ => false,
    }
}

/// Accepts integers, and floats without a fractional part (normalized).
fn integral(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return Some(n.clone());
    }
    let f = n.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        return Some(Number::from(f as i64));
    }
    None
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_owned()
    } else {
        format!("{path}.{field}")
    }
}
