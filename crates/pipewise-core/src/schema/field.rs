//! Declarative field maps.

use std::fmt;

use derive_more::Deref;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::TypeToken;
use crate::error::{SchemaError, SchemaResult};

/// A single named, typed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Field name, unique within its schema.
    pub name: String,
    /// Declared type.
    pub ty: TypeToken,
}

impl FieldSchema {
    /// Creates a new field.
    pub fn new(name: impl Into<String>, ty: TypeToken) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Ordered field map, `{name -> type token}`.
///
/// The JSON form is an object whose values are type-token strings, e.g.
/// `{"text": "str", "score": "float"}`. Declaration order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a schema declaring exactly one field.
    pub fn single(name: impl Into<String>, ty: TypeToken) -> Self {
        Self {
            fields: vec![FieldSchema::new(name, ty)],
        }
    }

    pub(super) fn from_unique_fields(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    /// Builds a schema from `(name, token)` pairs, parsing each token.
    pub fn try_from_pairs<I, K, T>(pairs: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: AsRef<str>,
    {
        let mut schema = Self::new();
        for (name, token) in pairs {
            schema.insert(FieldSchema::new(name, token.as_ref().parse()?))?;
        }
        Ok(schema)
    }

    /// Reads a schema from a JSON object of type tokens.
    pub fn from_value(value: &Value) -> SchemaResult<Self> {
        let Value::Object(map) = value else {
            return Err(SchemaError::InvalidSchema(
                "expected an object of field names to type tokens".into(),
            ));
        };

        let mut schema = Self::new();
        for (name, token) in map {
            let Value::String(token) = token else {
                return Err(SchemaError::InvalidSchema(format!(
                    "type of field `{name}` must be a string"
                )));
            };
            schema.insert(FieldSchema::new(name.clone(), token.parse()?))?;
        }
        Ok(schema)
    }

    /// Appends a field, rejecting duplicate names.
    pub fn insert(&mut self, field: FieldSchema) -> SchemaResult<()> {
        if self.contains(&field.name) {
            return Err(SchemaError::DuplicateField(field.name));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Appends a field and returns the schema.
    pub fn with_field(mut self, name: impl Into<String>, ty: TypeToken) -> SchemaResult<Self> {
        self.insert(FieldSchema::new(name, ty))?;
        Ok(self)
    }

    /// Returns the declared type of a field.
    pub fn get(&self, name: &str) -> Option<&TypeToken> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.ty)
    }

    /// Returns whether a field with this name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the JSON form of this schema.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), Value::String(f.ty.to_string())))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.ty)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to type tokens")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
                let mut schema = Schema::new();
                while let Some((name, ty)) = access.next_entry::<String, TypeToken>()? {
                    schema
                        .insert(FieldSchema::new(name, ty))
                        .map_err(de::Error::custom)?;
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}
