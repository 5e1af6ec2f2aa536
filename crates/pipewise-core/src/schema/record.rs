//! Synthesized record types and their validated instances.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::validate::validate_record;
use super::{FieldSchema, Schema, TypeToken};
use crate::TRACING_TARGET_SCHEMA;
use crate::error::{SchemaResult, ValidationError};

/// A structural record type synthesized at runtime from a [`Schema`].
///
/// Cloning is cheap. Equality is structural: two record types are equal when
/// they declare the same fields with the same types, whatever their names
/// and declaration order.
#[derive(Clone)]
pub struct RecordType {
    inner: Arc<RecordTypeInner>,
}

struct RecordTypeInner {
    name: String,
    schema: Schema,
}

impl RecordType {
    /// Synthesizes a record type exposing exactly the fields of `schema`.
    pub fn synthesize(name: impl Into<String>, schema: &Schema) -> Self {
        let name = name.into();
        tracing::trace!(
            target: TRACING_TARGET_SCHEMA,
            record = %name,
            fields = schema.len(),
            "synthesized record type"
        );

        Self {
            inner: Arc::new(RecordTypeInner {
                name,
                schema: schema.clone(),
            }),
        }
    }

    /// Creates a record type without fields.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::synthesize(name, &Schema::new())
    }

    /// Synthesizes a record type from sample values, one field per entry.
    ///
    /// See [`TypeToken::infer`] for how each value's type is chosen.
    pub fn infer(name: impl Into<String>, values: &Map<String, Value>) -> Self {
        // Object keys are unique, so the inferred fields are too.
        let schema = Schema::from_unique_fields(
            values
                .iter()
                .map(|(key, value)| FieldSchema::new(key.clone(), TypeToken::infer(value)))
                .collect(),
        );
        Self::synthesize(name, &schema)
    }

    /// Synthesizes a record type from named record instances.
    ///
    /// Each entry becomes a field of type [`TypeToken::Record`] carrying the
    /// instance's own record type. Used to type the outputs of predecessor
    /// nodes keyed by their node id.
    pub fn from_instances<'a, I>(name: impl Into<String>, instances: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a RecordInstance)>,
    {
        let mut schema = Schema::new();
        for (key, instance) in instances {
            schema.insert(FieldSchema::new(
                key,
                TypeToken::Record(instance.record_type().clone()),
            ))?;
        }
        Ok(Self::synthesize(name, &schema))
    }

    /// Returns the record type's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the declared fields.
    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Returns the declared type of a field.
    pub fn field(&self, name: &str) -> Option<&TypeToken> {
        self.inner.schema.get(name)
    }

    /// Validates a JSON value, returning an instance holding exactly the
    /// declared fields.
    pub fn validate(&self, value: &Value) -> Result<RecordInstance, ValidationError> {
        match validate_record(self.schema(), value) {
            Ok(values) => Ok(RecordInstance {
                record_type: self.clone(),
                values,
            }),
            Err(violations) => Err(ValidationError {
                record: self.name().to_owned(),
                violations,
            }),
        }
    }

    /// Validates a JSON mapping.
    pub fn validate_map(&self, map: &Map<String, Value>) -> Result<RecordInstance, ValidationError> {
        self.validate(&Value::Object(map.clone()))
    }

    /// Revalidates an existing instance against this type.
    pub fn revalidate(&self, instance: &RecordInstance) -> Result<RecordInstance, ValidationError> {
        self.validate(&instance.dump())
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        let (ours, theirs) = (self.schema(), other.schema());
        ours.len() == theirs.len()
            && ours.iter().all(|field| theirs.get(&field.name) == Some(&field.ty))
    }
}

impl Eq for RecordType {}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.schema)
            .finish()
    }
}

/// A value that passed validation against a [`RecordType`].
///
/// Only [`RecordType::validate`] and friends create instances, so an instance
/// always holds exactly the declared fields of its type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordInstance {
    record_type: RecordType,
    values: Map<String, Value>,
}

impl RecordInstance {
    /// Returns the type this instance was validated against.
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// Returns a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Returns the validated values.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Dumps the instance to a JSON mapping.
    pub fn dump(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Consumes the instance, returning its JSON mapping.
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    /// Deserializes the instance into a typed structure.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.dump())
    }
}

impl Serialize for RecordInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
