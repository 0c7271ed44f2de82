//! # Core Type Definitions
//!
//! This module contains all core types for the Quadrille mapping layer:
//! - Entity identity and store identifiers (`EntityId`, `Uid`)
//! - Scalar field values (`Value`)
//! - Assertion statements (`Subject`, `Object`, `Statement`)
//! - Error types (`QuadrilleError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module implement `Ord` where they key a `BTreeMap` or
//! `BTreeSet`, so every traversal in the crate iterates in a stable order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ENTITY IDENTITY & STORE IDENTIFIERS
// =============================================================================

/// Identity of an entity inside one `EntityGraph`.
///
/// This is an arena index, never reused within a graph. Every visited-set in
/// the crate is keyed by `EntityId`, not by store identifier, because a
/// never-yet-persisted entity has no store identifier to key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Identifier assigned to a persisted entity by the data store (e.g. `0x2a`).
///
/// Absent on an entity until the store has assigned one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Uid(pub String);

impl Uid {
    /// Create a new uid from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the uid as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// SCALAR VALUES
// =============================================================================

/// A scalar field value.
///
/// Floats are stored, never computed with. `Value` mirrors the scalar subset
/// of JSON; structured JSON (objects, arrays) belongs to relationship fields
/// and is rejected for scalar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A string value.
    Str(String),
    /// A signed integer value.
    Int(i64),
    /// A floating point value (storage only).
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// An explicit null.
    Null,
}

impl Value {
    /// Convert a JSON value into a scalar `Value`.
    ///
    /// Returns `None` for structured JSON (objects and arrays), which is
    /// never a valid scalar.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::String(s) => Some(Self::Str(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else {
                    n.as_f64().map(Self::Float)
                }
            }
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Null => Some(Self::Null),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => None,
        }
    }

    /// Convert back into a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Null => serde_json::Value::Null,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// =============================================================================
// ASSERTION STATEMENTS
// =============================================================================

/// Subject token of an assertion statement.
///
/// Persisted entities use their store uid; entities not yet persisted get a
/// blank-node label. The tagged enum keeps the two distinguishable in memory;
/// the text encoding renders blanks with the reserved `_:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    /// A persisted entity, addressed by its store uid.
    Node(Uid),
    /// A temporary blank-node label for a not-yet-persisted entity.
    Blank(String),
}

/// Object term of an assertion statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    /// A scalar literal.
    Literal(Value),
    /// A reference to another entity.
    Subject(Subject),
}

/// One assertion to be submitted to the store.
///
/// `facet` qualifies the predicate with an edge-attribute name: the statement
/// then asserts an attribute of the (subject, predicate, target) edge rather
/// than a fact about the subject itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// The subject the fact is about.
    pub subject: Subject,
    /// The predicate (field) name.
    pub predicate: String,
    /// Optional edge-attribute qualifier.
    pub facet: Option<String>,
    /// The asserted object.
    pub object: Object,
}

impl Statement {
    /// Create a plain (unqualified) statement.
    #[must_use]
    pub fn new(subject: Subject, predicate: impl Into<String>, object: Object) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            facet: None,
            object,
        }
    }

    /// Create an edge-qualified statement carrying a facet value.
    #[must_use]
    pub fn faceted(
        subject: Subject,
        predicate: impl Into<String>,
        facet: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            facet: Some(facet.into()),
            object: Object::Literal(value),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the Quadrille mapping layer.
///
/// These are programming or data-shape errors, never transient failures:
/// nothing in this crate retries, and an operation that errors abandons its
/// whole result rather than returning a partial graph or statement list.
#[derive(Debug, Error)]
pub enum QuadrilleError {
    /// The entity type has no entry in the schema registry.
    #[error("type not registered: {0}")]
    UnregisteredType(String),

    /// A field name is neither a registered scalar nor a registered relation
    /// of the type it was used on.
    #[error("unknown field '{field}' on type '{type_name}'")]
    UnknownField {
        /// The entity type the field was used on.
        type_name: String,
        /// The offending field name.
        field: String,
    },

    /// Raw input shape disagrees with the registered fields.
    #[error("schema mismatch on '{type_name}.{field}': {reason}")]
    SchemaMismatch {
        /// The entity type being instantiated or mutated.
        type_name: String,
        /// The field whose shape disagreed.
        field: String,
        /// What was expected vs. found.
        reason: String,
    },

    /// The referenced entity does not exist in the graph arena.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_from_json_scalars() {
        assert_eq!(
            Value::from_json(&serde_json::json!("hi")),
            Some(Value::Str("hi".to_string()))
        );
        assert_eq!(Value::from_json(&serde_json::json!(7)), Some(Value::Int(7)));
        assert_eq!(
            Value::from_json(&serde_json::json!(true)),
            Some(Value::Bool(true))
        );
        assert_eq!(
            Value::from_json(&serde_json::Value::Null),
            Some(Value::Null)
        );
    }

    #[test]
    fn value_from_json_rejects_structured() {
        assert_eq!(Value::from_json(&serde_json::json!({})), None);
        assert_eq!(Value::from_json(&serde_json::json!([1, 2])), None);
    }

    #[test]
    fn value_json_round_trip() {
        let values = vec![
            Value::Str("x".to_string()),
            Value::Int(-3),
            Value::Bool(false),
            Value::Null,
        ];
        for v in values {
            assert_eq!(Value::from_json(&v.to_json()), Some(v));
        }
    }

    #[test]
    fn subject_variants_are_distinguishable() {
        let persisted = Subject::Node(Uid::new("0x1"));
        let blank = Subject::Blank("e1".to_string());
        assert_ne!(persisted, blank);
    }
}
