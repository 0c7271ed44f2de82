//! # Schema Registry
//!
//! Explicit, registration-time field metadata for every mappable entity type.
//!
//! The registry is built once during process setup and treated as read-only
//! afterwards. The resolver and the mutation compiler reach it through the
//! `EntityGraph` that holds it; nothing in this crate mutates a registry
//! after construction.

use crate::QuadrilleError;
use std::collections::BTreeMap;

/// Reserved raw-input key carrying a record's store identifier.
pub const DEFAULT_UID_KEY: &str = "uid";

// =============================================================================
// FIELD DEFINITIONS
// =============================================================================

/// Definition of one relationship field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSchema {
    name: String,
    target: String,
    many: bool,
    facets: Vec<String>,
}

impl RelationSchema {
    /// Define a single-valued relation `name` pointing at entity type
    /// `target`.
    #[must_use]
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            many: false,
            facets: Vec::new(),
        }
    }

    /// Mark the relation as multi-valued.
    #[must_use]
    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    /// Declare an edge-attribute (facet) field on this relation.
    #[must_use]
    pub fn facet(mut self, name: impl Into<String>) -> Self {
        self.facets.push(name.into());
        self
    }

    /// The relation field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The target entity type.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether the relation holds more than one target.
    #[must_use]
    pub fn is_many(&self) -> bool {
        self.many
    }

    /// Declared facet field names.
    #[must_use]
    pub fn facets(&self) -> &[String] {
        &self.facets
    }

    /// Whether `name` is a declared facet field of this relation.
    #[must_use]
    pub fn has_facet(&self, name: &str) -> bool {
        self.facets.iter().any(|f| f == name)
    }
}

// =============================================================================
// NODE SCHEMA
// =============================================================================

/// Field metadata for one entity type: its scalar fields and its relations.
///
/// Built fluently:
///
/// ```
/// use quadrille_core::schema::{NodeSchema, RelationSchema};
///
/// let person = NodeSchema::new("Person")
///     .scalar("name")
///     .relation(RelationSchema::new("friends", "Person").many().facet("familiarity"));
/// assert!(person.is_scalar("name"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSchema {
    name: String,
    scalars: Vec<String>,
    relations: Vec<RelationSchema>,
}

impl NodeSchema {
    /// Start a schema for entity type `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scalars: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Declare a scalar field.
    #[must_use]
    pub fn scalar(mut self, name: impl Into<String>) -> Self {
        self.scalars.push(name.into());
        self
    }

    /// Declare a relationship field.
    #[must_use]
    pub fn relation(mut self, relation: RelationSchema) -> Self {
        self.relations.push(relation);
        self
    }

    /// The entity type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `field` is a registered scalar field.
    #[must_use]
    pub fn is_scalar(&self, field: &str) -> bool {
        self.scalars.iter().any(|s| s == field)
    }

    /// Look up a relationship field by name.
    #[must_use]
    pub fn relation_named(&self, field: &str) -> Option<&RelationSchema> {
        self.relations.iter().find(|r| r.name() == field)
    }

    /// All relationship fields, in declaration order.
    #[must_use]
    pub fn relations(&self) -> &[RelationSchema] {
        &self.relations
    }

    /// All scalar fields, in declaration order.
    #[must_use]
    pub fn scalars(&self) -> &[String] {
        &self.scalars
    }
}

// =============================================================================
// SCHEMA REGISTRY
// =============================================================================

/// The registry of every mappable entity type.
///
/// Replaces runtime reflection with an explicit registration call per type.
/// The reserved identifier key applies to the whole registry because raw
/// records are scanned for identifiers before their types are known.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: BTreeMap<String, NodeSchema>,
    uid_key: Option<String>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the reserved identifier key (default `uid`).
    #[must_use]
    pub fn with_uid_key(mut self, key: impl Into<String>) -> Self {
        self.uid_key = Some(key.into());
        self
    }

    /// Register an entity type. Re-registering a name replaces the previous
    /// schema.
    #[must_use]
    pub fn register(mut self, schema: NodeSchema) -> Self {
        self.types.insert(schema.name().to_string(), schema);
        self
    }

    /// The reserved raw-input key carrying a record's identifier.
    #[must_use]
    pub fn uid_key(&self) -> &str {
        self.uid_key.as_deref().unwrap_or(DEFAULT_UID_KEY)
    }

    /// Look up a type's schema.
    ///
    /// Returns `QuadrilleError::UnregisteredType` if the type was never
    /// registered.
    pub fn get(&self, type_name: &str) -> Result<&NodeSchema, QuadrilleError> {
        self.types
            .get(type_name)
            .ok_or_else(|| QuadrilleError::UnregisteredType(type_name.to_string()))
    }

    /// Whether a type is registered.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }
}

// =============================================================================
// TESTS
// =============================================================================
