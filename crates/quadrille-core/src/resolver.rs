//! # Graph Resolver
//!
//! Merges a flat or nested record stream into one logical graph keyed by
//! identifier, then instantiates typed entities from it.
//!
//! Resolution runs in four passes:
//! 1. **Scan** — every record carrying the reserved identifier key is folded
//!    into the resource cache (field-level merge, later occurrences win).
//! 2. **Expand** — cached fields are merged back into every occurrence of
//!    the identifier, cycle-guarded per `(parent, field, child)` edge.
//! 3. **Instantiate** — entities are created per the schema registry, one
//!    per identifier, with facet keys on child records attached to the
//!    incoming edge.
//! 4. **Rebaseline** — changelogs are reset so a fresh load compiles to an
//!    empty statement list.

use crate::graph::EntityGraph;
use crate::schema::RelationSchema;
use crate::{EntityId, QuadrilleError, Uid, Value};
use serde_json::Value as Json;
use std::collections::{BTreeMap, BTreeSet};

type JsonMap = serde_json::Map<String, Json>;

/// Edge key for the expand cycle guard: parent uid, field name, child uid.
///
/// Keyed per edge rather than per node so diamonds still expand every
/// distinct path once, while cycles terminate.
type EdgeKey = (String, String, String);

/// The Resolver turns raw record streams into typed entities.
pub struct Resolver;

impl Resolver {
    /// Resolve `raw` (a single record or an array of records of
    /// `entry_type`) into entities in `graph`.
    ///
    /// Returns the roots in input order. Records sharing an identifier
    /// resolve to one entity. Empty input yields an empty root list.
    ///
    /// # Errors
    ///
    /// `SchemaMismatch` if the input shape disagrees with the registered
    /// fields; the whole resolution is abandoned and the caller should
    /// discard the graph rather than use a partial result.
    pub fn resolve(
        graph: &mut EntityGraph,
        entry_type: &str,
        raw: &Json,
    ) -> Result<Vec<EntityId>, QuadrilleError> {
        let roots = Self::adopt(graph, entry_type, raw)?;
        for root in &roots {
            graph.clear_changelog_recursive(*root)?;
        }
        Ok(roots)
    }

    /// Like [`Resolver::resolve`], but without the final rebaseline: the
    /// instantiated entities are treated as host-constructed, so every field
    /// stays recorded as dirty and compiles into assertions.
    ///
    /// This is the path for submitting externally produced records as new
    /// data rather than loading them as the persisted baseline.
    pub fn adopt(
        graph: &mut EntityGraph,
        entry_type: &str,
        raw: &Json,
    ) -> Result<Vec<EntityId>, QuadrilleError> {
        let _ = graph.registry().get(entry_type)?;
        let uid_key = graph.registry().uid_key().to_string();

        let mut records: Vec<Json> = match raw {
            Json::Array(items) => items.clone(),
            Json::Null => Vec::new(),
            other => vec![other.clone()],
        };

        let mut cache: BTreeMap<String, JsonMap> = BTreeMap::new();
        for record in &records {
            Self::scan(&uid_key, record, &mut cache);
        }

        if !cache.is_empty() {
            let mut visited: BTreeSet<EdgeKey> = BTreeSet::new();
            for record in &mut records {
                if let Json::Object(map) = record {
                    Self::expand(&uid_key, &cache, &mut visited, map);
                }
            }
        }

        let mut by_uid: BTreeMap<String, EntityId> = BTreeMap::new();
        let mut roots = Vec::with_capacity(records.len());
        for record in &records {
            let Json::Object(map) = record else {
                return Err(QuadrilleError::SchemaMismatch {
                    type_name: entry_type.to_string(),
                    field: "$".to_string(),
                    reason: "expected a record or an array of records".to_string(),
                });
            };
            roots.push(Self::instantiate(graph, &uid_key, &mut by_uid, entry_type, map)?);
        }
        Ok(roots)
    }

    /// Fold every identified record reachable in `value` into the cache.
    ///
    /// Field-level merge: a later occurrence of the same identifier
    /// overwrites the fields it carries and leaves the rest.
    fn scan(uid_key: &str, value: &Json, cache: &mut BTreeMap<String, JsonMap>) {
        match value {
            Json::Object(map) => {
                if let Some(uid) = map.get(uid_key).and_then(Json::as_str) {
                    let entry = cache.entry(uid.to_string()).or_default();
                    for (field, field_value) in map {
                        entry.insert(field.clone(), field_value.clone());
                    }
                }
                for field_value in map.values() {
                    Self::scan(uid_key, field_value, cache);
                }
            }
            Json::Array(items) => {
                for item in items {
                    Self::scan(uid_key, item, cache);
                }
            }
            _ => {}
        }
    }

    /// Merge cached fields into `map` (cache wins) and recurse into child
    /// records, expanding each `(parent, field, child)` edge at most once.
    fn expand(
        uid_key: &str,
        cache: &BTreeMap<String, JsonMap>,
        visited: &mut BTreeSet<EdgeKey>,
        map: &mut JsonMap,
    ) {
        let self_uid = map
            .get(uid_key)
            .and_then(Json::as_str)
            .unwrap_or_default()
            .to_string();

        if let Some(full) = cache.get(&self_uid) {
            for (field, field_value) in full {
                map.insert(field.clone(), field_value.clone());
            }
        }

        for (field, field_value) in map.iter_mut() {
            match field_value {
                Json::Array(children) => {
                    for child in children.iter_mut() {
                        if let Json::Object(child_map) = child {
                            Self::expand_child(uid_key, cache, visited, &self_uid, field, child_map);
                        }
                    }
                }
                Json::Object(child_map) => {
                    Self::expand_child(uid_key, cache, visited, &self_uid, field, child_map);
                }
                _ => {}
            }
        }
    }

    fn expand_child(
        uid_key: &str,
        cache: &BTreeMap<String, JsonMap>,
        visited: &mut BTreeSet<EdgeKey>,
        parent_uid: &str,
        field: &str,
        child: &mut JsonMap,
    ) {
        let child_uid = child
            .get(uid_key)
            .and_then(Json::as_str)
            .unwrap_or_default()
            .to_string();
        let key = (parent_uid.to_string(), field.to_string(), child_uid);
        if visited.insert(key) {
            Self::expand(uid_key, cache, visited, child);
        }
    }

    /// Create (or reuse) the entity for one expanded record and fill its
    /// fields per the registry.
    fn instantiate(
        graph: &mut EntityGraph,
        uid_key: &str,
        by_uid: &mut BTreeMap<String, EntityId>,
        type_name: &str,
        map: &JsonMap,
    ) -> Result<EntityId, QuadrilleError> {
        let uid = map.get(uid_key).and_then(Json::as_str);
        if let Some(uid) = uid {
            if let Some(id) = by_uid.get(uid) {
                return Ok(*id);
            }
        }

        let id = graph.insert(type_name)?;
        if let Some(uid) = uid {
            // Registered before the field walk so a cyclic reference back to
            // this record resolves to the same entity.
            graph.set_uid(id, Uid::new(uid))?;
            by_uid.insert(uid.to_string(), id);
        }

        let schema = graph.registry().get(type_name)?.clone();
        for (field, field_value) in map {
            if field == uid_key {
                continue;
            }
            if schema.is_scalar(field) {
                let Some(value) = Value::from_json(field_value) else {
                    return Err(QuadrilleError::SchemaMismatch {
                        type_name: type_name.to_string(),
                        field: field.clone(),
                        reason: "scalar field holds structured data".to_string(),
                    });
                };
                graph.set_scalar(id, field, value)?;
            } else if let Some(relation) = schema.relation_named(field).cloned() {
                match field_value {
                    Json::Null => {}
                    Json::Object(child) => {
                        Self::link_child(graph, uid_key, by_uid, &relation, id, field, child)?;
                    }
                    Json::Array(children) => {
                        for child in children {
                            let Json::Object(child_map) = child else {
                                return Err(QuadrilleError::SchemaMismatch {
                                    type_name: type_name.to_string(),
                                    field: field.clone(),
                                    reason: "relationship array holds non-record data".to_string(),
                                });
                            };
                            Self::link_child(
                                graph, uid_key, by_uid, &relation, id, field, child_map,
                            )?;
                        }
                    }
                    _ => {
                        return Err(QuadrilleError::SchemaMismatch {
                            type_name: type_name.to_string(),
                            field: field.clone(),
                            reason: "relationship field holds scalar data".to_string(),
                        });
                    }
                }
            }
            // Unknown keys (bookkeeping and facet-bearing keys among them)
            // are ignored: query payloads routinely carry extras.
        }
        Ok(id)
    }

    /// Instantiate a child record and attach it, with any facet keys the
    /// child carries for the incoming edge.
    fn link_child(
        graph: &mut EntityGraph,
        uid_key: &str,
        by_uid: &mut BTreeMap<String, EntityId>,
        relation: &RelationSchema,
        owner: EntityId,
        field: &str,
        child: &JsonMap,
    ) -> Result<(), QuadrilleError> {
        let target = Self::instantiate(graph, uid_key, by_uid, relation.target(), child)?;

        let mut facets = BTreeMap::new();
        for facet in relation.facets() {
            let key = format!("{field}|{facet}");
            if let Some(raw) = child.get(&key) {
                let Some(value) = Value::from_json(raw) else {
                    return Err(QuadrilleError::SchemaMismatch {
                        type_name: relation.target().to_string(),
                        field: key,
                        reason: "facet value holds structured data".to_string(),
                    });
                };
                facets.insert(facet.clone(), value);
            }
        }

        graph.add_related(owner, field, target, facets)
    }
}

// =============================================================================
// TESTS
// =============================================================================
