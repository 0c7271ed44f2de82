//! # Entity Graph
//!
//! The arena holding every typed entity of one mapping session.
//!
//! Entity graphs are cyclic and freely aliased: relationship collections
//! store `EntityId`s, never owned children, so two entities may reference
//! each other and any number of paths may reach the same node. Every
//! recursive walk in this crate is therefore guarded by an identity-keyed
//! visited-set over `EntityId`.
//!
//! All external writes go through the mutator methods on `EntityGraph`. This
//! is the field-interception mechanism: each mutator records the write in the
//! entity's `Changelog` before applying it, which is what guarantees the
//! changelog is complete.

use crate::changelog::Changelog;
use crate::schema::SchemaRegistry;
use crate::{EntityId, QuadrilleError, Uid, Value};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// RELATION SET
// =============================================================================

/// The ordered target set of one relationship field on one owning entity,
/// with per-edge facet bags.
///
/// Invariant: a target appears at most once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelationSet {
    members: Vec<EntityId>,
    facets: BTreeMap<EntityId, BTreeMap<String, Value>>,
}

impl RelationSet {
    /// Whether `target` is a member.
    #[must_use]
    pub fn contains(&self, target: EntityId) -> bool {
        self.members.contains(&target)
    }

    /// Add a member. Returns `false` (and changes nothing) if already
    /// present.
    fn add(&mut self, target: EntityId, facets: BTreeMap<String, Value>) -> bool {
        if self.contains(target) {
            return false;
        }
        self.members.push(target);
        if !facets.is_empty() {
            self.facets.insert(target, facets);
        }
        true
    }

    /// Remove a member. Returns `false` if it was not present.
    fn remove(&mut self, target: EntityId) -> bool {
        let Some(pos) = self.members.iter().position(|m| *m == target) else {
            return false;
        };
        self.members.remove(pos);
        self.facets.remove(&target);
        true
    }

    /// Members in insertion order.
    #[must_use]
    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    /// Facet values of the edge to `target`, if any were recorded.
    #[must_use]
    pub fn facets_of(&self, target: EntityId) -> Option<&BTreeMap<String, Value>> {
        self.facets.get(&target)
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// One typed entity in the arena.
#[derive(Debug, Clone)]
pub struct Entity {
    type_name: String,
    uid: Option<Uid>,
    scalars: BTreeMap<String, Value>,
    relations: BTreeMap<String, RelationSet>,
    changelog: Changelog,
}

impl Entity {
    fn new(type_name: String) -> Self {
        Self {
            type_name,
            uid: None,
            scalars: BTreeMap::new(),
            relations: BTreeMap::new(),
            changelog: Changelog::new(),
        }
    }

    /// The registered type of this entity.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The persisted store identifier, if assigned.
    #[must_use]
    pub fn uid(&self) -> Option<&Uid> {
        self.uid.as_ref()
    }

    /// Current value of a scalar field.
    #[must_use]
    pub fn scalar(&self, field: &str) -> Option<&Value> {
        self.scalars.get(field)
    }

    /// All scalar fields.
    #[must_use]
    pub fn scalars(&self) -> &BTreeMap<String, Value> {
        &self.scalars
    }

    /// The target set of a relationship field.
    #[must_use]
    pub fn relation(&self, field: &str) -> Option<&RelationSet> {
        self.relations.get(field)
    }

    /// All touched relationship fields.
    #[must_use]
    pub fn relations(&self) -> &BTreeMap<String, RelationSet> {
        &self.relations
    }

    /// This entity's change tracker.
    #[must_use]
    pub fn changelog(&self) -> &Changelog {
        &self.changelog
    }
}

// =============================================================================
// ENTITY GRAPH
// =============================================================================

/// The arena of entities plus the read-only schema registry they were
/// registered under.
///
/// Uses `BTreeMap` exclusively for deterministic iteration.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    registry: SchemaRegistry,
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
}

impl EntityGraph {
    /// Create an empty graph over the given registry.
    #[must_use]
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            entities: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// The schema registry this graph was built over.
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Number of entities in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    /// Look up an entity.
    pub fn entity(&self, id: EntityId) -> Result<&Entity, QuadrilleError> {
        self.entities
            .get(&id)
            .ok_or(QuadrilleError::EntityNotFound(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, QuadrilleError> {
        self.entities
            .get_mut(&id)
            .ok_or(QuadrilleError::EntityNotFound(id))
    }

    // -------------------------------------------------------------------------
    // MUTATORS (the field-interception surface)
    // -------------------------------------------------------------------------

    /// Create a fresh entity of a registered type.
    ///
    /// Fresh entities have no baseline: every write from here on is recorded
    /// and will be compiled.
    pub fn insert(&mut self, type_name: &str) -> Result<EntityId, QuadrilleError> {
        // Fails before allocating if the type was never registered.
        let _ = self.registry.get(type_name)?;

        let id = EntityId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entities.insert(id, Entity::new(type_name.to_string()));
        Ok(id)
    }

    /// Assign the persisted store identifier.
    pub fn set_uid(&mut self, id: EntityId, uid: Uid) -> Result<(), QuadrilleError> {
        self.entity_mut(id)?.uid = Some(uid);
        Ok(())
    }

    /// Write a scalar field.
    ///
    /// The write is logged unconditionally before it is applied: any write
    /// marks the field dirty, whether or not the value changed.
    pub fn set_scalar(
        &mut self,
        id: EntityId,
        field: &str,
        value: Value,
    ) -> Result<(), QuadrilleError> {
        let type_name = self.entity(id)?.type_name.clone();
        let schema = self.registry.get(&type_name)?;
        if !schema.is_scalar(field) {
            return Err(QuadrilleError::UnknownField {
                type_name,
                field: field.to_string(),
            });
        }

        let entity = self.entity_mut(id)?;
        entity.changelog.record_scalar(field, value.clone());
        entity.scalars.insert(field.to_string(), value);
        Ok(())
    }

    /// Add `target` to a relationship field, optionally with facet values
    /// for the new edge.
    ///
    /// Idempotent: adding a current member changes nothing. On a
    /// single-valued relation the current member, if different, is removed
    /// first (through the same changelog path as an explicit removal).
    pub fn add_related(
        &mut self,
        id: EntityId,
        field: &str,
        target: EntityId,
        facets: BTreeMap<String, Value>,
    ) -> Result<(), QuadrilleError> {
        let type_name = self.entity(id)?.type_name.clone();
        let relation = {
            let schema = self.registry.get(&type_name)?;
            schema
                .relation_named(field)
                .ok_or_else(|| QuadrilleError::UnknownField {
                    type_name: type_name.clone(),
                    field: field.to_string(),
                })?
                .clone()
        };

        let target_type = self.entity(target)?.type_name.clone();
        if target_type != relation.target() {
            return Err(QuadrilleError::SchemaMismatch {
                type_name,
                field: field.to_string(),
                reason: format!(
                    "relation targets '{}', got entity of type '{}'",
                    relation.target(),
                    target_type
                ),
            });
        }
        for facet in facets.keys() {
            if !relation.has_facet(facet) {
                return Err(QuadrilleError::UnknownField {
                    type_name,
                    field: format!("{field}|{facet}"),
                });
            }
        }

        // Single-valued relations hold at most one member.
        if !relation.is_many() {
            let current: Vec<EntityId> = self
                .entity(id)?
                .relations
                .get(field)
                .map(|set| set.members().to_vec())
                .unwrap_or_default();
            for member in current {
                if member != target {
                    self.remove_related(id, field, member)?;
                }
            }
        }

        let entity = self.entity_mut(id)?;
        let set = entity.relations.entry(field.to_string()).or_default();
        if set.add(target, facets.clone()) {
            entity.changelog.record_relation_add(field, target, facets);
        }
        Ok(())
    }

    /// Remove `target` from a relationship field.
    ///
    /// Removing a non-member changes nothing. A target that was pending
    /// addition is reconciled to a net no-op in the changelog.
    pub fn remove_related(
        &mut self,
        id: EntityId,
        field: &str,
        target: EntityId,
    ) -> Result<(), QuadrilleError> {
        let type_name = self.entity(id)?.type_name.clone();
        let schema = self.registry.get(&type_name)?;
        if schema.relation_named(field).is_none() {
            return Err(QuadrilleError::UnknownField {
                type_name,
                field: field.to_string(),
            });
        }

        let entity = self.entity_mut(id)?;
        let removed = entity
            .relations
            .get_mut(field)
            .is_some_and(|set| set.remove(target));
        if removed {
            entity.changelog.record_relation_remove(field, target);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // BASELINES
    // -------------------------------------------------------------------------

    /// Reset one entity's changelog to a clean baseline reflecting its
    /// current field values.
    pub fn clear_changelog(&mut self, id: EntityId) -> Result<(), QuadrilleError> {
        let entity = self.entity_mut(id)?;
        entity.changelog.clear();
        let snapshots: Vec<(String, Vec<EntityId>)> = entity
            .relations
            .iter()
            .map(|(field, set)| (field.clone(), set.members().to_vec()))
            .collect();
        for (field, members) in snapshots {
            entity.changelog.rebase_relation(field, members);
        }
        Ok(())
    }

    /// Reset the changelog of `id` and of every entity reachable from it
    /// through relationship fields. Cycle-guarded by entity identity.
    pub fn clear_changelog_recursive(&mut self, id: EntityId) -> Result<(), QuadrilleError> {
        let mut visited = BTreeSet::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            self.clear_changelog(current)?;
            for set in self.entity(current)?.relations.values() {
                stack.extend(set.members().iter().copied());
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NodeSchema, RelationSchema};

    fn person_graph() -> EntityGraph {
        let registry = SchemaRegistry::new().register(
            NodeSchema::new("Person")
                .scalar("name")
                .relation(RelationSchema::new("friends", "Person").many().facet("familiarity"))
                .relation(RelationSchema::new("spouse", "Person")),
        );
        EntityGraph::new(registry)
    }

    fn facet(value: i64) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("familiarity".to_string(), Value::Int(value));
        map
    }

    #[test]
    fn insert_unregistered_type_errors() {
        let mut graph = person_graph();
        assert!(matches!(
            graph.insert("Hobby"),
            Err(QuadrilleError::UnregisteredType(_))
        ));
        assert!(graph.is_empty());
    }

    #[test]
    fn scalar_write_is_recorded_and_applied() {
        let mut graph = person_graph();
        let alice = graph.insert("Person").expect("insert");

        graph
            .set_scalar(alice, "name", Value::from("Alice"))
            .expect("set");

        let entity = graph.entity(alice).expect("entity");
        assert_eq!(entity.scalar("name"), Some(&Value::from("Alice")));
        assert_eq!(
            entity.changelog().scalars().get("name"),
            Some(&Value::from("Alice"))
        );
    }

    #[test]
    fn unknown_scalar_field_errors() {
        let mut graph = person_graph();
        let alice = graph.insert("Person").expect("insert");

        assert!(matches!(
            graph.set_scalar(alice, "height", Value::Int(170)),
            Err(QuadrilleError::UnknownField { field, .. }) if field == "height"
        ));
    }

    #[test]
    fn add_related_is_idempotent() {
        let mut graph = person_graph();
        let a = graph.insert("Person").expect("insert");
        let b = graph.insert("Person").expect("insert");

        graph.add_related(a, "friends", b, BTreeMap::new()).expect("add");
        graph.add_related(a, "friends", b, BTreeMap::new()).expect("add");

        let entity = graph.entity(a).expect("entity");
        assert_eq!(entity.relation("friends").expect("set").members(), &[b]);
        assert_eq!(
            entity.changelog().relations()["friends"].added().len(),
            1
        );
    }

    #[test]
    fn add_then_remove_reconciles_to_clean() {
        let mut graph = person_graph();
        let a = graph.insert("Person").expect("insert");
        let b = graph.insert("Person").expect("insert");

        graph.add_related(a, "friends", b, BTreeMap::new()).expect("add");
        graph.remove_related(a, "friends", b).expect("remove");

        let entity = graph.entity(a).expect("entity");
        assert!(entity.relation("friends").expect("set").members().is_empty());
        assert!(entity.changelog().relations()["friends"].is_clean());
    }

    #[test]
    fn facets_attach_to_the_edge() {
        let mut graph = person_graph();
        let a = graph.insert("Person").expect("insert");
        let b = graph.insert("Person").expect("insert");

        graph.add_related(a, "friends", b, facet(42)).expect("add");

        let entity = graph.entity(a).expect("entity");
        let set = entity.relation("friends").expect("set");
        assert_eq!(
            set.facets_of(b).and_then(|f| f.get("familiarity")),
            Some(&Value::Int(42))
        );
    }

    #[test]
    fn undeclared_facet_errors() {
        let mut graph = person_graph();
        let a = graph.insert("Person").expect("insert");
        let b = graph.insert("Person").expect("insert");

        let mut facets = BTreeMap::new();
        facets.insert("since".to_string(), Value::Int(1999));
        assert!(matches!(
            graph.add_related(a, "friends", b, facets),
            Err(QuadrilleError::UnknownField { field, .. }) if field == "friends|since"
        ));
    }

    #[test]
    fn wrong_target_type_errors() {
        let registry = SchemaRegistry::new()
            .register(
                NodeSchema::new("Person")
                    .relation(RelationSchema::new("hobbies", "Hobby").many()),
            )
            .register(NodeSchema::new("Hobby").scalar("name"));
        let mut graph = EntityGraph::new(registry);
        let person = graph.insert("Person").expect("insert");
        let other = graph.insert("Person").expect("insert");

        assert!(matches!(
            graph.add_related(person, "hobbies", other, BTreeMap::new()),
            Err(QuadrilleError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn single_valued_relation_replaces() {
        let mut graph = person_graph();
        let a = graph.insert("Person").expect("insert");
        let b = graph.insert("Person").expect("insert");
        let c = graph.insert("Person").expect("insert");

        graph.add_related(a, "spouse", b, BTreeMap::new()).expect("add");
        graph.add_related(a, "spouse", c, BTreeMap::new()).expect("add");

        let entity = graph.entity(a).expect("entity");
        assert_eq!(entity.relation("spouse").expect("set").members(), &[c]);
    }

    #[test]
    fn clear_changelog_snapshots_membership() {
        let mut graph = person_graph();
        let a = graph.insert("Person").expect("insert");
        let b = graph.insert("Person").expect("insert");

        graph.add_related(a, "friends", b, BTreeMap::new()).expect("add");
        graph.clear_changelog(a).expect("clear");

        let entity = graph.entity(a).expect("entity");
        assert!(entity.changelog().is_clean());

        // Re-adding a baseline member after the snapshot stays clean.
        graph.add_related(a, "friends", b, BTreeMap::new()).expect("add");
        assert!(graph.entity(a).expect("entity").changelog().is_clean());
    }

    #[test]
    fn recursive_clear_survives_cycles() {
        let mut graph = person_graph();
        let a = graph.insert("Person").expect("insert");
        let b = graph.insert("Person").expect("insert");

        graph.add_related(a, "friends", b, BTreeMap::new()).expect("add");
        graph.add_related(b, "friends", a, BTreeMap::new()).expect("add");
        graph.set_scalar(a, "name", Value::from("A")).expect("set");
        graph.set_scalar(b, "name", Value::from("B")).expect("set");

        graph.clear_changelog_recursive(a).expect("clear");

        assert!(graph.entity(a).expect("entity").changelog().is_clean());
        assert!(graph.entity(b).expect("entity").changelog().is_clean());
    }
}
