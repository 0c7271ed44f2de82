//! # Change Tracker
//!
//! Per-entity record of "what changed since baseline".
//!
//! The tracker is purely observational: it never rejects a write. A scalar
//! write is logged unconditionally (write-only semantics — any write counts
//! as a change, the old value is never consulted). Relationship fields keep
//! an ordered add/remove log against a baseline snapshot so idempotent
//! re-additions and add-then-remove sequences reconcile to nothing.

use crate::{EntityId, Value};
use std::collections::BTreeMap;

// =============================================================================
// RELATION CHANGELOG
// =============================================================================

/// One pending relationship addition, with the facet values recorded for the
/// new edge.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedEdge {
    /// The added target entity.
    pub target: EntityId,
    /// Edge-attribute values recorded alongside the addition.
    pub facets: BTreeMap<String, Value>,
}

/// Add/remove log for one multi-valued or single-valued relationship field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelationChangelog {
    baseline: Vec<EntityId>,
    added: Vec<AddedEdge>,
    removed: Vec<EntityId>,
}

impl RelationChangelog {
    /// Record an addition. Idempotent: a target already pending addition or
    /// already in the baseline is not logged again. Re-adding a member
    /// removed since the baseline cancels the pending removal; if the re-add
    /// carries facet values it is logged as a pending add so those values
    /// still compile.
    pub fn record_add(&mut self, target: EntityId, facets: BTreeMap<String, Value>) {
        if let Some(pos) = self.removed.iter().position(|r| *r == target) {
            self.removed.remove(pos);
            if !facets.is_empty() {
                self.added.push(AddedEdge { target, facets });
            }
            return;
        }
        if self.baseline.contains(&target) {
            return;
        }
        if self.added.iter().any(|e| e.target == target) {
            return;
        }
        self.added.push(AddedEdge { target, facets });
    }

    /// Record a removal. A target pending addition is dropped from the
    /// add-log; a baseline member is logged as removed. A faceted re-add of
    /// a baseline member hits both paths, so its removal reconciles back to
    /// a plain baseline removal.
    pub fn record_remove(&mut self, target: EntityId) {
        if let Some(pos) = self.added.iter().position(|e| e.target == target) {
            self.added.remove(pos);
        }
        if self.baseline.contains(&target) && !self.removed.contains(&target) {
            self.removed.push(target);
        }
    }

    /// Reset to a known baseline, discarding all pending adds and removes.
    pub fn rebase(&mut self, members: Vec<EntityId>) {
        self.baseline = members;
        self.added.clear();
        self.removed.clear();
    }

    /// Pending additions, in the order they were recorded.
    #[must_use]
    pub fn added(&self) -> &[AddedEdge] {
        &self.added
    }

    /// Pending removals, in the order they were recorded.
    #[must_use]
    pub fn removed(&self) -> &[EntityId] {
        &self.removed
    }

    /// Members at the last baseline snapshot.
    #[must_use]
    pub fn baseline(&self) -> &[EntityId] {
        &self.baseline
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

// =============================================================================
// CHANGELOG
// =============================================================================

/// The per-entity changelog: latest scalar writes plus one relation log per
/// touched relationship field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Changelog {
    scalars: BTreeMap<String, Value>,
    relations: BTreeMap<String, RelationChangelog>,
}

impl Changelog {
    /// Create an empty changelog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a scalar write. Unconditional: the latest value wins and the
    /// field counts as dirty even if the value is unchanged.
    pub fn record_scalar(&mut self, field: impl Into<String>, value: Value) {
        self.scalars.insert(field.into(), value);
    }

    /// Log a relationship addition on `field`.
    pub fn record_relation_add(
        &mut self,
        field: impl Into<String>,
        target: EntityId,
        facets: BTreeMap<String, Value>,
    ) {
        self.relations
            .entry(field.into())
            .or_default()
            .record_add(target, facets);
    }

    /// Log a relationship removal on `field`.
    pub fn record_relation_remove(&mut self, field: impl Into<String>, target: EntityId) {
        self.relations
            .entry(field.into())
            .or_default()
            .record_remove(target);
    }

    /// Reset `field`'s relation log to the given membership baseline.
    pub fn rebase_relation(&mut self, field: impl Into<String>, members: Vec<EntityId>) {
        self.relations
            .entry(field.into())
            .or_default()
            .rebase(members);
    }

    /// Discard every logged delta. Relation baselines are cleared too; the
    /// graph re-snapshots them right after (see `EntityGraph::clear_changelog`).
    pub fn clear(&mut self) {
        self.scalars.clear();
        self.relations.clear();
    }

    /// Logged scalar writes, keyed by field.
    #[must_use]
    pub fn scalars(&self) -> &BTreeMap<String, Value> {
        &self.scalars
    }

    /// Relation logs, keyed by field.
    #[must_use]
    pub fn relations(&self) -> &BTreeMap<String, RelationChangelog> {
        &self.relations
    }

    /// Whether the entity has no pending change at all.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.scalars.is_empty() && self.relations.values().all(RelationChangelog::is_clean)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_write_is_unconditional() {
        let mut log = Changelog::new();
        log.record_scalar("name", Value::from("Alice"));
        log.record_scalar("name", Value::from("Alice"));

        // Still exactly one dirty field, latest value wins.
        assert_eq!(log.scalars().len(), 1);
        assert_eq!(log.scalars().get("name"), Some(&Value::from("Alice")));
        assert!(!log.is_clean());
    }

    #[test]
    fn relation_add_is_idempotent() {
        let mut log = RelationChangelog::default();
        log.record_add(EntityId(1), BTreeMap::new());
        log.record_add(EntityId(1), BTreeMap::new());

        assert_eq!(log.added().len(), 1);
    }

    #[test]
    fn add_of_baseline_member_is_noop() {
        let mut log = RelationChangelog::default();
        log.rebase(vec![EntityId(1)]);
        log.record_add(EntityId(1), BTreeMap::new());

        assert!(log.is_clean());
    }

    #[test]
    fn add_then_remove_cancels() {
        let mut log = RelationChangelog::default();
        log.record_add(EntityId(7), BTreeMap::new());
        log.record_remove(EntityId(7));

        assert!(log.added().is_empty());
        assert!(log.removed().is_empty());
        assert!(log.is_clean());
    }

    #[test]
    fn remove_of_baseline_member_is_logged() {
        let mut log = RelationChangelog::default();
        log.rebase(vec![EntityId(3)]);
        log.record_remove(EntityId(3));

        assert_eq!(log.removed(), &[EntityId(3)]);
        assert!(!log.is_clean());
    }

    #[test]
    fn remove_of_stranger_is_noop() {
        let mut log = RelationChangelog::default();
        log.record_remove(EntityId(9));

        assert!(log.is_clean());
    }

    #[test]
    fn remove_then_re_add_restores_baseline() {
        let mut log = RelationChangelog::default();
        log.rebase(vec![EntityId(3)]);
        log.record_remove(EntityId(3));
        log.record_add(EntityId(3), BTreeMap::new());

        assert!(log.is_clean());
    }

    #[test]
    fn faceted_re_add_of_removed_member_is_logged() {
        let mut facets = BTreeMap::new();
        facets.insert("familiarity".to_string(), Value::from(42));

        let mut log = RelationChangelog::default();
        log.rebase(vec![EntityId(3)]);
        log.record_remove(EntityId(3));
        log.record_add(EntityId(3), facets.clone());

        assert!(log.removed().is_empty());
        assert_eq!(log.added().len(), 1);
        assert_eq!(log.added()[0].facets, facets);
        assert!(!log.is_clean());
    }

    #[test]
    fn removing_a_faceted_re_add_reconciles_to_a_baseline_removal() {
        let mut facets = BTreeMap::new();
        facets.insert("familiarity".to_string(), Value::from(42));

        let mut log = RelationChangelog::default();
        log.rebase(vec![EntityId(3)]);
        log.record_remove(EntityId(3));
        log.record_add(EntityId(3), facets);
        log.record_remove(EntityId(3));

        assert!(log.added().is_empty());
        assert_eq!(log.removed(), &[EntityId(3)]);
    }

    #[test]
    fn rebase_discards_pending_deltas() {
        let mut log = RelationChangelog::default();
        log.record_add(EntityId(1), BTreeMap::new());
        log.rebase(vec![EntityId(1), EntityId(2)]);

        assert!(log.is_clean());
        assert_eq!(log.baseline(), &[EntityId(1), EntityId(2)]);
    }

    #[test]
    fn add_preserves_facets() {
        let mut facets = BTreeMap::new();
        facets.insert("familiarity".to_string(), Value::from(42));

        let mut log = RelationChangelog::default();
        log.record_add(EntityId(1), facets.clone());

        assert_eq!(log.added()[0].facets, facets);
    }

    #[test]
    fn clear_empties_everything() {
        let mut log = Changelog::new();
        log.record_scalar("name", Value::from("x"));
        log.record_relation_add("friends", EntityId(1), BTreeMap::new());
        log.clear();

        assert!(log.is_clean());
        assert!(log.scalars().is_empty());
        assert!(log.relations().is_empty());
    }
}
