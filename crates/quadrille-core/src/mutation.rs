//! # Mutation Compiler
//!
//! Walks a (possibly cyclic) entity graph from one or more roots and emits
//! the minimal set of assertion statements capturing the recorded changes.
//!
//! The walk is keyed by entity identity, not by store identifier: a
//! never-persisted entity has no identifier to key on, and two arena entries
//! are the same node exactly when they share an `EntityId`. Entities without
//! a store identifier get a blank-node subject derived from their arena id,
//! so the same instance always maps to the same temporary token.

use crate::graph::EntityGraph;
use crate::{EntityId, Object, QuadrilleError, Statement, Subject};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// MUTATION
// =============================================================================

/// The compiled mutation: statements in visitation order plus the subject
/// token chosen for every visited entity.
#[derive(Debug, Clone, Default)]
pub struct Mutation {
    /// Assertion statements, in visitation order. An entity's own statements
    /// precede those of entities first reached through it.
    pub statements: Vec<Statement>,
    /// Subject token (persisted uid or temporary blank label) per entity.
    pub subjects: BTreeMap<EntityId, Subject>,
}

impl Mutation {
    /// Whether the compilation found nothing to assert.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

// =============================================================================
// COMPILER
// =============================================================================

/// The MutationCompiler turns tracked changes back into statements.
pub struct MutationCompiler;

impl MutationCompiler {
    /// Compile every change reachable from `roots`.
    ///
    /// A root whose whole reachable subgraph is clean contributes nothing;
    /// the result is then empty, not an error. Removed relationship edges do
    /// not emit retractions.
    pub fn compile(
        graph: &EntityGraph,
        roots: &[EntityId],
    ) -> Result<Mutation, QuadrilleError> {
        let mut mutation = Mutation::default();
        let mut visited = BTreeSet::new();
        for root in roots {
            Self::visit(graph, *root, &mut visited, &mut mutation)?;
        }
        Ok(mutation)
    }

    /// Subject token for an entity: its uid if persisted, else a blank label
    /// derived from its arena id. Memoized in the mutation's subject map.
    fn subject_for(
        graph: &EntityGraph,
        id: EntityId,
        mutation: &mut Mutation,
    ) -> Result<Subject, QuadrilleError> {
        if let Some(subject) = mutation.subjects.get(&id) {
            return Ok(subject.clone());
        }
        let entity = graph.entity(id)?;
        let subject = match entity.uid() {
            Some(uid) => Subject::Node(uid.clone()),
            None => Subject::Blank(format!("e{}", id.0)),
        };
        mutation.subjects.insert(id, subject.clone());
        Ok(subject)
    }

    fn visit(
        graph: &EntityGraph,
        id: EntityId,
        visited: &mut BTreeSet<EntityId>,
        mutation: &mut Mutation,
    ) -> Result<(), QuadrilleError> {
        if !visited.insert(id) {
            return Ok(());
        }

        let entity = graph.entity(id)?;
        let subject = Self::subject_for(graph, id, mutation)?;

        // Changed scalars first: one plain assertion per logged write.
        for (field, value) in entity.changelog().scalars() {
            mutation.statements.push(Statement::new(
                subject.clone(),
                field.clone(),
                Object::Literal(value.clone()),
            ));
        }

        // Added relationship edges, each with its facet assertions.
        for (field, log) in entity.changelog().relations() {
            for edge in log.added() {
                let target_subject = Self::subject_for(graph, edge.target, mutation)?;
                mutation.statements.push(Statement::new(
                    subject.clone(),
                    field.clone(),
                    Object::Subject(target_subject),
                ));
                for (facet, value) in &edge.facets {
                    mutation.statements.push(Statement::faceted(
                        subject.clone(),
                        field.clone(),
                        facet.clone(),
                        value.clone(),
                    ));
                }
            }
        }

        // Walk into every relationship target, changed or not: a clean
        // target may be the entry point to further-changed descendants.
        for set in entity.relations().values() {
            for target in set.members() {
                Self::visit(graph, *target, visited, mutation)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
