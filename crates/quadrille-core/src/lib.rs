//! # quadrille-core
//!
//! The graph mapping layer for Quadrille - THE LOGIC.
//!
//! This crate maps between a tree/graph-shaped wire representation (JSON
//! records cross-referencing each other by identifier) and an in-memory
//! graph of typed entities, and compiles in-memory mutations of that graph
//! back into a minimal set of assertion statements for a graph store.
//!
//! The three responsibilities:
//! - **Graph resolution**: merging a record stream into one deduplicated,
//!   cross-linked entity graph, cycle-safe
//! - **Change tracking**: every entity records which fields were written
//!   after its baseline, element-wise for relationships
//! - **Mutation compilation**: a cycle-safe walk emitting exactly the
//!   recorded changes, with temporary identifiers for unpersisted entities
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network, no I/O — the data store, transport,
//!   and flush policy are the host's business
//! - Deterministic: `BTreeMap`/`BTreeSet` only, no randomness
//! - Single-threaded: the host serializes access to an `EntityGraph`

// =============================================================================
// MODULES
// =============================================================================

pub mod changelog;
pub mod graph;
pub mod mutation;
pub mod nquads;
pub mod resolver;
pub mod schema;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{EntityId, Object, QuadrilleError, Statement, Subject, Uid, Value};

// =============================================================================
// RE-EXPORTS: Mapping Layer
// =============================================================================

pub use changelog::{AddedEdge, Changelog, RelationChangelog};
pub use graph::{Entity, EntityGraph, RelationSet};
pub use mutation::{Mutation, MutationCompiler};
pub use resolver::Resolver;
pub use schema::{NodeSchema, RelationSchema, SchemaRegistry};
