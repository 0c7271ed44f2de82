//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands. Each
//! command returns its rendered output so tests can assert on it directly.

use crate::CliError;
use crate::schema_file::SchemaFile;
use quadrille_core::{EntityGraph, MutationCompiler, Resolver, nquads};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for input records (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_DATA_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate an input path and its size before reading.
///
/// Canonicalization resolves symlinks and `..`, and validates existence;
/// rejecting directories and oversized files happens before any read.
fn validate_input_file(path: &Path, max_size: u64) -> Result<PathBuf, CliError> {
    let canonical = path.canonicalize().map_err(|e| {
        CliError::InvalidInput(format!("invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CliError::InvalidInput(format!(
            "path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)?;
    if metadata.len() > max_size {
        return Err(CliError::InvalidInput(format!(
            "file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }

    Ok(canonical)
}

fn load_records(path: &Path) -> Result<serde_json::Value, CliError> {
    let path = validate_input_file(path, MAX_DATA_FILE_SIZE)?;
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

// =============================================================================
// GRAPH SUMMARY (resolve output)
// =============================================================================

#[derive(Debug, Serialize)]
struct GraphSummary {
    entity_count: usize,
    roots: Vec<u64>,
    entities: Vec<EntitySummary>,
}

#[derive(Debug, Serialize)]
struct EntitySummary {
    id: u64,
    entity_type: String,
    uid: Option<String>,
    scalars: BTreeMap<String, serde_json::Value>,
    relations: BTreeMap<String, Vec<u64>>,
}

fn summarize(graph: &EntityGraph, roots: &[quadrille_core::EntityId]) -> GraphSummary {
    let entities = graph
        .entities()
        .map(|(id, entity)| EntitySummary {
            id: id.0,
            entity_type: entity.type_name().to_string(),
            uid: entity.uid().map(|u| u.as_str().to_string()),
            scalars: entity
                .scalars()
                .iter()
                .map(|(field, value)| (field.clone(), value.to_json()))
                .collect(),
            relations: entity
                .relations()
                .iter()
                .map(|(field, set)| {
                    (
                        field.clone(),
                        set.members().iter().map(|m| m.0).collect(),
                    )
                })
                .collect(),
        })
        .collect();

    GraphSummary {
        entity_count: graph.len(),
        roots: roots.iter().map(|r| r.0).collect(),
        entities,
    }
}

fn render_summary(summary: &GraphSummary, json_mode: bool) -> Result<String, CliError> {
    if json_mode {
        let mut out = serde_json::to_string_pretty(summary)?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = format!(
        "Resolved {} entities ({} roots)\n",
        summary.entity_count,
        summary.roots.len()
    );
    for entity in &summary.entities {
        let uid = entity.uid.as_deref().unwrap_or("-");
        out.push_str(&format!(
            "  [{}] {} uid={}\n",
            entity.id, entity.entity_type, uid
        ));
        for (field, value) in &entity.scalars {
            out.push_str(&format!("    {field} = {value}\n"));
        }
        for (field, targets) in &entity.relations {
            out.push_str(&format!("    {field} -> {targets:?}\n"));
        }
    }
    Ok(out)
}

// =============================================================================
// COMMANDS
// =============================================================================

/// `resolve`: load the schema and records, resolve the record stream, and
/// render an entity graph summary.
pub fn cmd_resolve(
    schema_path: &Path,
    data_path: &Path,
    entry_type: &str,
    json_mode: bool,
) -> Result<String, CliError> {
    let registry = SchemaFile::load(schema_path)?;
    let records = load_records(data_path)?;

    let mut graph = EntityGraph::new(registry);
    let roots = Resolver::resolve(&mut graph, entry_type, &records)?;
    tracing::info!(
        entities = graph.len(),
        roots = roots.len(),
        "resolved record stream"
    );

    render_summary(&summarize(&graph, &roots), json_mode)
}

/// `assert`: load the schema and records, adopt the records as new (dirty)
/// entities, compile them, and render the statements as N-Quads (or as a
/// JSON statement list in json mode).
pub fn cmd_assert(
    schema_path: &Path,
    data_path: &Path,
    entry_type: &str,
    json_mode: bool,
) -> Result<String, CliError> {
    let registry = SchemaFile::load(schema_path)?;
    let records = load_records(data_path)?;

    let mut graph = EntityGraph::new(registry);
    let roots = Resolver::adopt(&mut graph, entry_type, &records)?;
    let mutation = MutationCompiler::compile(&graph, &roots)?;
    tracing::info!(
        statements = mutation.statements.len(),
        subjects = mutation.subjects.len(),
        "compiled assertion statements"
    );

    if json_mode {
        let mut out = serde_json::to_string_pretty(&mutation.statements)?;
        out.push('\n');
        return Ok(out);
    }
    Ok(nquads::encode(&mutation.statements))
}
