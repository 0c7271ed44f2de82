//! # Schema File Loading
//!
//! Deserializes the TOML schema description into a `SchemaRegistry`.
//!
//! ```toml
//! [types.Person]
//! scalars = ["name"]
//!
//! [[types.Person.relations]]
//! name = "friends"
//! target = "Person"
//! many = true
//! facets = ["familiarity"]
//! ```

use crate::CliError;
use quadrille_core::{NodeSchema, RelationSchema, SchemaRegistry};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Mirror of the on-disk schema description.
#[derive(Debug, Deserialize)]
pub struct SchemaFile {
    /// Override for the reserved identifier key (default `uid`).
    #[serde(default)]
    uid_key: Option<String>,
    /// Entity types, keyed by type name.
    types: BTreeMap<String, TypeDef>,
}

#[derive(Debug, Deserialize)]
struct TypeDef {
    #[serde(default)]
    scalars: Vec<String>,
    #[serde(default)]
    relations: Vec<RelationDef>,
}

#[derive(Debug, Deserialize)]
struct RelationDef {
    name: String,
    target: String,
    #[serde(default)]
    many: bool,
    #[serde(default)]
    facets: Vec<String>,
}

impl SchemaFile {
    /// Parse a schema description from TOML text.
    pub fn parse(text: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a schema file, then build the registry.
    pub fn load(path: &Path) -> Result<SchemaRegistry, CliError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text)?.into_registry())
    }

    /// Build the registry this description declares.
    #[must_use]
    pub fn into_registry(self) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        if let Some(uid_key) = self.uid_key {
            registry = registry.with_uid_key(uid_key);
        }
        for (name, def) in self.types {
            let mut schema = NodeSchema::new(name);
            for scalar in def.scalars {
                schema = schema.scalar(scalar);
            }
            for relation in def.relations {
                let mut rel = RelationSchema::new(relation.name, relation.target);
                if relation.many {
                    rel = rel.many();
                }
                for facet in relation.facets {
                    rel = rel.facet(facet);
                }
                schema = schema.relation(rel);
            }
            registry = registry.register(schema);
        }
        registry
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
[types.Person]
scalars = ["name"]

[[types.Person.relations]]
name = "friends"
target = "Person"
many = true
facets = ["familiarity"]

[types.Hobby]
scalars = ["name", "type"]
"#;

    #[test]
    fn parses_types_and_relations() {
        let registry = SchemaFile::parse(EXAMPLE).expect("parse").into_registry();

        let person = registry.get("Person").expect("registered");
        assert!(person.is_scalar("name"));
        let friends = person.relation_named("friends").expect("relation");
        assert!(friends.is_many());
        assert!(friends.has_facet("familiarity"));

        let hobby = registry.get("Hobby").expect("registered");
        assert!(hobby.is_scalar("type"));
    }

    #[test]
    fn uid_key_override() {
        let registry = SchemaFile::parse("uid_key = \"id\"\n[types.Person]\n")
            .expect("parse")
            .into_registry();
        assert_eq!(registry.uid_key(), "id");
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(SchemaFile::parse("types = 3").is_err());
    }
}
