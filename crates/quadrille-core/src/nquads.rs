//! # N-Quad Text Encoding
//!
//! Renders compiled statements in the line-oriented assertion format the
//! store ingests: one `.`-terminated line per statement, uids in angle
//! brackets, temporary identifiers as `_:`-prefixed blank labels, and
//! edge-qualified predicates as `<field|facet>`.

use crate::{Object, Statement, Subject, Value};

/// Encode statements, one per line.
#[must_use]
pub fn encode(statements: &[Statement]) -> String {
    let mut out = String::new();
    for statement in statements {
        out.push_str(&subject_token(&statement.subject));
        out.push(' ');
        out.push_str(&predicate_token(statement));
        out.push(' ');
        out.push_str(&object_token(&statement.object));
        out.push_str(" .\n");
    }
    out
}

fn subject_token(subject: &Subject) -> String {
    match subject {
        Subject::Node(uid) => format!("<{}>", uid.as_str()),
        Subject::Blank(label) => format!("_:{label}"),
    }
}

fn predicate_token(statement: &Statement) -> String {
    match &statement.facet {
        Some(facet) => format!("<{}|{}>", statement.predicate, facet),
        None => format!("<{}>", statement.predicate),
    }
}

fn object_token(object: &Object) -> String {
    match object {
        Object::Literal(value) => literal_token(value),
        Object::Subject(subject) => subject_token(subject),
    }
}

fn literal_token(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("\"{}\"", escape(s)),
        Value::Int(i) => format!("\"{i}\""),
        Value::Float(f) => format!("\"{f}\""),
        Value::Bool(b) => format!("\"{b}\""),
        Value::Null => "\"\"".to_string(),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
