#![allow(dead_code)]
//! Shared helpers for `folio-query` integration tests.

use folio_query::{Entity, Query, Statement, Value};

pub fn select(query: &str, entity: Entity) -> Statement {
    Query::new(query, entity)
        .select()
        .expect("compilation should succeed")
        .expect("query should produce a statement")
}

pub fn count(query: &str, entity: Entity) -> Statement {
    Query::new(query, entity)
        .count()
        .expect("compilation should succeed")
        .expect("query should produce a statement")
}

pub fn select_none(query: &str, entity: Entity) {
    let q = Query::new(query, entity);
    assert_eq!(q.select().expect("compilation should succeed"), None);
    assert_eq!(q.count().expect("compilation should succeed"), None);
}

/// The WHERE clause of a compiled statement, or "" when unconditional.
pub fn conditions(statement: &Statement) -> &str {
    statement.sql.splitn(2, " WHERE ").nth(1).unwrap_or("")
}

pub fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// The `%value%` pattern bound by case-insensitive substring conditions.
pub fn like(value: &str) -> Value {
    Value::Text(format!("%{}%", value.to_lowercase()))
}
