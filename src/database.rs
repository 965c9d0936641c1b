//! SQLite access layer: connection handling, schema bootstrap and the
//! `(sql, values)` execution primitives the compiled queries run through.

use anyhow::{bail, Context, Result};
use folio_query::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::info;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS articles (
        id              INTEGER PRIMARY KEY NOT NULL,
        key             TEXT UNIQUE NOT NULL,
        imported        INTEGER NOT NULL,
        doi             TEXT,
        pmid            TEXT,
        journal         INTEGER REFERENCES journals ON DELETE SET NULL,
        year            INTEGER,
        volume          TEXT,
        issue           TEXT,
        pages           TEXT,
        title           TEXT,
        abstract        TEXT,
        notes           TEXT,
        pdf             INTEGER NOT NULL DEFAULT 0,
        colour          TEXT,
        rating          INTEGER NOT NULL DEFAULT 0,
        deleted         INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS journals (
        id              INTEGER PRIMARY KEY NOT NULL,
        title           TEXT NOT NULL,
        abbreviation    TEXT
    );

    CREATE TABLE IF NOT EXISTS authors (
        id              INTEGER PRIMARY KEY NOT NULL,
        shortname       TEXT NOT NULL,
        lastname        TEXT NOT NULL,
        firstname       TEXT NOT NULL,
        initials        TEXT
    );

    CREATE TABLE IF NOT EXISTS labels (
        id              INTEGER PRIMARY KEY NOT NULL,
        title           TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS collections (
        id              INTEGER PRIMARY KEY NOT NULL,
        title           TEXT NOT NULL,
        query           TEXT,
        priority        INTEGER NOT NULL DEFAULT 0,
        export          INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS articles_authors (
        article         INTEGER NOT NULL REFERENCES articles ON DELETE CASCADE,
        author          INTEGER NOT NULL REFERENCES authors ON DELETE CASCADE,
        priority        INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS articles_labels (
        article         INTEGER NOT NULL REFERENCES articles ON DELETE CASCADE,
        label           INTEGER NOT NULL REFERENCES labels ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS articles_collections (
        collection      INTEGER NOT NULL REFERENCES collections ON DELETE CASCADE,
        article         INTEGER NOT NULL REFERENCES articles ON DELETE CASCADE
    );
";

/// Owns the SQLite connection. The schema is created on first open, so a
/// fresh file (or an in-memory database) is immediately usable.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an existing library database file.
    pub fn open(path: &Path) -> Result<Database> {
        if !path.exists() {
            bail!("library database does not exist: {}", path.display());
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Open database at `{}` failed.", path.display()))?;
        Database::prepare(conn)
    }

    /// Creates a new library database file; refuses to clobber an existing
    /// one.
    pub fn create(path: &Path) -> Result<Database> {
        if path.exists() {
            bail!("library database already exists: {}", path.display());
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Create database at `{}` failed.", path.display()))?;
        info!(path = %path.display(), "created library database");
        Database::prepare(conn)
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Result<Database> {
        let conn = Connection::open_in_memory().context("Open in-memory database failed.")?;
        Database::prepare(conn)
    }

    fn prepare(conn: Connection) -> Result<Database> {
        conn.pragma_update(None, "foreign_keys", true)
            .context("Enable foreign keys failed.")?;
        conn.execute_batch(SCHEMA)
            .context("Initialize schema failed.")?;
        Ok(Database { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Runs a compiled `(sql, values)` query and decodes each row through
    /// `map`.
    pub fn rows<T>(
        &self,
        sql: &str,
        values: &[Value],
        map: impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut statement = self.conn.prepare(sql).context("Prepare statement failed.")?;
        let mapped = statement
            .query_map(params_from_iter(bind(values)), map)
            .context("Run query failed.")?;
        let mut rows = Vec::new();
        for row in mapped {
            rows.push(row.context("Decode row failed.")?);
        }
        Ok(rows)
    }

    /// Runs a compiled `(sql, values)` statement and returns the affected
    /// row count.
    pub fn execute(&self, sql: &str, values: &[Value]) -> Result<usize> {
        self.conn
            .execute(sql, params_from_iter(bind(values)))
            .context("Execute statement failed.")
    }
}

fn bind(values: &[Value]) -> Vec<rusqlite::types::Value> {
    values
        .iter()
        .map(|value| match value {
            Value::Int(int) => rusqlite::types::Value::Integer(*int),
            Value::Text(text) => rusqlite::types::Value::Text(text.clone()),
        })
        .collect()
}
