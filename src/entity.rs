//! Record types for the five library entities.

use serde::{Deserialize, Serialize};

/// A referenced article, with its linked journal, authors, labels and
/// collections hydrated by [`crate::Library::search`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<i64>,
    /// Short unique citation key, generated on insert when absent.
    pub key: Option<String>,
    /// Unix timestamp of import, set on insert when zero.
    pub imported: i64,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub journal: Option<Journal>,
    pub year: Option<i64>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub notes: Option<String>,
    /// Authors in citation order; the first is the first author.
    pub authors: Vec<Author>,
    pub labels: Vec<Label>,
    pub collections: Vec<Collection>,
    pub pdf: bool,
    /// Colour mark as a hex code, e.g. `ff6e64`.
    pub colour: Option<String>,
    pub rating: i64,
    pub deleted: bool,
}

impl Article {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
        Ok(Article {
            id: row.get("id")?,
            key: row.get("key")?,
            imported: row.get("imported")?,
            doi: row.get("doi")?,
            pmid: row.get("pmid")?,
            journal: None,
            year: row.get("year")?,
            volume: row.get("volume")?,
            issue: row.get("issue")?,
            pages: row.get("pages")?,
            title: row.get("title")?,
            abstract_text: row.get("abstract")?,
            notes: row.get("notes")?,
            authors: Vec::new(),
            labels: Vec::new(),
            collections: Vec::new(),
            pdf: row.get("pdf")?,
            colour: row.get("colour")?,
            rating: row.get("rating")?,
            deleted: row.get("deleted")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    pub id: Option<i64>,
    pub title: String,
    pub abbreviation: Option<String>,
}

impl Journal {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Journal> {
        Ok(Journal {
            id: row.get("id")?,
            title: row.get("title")?,
            abbreviation: row.get("abbreviation")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<i64>,
    /// Display form used in searches, e.g. `Smith J`.
    pub shortname: String,
    pub lastname: String,
    pub firstname: String,
    pub initials: Option<String>,
}

impl Author {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Author> {
        Ok(Author {
            id: row.get("id")?,
            shortname: row.get("shortname")?,
            lastname: row.get("lastname")?,
            firstname: row.get("firstname")?,
            initials: row.get("initials")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Label {
    pub id: Option<i64>,
    pub title: String,
}

impl Label {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Label> {
        Ok(Label {
            id: row.get("id")?,
            title: row.get("title")?,
        })
    }
}

/// A collection of articles; `query` optionally stores the search string a
/// smart collection was built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub id: Option<i64>,
    pub title: String,
    pub query: Option<String>,
    pub priority: i64,
    pub export: bool,
}

impl Collection {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Collection> {
        Ok(Collection {
            id: row.get("id")?,
            title: row.get("title")?,
            query: row.get("query")?,
            priority: row.get("priority")?,
            export: row.get("export")?,
        })
    }
}
