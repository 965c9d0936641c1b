//! folio — a reference-library engine.
//!
//! Queries written in a PubMed-like boolean syntax are compiled by
//! [`folio_query`] into parameterized SQLite statements and executed here
//! against the library's entity tables.
//!
//! ```no_run
//! use folio::{Entity, Library, Matches, Query};
//!
//! let library = Library::in_memory().unwrap();
//! let query = Query::new("smith[AU] AND (cancer OR tumor)", Entity::Articles);
//! if let Matches::Articles(articles) = library.search(&query).unwrap() {
//!     for article in articles {
//!         println!("{:?}", article.title);
//!     }
//! }
//! ```

pub mod database;
pub mod entity;
pub mod library;

pub use database::Database;
pub use entity::{Article, Author, Collection, Journal, Label};
pub use folio_query::{Entity, Query, QueryError, Statement, Tag, Value};
pub use library::{Library, Matches};
