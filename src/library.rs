//! The library facade: runs compiled queries against storage and keeps the
//! entity tables and their links consistent on insert/update.

use crate::database::Database;
use crate::entity::{Article, Author, Collection, Journal, Label};
use anyhow::{bail, Context, Result};
use folio_query::{Entity, Query, Statement, Value};
use rand::Rng;
use rusqlite::params;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const KEY_CHARS: &[u8] = b"abcdefghijklmnopqrst0123456789";
const KEY_SIZE: usize = 4;

/// Entity-typed search results.
#[derive(Debug)]
pub enum Matches {
    Articles(Vec<Article>),
    Journals(Vec<Journal>),
    Authors(Vec<Author>),
    Labels(Vec<Label>),
    Collections(Vec<Collection>),
}

impl Matches {
    fn empty(entity: Entity) -> Matches {
        match entity {
            Entity::Articles => Matches::Articles(Vec::new()),
            Entity::Journals => Matches::Journals(Vec::new()),
            Entity::Authors => Matches::Authors(Vec::new()),
            Entity::Labels => Matches::Labels(Vec::new()),
            Entity::Collections => Matches::Collections(Vec::new()),
        }
    }

    pub fn entity(&self) -> Entity {
        match self {
            Matches::Articles(_) => Entity::Articles,
            Matches::Journals(_) => Entity::Journals,
            Matches::Authors(_) => Entity::Authors,
            Matches::Labels(_) => Entity::Labels,
            Matches::Collections(_) => Entity::Collections,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Matches::Articles(items) => items.len(),
            Matches::Journals(items) => items.len(),
            Matches::Authors(items) => items.len(),
            Matches::Labels(items) => items.len(),
            Matches::Collections(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct Library {
    db: Database,
}

impl Library {
    pub fn open(path: &Path) -> Result<Library> {
        Ok(Library {
            db: Database::open(path)?,
        })
    }

    pub fn create(path: &Path) -> Result<Library> {
        Ok(Library {
            db: Database::create(path)?,
        })
    }

    pub fn in_memory() -> Result<Library> {
        Ok(Library {
            db: Database::in_memory()?,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Runs a compiled query and returns the matching records, with article
    /// results hydrated with their journal, authors, labels and collections.
    /// A query that yields no usable conditions returns an empty result
    /// rather than an error.
    pub fn search(&self, query: &Query) -> Result<Matches> {
        let Some(statement) = query.select().context("Compile query failed.")? else {
            debug!(query = query.raw(), "query yields no usable conditions");
            return Ok(Matches::empty(query.entity()));
        };
        debug!(sql = %statement.sql, "running search");

        match query.entity() {
            Entity::Articles => Ok(Matches::Articles(self.fetch_articles(&statement)?)),
            Entity::Journals => Ok(Matches::Journals(self.db.rows(
                &statement.sql,
                &statement.values,
                Journal::from_row,
            )?)),
            Entity::Authors => Ok(Matches::Authors(self.db.rows(
                &statement.sql,
                &statement.values,
                Author::from_row,
            )?)),
            Entity::Labels => Ok(Matches::Labels(self.db.rows(
                &statement.sql,
                &statement.values,
                Label::from_row,
            )?)),
            Entity::Collections => Ok(Matches::Collections(self.db.rows(
                &statement.sql,
                &statement.values,
                Collection::from_row,
            )?)),
        }
    }

    /// Counts the records a query matches; an unusable query counts zero.
    pub fn count(&self, query: &Query) -> Result<i64> {
        let Some(statement) = query.count().context("Compile query failed.")? else {
            return Ok(0);
        };
        let counts = self
            .db
            .rows(&statement.sql, &statement.values, |row| row.get::<_, i64>(0))?;
        Ok(counts.into_iter().next().unwrap_or(0))
    }

    pub fn insert_journal(&self, journal: &mut Journal) -> Result<()> {
        self.db
            .conn()
            .execute(
                "INSERT INTO journals (title, abbreviation) VALUES (?1, ?2)",
                params![journal.title, journal.abbreviation],
            )
            .context("Insert journal failed.")?;
        journal.id = Some(self.db.conn().last_insert_rowid());
        Ok(())
    }

    pub fn insert_author(&self, author: &mut Author) -> Result<()> {
        self.db
            .conn()
            .execute(
                "INSERT INTO authors (shortname, lastname, firstname, initials) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    author.shortname,
                    author.lastname,
                    author.firstname,
                    author.initials
                ],
            )
            .context("Insert author failed.")?;
        author.id = Some(self.db.conn().last_insert_rowid());
        Ok(())
    }

    pub fn insert_label(&self, label: &mut Label) -> Result<()> {
        self.db
            .conn()
            .execute("INSERT INTO labels (title) VALUES (?1)", params![label.title])
            .context("Insert label failed.")?;
        label.id = Some(self.db.conn().last_insert_rowid());
        Ok(())
    }

    pub fn insert_collection(&self, collection: &mut Collection) -> Result<()> {
        self.db
            .conn()
            .execute(
                "INSERT INTO collections (title, query, priority, export) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    collection.title,
                    collection.query,
                    collection.priority,
                    collection.export
                ],
            )
            .context("Insert collection failed.")?;
        collection.id = Some(self.db.conn().last_insert_rowid());
        Ok(())
    }

    /// Inserts an article with its links. A missing key is generated, a zero
    /// import timestamp is set to now, and linked journal/authors/labels/
    /// collections without ids are inserted first.
    pub fn insert_article(&self, article: &mut Article) -> Result<()> {
        if article.key.is_none() {
            article.key = Some(self.generate_key()?);
        }
        if article.imported == 0 {
            article.imported = unix_now();
        }
        if let Some(journal) = article.journal.as_mut() {
            if journal.id.is_none() {
                self.insert_journal(journal)?;
            }
        }

        self.db
            .conn()
            .execute(
                "INSERT INTO articles (\
                 key, imported, doi, pmid, journal, year, volume, issue, pages, \
                 title, abstract, notes, pdf, colour, rating, deleted) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    article.key,
                    article.imported,
                    article.doi,
                    article.pmid,
                    article.journal.as_ref().and_then(|journal| journal.id),
                    article.year,
                    article.volume,
                    article.issue,
                    article.pages,
                    article.title,
                    article.abstract_text,
                    article.notes,
                    article.pdf,
                    article.colour,
                    article.rating,
                    article.deleted,
                ],
            )
            .context("Insert article failed.")?;
        let id = self.db.conn().last_insert_rowid();
        article.id = Some(id);

        self.link_article(id, article)?;
        debug!(key = ?article.key, "article inserted");
        Ok(())
    }

    /// Rewrites an existing article's columns and links.
    pub fn update_article(&self, article: &mut Article) -> Result<()> {
        let Some(id) = article.id else {
            bail!("article has no database id");
        };
        if let Some(journal) = article.journal.as_mut() {
            if journal.id.is_none() {
                self.insert_journal(journal)?;
            }
        }

        self.db
            .conn()
            .execute(
                "UPDATE articles SET \
                 doi = ?1, pmid = ?2, journal = ?3, year = ?4, volume = ?5, \
                 issue = ?6, pages = ?7, title = ?8, abstract = ?9, notes = ?10, \
                 pdf = ?11, colour = ?12, rating = ?13, deleted = ?14 \
                 WHERE id = ?15",
                params![
                    article.doi,
                    article.pmid,
                    article.journal.as_ref().and_then(|journal| journal.id),
                    article.year,
                    article.volume,
                    article.issue,
                    article.pages,
                    article.title,
                    article.abstract_text,
                    article.notes,
                    article.pdf,
                    article.colour,
                    article.rating,
                    article.deleted,
                    id,
                ],
            )
            .context("Update article failed.")?;

        for table in ["articles_authors", "articles_labels", "articles_collections"] {
            self.db
                .conn()
                .execute(&format!("DELETE FROM {table} WHERE article = ?1"), params![id])
                .context("Unlink article failed.")?;
        }
        self.link_article(id, article)
    }

    /// Flags or unflags articles as trashed.
    pub fn trash(&self, article_ids: &[i64], trashed: bool) -> Result<()> {
        for &id in article_ids {
            self.db
                .conn()
                .execute(
                    "UPDATE articles SET deleted = ?1 WHERE id = ?2",
                    params![trashed, id],
                )
                .context("Update trash flag failed.")?;
        }
        Ok(())
    }

    /// Deletes an article; link rows cascade.
    pub fn delete_article(&self, id: i64) -> Result<()> {
        self.db
            .conn()
            .execute("DELETE FROM articles WHERE id = ?1", params![id])
            .context("Delete article failed.")?;
        Ok(())
    }

    fn link_article(&self, id: i64, article: &mut Article) -> Result<()> {
        for (priority, author) in article.authors.iter_mut().enumerate() {
            if author.id.is_none() {
                self.insert_author(author)?;
            }
            self.db
                .conn()
                .execute(
                    "INSERT INTO articles_authors (article, author, priority) \
                     VALUES (?1, ?2, ?3)",
                    params![id, author.id, priority as i64],
                )
                .context("Link author failed.")?;
        }
        for label in article.labels.iter_mut() {
            if label.id.is_none() {
                self.insert_label(label)?;
            }
            self.db
                .conn()
                .execute(
                    "INSERT INTO articles_labels (article, label) VALUES (?1, ?2)",
                    params![id, label.id],
                )
                .context("Link label failed.")?;
        }
        for collection in article.collections.iter_mut() {
            if collection.id.is_none() {
                self.insert_collection(collection)?;
            }
            self.db
                .conn()
                .execute(
                    "INSERT INTO articles_collections (collection, article) VALUES (?1, ?2)",
                    params![collection.id, id],
                )
                .context("Link collection failed.")?;
        }
        Ok(())
    }

    fn fetch_articles(&self, statement: &Statement) -> Result<Vec<Article>> {
        let rows = self.db.rows(&statement.sql, &statement.values, |row| {
            let article = Article::from_row(row)?;
            let journal: Option<i64> = row.get("journal")?;
            Ok((article, journal))
        })?;

        let mut articles = Vec::with_capacity(rows.len());
        for (mut article, journal) in rows {
            if let Some(journal_id) = journal {
                article.journal = self.journal_by_id(journal_id)?;
            }
            if let Some(id) = article.id {
                article.authors = self.article_authors(id)?;
                article.labels = self.article_labels(id)?;
                article.collections = self.article_collections(id)?;
            }
            articles.push(article);
        }
        Ok(articles)
    }

    fn journal_by_id(&self, id: i64) -> Result<Option<Journal>> {
        let mut journals = self.db.rows(
            "SELECT * FROM journals WHERE id = ?",
            &[Value::Int(id)],
            Journal::from_row,
        )?;
        Ok(journals.pop())
    }

    fn article_authors(&self, article: i64) -> Result<Vec<Author>> {
        self.db.rows(
            "SELECT authors.* FROM articles_authors \
             LEFT JOIN authors ON articles_authors.author = authors.id \
             WHERE articles_authors.article = ? \
             ORDER BY articles_authors.priority",
            &[Value::Int(article)],
            Author::from_row,
        )
    }

    fn article_labels(&self, article: i64) -> Result<Vec<Label>> {
        self.db.rows(
            "SELECT labels.* FROM articles_labels \
             LEFT JOIN labels ON articles_labels.label = labels.id \
             WHERE articles_labels.article = ? \
             ORDER BY labels.title",
            &[Value::Int(article)],
            Label::from_row,
        )
    }

    fn article_collections(&self, article: i64) -> Result<Vec<Collection>> {
        self.db.rows(
            "SELECT collections.* FROM articles_collections \
             LEFT JOIN collections ON articles_collections.collection = collections.id \
             WHERE articles_collections.article = ? \
             ORDER BY collections.priority",
            &[Value::Int(article)],
            Collection::from_row,
        )
    }

    fn generate_key(&self) -> Result<String> {
        let mut rng = rand::thread_rng();
        loop {
            let key: String = (0..KEY_SIZE)
                .map(|_| KEY_CHARS[rng.gen_range(0..KEY_CHARS.len())] as char)
                .collect();
            let taken: i64 = self
                .db
                .conn()
                .query_row(
                    "SELECT COUNT(*) FROM articles WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .context("Check key uniqueness failed.")?;
            if taken == 0 {
                return Ok(key);
            }
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
