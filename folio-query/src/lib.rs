//! # folio's search-query compiler
//!
//! `folio-query` turns PubMed-like boolean searches (`smith[AU] AND (cancer
//! OR tumor)`) into parameterized SQLite statements for one of the five
//! library entity tables. Queries support bare values, quoted phrases,
//! bracketed field tags, grouping, `NOT` negation and `AND`/`OR` chains,
//! with adjacent bare terms joined by an implicit `AND`.
//!
//! ## Example
//! ```
//! use folio_query::{Entity, Query, Value};
//!
//! let query = Query::new("3[RATING]", Entity::Articles);
//! let statement = query.count().unwrap().unwrap();
//! assert_eq!(statement.sql, "SELECT COUNT(*) FROM articles WHERE articles.rating = ?");
//! assert_eq!(statement.values, vec![Value::Int(3)]);
//!
//! let query = Query::new("", Entity::Articles);
//! let statement = query.select().unwrap().unwrap();
//! assert_eq!(statement.sql, "SELECT * FROM articles");
//! assert!(statement.values.is_empty());
//! ```
//!
//! A non-empty query that yields no usable condition compiles to `Ok(None)`
//! rather than an error, so callers can decide whether that means "show
//! nothing" or "complain":
//! ```
//! use folio_query::{Entity, Query};
//!
//! let query = Query::new("[", Entity::Articles);
//! assert_eq!(query.select().unwrap(), None);
//! ```

mod fields;

use folio_grammar::{Grammar, Node};
use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;

/// The fixed search grammar, shared by every [`Query`]. Alternative order is
/// load-bearing: `expr` prefers negations, then operator chains, then lone
/// operands, and the first full match wins.
static GRAMMAR: Lazy<Grammar> = Lazy::new(|| {
    Grammar::new([
        ("op", "AND | OR"),
        ("val", r"[A-Za-z0-9\-_\./\\]+"),
        (
            "quote",
            r#"" [A-Za-z0-9\-_\.\s/\\]+ " | ' [A-Za-z0-9\-_\.\s/\\]+ '"#,
        ),
        ("tag", r"\[[A-Za-z0-9]+\]"),
        ("elm", "val tag | quote tag"),
        ("group", r"\( expr \)"),
        ("neg", "NOT expr"),
        (
            "expr",
            "neg | group op expr | elm op expr | quote op expr | val op expr | group | elm | quote | val",
        ),
    ])
    .expect("search grammar is valid")
});

/// The five entity tables a query can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Articles,
    Journals,
    Authors,
    Labels,
    Collections,
}

impl Entity {
    pub const ALL: [Entity; 5] = [
        Entity::Articles,
        Entity::Journals,
        Entity::Authors,
        Entity::Labels,
        Entity::Collections,
    ];

    /// Table name in the library schema.
    pub fn table(self) -> &'static str {
        match self {
            Entity::Articles => "articles",
            Entity::Journals => "journals",
            Entity::Authors => "authors",
            Entity::Labels => "labels",
            Entity::Collections => "collections",
        }
    }

    /// Resolves one of the closed set of entity names.
    pub fn from_name(name: &str) -> Option<Entity> {
        match name {
            "articles" => Some(Entity::Articles),
            "journals" => Some(Entity::Journals),
            "authors" => Some(Entity::Authors),
            "labels" => Some(Entity::Labels),
            "collections" => Some(Entity::Collections),
            _ => None,
        }
    }

    /// Tags this entity resolves to a dedicated condition. Any other tag on a
    /// term falls back to the entity's default-field search.
    ///
    /// ```
    /// use folio_query::{Entity, Tag};
    /// assert_eq!(Entity::Journals.supported_tags(), &[Tag::Id]);
    /// assert!(Entity::Articles.supported_tags().contains(&Tag::Author));
    /// ```
    pub fn supported_tags(self) -> &'static [Tag] {
        match self {
            Entity::Articles => &Tag::ARTICLE_TAGS,
            Entity::Journals | Entity::Authors | Entity::Labels | Entity::Collections => &[Tag::Id],
        }
    }
}

impl FromStr for Entity {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Entity, QueryError> {
        Entity::from_name(s).ok_or_else(|| QueryError::UnknownEntity(s.to_string()))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Bracketed field selectors, uppercased (`foo[ti]` and `foo[TI]` are the
/// same tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `[ID]` — exact database id.
    Id,
    /// `[KEY]` — exact article key.
    Key,
    /// `[PMID]` — exact PubMed id; the literal value `NULL` tests for
    /// articles without one.
    Pmid,
    /// `[DOI]` — case-insensitive substring.
    Doi,
    /// `[RECENT]` — imported within the last N days.
    Recent,
    /// `[PY]` — exact publication year.
    Year,
    /// `[TI]` — case-insensitive title substring.
    Title,
    /// `[AB]` — case-insensitive abstract substring.
    Abstract,
    /// `[NOTE]` — case-insensitive notes substring.
    Note,
    /// `[COLOUR]` / `[COLOR]` — colour mark, by name or hex code.
    Colour,
    /// `[PDF]` — has an attached PDF (boolean-like token).
    Pdf,
    /// `[RATING]` — exact rating.
    Rating,
    /// `[RBE]` — rating below or equal.
    RatingAtMost,
    /// `[RAE]` — rating above or equal.
    RatingAtLeast,
    /// `[TRASH]` — trashed flag (boolean-like token).
    Trash,
    /// `[JT]` — journal title substring.
    JournalTitle,
    /// `[JA]` — journal abbreviation substring.
    JournalAbbreviation,
    /// `[AU]` — any author short name substring.
    Author,
    /// `[AUID]` — exact author id.
    AuthorId,
    /// `[FAU]` — first author short name substring.
    FirstAuthor,
    /// `[LAU]` — last author short name substring.
    LastAuthor,
    /// `[LB]` — exact label title (case-insensitive).
    Label,
    /// `[LABELID]` — exact label id.
    LabelId,
    /// `[COLLECTIONID]` — exact collection id.
    CollectionId,
}

impl Tag {
    pub const ARTICLE_TAGS: [Tag; 24] = [
        Tag::Id,
        Tag::Key,
        Tag::Pmid,
        Tag::Doi,
        Tag::Recent,
        Tag::Year,
        Tag::Title,
        Tag::Abstract,
        Tag::Note,
        Tag::Colour,
        Tag::Pdf,
        Tag::Rating,
        Tag::RatingAtMost,
        Tag::RatingAtLeast,
        Tag::Trash,
        Tag::JournalTitle,
        Tag::JournalAbbreviation,
        Tag::Author,
        Tag::AuthorId,
        Tag::FirstAuthor,
        Tag::LastAuthor,
        Tag::Label,
        Tag::LabelId,
        Tag::CollectionId,
    ];

    /// Resolves a tag name (without brackets, any case). Unknown names return
    /// `None`, which compiles as a default-field search rather than an error.
    pub fn from_name(name: &str) -> Option<Tag> {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "ID" => Some(Tag::Id),
            "KEY" => Some(Tag::Key),
            "PMID" => Some(Tag::Pmid),
            "DOI" => Some(Tag::Doi),
            "RECENT" => Some(Tag::Recent),
            "PY" => Some(Tag::Year),
            "TI" => Some(Tag::Title),
            "AB" => Some(Tag::Abstract),
            "NOTE" => Some(Tag::Note),
            "COLOUR" | "COLOR" => Some(Tag::Colour),
            "PDF" => Some(Tag::Pdf),
            "RATING" => Some(Tag::Rating),
            "RBE" => Some(Tag::RatingAtMost),
            "RAE" => Some(Tag::RatingAtLeast),
            "TRASH" => Some(Tag::Trash),
            "JT" => Some(Tag::JournalTitle),
            "JA" => Some(Tag::JournalAbbreviation),
            "AU" => Some(Tag::Author),
            "AUID" => Some(Tag::AuthorId),
            "FAU" => Some(Tag::FirstAuthor),
            "LAU" => Some(Tag::LastAuthor),
            "LB" => Some(Tag::Label),
            "LABELID" => Some(Tag::LabelId),
            "COLLECTIONID" => Some(Tag::CollectionId),
            _ => None,
        }
    }

    /// Canonical tag name, without brackets.
    pub fn name(self) -> &'static str {
        match self {
            Tag::Id => "ID",
            Tag::Key => "KEY",
            Tag::Pmid => "PMID",
            Tag::Doi => "DOI",
            Tag::Recent => "RECENT",
            Tag::Year => "PY",
            Tag::Title => "TI",
            Tag::Abstract => "AB",
            Tag::Note => "NOTE",
            Tag::Colour => "COLOUR",
            Tag::Pdf => "PDF",
            Tag::Rating => "RATING",
            Tag::RatingAtMost => "RBE",
            Tag::RatingAtLeast => "RAE",
            Tag::Trash => "TRASH",
            Tag::JournalTitle => "JT",
            Tag::JournalAbbreviation => "JA",
            Tag::Author => "AU",
            Tag::AuthorId => "AUID",
            Tag::FirstAuthor => "FAU",
            Tag::LastAuthor => "LAU",
            Tag::Label => "LB",
            Tag::LabelId => "LABELID",
            Tag::CollectionId => "COLLECTIONID",
        }
    }
}

/// A scalar bound to one `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
}

/// A compiled statement: SQL with `?` placeholders and the values bound to
/// them in order. The placeholder count always equals `values.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Compiler failures. Both variants are programmer errors: an entity name
/// outside the closed set, or a parse-tree node the compiler does not
/// recognize (the fixed grammar never produces one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    UnknownEntity(String),
    UnknownRule(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnknownEntity(name) => write!(f, "unknown entity: '{name}'"),
            QueryError::UnknownRule(name) => write!(f, "unknown rule: '{name}'"),
        }
    }
}

impl std::error::Error for QueryError {}

/// Node kinds the compiler understands, resolved from rule names once per
/// node.
enum NodeKind {
    Expr,
    Neg,
    Group,
    Elm,
    Quote,
    Val,
    Op,
}

impl NodeKind {
    fn from_name(name: &str) -> Option<NodeKind> {
        match name {
            "expr" => Some(NodeKind::Expr),
            "neg" => Some(NodeKind::Neg),
            "group" => Some(NodeKind::Group),
            "elm" => Some(NodeKind::Elm),
            "quote" => Some(NodeKind::Quote),
            "val" => Some(NodeKind::Val),
            "op" => Some(NodeKind::Op),
            _ => None,
        }
    }
}

/// A parsed library query bound to a target entity.
///
/// Parsing happens at construction and never fails: a query that does not
/// reduce to usable conditions is carried as an empty tree and surfaces as
/// `Ok(None)` from [`Query::select`] and [`Query::count`].
pub struct Query {
    raw: String,
    entity: Entity,
    tree: Option<Node>,
}

impl Query {
    pub fn new(query: impl Into<String>, entity: Entity) -> Query {
        let raw = query.into();
        let tree = parse_tree(&raw);
        Query { raw, entity, tree }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The query string as typed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parse tree, when the query parsed. Multiple adjacent top-level
    /// expressions are already joined by implicit `AND` nodes.
    pub fn tree(&self) -> Option<&Node> {
        self.tree.as_ref()
    }

    /// Canonical textual form of the parsed tree: tokens re-joined with
    /// single spaces, phrases re-quoted. Not byte-identical to the input,
    /// but re-parses to an equivalent tree. Empty for unparseable queries.
    pub fn text(&self) -> String {
        match &self.tree {
            Some(tree) => render(tree).trim_start().to_string(),
            None => String::new(),
        }
    }

    /// Compiles `SELECT * FROM <table> [WHERE ...]`. Returns `Ok(None)` when
    /// the query text is non-empty but produced no usable conditions.
    pub fn select(&self) -> Result<Option<Statement>, QueryError> {
        self.statement("SELECT *")
    }

    /// Compiles `SELECT COUNT(*) FROM <table> [WHERE ...]`, with the same
    /// sentinel behavior as [`Query::select`].
    pub fn count(&self) -> Result<Option<Statement>, QueryError> {
        self.statement("SELECT COUNT(*)")
    }

    fn statement(&self, head: &str) -> Result<Option<Statement>, QueryError> {
        let (sqls, values) = match &self.tree {
            Some(tree) => compile_expr(tree, self.entity)?,
            None => (Vec::new(), Vec::new()),
        };
        let conditions = sqls.join(" ");

        if conditions.is_empty() && !self.raw.is_empty() {
            return Ok(None);
        }

        let mut sql = format!("{head} FROM {}", self.entity.table());
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }

        Ok(Some(Statement { sql, values }))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Parses a query string and joins multiple top-level expressions with
/// implicit `AND`, so `foo bar` behaves as `foo AND bar`.
fn parse_tree(raw: &str) -> Option<Node> {
    let mut nodes = GRAMMAR
        .parse("expr", raw)
        .expect("the expr rule is declared")?;

    if nodes.is_empty() {
        return None;
    }
    if nodes.len() == 1 {
        return nodes.pop();
    }

    let mut children = Vec::with_capacity(nodes.len() * 2 - 1);
    for (i, node) in nodes.into_iter().enumerate() {
        if i > 0 {
            children.push(Node::Rule {
                name: "op".to_string(),
                children: vec![Node::Leaf("AND".to_string())],
            });
        }
        children.push(node);
    }
    Some(Node::Rule {
        name: "expr".to_string(),
        children,
    })
}

fn render(node: &Node) -> String {
    match node {
        Node::Leaf(text) => format!(" {text}"),
        Node::Rule { name, children } if name == "quote" => match children.as_slice() {
            [_, Node::Leaf(text), _] => format!(" \"{text}\""),
            _ => String::new(),
        },
        Node::Rule { children, .. } => children.iter().map(render).collect(),
    }
}

type Compiled = (Vec<String>, Vec<Value>);

/// Compiles the children of an `expr` node in order. Operand nodes emit their
/// own conditions and `op` nodes their literal keyword, so plain
/// concatenation yields a well-formed boolean expression.
fn compile_expr(node: &Node, entity: Entity) -> Result<Compiled, QueryError> {
    let mut sqls = Vec::new();
    let mut values = Vec::new();

    for child in node.children() {
        let (name, children) = match child {
            Node::Rule { name, children } => (name.as_str(), children.as_slice()),
            Node::Leaf(text) => return Err(QueryError::UnknownRule(text.clone())),
        };
        let (sql, mut bound) = match NodeKind::from_name(name) {
            Some(NodeKind::Expr) => compile_expr(child, entity)?,
            Some(NodeKind::Neg) => compile_neg(children, entity)?,
            Some(NodeKind::Group) => compile_group(children, entity)?,
            Some(NodeKind::Elm) => compile_elm(children, entity)?,
            Some(NodeKind::Quote) => match children {
                [_, Node::Leaf(text), _] => fields::conditions(entity, text, None),
                _ => return Err(QueryError::UnknownRule(name.to_string())),
            },
            Some(NodeKind::Val) => match children {
                [Node::Leaf(text)] => fields::conditions(entity, text, None),
                _ => return Err(QueryError::UnknownRule(name.to_string())),
            },
            Some(NodeKind::Op) => match children {
                [Node::Leaf(text)] => (vec![text.clone()], Vec::new()),
                _ => return Err(QueryError::UnknownRule(name.to_string())),
            },
            None => return Err(QueryError::UnknownRule(name.to_string())),
        };
        sqls.extend(sql);
        values.append(&mut bound);
    }

    Ok((sqls, values))
}

fn compile_neg(children: &[Node], entity: Entity) -> Result<Compiled, QueryError> {
    let [Node::Leaf(keyword), inner] = children else {
        return Err(QueryError::UnknownRule("neg".to_string()));
    };
    let (inner_sqls, values) = compile_expr(inner, entity)?;
    let mut sqls = Vec::with_capacity(inner_sqls.len() + 1);
    sqls.push(keyword.clone());
    sqls.extend(inner_sqls);
    Ok((sqls, values))
}

fn compile_group(children: &[Node], entity: Entity) -> Result<Compiled, QueryError> {
    let [Node::Leaf(open), inner, Node::Leaf(close)] = children else {
        return Err(QueryError::UnknownRule("group".to_string()));
    };
    let (inner_sqls, values) = compile_expr(inner, entity)?;
    let mut sqls = Vec::with_capacity(inner_sqls.len() + 2);
    sqls.push(open.clone());
    sqls.extend(inner_sqls);
    sqls.push(close.clone());
    Ok((sqls, values))
}

fn compile_elm(children: &[Node], entity: Entity) -> Result<Compiled, QueryError> {
    let [operand, tag] = children else {
        return Err(QueryError::UnknownRule("elm".to_string()));
    };
    let [Node::Leaf(tag_text)] = tag.children() else {
        return Err(QueryError::UnknownRule("tag".to_string()));
    };
    let name = tag_text.trim_start_matches('[').trim_end_matches(']');
    let value = operand_text(operand)?;
    Ok(fields::conditions(entity, value, Tag::from_name(name)))
}

fn operand_text(node: &Node) -> Result<&str, QueryError> {
    match node {
        Node::Rule { name, children } if name == "quote" => match children.as_slice() {
            [_, Node::Leaf(text), _] => Ok(text),
            _ => Err(QueryError::UnknownRule(name.clone())),
        },
        Node::Rule { name, children } => match children.as_slice() {
            [Node::Leaf(text)] => Ok(text),
            _ => Err(QueryError::UnknownRule(name.clone())),
        },
        Node::Leaf(text) => Err(QueryError::UnknownRule(text.clone())),
    }
}
