//! Per-entity field resolution: turns one `(value, tag)` pair into SQL
//! condition fragments and bound values for the target entity table.

use crate::{Entity, Tag, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const DAY_SECONDS: i64 = 60 * 60 * 24;

pub(crate) fn conditions(entity: Entity, value: &str, tag: Option<Tag>) -> (Vec<String>, Vec<Value>) {
    match entity {
        Entity::Articles => articles(value, tag),
        Entity::Journals => journals(value, tag),
        Entity::Authors => authors(value, tag),
        Entity::Labels => labels(value, tag),
        Entity::Collections => collections(value, tag),
    }
}

fn articles(value: &str, tag: Option<Tag>) -> (Vec<String>, Vec<Value>) {
    let mut sqls = Vec::new();
    let mut values = Vec::new();

    let value_lower = value.to_lowercase();
    let value_like = format!("%{value_lower}%");

    match tag {
        Some(Tag::Id) => {
            sqls.push("(articles.id = ?)".to_string());
            values.push(Value::Text(value.to_string()));
        }

        Some(Tag::Key) => {
            sqls.push("(articles.key = ?)".to_string());
            values.push(Value::Text(value.to_string()));
        }

        // the literal value NULL tests for a missing PMID instead of binding
        Some(Tag::Pmid) => {
            if value == "NULL" {
                sqls.push("(articles.pmid IS NULL)".to_string());
            } else {
                sqls.push("(articles.pmid = ?)".to_string());
                values.push(Value::Text(value.to_string()));
            }
        }

        Some(Tag::Doi) => {
            sqls.push("(LOWER(articles.doi) LIKE ?)".to_string());
            values.push(Value::Text(value_like.clone()));
        }

        // a non-integer day count contributes no condition at all
        Some(Tag::Recent) => {
            if let Ok(days) = value.parse::<i64>() {
                sqls.push("(articles.imported >= ?)".to_string());
                values.push(Value::Int(unix_now() - days * DAY_SECONDS));
            }
        }

        Some(Tag::Year) => {
            sqls.push("(articles.year = ?)".to_string());
            values.push(Value::Text(value.to_string()));
        }

        Some(Tag::Title) => {
            sqls.push("(LOWER(articles.title) LIKE ?)".to_string());
            values.push(Value::Text(value_like.clone()));
        }

        Some(Tag::Abstract) => {
            sqls.push("(LOWER(articles.abstract) LIKE ?)".to_string());
            values.push(Value::Text(value_like.clone()));
        }

        Some(Tag::Note) => {
            sqls.push("(LOWER(articles.notes) LIKE ?)".to_string());
            values.push(Value::Text(value_like.clone()));
        }

        Some(Tag::Colour) => {
            sqls.push("LOWER(articles.colour) = ?".to_string());
            let code = match colour_code(&value_lower) {
                Some(code) => code.to_string(),
                None => value_lower.clone(),
            };
            values.push(Value::Text(code));
        }

        Some(Tag::Pdf) => {
            sqls.push("articles.pdf = ?".to_string());
            values.push(Value::Int(bool_token(value)));
        }

        Some(Tag::Rating) => {
            if let Ok(rating) = value.parse::<i64>() {
                sqls.push("articles.rating = ?".to_string());
                values.push(Value::Int(rating));
            }
        }

        Some(Tag::RatingAtMost) => {
            if let Ok(rating) = value.parse::<i64>() {
                sqls.push("articles.rating <= ?".to_string());
                values.push(Value::Int(rating));
            }
        }

        Some(Tag::RatingAtLeast) => {
            if let Ok(rating) = value.parse::<i64>() {
                sqls.push("articles.rating >= ?".to_string());
                values.push(Value::Int(rating));
            }
        }

        Some(Tag::Trash) => {
            sqls.push("articles.deleted = ?".to_string());
            values.push(Value::Int(bool_token(value)));
        }

        Some(Tag::JournalTitle) => {
            sqls.push(
                "((SELECT COUNT(*) FROM journals \
                 WHERE articles.journal = journals.id \
                 AND LOWER(journals.title) LIKE ?) != 0)"
                    .to_string(),
            );
            values.push(Value::Text(value_like.clone()));
        }

        Some(Tag::JournalAbbreviation) => {
            sqls.push(
                "((SELECT COUNT(*) FROM journals \
                 WHERE articles.journal = journals.id \
                 AND LOWER(journals.abbreviation) LIKE ?) != 0)"
                    .to_string(),
            );
            values.push(Value::Text(value_like.clone()));
        }

        Some(Tag::Author) => {
            sqls.push(
                "((SELECT COUNT(*) FROM articles_authors \
                 LEFT JOIN authors ON articles_authors.author = authors.id \
                 WHERE articles_authors.article = articles.id \
                 AND LOWER(authors.shortname) LIKE ?) != 0)"
                    .to_string(),
            );
            values.push(Value::Text(value_like.clone()));
        }

        Some(Tag::AuthorId) => {
            sqls.push(
                "((SELECT COUNT(*) FROM articles_authors \
                 WHERE articles_authors.article = articles.id \
                 AND articles_authors.author = ?) != 0)"
                    .to_string(),
            );
            values.push(Value::Text(value.to_string()));
        }

        // first author sits at priority 0
        Some(Tag::FirstAuthor) => {
            sqls.push(
                "((SELECT COUNT(*) FROM articles_authors \
                 LEFT JOIN authors ON articles_authors.author = authors.id \
                 WHERE articles_authors.article = articles.id \
                 AND articles_authors.priority = 0 \
                 AND LOWER(authors.shortname) LIKE ?) != 0)"
                    .to_string(),
            );
            values.push(Value::Text(value_like.clone()));
        }

        // last author sits at the article's maximum priority
        Some(Tag::LastAuthor) => {
            sqls.push(
                "((SELECT COUNT(*) FROM (SELECT * FROM articles_authors \
                 LEFT JOIN authors ON articles_authors.author = authors.id \
                 WHERE articles_authors.article = articles.id \
                 AND LOWER(authors.shortname) LIKE ? \
                 AND articles_authors.priority = (\
                 SELECT MAX(t1.priority) FROM articles_authors t1 \
                 WHERE t1.article = articles.id))) != 0)"
                    .to_string(),
            );
            values.push(Value::Text(value_like.clone()));
        }

        Some(Tag::Label) => {
            sqls.push(
                "((SELECT COUNT(*) FROM articles_labels \
                 LEFT JOIN labels ON articles_labels.label = labels.id \
                 WHERE articles_labels.article = articles.id \
                 AND LOWER(labels.title) = ?) != 0)"
                    .to_string(),
            );
            values.push(Value::Text(value_lower.clone()));
        }

        Some(Tag::LabelId) => {
            sqls.push(
                "((SELECT COUNT(*) FROM articles_labels \
                 WHERE articles_labels.article = articles.id \
                 AND articles_labels.label = ?) != 0)"
                    .to_string(),
            );
            values.push(Value::Text(value.to_string()));
        }

        Some(Tag::CollectionId) => {
            sqls.push(
                "((SELECT COUNT(*) FROM articles_collections \
                 WHERE articles_collections.article = articles.id \
                 AND articles_collections.collection = ?) != 0)"
                    .to_string(),
            );
            values.push(Value::Text(value.to_string()));
        }

        None => {
            sqls.push(
                "(articles.key = ? \
                 OR articles.pmid = ? \
                 OR LOWER(articles.doi) = ? \
                 OR LOWER(articles.title) LIKE ? \
                 OR LOWER(articles.abstract) LIKE ? \
                 OR LOWER(articles.notes) LIKE ? \
                 OR (SELECT COUNT(*) FROM journals \
                 WHERE journals.id = articles.journal \
                 AND (LOWER(journals.title) LIKE ? \
                 OR LOWER(journals.abbreviation) LIKE ?)) != 0 \
                 OR (SELECT COUNT(*) FROM articles_authors \
                 LEFT JOIN authors ON articles_authors.author = authors.id \
                 WHERE articles_authors.article = articles.id \
                 AND LOWER(authors.shortname) LIKE ?) != 0 \
                 OR (SELECT COUNT(*) FROM articles_labels \
                 LEFT JOIN labels ON articles_labels.label = labels.id \
                 WHERE articles_labels.article = articles.id \
                 AND LOWER(labels.title) LIKE ?) != 0)"
                    .to_string(),
            );
            values.extend([
                Value::Text(value.to_string()),
                Value::Text(value.to_string()),
                Value::Text(value_lower.clone()),
                Value::Text(value_like.clone()),
                Value::Text(value_like.clone()),
                Value::Text(value_like.clone()),
                Value::Text(value_like.clone()),
                Value::Text(value_like.clone()),
                Value::Text(value_like.clone()),
                Value::Text(value_like.clone()),
            ]);
        }
    }

    (sqls, values)
}

fn journals(value: &str, tag: Option<Tag>) -> (Vec<String>, Vec<Value>) {
    let mut sqls = Vec::new();
    let mut values = Vec::new();
    let value_like = format!("%{}%", value.to_lowercase());

    match tag {
        Some(Tag::Id) => {
            sqls.push("(id = ?)".to_string());
            values.push(Value::Text(value.to_string()));
        }
        _ => {
            sqls.push("(LOWER(title) LIKE ? OR LOWER(abbreviation) LIKE ?)".to_string());
            values.push(Value::Text(value_like.clone()));
            values.push(Value::Text(value_like));
        }
    }

    (sqls, values)
}

fn authors(value: &str, tag: Option<Tag>) -> (Vec<String>, Vec<Value>) {
    let mut sqls = Vec::new();
    let mut values = Vec::new();
    let value_like = format!("%{}%", value.to_lowercase());

    match tag {
        Some(Tag::Id) => {
            sqls.push("(id = ?)".to_string());
            values.push(Value::Text(value.to_string()));
        }
        _ => {
            sqls.push(
                "(LOWER(shortname) LIKE ? OR LOWER(lastname) LIKE ? OR LOWER(firstname) LIKE ?)"
                    .to_string(),
            );
            values.push(Value::Text(value_like.clone()));
            values.push(Value::Text(value_like.clone()));
            values.push(Value::Text(value_like));
        }
    }

    (sqls, values)
}

fn labels(value: &str, tag: Option<Tag>) -> (Vec<String>, Vec<Value>) {
    title_only(value, tag)
}

fn collections(value: &str, tag: Option<Tag>) -> (Vec<String>, Vec<Value>) {
    title_only(value, tag)
}

fn title_only(value: &str, tag: Option<Tag>) -> (Vec<String>, Vec<Value>) {
    let mut sqls = Vec::new();
    let mut values = Vec::new();

    match tag {
        Some(Tag::Id) => {
            sqls.push("(id = ?)".to_string());
            values.push(Value::Text(value.to_string()));
        }
        _ => {
            sqls.push("(LOWER(title) LIKE ?)".to_string());
            values.push(Value::Text(format!("%{}%", value.to_lowercase())));
        }
    }

    (sqls, values)
}

/// Maps the seven colour names to their mark hex codes. Unknown names pass
/// through unchanged (the caller may already hold a hex code).
fn colour_code(name: &str) -> Option<&'static str> {
    match name {
        "red" => Some("ff6e64"),
        "orange" => Some("ffb941"),
        "yellow" => Some("f0e646"),
        "green" => Some("b4e646"),
        "blue" => Some("64afff"),
        "purple" => Some("dc8cf0"),
        "gray" => Some("c8c8c8"),
        _ => None,
    }
}

/// Boolean-like tokens in any case; anything unrecognized counts as false.
fn bool_token(value: &str) -> i64 {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => 1,
        _ => 0,
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_names_map_to_codes() {
        assert_eq!(colour_code("red"), Some("ff6e64"));
        assert_eq!(colour_code("gray"), Some("c8c8c8"));
        assert_eq!(colour_code("teal"), None);
    }

    #[test]
    fn bool_tokens_default_to_false() {
        assert_eq!(bool_token("1"), 1);
        assert_eq!(bool_token("TRUE"), 1);
        assert_eq!(bool_token("Yes"), 1);
        assert_eq!(bool_token("0"), 0);
        assert_eq!(bool_token("no"), 0);
        assert_eq!(bool_token("maybe"), 0);
    }
}
