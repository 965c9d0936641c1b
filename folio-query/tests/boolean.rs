mod common;

use common::*;
use folio_query::{Entity, Query};

#[test]
fn and_chains_concatenate_conditions() {
    let statement = select("a[TI] AND b[TI]", Entity::Articles);
    assert_eq!(
        conditions(&statement),
        "(LOWER(articles.title) LIKE ?) AND (LOWER(articles.title) LIKE ?)"
    );
    assert_eq!(statement.values, vec![like("a"), like("b")]);
}

#[test]
fn or_chains_concatenate_conditions() {
    let statement = select("a[TI] OR b[AB]", Entity::Articles);
    assert_eq!(
        conditions(&statement),
        "(LOWER(articles.title) LIKE ?) OR (LOWER(articles.abstract) LIKE ?)"
    );
    assert_eq!(statement.values, vec![like("a"), like("b")]);
}

#[test]
fn adjacent_terms_behave_as_an_explicit_and() {
    let implicit = select("a[TI] b[TI]", Entity::Articles);
    let explicit = select("a[TI] AND b[TI]", Entity::Articles);
    assert_eq!(implicit, explicit);
}

#[test]
fn negated_group_wraps_or_joined_conditions() {
    let statement = select("NOT (foo[TI] OR bar[TI])", Entity::Articles);
    let clause = conditions(&statement);
    assert!(clause.starts_with("NOT ("), "clause: {clause}");
    assert_eq!(
        clause,
        "NOT ( (LOWER(articles.title) LIKE ?) OR (LOWER(articles.title) LIKE ?) )"
    );
    assert_eq!(statement.values, vec![like("foo"), like("bar")]);
}

#[test]
fn groups_nest() {
    let statement = select("((a[TI]))", Entity::Articles);
    assert_eq!(
        conditions(&statement),
        "( ( (LOWER(articles.title) LIKE ?) ) )"
    );
}

#[test]
fn groups_chain_with_operators() {
    let statement = select("(a[TI] OR b[TI]) AND c[AB]", Entity::Articles);
    assert_eq!(
        conditions(&statement),
        "( (LOWER(articles.title) LIKE ?) OR (LOWER(articles.title) LIKE ?) ) \
         AND (LOWER(articles.abstract) LIKE ?)"
    );
    assert_eq!(statement.values, vec![like("a"), like("b"), like("c")]);
}

#[test]
fn negation_binds_the_rest_of_the_expression() {
    let statement = select("NOT missing[PDF]", Entity::Articles);
    assert_eq!(conditions(&statement), "NOT articles.pdf = ?");
}

#[test]
fn empty_query_selects_everything() {
    let query = Query::new("", Entity::Articles);
    let statement = query.select().unwrap().unwrap();
    assert_eq!(statement.sql, "SELECT * FROM articles");
    assert!(statement.values.is_empty());

    let statement = query.count().unwrap().unwrap();
    assert_eq!(statement.sql, "SELECT COUNT(*) FROM articles");
}

#[test]
fn unparseable_query_is_a_sentinel_not_an_error() {
    select_none("[", Entity::Articles);
    select_none("(never closed", Entity::Articles);
    select_none("\"unterminated[TI]", Entity::Articles);
}

#[test]
fn placeholder_count_always_matches_bound_values() {
    let cases = [
        "smith[AU] AND (cancer OR tumor)",
        "NOT (a[TI] OR b[AB]) AND c",
        "foo bar baz",
        "\"complex phrase\"[AB] OR plain",
        "red[COLOUR] 1[PDF] 4[RAE]",
        "x[RATING] AND real[TI]",
        "42[ID] OR NULL[PMID]",
    ];
    for case in cases {
        let query = Query::new(case, Entity::Articles);
        if let Some(statement) = query.select().unwrap() {
            assert_eq!(
                placeholders(&statement.sql),
                statement.values.len(),
                "case: {case}"
            );
        }
    }
}
