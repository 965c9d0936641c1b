//! End-to-end searches against an in-memory library.

use folio::entity::{Article, Author, Collection, Journal, Label};
use folio::{Entity, Library, Matches, Query};

fn article_titles(matches: &Matches) -> Vec<String> {
    match matches {
        Matches::Articles(articles) => articles
            .iter()
            .map(|article| article.title.clone().unwrap_or_default())
            .collect(),
        other => panic!("expected articles, got: {other:?}"),
    }
}

fn search(library: &Library, query: &str) -> Vec<String> {
    let matches = library
        .search(&Query::new(query, Entity::Articles))
        .unwrap();
    let mut titles = article_titles(&matches);
    titles.sort();
    titles
}

/// Three articles: two in Nature Medicine by Smith/Doe (one rated 4 with a
/// PDF, label and collection), one unrelated by Okafor.
fn sample_library() -> Library {
    let library = Library::in_memory().unwrap();

    let mut nature = Journal {
        id: None,
        title: "Nature Medicine".to_string(),
        abbreviation: Some("Nat Med".to_string()),
    };
    library.insert_journal(&mut nature).unwrap();

    let mut smith = Author {
        shortname: "Smith J".to_string(),
        lastname: "Smith".to_string(),
        firstname: "Jane".to_string(),
        initials: Some("J".to_string()),
        ..Default::default()
    };
    library.insert_author(&mut smith).unwrap();
    let mut doe = Author {
        shortname: "Doe R".to_string(),
        lastname: "Doe".to_string(),
        firstname: "Robert".to_string(),
        ..Default::default()
    };
    library.insert_author(&mut doe).unwrap();
    let mut okafor = Author {
        shortname: "Okafor N".to_string(),
        lastname: "Okafor".to_string(),
        firstname: "Ngozi".to_string(),
        ..Default::default()
    };
    library.insert_author(&mut okafor).unwrap();

    let mut urgent = Label {
        id: None,
        title: "Urgent".to_string(),
    };
    library.insert_label(&mut urgent).unwrap();

    let mut immuno = Collection {
        title: "Immunotherapy".to_string(),
        ..Default::default()
    };
    library.insert_collection(&mut immuno).unwrap();

    let mut first = Article {
        title: Some("Cancer immunotherapy advances".to_string()),
        abstract_text: Some("Checkpoint inhibitors in solid tumours.".to_string()),
        doi: Some("10.1000/XYZ".to_string()),
        pmid: Some("31622404".to_string()),
        year: Some(2024),
        rating: 4,
        pdf: true,
        colour: Some("ff6e64".to_string()),
        journal: Some(nature.clone()),
        authors: vec![smith.clone(), doe.clone()],
        labels: vec![urgent.clone()],
        collections: vec![immuno.clone()],
        ..Default::default()
    };
    library.insert_article(&mut first).unwrap();

    let mut second = Article {
        title: Some("Tumor suppressor pathways".to_string()),
        abstract_text: Some("P53 and friends.".to_string()),
        year: Some(2023),
        rating: 2,
        journal: Some(nature.clone()),
        authors: vec![doe.clone(), smith.clone()],
        ..Default::default()
    };
    library.insert_article(&mut second).unwrap();

    let mut third = Article {
        title: Some("Keratin structure in hair".to_string()),
        abstract_text: Some("Fibrous proteins.".to_string()),
        year: Some(2020),
        rating: 5,
        authors: vec![okafor.clone()],
        ..Default::default()
    };
    library.insert_article(&mut third).unwrap();

    library
}

#[test]
fn empty_query_returns_every_article() {
    let library = sample_library();
    assert_eq!(search(&library, "").len(), 3);
}

#[test]
fn title_and_abstract_tags_match_substrings() {
    let library = sample_library();
    assert_eq!(
        search(&library, "cancer[TI]"),
        vec!["Cancer immunotherapy advances"]
    );
    assert_eq!(
        search(&library, "tumor[TI]"),
        vec!["Tumor suppressor pathways"]
    );
    assert_eq!(
        search(&library, "tumours[AB]"),
        vec!["Cancer immunotherapy advances"]
    );
}

#[test]
fn untagged_terms_combine_with_implicit_and() {
    let library = sample_library();
    assert_eq!(
        search(&library, "checkpoint inhibitors"),
        vec!["Cancer immunotherapy advances"]
    );
}

#[test]
fn author_tags_follow_the_link_table() {
    let library = sample_library();
    assert_eq!(search(&library, "smith[AU]").len(), 2);
    // Smith leads the first article and closes the second
    assert_eq!(
        search(&library, "smith[FAU]"),
        vec!["Cancer immunotherapy advances"]
    );
    assert_eq!(
        search(&library, "smith[LAU]"),
        vec!["Tumor suppressor pathways"]
    );
    assert_eq!(search(&library, "okafor[LAU]"), vec!["Keratin structure in hair"]);
}

#[test]
fn author_id_tag_matches_link_rows() {
    let library = sample_library();
    let Matches::Authors(authors) = library
        .search(&Query::new("Smith", Entity::Authors))
        .unwrap()
    else {
        panic!("expected authors");
    };
    let id = authors[0].id.unwrap();
    assert_eq!(search(&library, &format!("{id}[AUID]")).len(), 2);
}

#[test]
fn negated_groups_exclude_their_matches() {
    let library = sample_library();
    assert_eq!(
        search(&library, "NOT (cancer[TI] OR tumor[TI])"),
        vec!["Keratin structure in hair"]
    );
}

#[test]
fn journal_year_and_doi_tags() {
    let library = sample_library();
    assert_eq!(search(&library, "nature[JT]").len(), 2);
    assert_eq!(search(&library, "med[JA]").len(), 2);
    assert_eq!(
        search(&library, "2024[PY]"),
        vec!["Cancer immunotherapy advances"]
    );
    assert_eq!(
        search(&library, "10.1000[DOI]"),
        vec!["Cancer immunotherapy advances"]
    );
    assert_eq!(search(&library, "NULL[PMID]").len(), 2);
    assert_eq!(search(&library, "31622404[PMID]").len(), 1);
}

#[test]
fn rating_colour_and_pdf_tags() {
    let library = sample_library();
    assert_eq!(
        search(&library, "red[COLOUR]"),
        vec!["Cancer immunotherapy advances"]
    );
    assert_eq!(search(&library, "yes[PDF]").len(), 1);
    assert_eq!(search(&library, "no[PDF]").len(), 2);
    assert_eq!(
        library.count(&Query::new("4[RATING]", Entity::Articles)).unwrap(),
        1
    );
    assert_eq!(
        library.count(&Query::new("3[RAE]", Entity::Articles)).unwrap(),
        2
    );
}

#[test]
fn recent_filters_by_import_time() {
    let library = sample_library();
    // everything was imported moments ago
    assert_eq!(search(&library, "1[RECENT]").len(), 3);
    // a negative day count pushes the cutoff into the future
    assert_eq!(search(&library, "-1[RECENT]").len(), 0);
}

#[test]
fn labels_and_collections_link_to_articles() {
    let library = sample_library();
    assert_eq!(
        search(&library, "urgent[LB]"),
        vec!["Cancer immunotherapy advances"]
    );

    let Matches::Collections(collections) = library
        .search(&Query::new("immuno", Entity::Collections))
        .unwrap()
    else {
        panic!("expected collections");
    };
    let id = collections[0].id.unwrap();
    assert_eq!(search(&library, &format!("{id}[COLLECTIONID]")).len(), 1);
}

#[test]
fn other_entities_search_their_default_fields() {
    let library = sample_library();
    assert_eq!(
        library.search(&Query::new("nat", Entity::Journals)).unwrap().len(),
        1
    );
    assert_eq!(
        library.search(&Query::new("smith", Entity::Authors)).unwrap().len(),
        1
    );
    assert_eq!(
        library.search(&Query::new("urg", Entity::Labels)).unwrap().len(),
        1
    );
}

#[test]
fn unparseable_queries_return_no_results() {
    let library = sample_library();
    let matches = library.search(&Query::new("[", Entity::Articles)).unwrap();
    assert!(matches.is_empty());
    assert_eq!(library.count(&Query::new("[", Entity::Articles)).unwrap(), 0);
}

#[test]
fn search_hydrates_article_links() {
    let library = sample_library();
    let Matches::Articles(articles) = library
        .search(&Query::new("cancer[TI]", Entity::Articles))
        .unwrap()
    else {
        panic!("expected articles");
    };
    let article = &articles[0];

    assert_eq!(article.key.as_ref().unwrap().len(), 4);
    assert_eq!(article.journal.as_ref().unwrap().title, "Nature Medicine");
    let shortnames: Vec<&str> = article
        .authors
        .iter()
        .map(|author| author.shortname.as_str())
        .collect();
    assert_eq!(shortnames, ["Smith J", "Doe R"]);
    assert_eq!(article.labels[0].title, "Urgent");
    assert_eq!(article.collections[0].title, "Immunotherapy");
    assert!(article.pdf);
}

#[test]
fn trash_delete_and_update_round_trip() {
    let library = sample_library();
    let Matches::Articles(articles) = library
        .search(&Query::new("keratin[TI]", Entity::Articles))
        .unwrap()
    else {
        panic!("expected articles");
    };
    let mut article = articles.into_iter().next().unwrap();
    let id = article.id.unwrap();

    library.trash(&[id], true).unwrap();
    assert_eq!(search(&library, "1[TRASH]"), vec!["Keratin structure in hair"]);
    library.trash(&[id], false).unwrap();
    assert_eq!(search(&library, "1[TRASH]").len(), 0);

    article.title = Some("Keratin assembly revisited".to_string());
    article.rating = 1;
    library.update_article(&mut article).unwrap();
    assert_eq!(search(&library, "assembly[TI]").len(), 1);
    assert_eq!(
        library.count(&Query::new("1[RATING]", Entity::Articles)).unwrap(),
        1
    );

    library.delete_article(id).unwrap();
    assert_eq!(search(&library, "").len(), 2);
}

#[test]
fn articles_serialize_to_json() {
    let library = sample_library();
    let Matches::Articles(articles) = library
        .search(&Query::new("cancer[TI]", Entity::Articles))
        .unwrap()
    else {
        panic!("expected articles");
    };
    let json = serde_json::to_value(&articles[0]).unwrap();
    assert_eq!(json["title"], "Cancer immunotherapy advances");
    assert_eq!(json["journal"]["title"], "Nature Medicine");
}

#[test]
fn create_then_open_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.db");
    {
        let library = Library::create(&path).unwrap();
        let mut label = Label {
            id: None,
            title: "Archived".to_string(),
        };
        library.insert_label(&mut label).unwrap();
    }

    let library = Library::open(&path).unwrap();
    let matches = library.search(&Query::new("archived", Entity::Labels)).unwrap();
    assert_eq!(matches.len(), 1);

    assert!(Library::create(&path).is_err());
    assert!(Library::open(&dir.path().join("missing.db")).is_err());
}
