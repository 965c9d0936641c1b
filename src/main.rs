mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use folio::{Entity, Library, Matches, Query};
use std::io::Write;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let library = if cli.new {
        Library::create(&cli.db)?
    } else {
        Library::open(&cli.db)?
    };

    println!("Search the library as `<query>` or `<entity>: <query>`; /bye quits.");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush().context("Flush prompt failed.")?;
        let mut line = String::new();
        if stdin.read_line(&mut line).context("Read input failed.")? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        } else if line == "/bye" {
            break;
        }

        let (entity, text) = parse_line(line);
        let query = Query::new(text, entity);
        match library.search(&query) {
            Ok(matches) => print_matches(&matches),
            Err(e) => eprintln!("Search failed: {e:?}"),
        }
    }

    Ok(())
}

/// Splits an optional `entity:` prefix off the query line; anything else
/// searches articles.
fn parse_line(line: &str) -> (Entity, &str) {
    if let Some((head, rest)) = line.split_once(':') {
        if let Some(entity) = Entity::from_name(head.trim()) {
            return (entity, rest.trim());
        }
    }
    (Entity::Articles, line)
}

fn print_matches(matches: &Matches) {
    match matches {
        Matches::Articles(articles) => {
            for (i, article) in articles.iter().enumerate() {
                let key = article.key.as_deref().unwrap_or("----");
                let title = article.title.as_deref().unwrap_or("(untitled)");
                let journal = article
                    .journal
                    .as_ref()
                    .map(|journal| journal.title.as_str())
                    .unwrap_or("-");
                println!("[{i}] {key} {title} ({journal})");
            }
        }
        Matches::Journals(journals) => {
            for (i, journal) in journals.iter().enumerate() {
                let abbreviation = journal.abbreviation.as_deref().unwrap_or("-");
                println!("[{i}] {} ({abbreviation})", journal.title);
            }
        }
        Matches::Authors(authors) => {
            for (i, author) in authors.iter().enumerate() {
                println!("[{i}] {}", author.shortname);
            }
        }
        Matches::Labels(labels) => {
            for (i, label) in labels.iter().enumerate() {
                println!("[{i}] {}", label.title);
            }
        }
        Matches::Collections(collections) => {
            for (i, collection) in collections.iter().enumerate() {
                println!("[{i}] {}", collection.title);
            }
        }
    }
    println!("{} match(es)", matches.len());
}
