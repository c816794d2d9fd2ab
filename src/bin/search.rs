//! Interactive search over crawled pages
//!
//! Reads commands from stdin and ranks stored pages by full-text relevance
//! against a single term. Reads the same database the crawler writes.

use clap::Parser;
use harvestman::storage::{SearchHit, SqliteStore};
use std::io::{self, BufRead, Write};
use std::path::Path;

const DEFAULT_LIMIT: usize = 5;

/// Search CLI for the harvestman page store
#[derive(Parser, Debug)]
#[command(name = "harvestman-search")]
#[command(version)]
#[command(about = "Search pages harvested by the crawler", long_about = None)]
struct Cli {
    /// Path to the SQLite database (default crawl.db)
    #[arg(long = "db", value_name = "PATH")]
    database: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let path = cli
        .database
        .or_else(|| std::env::var("HARVESTMAN_DB").ok())
        .unwrap_or_else(|| "crawl.db".to_string());

    let store = SqliteStore::open(Path::new(&path))?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_menu();
        print!("Enter command: ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields[0] == "q" {
            break;
        }

        let word = fields[0];
        let limit = match fields.get(1) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    println!("Invalid limit value");
                    continue;
                }
            },
            None => DEFAULT_LIMIT,
        };

        println!("word: {} limit: {}", word, limit);
        match store.search(word, limit) {
            Ok(hits) => print_results(&hits),
            Err(err) => println!("Error fetching results: {}", err),
        }
    }

    println!();
    println!("Exiting...");
    Ok(())
}

fn print_menu() {
    println!();
    println!("========================================");
    println!("        Harvestman Search CLI");
    println!("========================================");
    println!();
    println!("  q               Quit");
    println!("  <word> <n>      Search pages by word");
    println!("                  <word> = term to search");
    println!("                  <n> (optional) = number of results, default {}", DEFAULT_LIMIT);
    println!();
    println!("  Example:");
    println!("      orange 8");
    println!("      apple");
    println!();
}

fn print_results(hits: &[SearchHit]) {
    println!();
    println!("Query Results:");
    if hits.is_empty() {
        println!("  (no matches)");
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("{}. URL: {}     SCORE: {:.4}", i + 1, hit.url, hit.score);
        println!("CONTENT:");
        println!("{}", hit.content);
        println!();
    }
    println!();
}
