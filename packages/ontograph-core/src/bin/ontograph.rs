//! Ontograph CLI
//!
//! # Usage
//!
//! ```bash
//! # Load a source into a SQLite-backed graph
//! ontograph --db graph.sqlite ingest doid.obo
//! ontograph --db graph.sqlite ingest terms.ttl --source-tag TEST
//!
//! # Navigate
//! ontograph --db graph.sqlite roots DOID
//! ontograph --db graph.sqlite children DOID:4
//! ontograph --db graph.sqlite ancestors DOID:1612
//!
//! # Search and resolve
//! ontograph --db graph.sqlite search "breast cancer" --exclude DOID:1612
//! ontograph --db graph.sqlite normalize-rows rows.csv
//! ```
//!
//! Results are printed to stdout as JSON. Without `--db` (or a
//! `storage.sqlite_path` in the config) the graph lives in memory for the
//! duration of one command.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ontograph_core::{AuthContext, OntographConfig, OntographService};
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ontograph")]
#[command(about = "Ontology ingestion, hierarchy navigation and search", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides storage.sqlite_path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a source file and merge it into the graph
    Ingest {
        file: PathBuf,

        /// Format hint (ttl, nt, obo, json); defaults to the file extension
        #[arg(long)]
        format: Option<String>,

        /// Prefix for triple-source notations
        #[arg(long)]
        source_tag: Option<String>,
    },

    /// Top-level entries of one source prefix
    Roots { prefix: String },

    /// Direct children of a node
    Children { key: String },

    /// Ancestors of a node, root first
    Ancestors { key: String },

    /// Full-text search over labels and synonyms
    Search {
        query: String,

        /// Codes to leave out of the results
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Resolve every cell of a CSV file against the graph
    NormalizeRows { file: PathBuf },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> ontograph_core::Result<OntographConfig> {
    let mut config = match &cli.config {
        Some(path) => OntographConfig::from_yaml(path)?,
        None => {
            let mut config = OntographConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    if let Some(db) = &cli.db {
        config.storage.sqlite_path = Some(db.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> ontograph_core::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    println!("{}", text);
    Ok(())
}

/// One CSV line → cells. Double-quoted fields may contain commas and `""`.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

fn hint_from_path(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_string)
}

fn run(cli: Cli) -> ontograph_core::Result<()> {
    let config = load_config(&cli)?;
    let service = OntographService::open(config)?;
    let auth = AuthContext::system();

    match cli.command {
        Commands::Ingest {
            file,
            format,
            source_tag,
        } => {
            let bytes = std::fs::read(&file)?;
            let hint = format.or_else(|| hint_from_path(&file));
            let tag = source_tag.unwrap_or_else(|| service.config().parsing.source_tag.clone());
            let report = service.ingest_tagged(&bytes, hint.as_deref(), &tag, &auth)?;
            print_json(&report)
        }
        Commands::Roots { prefix } => print_json(&service.hierarchy().root_entries(&prefix)?),
        Commands::Children { key } => print_json(&service.hierarchy().children(&key)?),
        Commands::Ancestors { key } => print_json(&service.hierarchy().ancestors(&key)?),
        Commands::Search { query, exclude } => print_json(&service.search(&query, &exclude)?),
        Commands::NormalizeRows { file } => {
            let content = std::fs::read_to_string(&file)?;
            let rows: Vec<Vec<String>> = content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(split_csv_line)
                .collect();
            print_json(&service.rows().normalize_rows(&rows)?)
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_csv_line() {
        assert_eq!(split_csv_line("a,b,,c"), vec!["a", "b", "", "c"]);
        assert_eq!(
            split_csv_line(r#""breast cancer, NOS",DOID:1612,"say ""hi""""#),
            vec!["breast cancer, NOS", "DOID:1612", r#"say "hi""#]
        );
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ontograph",
            "search",
            "cancer",
            "--exclude",
            "DO:001",
            "--db",
            "g.sqlite",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("g.sqlite")));
        match cli.command {
            Commands::Search { query, exclude } => {
                assert_eq!(query, "cancer");
                assert_eq!(exclude, vec!["DO:001"]);
            }
            _ => panic!("expected search"),
        }
    }
}
