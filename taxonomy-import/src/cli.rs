///
/// This module implements the CLI interface for taxonomy-import: command parsing,
/// argument validation and wiring the concrete API clients into the core importer.
///
/// All domain logic (slugging, resolving, the import loop) lives in
/// [`taxonomy-import-core`]. This module only builds clients, reads the input
/// file and reports the outcome.
///
/// ## Commands
/// - `import <FILE>`: the actual import. `--dry-run` validates and counts without
///   touching the remote APIs. The sheet is read before the configuration, so
///   an unreadable or empty sheet fails without needing credentials.
/// - `find`, `search`, `resolve-path`: read-only Discovery diagnostics.
///
/// ## How To Use
/// - For command-line users: run the installed `taxonomy-import` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`taxonomy-import-core`]: ../../taxonomy-import-core/
use crate::discovery::DiscoveryClient;
use crate::load_config::load_config;
use crate::pim::PimClient;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use taxonomy_import_core::cache::PathCache;
use taxonomy_import_core::config::ImporterConfig;
use taxonomy_import_core::contract::{Discovery, FolderNode, NodeQuery, Shape};
use taxonomy_import_core::import::{run_import, DriverOptions, ImportRecord, ImportReport};
use taxonomy_import_core::input::read_records;
use taxonomy_import_core::resolver::{HierarchyResolver, ResolverOptions};

/// CLI for taxonomy-import: idempotent brand/model-line folder import.
#[derive(Parser)]
#[clap(
    name = "taxonomy-import",
    version,
    about = "Import a merk/modellijn/sub-modellijn sheet into the CMS folder tree"
)]
pub struct Cli {
    /// Optional YAML file with locales and tuning; secrets always come from the environment
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import every row of an Excel workbook or CSV export into the folder tree
    Import {
        /// Path to the sheet (.xlsx/.xls/.ods read as a workbook, anything else as CSV)
        /// with a header row naming merk, modellijn, sub-modellijn. A sheet without
        /// data rows is an error.
        file: PathBuf,
        /// Validate and count only; no remote calls
        #[clap(long)]
        dry_run: bool,
        /// Field delimiter for CSV input; ignored for workbooks
        #[clap(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Look up a single folder by exact name and shape
    Find {
        name: String,
        /// Shape identifier, e.g. merk, modellijn, sub-modellijn
        #[clap(long)]
        shape: String,
        /// Only accept folders within this path
        #[clap(long)]
        parent: Option<String>,
    },
    /// Broad search over folder names
    Search {
        term: String,
        #[clap(long)]
        shape: Option<String>,
    },
    /// Print the path of a folder id
    ResolvePath { id: String },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Import {
            file,
            dry_run,
            delimiter,
        } => {
            if !file.is_file() {
                tracing::error!(command = "import", path = ?file, "Input file not found");
                return Err(anyhow!("Input file not found: {}", file.display()));
            }
            if !delimiter.is_ascii() {
                return Err(anyhow!("Delimiter must be a single ASCII character, got {delimiter:?}"));
            }
            let records = read_records(&file, delimiter as u8)?;
            let config = load_config(cli.config.as_deref())?;
            import(&config, &records, dry_run).await
        }
        Commands::Find {
            name,
            shape,
            parent,
        } => {
            let discovery = discovery_client(&load_config(cli.config.as_deref())?)?;
            let shape = Shape::from_identifier(&shape);
            let query = NodeQuery {
                name: &name,
                shape: &shape,
                parent_path: parent.as_deref(),
            };
            match discovery.find_node(query).await {
                Some(node) => println!("{}", format_node(&node)),
                None => println!("No {shape} folder named {name:?} found"),
            }
            Ok(())
        }
        Commands::Search { term, shape } => {
            let discovery = discovery_client(&load_config(cli.config.as_deref())?)?;
            let hits = discovery
                .search_by_term(&term, shape.as_deref().map(Shape::from_identifier))
                .await;
            println!("{} folder(s) found for {term:?}", hits.len());
            for node in &hits {
                println!("{}", format_node(node));
            }
            Ok(())
        }
        Commands::ResolvePath { id } => {
            let discovery = discovery_client(&load_config(cli.config.as_deref())?)?;
            match discovery.resolve_path_by_id(&id).await {
                Some(path) => println!("{path}"),
                None => println!("No path found for id {id:?}"),
            }
            Ok(())
        }
    }
}

fn discovery_client(config: &ImporterConfig) -> Result<DiscoveryClient> {
    Ok(DiscoveryClient::new(
        &config.discovery,
        &config.locales.language,
        config.tuning.request_timeout(),
    )?)
}

async fn import(config: &ImporterConfig, records: &[ImportRecord], dry_run: bool) -> Result<()> {
    let discovery = Arc::new(discovery_client(config)?);
    let writer = PimClient::new(
        &config.pim,
        config.locales.clone(),
        config.tuning.request_timeout(),
        Arc::clone(&discovery),
    )?;
    let resolver = HierarchyResolver::new(
        discovery,
        writer,
        ResolverOptions::from(&config.tuning),
    );

    tracing::info!(command = "import", records = records.len(), dry_run, "Starting import");
    let options = DriverOptions::from_tuning(&config.tuning, dry_run);
    let mut cache = PathCache::new();
    let report = run_import(records, &resolver, &options, &mut cache).await;
    tracing::info!(command = "import", stats = ?report.stats, cached_paths = cache.len(), "Import complete");

    print!("{}", format_summary(&report, dry_run));
    Ok(())
}

fn format_node(node: &FolderNode) -> String {
    format!("{}\t{}\t{}\t{}", node.path, node.name, node.shape, node.id)
}

fn format_summary(report: &ImportReport, dry_run: bool) -> String {
    let s = &report.stats;
    let mut out = String::new();
    out.push_str(if dry_run {
        "=== IMPORT SUMMARY (DRY RUN) ===\n"
    } else {
        "=== IMPORT SUMMARY ===\n"
    });
    for (label, value) in [
        ("Total Processed", s.processed),
        ("Newly Created", s.created),
        ("Already Exists", s.already_exists),
        ("Failed", s.failed),
        ("Skipped", s.skipped),
        ("Unconfirmed", s.unconfirmed),
    ] {
        out.push_str(&format!("{label:<16}{value:>8}\n"));
    }
    for issue in &report.failed {
        out.push_str(&format!("FAILED  row {}: {} ({})\n", issue.row, issue.label, issue.message));
    }
    for issue in &report.skipped {
        out.push_str(&format!("SKIPPED row {}: {} ({})\n", issue.row, issue.label, issue.message));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxonomy_import_core::import::{ImportStats, RecordIssue};

    #[test]
    fn summary_lists_every_counter_and_issue() {
        let report = ImportReport {
            stats: ImportStats {
                processed: 4,
                created: 1,
                already_exists: 1,
                failed: 1,
                skipped: 1,
                unconfirmed: 1,
            },
            failed: vec![RecordIssue {
                row: 3,
                label: "Acme / Pro / Pro X".into(),
                message: "boom".into(),
            }],
            skipped: vec![],
        };
        let text = format_summary(&report, false);
        assert!(text.starts_with("=== IMPORT SUMMARY ===\n"));
        assert!(text
            .lines()
            .any(|l| l.starts_with("Total Processed") && l.ends_with(" 4")));
        assert!(text.contains("Unconfirmed"));
        assert!(text.contains("FAILED  row 3: Acme / Pro / Pro X (boom)"));
    }

    #[test]
    fn cli_parses_import_flags() {
        let cli = Cli::parse_from([
            "taxonomy-import",
            "import",
            "sheet.csv",
            "--dry-run",
            "--delimiter",
            ";",
            "--config",
            "importer.yaml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("importer.yaml")));
        match cli.command {
            Commands::Import {
                file,
                dry_run,
                delimiter,
            } => {
                assert_eq!(file, PathBuf::from("sheet.csv"));
                assert!(dry_run);
                assert_eq!(delimiter, ';');
            }
            _ => panic!("expected import command"),
        }
    }
}
