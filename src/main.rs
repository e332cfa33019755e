use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::{Path, PathBuf};
use std::time::Instant;
use time::macros::format_description;

mod clients;
mod config;
mod context;
mod dump;
mod entity;
mod isbn;
mod jobs;
mod merge;
mod records;
mod registry;
mod report;
mod util;

use clients::{HttpOpenLibrary, HttpWikidata};
use config::SyncConfig;
use context::RunContext;
use util::format_elapsed;

#[derive(Parser)]
#[command(name = "ol-wikidata-sync")]
#[command(about = "Reconciles author and edition identifiers between Open Library and Wikidata.")]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "INFO", help = "Logging level (DEBUG, INFO, WARN, ERROR)")]
    log_level: String,
    #[arg(long, help = "Path to the endpoints configuration YAML file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    job: Job,
}

#[derive(Subcommand)]
enum Job {
    /// Merge remote identifiers from a Wikidata entity dump into Open Library authors
    AuthorIds {
        #[arg(long, value_name = "PATH", help = "Wikidata entity dump to read (TSV, optionally gzipped)")]
        sql_path: PathBuf,
        #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set,
              help = "Log what would change without persisting anything")]
        dry_run: bool,
        #[arg(long, value_name = "N", help = "Stop once either catalog has received this many write-backs")]
        limit: Option<usize>,
    },
    /// List cross-referenced authors still missing the wikidata remote ID (writes a TSV, never the catalogs)
    AuthorOlids {
        #[arg(long, value_name = "PATH", help = "Output TSV of olid/qid pairs")]
        out: PathBuf,
    },
    /// Match edition items to Open Library by ISBN and cross-reference both catalogs
    EditionOlids {
        #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set,
              help = "Log what would change without persisting anything")]
        dry_run: bool,
        #[arg(long, value_name = "N", help = "Stop once either catalog has received this many write-backs")]
        limit: Option<usize>,
    },
    /// Same as edition-olids, with ISBNs grouped per item in one SPARQL row
    EditionOlidsByIsbns {
        #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set,
              help = "Log what would change without persisting anything")]
        dry_run: bool,
        #[arg(long, value_name = "N", help = "Stop once either catalog has received this many write-backs")]
        limit: Option<usize>,
    },
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::AuthorIds { .. } => "author-ids",
            Job::AuthorOlids { .. } => "author-olids",
            Job::EditionOlids { .. } => "edition-olids",
            Job::EditionOlidsByIsbns { .. } => "edition-olids-by-isbns",
        }
    }

    // Author flows carry a display-name column in their problems sheet.
    fn reports_author_names(&self) -> bool {
        matches!(self, Job::AuthorIds { .. } | Job::AuthorOlids { .. })
    }
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_uppercase().as_str() {
        "DEBUG" => LevelFilter::Debug,
        "INFO" => LevelFilter::Info,
        "WARN" | "WARNING" => LevelFilter::Warn,
        "ERROR" => LevelFilter::Error,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO.", cli.log_level);
            LevelFilter::Info
        }
    };
    SimpleLogger::new()
        .with_level(log_level)
        .with_timestamp_format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .init()?;

    let config = SyncConfig::load(cli.config.as_deref())?;
    info!("Starting {} job", cli.job.name());

    if let Err(e) = run_job(&cli.job, &config) {
        error!("{} job failed: {:#}", cli.job.name(), e);
        std::process::exit(1);
    }

    info!("Total execution time: {}", format_elapsed(start_time.elapsed()));
    Ok(())
}

fn run_job(job: &Job, config: &SyncConfig) -> Result<()> {
    let mut ctx = RunContext::create(Path::new("logs"), job.name(), job.reports_author_names())
        .context("Failed to set up the run context")?;
    let ol = HttpOpenLibrary::new(config);
    let wd = HttpWikidata::new(config);

    match job {
        Job::AuthorIds {
            sql_path,
            dry_run,
            limit,
        } => jobs::author_ids::run(&mut ctx, &ol, sql_path, *dry_run, *limit),
        Job::AuthorOlids { out } => jobs::author_olids::run(&mut ctx, &ol, &wd, out),
        Job::EditionOlids { dry_run, limit } => {
            jobs::editions::run_edition_olids(&mut ctx, &ol, &wd, *dry_run, *limit)
        }
        Job::EditionOlidsByIsbns { dry_run, limit } => {
            jobs::editions::run_edition_olids_by_isbns(&mut ctx, &ol, &wd, *dry_run, *limit)
        }
    }
}
