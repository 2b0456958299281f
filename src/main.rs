use std::fs;
use std::io;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info, warn};

use freebies::cli::{Cli, Command, DiffArgs, HistoryArgs, LatestArgs, ManifestArgs, RecordArgs};
use freebies::config::Config;
use freebies::pipeline::{self, Archival};
use freebies::report;
use freebies::snapshot::Snapshot;
use freebies::store::diff;
use freebies::store::sqlite::SqliteHistoryStore;
use freebies::store::HistoryStore;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref()).context("loading config")?;
    if let Some(dir) = cli.history_dir {
        config.history_dir = dir;
    }

    match cli.command {
        Command::Record(args) => record(config, args),
        Command::History(args) => history(&config, args),
        Command::Latest(args) => latest(&config, args),
        Command::Diff(args) => diff_records(&config, args),
        Command::Manifest(args) => manifest(&config, args),
    }
}

fn open_store(config: &Config) -> anyhow::Result<SqliteHistoryStore> {
    SqliteHistoryStore::open(&config.db_path())
        .with_context(|| format!("opening history store {}", config.db_path().display()))
}

fn record(mut config: Config, args: RecordArgs) -> anyhow::Result<ExitCode> {
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let collected = pipeline::collect(&config.fetchers());
    for (platform, e) in &collected.fetch_failures {
        warn!(%platform, error = %e, "platform missing from this run");
    }

    // the page is published before any archival attempt
    let published = pipeline::publish_snapshot(&config.output_dir, &collected.snapshot)
        .with_context(|| format!("writing snapshot to {}", config.output_dir.display()))?;
    info!(
        path = %published.display(),
        offers = collected.snapshot.len(),
        fetch_ms = collected.fetch_duration_ms,
        "published snapshot"
    );

    let mut store = match SqliteHistoryStore::open(&config.db_path()) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "history store unusable");
            return Ok(ExitCode::FAILURE);
        }
    };

    let writer = config.archive_writer();
    let image = args.image;
    let render = |_: &Snapshot| match &image {
        Some(path) => fs::read(path),
        None => Err(io::Error::new(io::ErrorKind::NotFound, "no --image given")),
    };

    match pipeline::archive_if_changed(&collected.snapshot, &mut store, &writer, render) {
        Ok(Archival::Archived(record)) => {
            println!("archived #{} at {}", record.id, record.timestamp);
            Ok(ExitCode::SUCCESS)
        }
        Ok(Archival::Unchanged(key)) => {
            println!("unchanged ({key})");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Archival::Failed(e)) => {
            println!("not archived: {e}");
            Ok(if args.strict { ExitCode::from(2) } else { ExitCode::SUCCESS })
        }
        Err(e) => {
            error!(error = %e, "history store unusable");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn history(config: &Config, args: HistoryArgs) -> anyhow::Result<ExitCode> {
    let store = open_store(config)?;

    let records = match (&args.from, &args.to) {
        (Some(from), Some(to)) => store.range(from, to)?,
        _ => store.list(args.limit.unwrap_or(config.list_limit), args.before.as_deref())?,
    };

    if args.json {
        println!("{}", report::json::render_records(&records)?);
    } else {
        print!("{}", report::table::render_history(&records));
    }
    Ok(ExitCode::SUCCESS)
}

fn latest(config: &Config, args: LatestArgs) -> anyhow::Result<ExitCode> {
    let store = open_store(config)?;

    let Some(record) = store.latest()? else {
        eprintln!("No history records yet. Run 'freebies record' to create one.");
        return Ok(ExitCode::FAILURE);
    };

    if args.json {
        println!("{}", report::json::render_record(&record)?);
    } else {
        print!("{}", report::table::render_record(&record));
    }
    Ok(ExitCode::SUCCESS)
}

fn diff_records(config: &Config, args: DiffArgs) -> anyhow::Result<ExitCode> {
    let store = open_store(config)?;

    let (from, to) = match (args.from, args.to) {
        (Some(from_id), Some(to_id)) => {
            let from = store.get(from_id)?.with_context(|| format!("record {from_id} not found"))?;
            let to = store.get(to_id)?.with_context(|| format!("record {to_id} not found"))?;
            (from, to)
        }
        _ => {
            let mut recent = store.list(2, None)?;
            if recent.len() < 2 {
                bail!("need at least 2 records to compare");
            }
            let to = recent.remove(0);
            let from = recent.remove(0);
            (from, to)
        }
    };

    print!("{}", report::table::render_diff(&diff::compare_records(&from, &to)));
    Ok(ExitCode::SUCCESS)
}

fn manifest(config: &Config, args: ManifestArgs) -> anyhow::Result<ExitCode> {
    let store = open_store(config)?;

    let out = args.out.unwrap_or_else(|| config.archive_writer().manifest_path());
    let written = pipeline::write_manifest(&store, &out)?;

    println!("wrote {written} records to {}", out.display());
    Ok(ExitCode::SUCCESS)
}
