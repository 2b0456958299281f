use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "freebies")]
#[command(about = "Free-game snapshot normalizer and change archive")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// History directory holding the database and archived images
    #[arg(long, global = true)]
    pub history_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Normalize the latest platform dumps and archive the snapshot if it changed
    Record(RecordArgs),

    /// List archived records, newest first
    History(HistoryArgs),

    /// Show the most recent archived record
    Latest(LatestArgs),

    /// Compare two archived records
    Diff(DiffArgs),

    /// Export the history manifest for the listing page
    Manifest(ManifestArgs),
}

#[derive(Parser)]
pub struct RecordArgs {
    /// Directory the scrapers write their dumps to; snapshot.json is written here too
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Rendered page image to archive when the snapshot changed
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Exit non-zero when a changed snapshot could not be archived
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Maximum number of records to show (defaults to list_limit from config)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Only records archived strictly before this YYYYMMDDHHmmss timestamp
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub before: Option<String>,

    /// Start of an inclusive timestamp range (YYYYMMDDHHmmss)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// End of an inclusive timestamp range (YYYYMMDDHHmmss)
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct LatestArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct DiffArgs {
    /// Starting record ID for comparison
    #[arg(long, requires = "to")]
    pub from: Option<i64>,

    /// Ending record ID for comparison
    #[arg(long, requires = "from")]
    pub to: Option<i64>,
}

#[derive(Parser)]
pub struct ManifestArgs {
    /// Where to write the manifest (defaults to <history_dir>/manifest.json)
    #[arg(long)]
    pub out: Option<PathBuf>,
}
