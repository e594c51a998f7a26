use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ggsift::{
    clean_link_tables, default_gamergate_subs, discover_archives, init_tracing_once,
    run_pipeline, AllowListExtractor, ArchiveFile, BarProgress, DailyCountSink, IngestOptions,
    LogProgress, MalformedPolicy, RecordSink, RunStats, TimestampDb, TimestampIndexSink,
};

#[derive(Parser)]
#[command(name = "ggsift", version)]
#[command(about = "Streaming extraction over zstd-compressed Pushshift submission dumps")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Skip malformed records instead of aborting the run.
    #[arg(long, global = true)]
    skip_malformed: bool,

    /// Disable the progress bar; milestones still go to the log.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the id -> timestamp SQLite index from a dump directory.
    BuildTimestampDb {
        /// Directory scanned recursively for *_YYYY-MM.zst archives.
        #[arg(short, long)]
        input: PathBuf,

        /// SQLite database path.
        #[arg(short, long, default_value = "data/timestamps.db")]
        db: PathBuf,
    },
    /// Extract allow-listed submissions to CSV.
    Extract {
        #[arg(short, long)]
        input: PathBuf,

        /// Subreddit names overriding the built-in Gamergate set.
        #[arg(short = 'l', long = "subreddit-list", num_args = 1..)]
        subreddits: Vec<String>,

        #[arg(short, long, default_value = "data/gamergate_post_data.csv")]
        output: PathBuf,
    },
    /// Aggregate per-day, per-subreddit post counts to CSV.
    DailyCounts {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "data/zst_posts_per_day_per_sub.csv")]
        output: PathBuf,
    },
    /// Fix POST_IDs and timestamps in the SNAP hyperlink TSV tables.
    CleanHyperlinks {
        /// Dump directory used to (re)build the timestamp index first.
        /// Omit to reuse an already-built database.
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long, default_value = "data/timestamps.db")]
        db: PathBuf,

        /// IN:OUT table pairs, e.g. links.tsv:links-cleaned.tsv.
        #[arg(short, long = "table", num_args = 1..)]
        tables: Vec<String>,

        /// Drop the scratch ts table when done.
        #[arg(long)]
        drop_table: bool,
    },
}

fn main() -> Result<()> {
    init_tracing_once();
    let cli = Cli::parse();
    let opts = IngestOptions::default()
        .with_malformed(if cli.skip_malformed {
            MalformedPolicy::Skip
        } else {
            MalformedPolicy::Abort
        })
        .with_progress(!cli.no_progress);

    match cli.command {
        Command::BuildTimestampDb { input, db } => {
            let files = discover_archives(&input)?;
            let mut sink = TimestampIndexSink::new(TimestampDb::open(&db)?);
            run(&files, &opts, &mut sink)?;
        }
        Command::Extract { input, subreddits, output } => {
            let allow = if subreddits.is_empty() {
                default_gamergate_subs()
            } else {
                tracing::info!("using subreddit list: {:?}", subreddits);
                subreddits.iter().map(|s| s.to_lowercase()).collect()
            };
            let files = discover_archives(&input)?;
            let mut sink = AllowListExtractor::create(&output, allow)?;
            run(&files, &opts, &mut sink)?;
        }
        Command::DailyCounts { input, output } => {
            let files = discover_archives(&input)?;
            let mut sink = DailyCountSink::create(&output)?;
            run(&files, &opts, &mut sink)?;
        }
        Command::CleanHyperlinks { input, db, tables, drop_table } => {
            let mut store = TimestampDb::open(&db)?;
            if let Some(dir) = input {
                let files = discover_archives(&dir)?;
                let mut sink = TimestampIndexSink::new(store);
                run(&files, &opts, &mut sink)?;
                store = sink.into_db()?;
            }
            let jobs = if tables.is_empty() {
                default_link_tables()
            } else {
                parse_table_pairs(&tables)?
            };
            clean_link_tables(&store, &jobs)?;
            if drop_table {
                store.drop_table()?;
            }
        }
    }
    Ok(())
}

fn run(
    files: &[ArchiveFile],
    opts: &IngestOptions,
    sink: &mut dyn RecordSink,
) -> Result<RunStats> {
    if opts.progress {
        let mut progress = BarProgress::new(opts.progress_label.as_deref());
        run_pipeline(files, opts, sink, &mut progress)
    } else {
        let mut progress = LogProgress;
        run_pipeline(files, opts, sink, &mut progress)
    }
}

/// The two SNAP hyperlink tables, cleaned in place next to the originals.
fn default_link_tables() -> Vec<(PathBuf, PathBuf)> {
    [
        ("data/soc-redditHyperlinks-title.tsv", "data/soc-redditHyperlinks-title-cleaned.tsv"),
        ("data/soc-redditHyperlinks-body.tsv", "data/soc-redditHyperlinks-body-cleaned.tsv"),
    ]
    .iter()
    .map(|(i, o)| (PathBuf::from(i), PathBuf::from(o)))
    .collect()
}

fn parse_table_pairs(specs: &[String]) -> Result<Vec<(PathBuf, PathBuf)>> {
    specs
        .iter()
        .map(|s| {
            let (i, o) = s
                .split_once(':')
                .ok_or_else(|| anyhow!("expected IN:OUT table pair, got {s}"))?;
            Ok((PathBuf::from(i), PathBuf::from(o)))
        })
        .collect()
}
