mod archive;
mod chunks;
mod cleanup;
mod config;
mod daily;
mod extract;
mod lines;
mod progress;
mod record;
mod sink;
mod store;
mod util;

pub use crate::archive::{discover_archives, run_pipeline, ArchiveFile, RunStats};
pub use crate::chunks::{ChunkedDecoder, DecodeOverflow};
pub use crate::cleanup::{clean_link_table, clean_link_tables, normalize_post_id};
pub use crate::config::{IngestOptions, MalformedPolicy};
pub use crate::daily::DailyCountSink;
pub use crate::extract::{default_gamergate_subs, AllowListExtractor, EXTRACT_HEADER};
pub use crate::lines::LineReader;
pub use crate::record::{format_date, format_timestamp, MalformedRecord, Submission};
pub use crate::sink::RecordSink;
pub use crate::store::{TimestampDb, TimestampIndexSink};

// Expose the injectable progress surface so callers (and tests) can record
// milestones instead of relying on ambient logger state.
pub use crate::progress::{
    BarProgress, LogProgress, Milestone, MilestoneStage, NullProgress, ProgressSink,
};

// Export robust file ops from util so binaries can import from crate root.
pub use crate::util::{create_with_backoff, init_tracing_once, open_with_backoff};
