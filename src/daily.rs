//! Sink (c): per-day, per-subreddit post counts with a per-file flush.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::record::{format_date, MalformedRecord, Submission};
use crate::sink::RecordSink;
use crate::util::create_with_backoff;

/// Two-level date -> subreddit -> count aggregate. The whole map is flushed
/// as CSV rows and cleared at every file boundary, so memory is bounded by
/// one file's worth of distinct (date, subreddit) pairs, not the corpus's.
pub struct DailyCountSink {
    writer: csv::Writer<File>,
    counts: BTreeMap<String, BTreeMap<String, u64>>,
}

impl DailyCountSink {
    /// Creates the output CSV with its `date, subreddit, post_count` header;
    /// rows are appended after each input file.
    pub fn create(out_path: &Path) -> Result<Self> {
        let file = create_with_backoff(out_path, 16, 50)
            .with_context(|| format!("create {}", out_path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(["date", "subreddit", "post_count"])?;
        Ok(Self { writer, counts: BTreeMap::new() })
    }
}

impl RecordSink for DailyCountSink {
    fn record(&mut self, line: &str) -> Result<Option<String>> {
        let sub = Submission::parse(line)?;
        let epoch = sub
            .created_utc
            .ok_or_else(|| MalformedRecord::new("missing created_utc"))?;
        let date = format_date(epoch)?;
        let subreddit = sub
            .subreddit_lower()
            .ok_or_else(|| MalformedRecord::new("missing subreddit"))?;
        *self
            .counts
            .entry(date.clone())
            .or_default()
            .entry(subreddit)
            .or_insert(0) += 1;
        Ok(Some(date))
    }

    fn file_boundary(&mut self) -> Result<()> {
        for (date, subs) in std::mem::take(&mut self.counts) {
            for (subreddit, count) in subs {
                let count = count.to_string();
                self.writer
                    .write_record([date.as_str(), subreddit.as_str(), count.as_str()])?;
            }
        }
        Ok(self.writer.flush()?)
    }

    fn finish(&mut self) -> Result<()> {
        self.file_boundary()
    }
}
