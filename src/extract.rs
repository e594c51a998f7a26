//! Sink (b): allow-list filtered CSV extraction of submission records.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use crate::record::{format_timestamp, Submission};
use crate::sink::RecordSink;
use crate::util::create_with_backoff;

/// The built-in allow-list: subreddits tied to the Gamergate controversy.
pub fn default_gamergate_subs() -> HashSet<String> {
    [
        "srssucks",
        "shitghazisays",
        "kotakuinaction",
        "amrsucks",
        "drama",
        "subredditdrama",
        "againstgamergate",
        "ggfreeforall",
        "shitliberalssay",
        "kiachatroom",
        "circlebroke2",
        "gamerghazi",
        "topmindsofreddit",
        "bestofoutrageculture",
        "shitredditsays",
        "panichistory",
        "the_donald",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub const EXTRACT_HEADER: [&str; 7] = [
    "TIMESTAMP",
    "SUBREDDIT",
    "USERNAME",
    "TITLE",
    "BODY_TEXT",
    "NUM_COMMENTS",
    "POST_ID",
];

/// Writes one CSV row per record whose subreddit is in the allow-list and
/// whose required fields all resolve. Partial records are dropped, not
/// padded; the allow-list check runs before anything else as a fast filter.
pub struct AllowListExtractor {
    writer: csv::Writer<File>,
    allow: HashSet<String>,
}

impl AllowListExtractor {
    /// Creates the output CSV and writes the header row up front.
    pub fn create(out_path: &Path, allow: HashSet<String>) -> Result<Self> {
        let file = create_with_backoff(out_path, 16, 50)
            .with_context(|| format!("create {}", out_path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(EXTRACT_HEADER)?;
        Ok(Self { writer, allow })
    }
}

impl RecordSink for AllowListExtractor {
    fn record(&mut self, line: &str) -> Result<Option<String>> {
        let sub = Submission::parse(line)?;

        // Every dateable record labels the progress stream, filtered or not.
        let ts = match sub.created_utc {
            Some(epoch) => Some(format_timestamp(epoch)?),
            None => None,
        };

        let subreddit = match sub.subreddit_lower() {
            Some(s) if self.allow.contains(&s) => s,
            _ => return Ok(ts),
        };

        // Link posts carry no selftext; that yields an empty body, not a drop.
        let body = sub.selftext.unwrap_or_default();
        let (Some(ts_str), Some(author), Some(title), Some(num_comments), Some(id)) =
            (ts.clone(), sub.author, sub.title, sub.num_comments, sub.id)
        else {
            return Ok(ts);
        };

        let username = format!("u/{author}");
        let comments = num_comments.to_string();
        self.writer.write_record([
            ts_str.as_str(),
            subreddit.as_str(),
            username.as_str(),
            title.as_str(),
            body.as_str(),
            comments.as_str(),
            id.as_str(),
        ])?;
        Ok(ts)
    }

    fn file_boundary(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }

    fn finish(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }
}
