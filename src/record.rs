//! Submission-record schema and the field transforms shared by the sinks.

use serde::{Deserialize, Deserializer};
use std::fmt;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// A record that failed JSON parsing or lacks a field the sink requires.
/// Surfaced through `anyhow::Error`; the orchestrator downcasts to this to
/// apply the configured skip/abort policy.
#[derive(Debug)]
pub struct MalformedRecord {
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed record: {}", self.reason)
    }
}

impl std::error::Error for MalformedRecord {}

/// Line-level schema for submission dumps. Extra fields are ignored by
/// serde; every field the sinks care about is optional and decoded once at
/// the parse boundary. `created_utc` arrives as an integer, a float, or a
/// decimal string depending on dump vintage, so it gets a tolerant
/// deserializer.
#[derive(Debug, Deserialize)]
pub struct Submission {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "epoch_lenient")]
    pub created_utc: Option<i64>,
    pub subreddit: Option<String>,
    pub permalink: Option<String>,
    pub author: Option<String>,
    pub num_comments: Option<i64>,
    pub title: Option<String>,
    pub selftext: Option<String>,
}

fn epoch_lenient<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Epoch {
        Num(i64),
        Float(f64),
        Text(String),
    }
    Ok(match Option::<Epoch>::deserialize(de)? {
        None => None,
        Some(Epoch::Num(n)) => Some(n),
        Some(Epoch::Float(x)) => Some(x as i64),
        Some(Epoch::Text(s)) => s.trim().parse::<f64>().ok().map(|x| x as i64),
    })
}

impl Submission {
    pub fn parse(line: &str) -> Result<Self, MalformedRecord> {
        serde_json::from_str(line).map_err(|e| MalformedRecord::new(e.to_string()))
    }

    /// Lowercased subreddit, preferring the permalink path segment
    /// (`/r/<subreddit>/comments/...`) and falling back to the direct field.
    pub fn subreddit_lower(&self) -> Option<String> {
        if let Some(link) = self.permalink.as_deref() {
            if let Some(seg) = link.split('/').nth(2) {
                if !seg.is_empty() {
                    return Some(seg.to_lowercase());
                }
            }
        }
        self.subreddit.as_deref().map(|s| s.to_lowercase())
    }
}

const TS_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_timestamp(epoch: i64) -> Result<String, MalformedRecord> {
    let dt = OffsetDateTime::from_unix_timestamp(epoch)
        .map_err(|e| MalformedRecord::new(format!("created_utc {epoch}: {e}")))?;
    dt.format(TS_FORMAT).map_err(|e| MalformedRecord::new(e.to_string()))
}

/// `YYYY-MM-DD` in UTC. Day granularity for the count aggregate.
pub fn format_date(epoch: i64) -> Result<String, MalformedRecord> {
    let dt = OffsetDateTime::from_unix_timestamp(epoch)
        .map_err(|e| MalformedRecord::new(format!("created_utc {epoch}: {e}")))?;
    dt.format(DATE_FORMAT).map_err(|e| MalformedRecord::new(e.to_string()))
}
