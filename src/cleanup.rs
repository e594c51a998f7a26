//! Post-process for the SNAP hyperlink tables: normalize malformed
//! `POST_ID` values and overwrite their unreliable embedded timestamps
//! with the accurate ones recovered from the raw archives.
//!
//! Depends on the timestamp index having been built over the full dump set.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use crate::store::TimestampDb;
use crate::util::{create_with_backoff, open_with_backoff};

/// IDs in the hyperlink tables are 6 characters; a known export defect
/// appends a stray trailing character. Trim one character whenever the
/// length is off, leave 6-character ids untouched.
pub fn normalize_post_id(raw: &str) -> &str {
    if raw.len() == 6 || raw.is_empty() {
        return raw;
    }
    let mut it = raw.chars();
    it.next_back();
    it.as_str()
}

/// Clean one tab-separated link table: corrected `POST_ID`s are written
/// back, and `TIMESTAMP` is overwritten from the store where the corrected
/// id is indexed. Rows whose id has no index entry keep their original
/// timestamp.
pub fn clean_link_table(db: &TimestampDb, in_path: &Path, out_path: &Path) -> Result<()> {
    let input = open_with_backoff(in_path, 16, 50)
        .with_context(|| format!("open {}", in_path.display()))?;
    let mut reader = csv::ReaderBuilder::new().delimiter(b'\t').from_reader(input);

    let headers = reader.headers()?.clone();
    let id_col = headers
        .iter()
        .position(|h| h == "POST_ID")
        .ok_or_else(|| anyhow!("{}: no POST_ID column", in_path.display()))?;
    let ts_col = headers
        .iter()
        .position(|h| h == "TIMESTAMP")
        .ok_or_else(|| anyhow!("{}: no TIMESTAMP column", in_path.display()))?;

    let output = create_with_backoff(out_path, 16, 50)
        .with_context(|| format!("create {}", out_path.display()))?;
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(output);
    writer.write_record(&headers)?;

    for row in reader.records() {
        let row = row?;
        let mut fields: Vec<String> = row.iter().map(|s| s.to_string()).collect();
        if let Some(id) = fields.get(id_col).cloned() {
            let fixed = normalize_post_id(&id).to_string();
            if let Some(ts) = db.get(&fixed)? {
                if let Some(slot) = fields.get_mut(ts_col) {
                    *slot = ts;
                }
            }
            fields[id_col] = fixed;
        }
        writer.write_record(&fields)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn clean_link_tables(db: &TimestampDb, jobs: &[(PathBuf, PathBuf)]) -> Result<()> {
    for (in_path, out_path) in jobs {
        clean_link_table(db, in_path, out_path)?;
    }
    Ok(())
}
