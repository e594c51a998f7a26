#![allow(dead_code)]

use serde_json::json;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a compressed `.zst` file containing the provided JSONL lines.
/// This mirrors the corpus's monthly submission dumps but with tiny content.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Write a compressed `.zst` file from raw bytes, no newline handling.
/// Used to place chunk boundaries inside multi-byte characters, and to
/// produce deliberately non-UTF-8 streams.
pub fn write_zst_raw(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap();
}

/// A minimal submission record in the dump's JSON shape.
pub fn submission(id: &str, epoch: i64, subreddit: &str, author: &str) -> String {
    json!({
        "id": id, "created_utc": epoch, "subreddit": subreddit,
        "author": author, "num_comments": 3, "title": format!("post {id}"),
        "selftext": "text body", "score": 1, "over_18": false
    })
    .to_string()
}

/// Build a dump directory with the given `(file name, lines)` archives laid
/// out under a `submissions/` subdirectory, as in the real dataset.
pub fn make_dump_dir(files: &[(&str, Vec<String>)]) -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.into_path();
    for (name, lines) in files {
        write_zst_lines(&base.join("submissions").join(name), lines);
    }
    base
}

/// Read a CSV (or TSV) file back as rows of strings, header included.
pub fn read_delim_rows(path: &Path, delimiter: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
        .collect()
}

pub fn read_csv_rows(path: &Path) -> Vec<Vec<String>> {
    read_delim_rows(path, b',')
}
