#[path = "common/mod.rs"]
mod common;

use common::*;
use ggsift::{discover_archives, run_pipeline, DailyCountSink, IngestOptions, NullProgress};

const JAN1: i64 = 1420070400; // 2015-01-01 UTC
const JAN2: i64 = 1420156800; // 2015-01-02 UTC

/// The aggregate is flushed and reset at every file boundary: counts from
/// file A and file B for the same (date, subreddit) pair come out as two
/// separate rows, never merged across files.
#[test]
fn counts_reset_between_files() {
    let file_a: Vec<String> = (0..3)
        .map(|i| submission(&format!("a{i}"), JAN1 + i, "suba", "alice"))
        .collect();
    let file_b = vec![
        submission("b0", JAN1 + 10, "suba", "bob"),
        submission("b1", JAN1 + 20, "suba", "bob"),
        submission("b2", JAN2, "subb", "bob"),
    ];
    let base = make_dump_dir(&[
        ("data_2015-01.zst", file_a),
        ("data_2015-02.zst", file_b),
    ]);
    let files = discover_archives(&base).unwrap();
    let out = base.join("posts_per_day.csv");

    let mut sink = DailyCountSink::create(&out).unwrap();
    run_pipeline(&files, &IngestOptions::default(), &mut sink, &mut NullProgress).unwrap();
    drop(sink);

    let rows = read_csv_rows(&out);
    assert_eq!(rows[0], vec!["date", "subreddit", "post_count"]);
    assert_eq!(
        rows[1..],
        [
            vec!["2015-01-01".to_string(), "suba".to_string(), "3".to_string()],
            vec!["2015-01-01".to_string(), "suba".to_string(), "2".to_string()],
            vec!["2015-01-02".to_string(), "subb".to_string(), "1".to_string()],
        ]
    );
}

/// Day granularity: different times on the same day fold into one row.
#[test]
fn same_day_posts_fold_into_one_row() {
    let lines = vec![
        submission("a0", JAN1, "drama", "alice"),
        submission("a1", JAN1 + 3600, "drama", "bob"),
        submission("a2", JAN1 + 86399, "drama", "carol"),
    ];
    let base = make_dump_dir(&[("data_2015-01.zst", lines)]);
    let files = discover_archives(&base).unwrap();
    let out = base.join("posts_per_day.csv");

    let mut sink = DailyCountSink::create(&out).unwrap();
    run_pipeline(&files, &IngestOptions::default(), &mut sink, &mut NullProgress).unwrap();
    drop(sink);

    let rows = read_csv_rows(&out);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec!["2015-01-01", "drama", "3"]);
}
