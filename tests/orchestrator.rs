#[path = "common/mod.rs"]
mod common;

use anyhow::Result;
use common::*;
use ggsift::{
    discover_archives, run_pipeline, IngestOptions, MalformedPolicy, Milestone, MilestoneStage,
    NullProgress, ProgressSink, RecordSink, TimestampDb, TimestampIndexSink,
};
use std::path::Path;

/// Archive files must process chronologically by the `_YYYY-MM` filename
/// segment regardless of filesystem listing order.
#[test]
fn files_process_in_chronological_order() {
    let base = make_dump_dir(&[
        ("data_2015-01.zst", vec![submission("a1", 1420070400, "drama", "alice")]),
        ("data_2014-12.zst", vec![submission("b1", 1417392000, "drama", "bob")]),
        ("data_2015-02.zst", vec![submission("c1", 1422748800, "drama", "carol")]),
    ]);

    let files = discover_archives(&base).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["data_2014-12.zst", "data_2015-01.zst", "data_2015-02.zst"]);
    assert_eq!(files[0].year, 2014);
    assert_eq!(files[0].month, 12);
}

/// Nested directories are walked; non-archive files are ignored.
#[test]
fn discovery_walks_subdirectories() {
    let base = make_dump_dir(&[("deep/nested/data_2015-01.zst", vec![submission("a1", 1420070400, "drama", "alice")])]);
    std::fs::write(base.join("submissions").join("notes.txt"), "not an archive").unwrap();

    let files = discover_archives(&base).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].size > 0);
}

/// Records each line it sees; labels milestones with a running counter.
struct Collect {
    lines: Vec<String>,
    boundaries: usize,
    finished: bool,
}

impl Collect {
    fn new() -> Self {
        Self { lines: Vec::new(), boundaries: 0, finished: false }
    }
}

impl RecordSink for Collect {
    fn record(&mut self, line: &str) -> Result<Option<String>> {
        self.lines.push(line.to_string());
        Ok(Some(format!("L{}", self.lines.len())))
    }
    fn file_boundary(&mut self) -> Result<()> {
        self.boundaries += 1;
        Ok(())
    }
    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[derive(Default)]
struct Recording {
    begun: Option<(usize, u64)>,
    milestones: Vec<(String, u64, MilestoneStage)>,
    bytes: u64,
    total: Option<u64>,
}

impl ProgressSink for Recording {
    fn begin(&mut self, files: usize, total_bytes: u64) {
        self.begun = Some((files, total_bytes));
    }
    fn advance_bytes(&mut self, delta: u64) {
        self.bytes += delta;
    }
    fn milestone(&mut self, m: &Milestone<'_>) {
        self.milestones.push((m.label.to_string(), m.lines, m.stage));
    }
    fn finish(&mut self, total_lines: u64) {
        self.total = Some(total_lines);
    }
}

/// Milestones fire at the first record of each file, every Nth record, and
/// at end of file, with cumulative line counts and the sink's label.
#[test]
fn milestones_fire_at_expected_points() {
    let file_a: Vec<String> = (0..5).map(|i| format!("{{\"n\":{i}}}")).collect();
    let file_b: Vec<String> = (0..3).map(|i| format!("{{\"n\":{i}}}")).collect();
    let base = make_dump_dir(&[
        ("data_2015-01.zst", file_a),
        ("data_2015-02.zst", file_b),
    ]);
    let files = discover_archives(&base).unwrap();

    let opts = IngestOptions::default().with_milestone_every(2);
    let mut sink = Collect::new();
    let mut progress = Recording::default();
    let stats = run_pipeline(&files, &opts, &mut sink, &mut progress).unwrap();

    assert_eq!(stats.total_lines, 8);
    assert_eq!(sink.boundaries, 2);
    assert!(sink.finished);

    let total_bytes: u64 = files.iter().map(|f| f.size).sum();
    assert_eq!(progress.begun, Some((2, total_bytes)));
    assert_eq!(progress.bytes, total_bytes);
    assert_eq!(progress.total, Some(8));

    // File A (5 records, cadence 2): start@1, running@2, running@4, end@5.
    // File B (3 records): start@6, running@7 (cumulative 7 is B's 2nd), end@8.
    let expected = vec![
        ("L1".to_string(), 1, MilestoneStage::FileStart),
        ("L2".to_string(), 2, MilestoneStage::Running),
        ("L4".to_string(), 4, MilestoneStage::Running),
        ("L5".to_string(), 5, MilestoneStage::FileEnd),
        ("L6".to_string(), 6, MilestoneStage::FileStart),
        ("L7".to_string(), 7, MilestoneStage::Running),
        ("L8".to_string(), 8, MilestoneStage::FileEnd),
    ];
    assert_eq!(progress.milestones, expected);
}

fn db_path(base: &Path) -> std::path::PathBuf {
    base.join("timestamps.db")
}

/// Under the abort policy a malformed line kills the run; under the skip
/// policy it is logged and the remaining records still land in the store.
#[test]
fn malformed_policy_skip_vs_abort() {
    let lines = vec![
        submission("aaa111", 1420070400, "drama", "alice"),
        "{ not valid json".to_string(),
        submission("bbb222", 1420070500, "drama", "bob"),
    ];
    let base = make_dump_dir(&[("data_2015-01.zst", lines)]);
    let files = discover_archives(&base).unwrap();

    // Abort (the default): the run fails.
    let mut sink = TimestampIndexSink::new(TimestampDb::open(&db_path(&base)).unwrap());
    let err = run_pipeline(&files, &IngestOptions::default(), &mut sink, &mut NullProgress)
        .unwrap_err();
    assert!(format!("{err:#}").contains("malformed record"));

    // Skip: the run completes and both valid ids are indexed.
    let skip_db = base.join("timestamps_skip.db");
    let mut sink = TimestampIndexSink::new(TimestampDb::open(&skip_db).unwrap());
    let opts = IngestOptions::default().with_malformed(MalformedPolicy::Skip);
    let stats = run_pipeline(&files, &opts, &mut sink, &mut NullProgress).unwrap();
    assert_eq!(stats.total_lines, 3);

    let db = sink.into_db().unwrap();
    assert_eq!(db.get("aaa111").unwrap(), Some("2015-01-01 00:00:00".to_string()));
    assert_eq!(db.get("bbb222").unwrap(), Some("2015-01-01 00:01:40".to_string()));
}
