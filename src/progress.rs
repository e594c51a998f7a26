//! Progress reporting: an injectable milestone sink plus the two built-in
//! renderers (tracing log lines, indicatif byte bar).

use indicatif::{ProgressBar, ProgressStyle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MilestoneStage {
    FileStart,
    Running,
    FileEnd,
}

/// Snapshot emitted by the orchestrator at milestone points: first record
/// of a file, every Nth record, and end of file.
#[derive(Debug)]
pub struct Milestone<'a> {
    /// Formatted timestamp of the most recent record, as reported by the sink.
    pub label: &'a str,
    /// Cumulative record count across the whole run.
    pub lines: u64,
    /// Percent of the current file, by compressed bytes.
    pub file_pct: f64,
    /// Percent of the whole corpus, by compressed bytes.
    pub corpus_pct: f64,
    pub stage: MilestoneStage,
}

/// Injected into the orchestrator instead of ambient global state, so
/// milestone behavior is unit-testable.
pub trait ProgressSink {
    fn begin(&mut self, _files: usize, _total_bytes: u64) {}
    fn advance_bytes(&mut self, _delta: u64) {}
    fn milestone(&mut self, _m: &Milestone<'_>) {}
    fn finish(&mut self, _total_lines: u64) {}
}

/// No-op sink for callers that do their own accounting.
pub struct NullProgress;

impl ProgressSink for NullProgress {}

/// Renders the classic `<ts> : <lines> : <file%> : <corpus%>` log lines.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn begin(&mut self, files: usize, total_bytes: u64) {
        tracing::info!(
            "processing {} files of {:.2} gigabytes",
            files,
            total_bytes as f64 / (1u64 << 30) as f64
        );
    }

    fn milestone(&mut self, m: &Milestone<'_>) {
        tracing::info!("{} : {} : {:.0}% : {:.0}%", m.label, m.lines, m.file_pct, m.corpus_pct);
    }

    fn finish(&mut self, total_lines: u64) {
        tracing::info!("total: {}", total_lines);
    }
}

/// Byte-based progress bar across the whole corpus.
pub struct BarProgress {
    pb: Option<ProgressBar>,
    label: Option<String>,
}

impl BarProgress {
    pub fn new(label: Option<&str>) -> Self {
        Self { pb: None, label: label.map(|s| s.to_string()) }
    }
}

impl ProgressSink for BarProgress {
    fn begin(&mut self, _files: usize, total_bytes: u64) {
        let pb = ProgressBar::new(total_bytes);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg} {bytes:>10}/{total_bytes:<10} [{bar:.cyan/blue}] {percent:>3}%  \
             {bytes_per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}",
        )
        .unwrap()
        .progress_chars("█▉▊▋▌▍▎▏  ");
        pb.set_style(style);
        if let Some(msg) = &self.label {
            pb.set_message(msg.clone());
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        self.pb = Some(pb);
    }

    fn advance_bytes(&mut self, delta: u64) {
        if let Some(pb) = &self.pb {
            pb.inc(delta);
        }
    }

    fn finish(&mut self, _total_lines: u64) {
        if let Some(pb) = &self.pb {
            pb.finish_with_message("done");
        }
    }
}
