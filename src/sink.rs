use anyhow::Result;

/// The seam between the orchestrator and the output paths.
///
/// `record` consumes one decoded line and returns an optional label (the
/// record's formatted timestamp) carried into progress milestones.
/// `file_boundary` is the per-file checkpoint: commit the store or flush
/// the aggregate so memory and uncommitted state stay bounded by a single
/// file's worth of work. `finish` runs once after the last file.
pub trait RecordSink {
    fn record(&mut self, line: &str) -> Result<Option<String>>;

    fn file_boundary(&mut self) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
