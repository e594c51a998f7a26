/// What to do with a record that fails JSON parsing or lacks a field the
/// sink requires: abort the whole run, or log a warning and move on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedPolicy {
    Abort,
    Skip,
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct IngestOptions {
    pub chunk_bytes: usize,       // decompressed bytes requested per read
    pub max_undecoded_bytes: u64, // ceiling on bytes buffered across decode retries
    pub window_log_max: u32,      // zstd long-range back-reference tolerance
    pub milestone_every: u64,     // emit a progress milestone every N records
    pub malformed: MalformedPolicy,
    pub progress: bool,                 // show progress bar
    pub progress_label: Option<String>, // optional label for progress bar
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_bytes: 1 << 27,
            max_undecoded_bytes: 1 << 30,
            window_log_max: 31,
            milestone_every: 100_000,
            malformed: MalformedPolicy::Abort,
            progress: true,
            progress_label: None,
        }
    }
}

impl IngestOptions {
    pub fn with_chunk_bytes(mut self, bytes: usize) -> Self {
        self.chunk_bytes = bytes.max(1);
        self
    }
    pub fn with_max_undecoded_bytes(mut self, bytes: u64) -> Self {
        self.max_undecoded_bytes = bytes.max(1);
        self
    }
    pub fn with_milestone_every(mut self, every: u64) -> Self {
        self.milestone_every = every.max(1);
        self
    }
    pub fn with_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.malformed = policy;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
}
