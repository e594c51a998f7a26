//! Line reassembly over decoded chunks: a lazy, per-file sequence of
//! complete newline-delimited records plus the running byte offset.

use anyhow::Result;
use std::collections::VecDeque;
use std::path::Path;

use crate::chunks::ChunkedDecoder;
use crate::config::IngestOptions;

/// Iterator over `(line, compressed_offset)` pairs for one archive file.
///
/// Splitting `buffer + chunk` on newlines yields N segments; the first N-1
/// are complete records, the last is always carried forward as the new
/// buffer (even when empty). A non-empty trailing buffer is flushed as a
/// final line at end of stream. The offset is the compressed position at
/// the moment the enclosing chunk was read, so all lines of one chunk
/// share it; it exists for progress accounting, not per-record addressing.
///
/// Not restartable: construct a fresh reader per file iteration.
pub struct LineReader {
    decoder: ChunkedDecoder,
    buffer: String,
    queue: VecDeque<(String, u64)>,
    done: bool,
}

impl LineReader {
    pub fn open(path: &Path, opts: &IngestOptions) -> Result<Self> {
        Ok(Self {
            decoder: ChunkedDecoder::open(path, opts)?,
            buffer: String::new(),
            queue: VecDeque::new(),
            done: false,
        })
    }

    fn fill(&mut self) -> Result<()> {
        while self.queue.is_empty() && !self.done {
            match self.decoder.next_chunk()? {
                Some(chunk) => {
                    let offset = self.decoder.compressed_pos();
                    let mut combined = std::mem::take(&mut self.buffer);
                    combined.push_str(&chunk);
                    let mut segments: Vec<&str> = combined.split('\n').collect();
                    // The last segment may be a partial line; keep it back.
                    let tail = segments.pop().unwrap_or("").to_string();
                    for seg in segments {
                        self.queue.push_back((seg.trim().to_string(), offset));
                    }
                    self.buffer = tail;
                }
                None => {
                    self.done = true;
                    if !self.buffer.trim().is_empty() {
                        let offset = self.decoder.compressed_pos();
                        let tail = std::mem::take(&mut self.buffer);
                        self.queue.push_back((tail.trim().to_string(), offset));
                    }
                    self.buffer.clear();
                }
            }
        }
        Ok(())
    }
}

impl Iterator for LineReader {
    type Item = Result<(String, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.queue.is_empty() {
            if let Err(e) = self.fill() {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.queue.pop_front().map(Ok)
    }
}
