//! Chunked zstd decompression: fixed-size decoded chunks with UTF-8
//! boundary stitching and a hard ceiling on buffered undecoded bytes.

use anyhow::{bail, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use zstd::stream::read::Decoder;

use crate::config::IngestOptions;
use crate::util::open_with_backoff;

/// The undecoded-byte ceiling was exceeded while stitching chunk reads,
/// which means the decompressed stream is not valid UTF-8 text.
#[derive(Debug)]
pub struct DecodeOverflow {
    pub bytes_buffered: u64,
}

impl fmt::Display for DecodeOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unable to decode frame after buffering {} bytes",
            self.bytes_buffered
        )
    }
}

impl std::error::Error for DecodeOverflow {}

/// A `Read` wrapper that counts compressed bytes read from the file.
/// The count doubles as the absolute offset used for progress reporting.
struct CountingReader<R: Read> {
    inner: R,
    counter: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Streams one compressed archive as decoded text chunks without ever
/// holding the decompressed content in memory.
///
/// `window_log_max(31)` is requested up front to avoid "Frame requires too
/// much memory" on the very large frames these dumps are packed with.
pub struct ChunkedDecoder {
    reader: Decoder<'static, BufReader<CountingReader<File>>>,
    counter: Arc<AtomicU64>,
    chunk_bytes: usize,
    max_undecoded_bytes: u64,
}

impl ChunkedDecoder {
    pub fn open(path: &Path, opts: &IngestOptions) -> Result<Self> {
        let file = open_with_backoff(path, 16, 50)?;
        let counter = Arc::new(AtomicU64::new(0));
        let counting = CountingReader { inner: file, counter: counter.clone() };
        let mut reader = Decoder::new(counting)?;
        reader.window_log_max(opts.window_log_max)?;
        Ok(Self {
            reader,
            counter,
            chunk_bytes: opts.chunk_bytes,
            max_undecoded_bytes: opts.max_undecoded_bytes,
        })
    }

    /// Absolute compressed-byte offset consumed from the underlying file.
    pub fn compressed_pos(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Next decoded text chunk, or `None` once the stream is exhausted.
    ///
    /// A multi-byte character split by the read boundary fails conversion;
    /// the failed bytes are kept and another chunk is appended before
    /// retrying. The retry is a loop rather than recursion, with the
    /// accumulated byte count checked against the configured ceiling.
    pub fn next_chunk(&mut self) -> Result<Option<String>> {
        let mut pending: Vec<u8> = Vec::new();
        let mut buffered: u64 = 0;
        loop {
            let start = pending.len();
            pending.resize(start + self.chunk_bytes, 0);
            let n = read_full(&mut self.reader, &mut pending[start..])?;
            pending.truncate(start + n);
            buffered += n as u64;

            if pending.is_empty() {
                return Ok(None);
            }
            match String::from_utf8(pending) {
                Ok(text) => return Ok(Some(text)),
                Err(err) => {
                    if n == 0 {
                        bail!("compressed stream ended inside a multi-byte character");
                    }
                    if buffered > self.max_undecoded_bytes {
                        return Err(DecodeOverflow { bytes_buffered: buffered }.into());
                    }
                    tracing::info!(
                        "decode error with {} bytes buffered, reading another chunk",
                        buffered
                    );
                    pending = err.into_bytes();
                }
            }
        }
    }
}

/// Read until `buf` is full or the stream ends; returns bytes filled.
fn read_full(r: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
