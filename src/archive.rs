//! Archive discovery, chronological ordering, and the per-file run driver
//! with aggregate progress accounting.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{IngestOptions, MalformedPolicy};
use crate::lines::LineReader;
use crate::progress::{Milestone, MilestoneStage, ProgressSink};
use crate::record::MalformedRecord;
use crate::sink::RecordSink;

/// One monthly dump file plus the ordering key embedded in its name.
#[derive(Clone, Debug)]
pub struct ArchiveFile {
    pub path: PathBuf,
    pub size: u64,
    pub year: u32,
    pub month: u32,
}

/// Recursively collect `.zst` archives under `root`, sorted ascending by
/// the two integers of the `_YYYY-MM` filename segment so chronologically
/// earlier files come first regardless of directory traversal order.
pub fn discover_archives(root: &Path) -> Result<Vec<ArchiveFile>> {
    let re = Regex::new(r"_(\d+)-(\d+)\.zst$").unwrap();
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let ent = entry?;
        if !ent.file_type().is_file() {
            continue;
        }
        let Some(name) = ent.file_name().to_str() else { continue };
        let Some(caps) = re.captures(name) else { continue };
        let year: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let size = ent.metadata()?.len();
        files.push(ArchiveFile { path: ent.path().to_path_buf(), size, year, month });
    }
    files.sort_by_key(|f| (f.year, f.month));
    Ok(files)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RunStats {
    pub total_lines: u64,
    pub total_bytes: u64,
}

/// Drive the whole file set through the sink, in order.
///
/// Per file: a fresh `LineReader`, every non-empty line handed to the sink,
/// milestones at the first record, every `milestone_every` records, and end
/// of file. After each file the sink checkpoints (`file_boundary`), which
/// is what bounds memory and uncommitted store state to one file's worth.
///
/// A sink error that downcasts to `MalformedRecord` is subject to the
/// configured policy; any other error aborts the run.
pub fn run_pipeline(
    files: &[ArchiveFile],
    opts: &IngestOptions,
    sink: &mut dyn RecordSink,
    progress: &mut dyn ProgressSink,
) -> Result<RunStats> {
    let total_size: u64 = files.iter().map(|f| f.size).sum();
    progress.begin(files.len(), total_size);

    let mut total_lines: u64 = 0;
    let mut total_bytes: u64 = 0;

    for file in files {
        let mut file_lines: u64 = 0;
        let mut last_offset: u64 = 0;
        let mut label = String::new();
        // Corpus percentage is held at the start-of-file value for the whole
        // file, matching the byte accounting of completed files only.
        let corpus_pct = pct(total_bytes, total_size);

        let reader = LineReader::open(&file.path, opts)
            .with_context(|| format!("open {}", file.path.display()))?;
        for item in reader {
            let (line, offset) =
                item.with_context(|| format!("decode {}", file.path.display()))?;
            if offset > last_offset {
                progress.advance_bytes(offset - last_offset);
                last_offset = offset;
            }
            if line.is_empty() {
                continue;
            }

            match sink.record(&line) {
                Ok(Some(l)) => label = l,
                Ok(None) => {}
                Err(err) => match err.downcast::<MalformedRecord>() {
                    Ok(bad) => match opts.malformed {
                        MalformedPolicy::Abort => {
                            return Err(anyhow::Error::new(bad)).with_context(|| {
                                format!(
                                    "record {} of {}",
                                    file_lines + 1,
                                    file.path.display()
                                )
                            });
                        }
                        MalformedPolicy::Skip => {
                            tracing::warn!(
                                "skipping malformed record in {}: {}",
                                file.path.display(),
                                bad
                            );
                        }
                    },
                    Err(other) => {
                        return Err(other)
                            .with_context(|| format!("processing {}", file.path.display()));
                    }
                },
            }

            file_lines += 1;
            if file_lines == 1 {
                progress.milestone(&Milestone {
                    label: &label,
                    lines: total_lines + file_lines,
                    file_pct: 0.0,
                    corpus_pct,
                    stage: MilestoneStage::FileStart,
                });
            } else if file_lines % opts.milestone_every == 0 {
                progress.milestone(&Milestone {
                    label: &label,
                    lines: total_lines + file_lines,
                    file_pct: pct(offset.min(file.size), file.size),
                    corpus_pct,
                    stage: MilestoneStage::Running,
                });
            }
        }

        total_lines += file_lines;
        total_bytes += file.size;
        if file.size > last_offset {
            progress.advance_bytes(file.size - last_offset);
        }
        progress.milestone(&Milestone {
            label: &label,
            lines: total_lines,
            file_pct: 100.0,
            corpus_pct: pct(total_bytes, total_size),
            stage: MilestoneStage::FileEnd,
        });

        sink.file_boundary()
            .with_context(|| format!("checkpoint after {}", file.path.display()))?;
    }

    sink.finish()?;
    progress.finish(total_lines);
    Ok(RunStats { total_lines, total_bytes })
}

fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        100.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}
