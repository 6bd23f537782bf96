use std::fs::File;
use std::path::Path;
use std::time::Instant;

use crossbeam::thread;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::planner::{plan_ranges, ByteRange};
use crate::profile::{Phase, Profile, WorkerProfile};
use crate::reduce::merge_tables;
use crate::report::Summary;
use crate::worker::{scan_range, ScanOptions, WorkerOutput};

/// Result of one pass over an input file.
#[derive(Debug, Clone)]
pub struct Run {
    pub summary: Summary,
    /// Records aggregated.
    pub lines: u64,
    /// Non-empty lines that could not be decoded.
    pub skipped: u64,
    pub bytes: u64,
    pub profile: Profile,
}

/// Scan `path` with `config.workers` parallel workers and return the sorted
/// per-key summary.
///
/// Any open or read failure aborts the whole run; no partial result is
/// returned.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn aggregate_file(path: &Path, config: &EngineConfig) -> Result<Run> {
    config.validate()?;
    let started = Instant::now();

    let open_error = |source| Error::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;
    let file_size = file.metadata().map_err(open_error)?.len();

    info!(
        size = file_size,
        workers = config.workers,
        capacity = 1usize << config.table_bits,
        "starting scan"
    );

    let mut profile = Profile::new();

    let phase = Instant::now();
    let ranges = plan_ranges(file_size, config.workers);
    profile.record_phase(Phase::Plan, phase.elapsed());

    let opts = ScanOptions {
        block_size: config.block_size,
        table_bits: config.table_bits,
        strict: config.strict,
    };
    let phase = Instant::now();
    let outputs = scan_all(&file, path, &ranges, file_size, &opts)?;
    profile.record_phase(Phase::Scan, phase.elapsed());

    let (mut lines, mut skipped, mut bytes) = (0u64, 0u64, 0u64);
    let mut tables = Vec::with_capacity(outputs.len());
    for out in outputs {
        lines += out.lines;
        skipped += out.skipped;
        bytes += out.bytes_read;
        profile.record_worker(WorkerProfile {
            range: out.range,
            bytes_read: out.bytes_read,
            lines: out.lines,
            skipped: out.skipped,
            keys: out.table.len(),
            elapsed: out.elapsed,
        });
        tables.push(out.table);
    }

    let phase = Instant::now();
    let merged = merge_tables(tables, config.table_bits);
    profile.record_phase(Phase::Merge, phase.elapsed());

    let phase = Instant::now();
    let summary = Summary::from_table(merged);
    profile.record_phase(Phase::Report, phase.elapsed());

    if skipped > 0 {
        warn!(skipped, strict = config.strict, "skipped malformed records");
    }
    info!(
        keys = summary.len(),
        lines,
        elapsed = ?started.elapsed(),
        "aggregation finished"
    );

    Ok(Run {
        summary,
        lines,
        skipped,
        bytes,
        profile,
    })
}

/// One scoped thread per range; returns once every worker has finished.
///
/// Each worker writes its result into its own slot. A worker that panics
/// leaves the `WorkerPanicked` placeholder behind, so the run still fails.
fn scan_all(
    file: &File,
    path: &Path,
    ranges: &[ByteRange],
    file_size: u64,
    opts: &ScanOptions,
) -> Result<Vec<WorkerOutput>> {
    let mut slots: Vec<Result<WorkerOutput>> = ranges
        .iter()
        .map(|range| Err(Error::WorkerPanicked { index: range.index }))
        .collect();

    let scoped = thread::scope(|s| {
        for (slot, &range) in slots.iter_mut().zip(ranges) {
            s.spawn(move |_| *slot = scan_range(file, path, range, file_size, opts));
        }
    });
    if scoped.is_err() {
        warn!("scan worker panicked");
    }

    slots.into_iter().collect()
}
