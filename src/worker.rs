use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::time::{Duration, Instant};

use memchr::memchr;
use tracing::{debug, debug_span};

use crate::decode::{decode_record, Decoded};
use crate::error::{Error, Result};
use crate::planner::ByteRange;
use crate::table::Table;

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub block_size: usize,
    pub table_bits: u32,
    pub strict: bool,
}

/// Everything one worker hands to the reducer.
pub struct WorkerOutput {
    pub range: ByteRange,
    pub table: Table,
    pub lines: u64,
    pub skipped: u64,
    pub bytes_read: u64,
    pub elapsed: Duration,
}

struct Sink {
    table: Table,
    strict: bool,
    lines: u64,
    skipped: u64,
}

impl Sink {
    #[inline]
    fn feed(&mut self, line: &[u8]) {
        match decode_record(line, self.strict) {
            Decoded::Record { key, value } => {
                self.table.upsert(key, value);
                self.lines += 1;
            }
            Decoded::Empty => {}
            Decoded::Malformed => self.skipped += 1,
        }
    }
}

/// Scan the lines owned by `range` (see [`ByteRange`]) with positioned reads
/// on `file`, so workers never share a cursor.
pub fn scan_range(
    file: &File,
    path: &Path,
    range: ByteRange,
    file_size: u64,
    opts: &ScanOptions,
) -> Result<WorkerOutput> {
    let _span = debug_span!("worker", index = range.index).entered();
    let started = Instant::now();

    let mut sink = Sink {
        table: Table::with_bits(opts.table_bits),
        strict: opts.strict,
        lines: 0,
        skipped: 0,
    };
    let mut bytes_read = 0u64;

    // A non-first worker with an empty range owns no line at all.
    if !(range.needs_alignment() && range.is_empty()) {
        let mut buf = vec![0u8; opts.block_size];
        let mut leftover: Vec<u8> = Vec::with_capacity(128);
        let mut aligned = !range.needs_alignment();
        let mut pos = range.start;
        let mut line_start = range.start;

        'read: while pos < file_size && line_start <= range.end {
            let n = file.read_at(&mut buf, pos).map_err(|source| Error::Read {
                path: path.to_path_buf(),
                offset: pos,
                source,
            })?;
            if n == 0 {
                break;
            }
            bytes_read += n as u64;
            pos += n as u64;
            let mut chunk = &buf[..n];

            if !aligned {
                match memchr(b'\n', chunk) {
                    Some(i) => {
                        chunk = &chunk[i + 1..];
                        line_start = pos - chunk.len() as u64;
                        aligned = true;
                    }
                    None => continue,
                }
            }

            while let Some(i) = memchr(b'\n', chunk) {
                if line_start > range.end {
                    break 'read;
                }
                if leftover.is_empty() {
                    sink.feed(&chunk[..i]);
                } else {
                    leftover.extend_from_slice(&chunk[..i]);
                    sink.feed(&leftover);
                    leftover.clear();
                }
                chunk = &chunk[i + 1..];
                line_start = pos - chunk.len() as u64;
            }
            leftover.extend_from_slice(chunk);
        }

        // Last line of the file without a terminator.
        if aligned && !leftover.is_empty() && line_start <= range.end {
            sink.feed(&leftover);
        }
    }

    let elapsed = started.elapsed();
    debug!(
        start = range.start,
        end = range.end,
        lines = sink.lines,
        skipped = sink.skipped,
        keys = sink.table.len(),
        ?elapsed,
        "scan finished"
    );

    Ok(WorkerOutput {
        range,
        table: sink.table,
        lines: sink.lines,
        skipped: sink.skipped,
        bytes_read,
        elapsed,
    })
}
