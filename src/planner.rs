/// Contiguous slice of the input assigned to one scan worker.
///
/// Ranges are not line-aligned. A worker with `index > 0` drops everything up
/// to and including the first newline at or after `start`, and every worker
/// keeps going past `end` until the line that starts at or before `end` is
/// complete. Worker `i > 0` therefore owns the lines starting in
/// `(start, end]`, worker 0 those starting in `[0, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether this worker must skip the partial line at its start.
    pub fn needs_alignment(&self) -> bool {
        self.index > 0
    }
}

/// Split `size` bytes into `workers` half-open ranges of roughly equal length.
/// The last range absorbs the remainder.
pub fn plan_ranges(size: u64, workers: usize) -> Vec<ByteRange> {
    let workers = workers.max(1);
    let chunk = size / workers as u64;
    (0..workers)
        .map(|index| {
            let start = index as u64 * chunk;
            let end = if index == workers - 1 {
                size
            } else {
                start + chunk
            };
            ByteRange { index, start, end }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_cover_file() {
        let ranges = plan_ranges(103, 4);
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[3].end, 103);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(ranges[0].len(), 25);
        assert_eq!(ranges[3].len(), 28);
    }

    #[test]
    fn test_empty_file() {
        let ranges = plan_ranges(0, 3);
        assert_eq!(ranges.len(), 3);
        assert!(ranges.iter().all(ByteRange::is_empty));
    }

    #[test]
    fn test_more_workers_than_bytes() {
        let ranges = plan_ranges(2, 5);
        assert!(ranges[..4].iter().all(ByteRange::is_empty));
        assert_eq!(ranges[4], ByteRange { index: 4, start: 0, end: 2 });
    }

    #[test]
    fn test_zero_workers_falls_back_to_one() {
        let ranges = plan_ranges(10, 0);
        assert_eq!(ranges, vec![ByteRange { index: 0, start: 0, end: 10 }]);
        assert!(!ranges[0].needs_alignment());
    }
}
