//! Plain-text run profile written by `--cpuprofile`.
//!
//! Wall-clock time per phase and per worker. For sampled CPU profiles run
//! the binary under `perf record`.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use crate::planner::ByteRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Plan,
    Scan,
    Merge,
    Report,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Plan => "plan",
            Phase::Scan => "scan",
            Phase::Merge => "merge",
            Phase::Report => "report",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerProfile {
    pub range: ByteRange,
    pub bytes_read: u64,
    pub lines: u64,
    pub skipped: u64,
    pub keys: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    phases: Vec<(Phase, Duration)>,
    workers: Vec<WorkerProfile>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_phase(&mut self, phase: Phase, elapsed: Duration) {
        self.phases.push((phase, elapsed));
    }

    pub fn record_worker(&mut self, worker: WorkerProfile) {
        self.workers.push(worker);
    }

    pub fn phase(&self, phase: Phase) -> Option<Duration> {
        self.phases
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, elapsed)| *elapsed)
    }

    pub fn workers(&self) -> &[WorkerProfile] {
        &self.workers
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        write!(out, "{}", self)?;
        out.flush()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (phase, elapsed) in &self.phases {
            writeln!(f, "phase {:<6} {:.3?}", phase.name(), elapsed)?;
        }
        for w in &self.workers {
            writeln!(
                f,
                "worker {:>3} range {}..{} read {} lines {} skipped {} keys {} elapsed {:.3?}",
                w.range.index,
                w.range.start,
                w.range.end,
                w.bytes_read,
                w.lines,
                w.skipped,
                w.keys,
                w.elapsed
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let mut profile = Profile::new();
        profile.record_phase(Phase::Plan, Duration::from_micros(5));
        profile.record_phase(Phase::Scan, Duration::from_millis(20));
        profile.record_worker(WorkerProfile {
            range: ByteRange { index: 0, start: 0, end: 64 },
            bytes_read: 64,
            lines: 8,
            skipped: 1,
            keys: 3,
            elapsed: Duration::from_millis(2),
        });

        assert_eq!(profile.phase(Phase::Scan), Some(Duration::from_millis(20)));
        assert_eq!(profile.phase(Phase::Merge), None);

        let mut out = Vec::new();
        profile.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, profile.to_string());
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("phase plan"));
        assert!(text.contains("worker   0 range 0..64 read 64 lines 8 skipped 1 keys 3"));
    }
}
