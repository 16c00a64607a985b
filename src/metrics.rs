// src/metrics.rs
use crate::engine::Event;

/// Counters for one replay run. Plain integers: replay is strictly
/// single-threaded, so there is nothing to synchronize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Metrics {
    pub frames: u64,
    pub adds: u64,
    pub updates: u64,
    pub deletes: u64,
    pub executes: u64,
    pub snapshots: u64,
    pub suppressed: u64,
    pub bytes: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, event: &Event) {
        self.frames += 1;
        match event {
            Event::Add { .. } => self.adds += 1,
            Event::Update { .. } => self.updates += 1,
            Event::Delete { .. } => self.deletes += 1,
            Event::Execute { .. } => self.executes += 1,
        }
    }

    #[inline]
    pub fn inc_snapshot(&mut self) {
        self.snapshots += 1;
    }

    #[inline]
    pub fn inc_suppressed(&mut self) {
        self.suppressed += 1;
    }

    pub fn summary(&self) -> String {
        format!(
            "frames={} bytes={} adds={} updates={} deletes={} executes={} snapshots={} suppressed={}",
            self.frames,
            self.bytes,
            self.adds,
            self.updates,
            self.deletes,
            self.executes,
            self.snapshots,
            self.suppressed,
        )
    }
}
