use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use raidfs::metrics::{DiskOp, MetricsSink, RaidOp, install_metrics_sink};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OpStats {
    pub count: u64,
    pub errors: u64,
    pub bytes: u64,
    pub latency_seconds: f64,
}

impl OpStats {
    fn add(&mut self, bytes: u64, latency_seconds: f64, error: bool) {
        self.count += 1;
        self.bytes = self.bytes.saturating_add(bytes);
        self.latency_seconds += latency_seconds;
        if error {
            self.errors += 1;
        }
    }

    fn mean_latency_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.latency_seconds * 1000.0 / self.count as f64
        }
    }
}

#[derive(Debug, Default)]
struct Summary {
    calls: u64,
    by_op: BTreeMap<&'static str, OpStats>,
    by_disk: Vec<OpStats>,
}

/// Sink that folds engine records into running totals and logs them every
/// `every` calls.
pub struct SummarySink {
    every: u64,
    state: Mutex<Summary>,
}

impl SummarySink {
    pub fn new(every: u64) -> Arc<Self> {
        Arc::new(Self {
            every: every.max(1),
            state: Mutex::new(Summary::default()),
        })
    }

    pub fn calls(&self) -> u64 {
        self.state.lock().map(|s| s.calls).unwrap_or_default()
    }

    pub fn op_stats(&self, op: &str) -> Option<OpStats> {
        self.state.lock().ok()?.by_op.get(op).copied()
    }

    pub fn disk_stats(&self, disk: usize) -> Option<OpStats> {
        self.state.lock().ok()?.by_disk.get(disk).copied()
    }

    pub fn log_summary(&self) {
        let Ok(state) = self.state.lock() else {
            return;
        };
        info!(calls = state.calls, "metrics summary");
        for (op, stats) in &state.by_op {
            info!(
                op,
                count = stats.count,
                errors = stats.errors,
                bytes = stats.bytes,
                mean_ms = stats.mean_latency_ms(),
                "op totals"
            );
        }
        for (disk, stats) in state.by_disk.iter().enumerate() {
            info!(
                disk,
                passes = stats.count,
                errors = stats.errors,
                bytes = stats.bytes,
                "disk totals"
            );
        }
    }
}

impl MetricsSink for SummarySink {
    fn record_disk_op(&self, op: DiskOp) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.by_disk.len() <= op.disk {
            state.by_disk.resize(op.disk + 1, OpStats::default());
        }
        state.by_disk[op.disk].add(op.bytes, op.latency_seconds, op.error);
    }

    fn record_raid_op(&self, op: RaidOp) {
        let due = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            state
                .by_op
                .entry(op.op.as_str())
                .or_default()
                .add(op.bytes, op.latency_seconds, op.error);
            state.calls += 1;
            state.calls.is_multiple_of(self.every)
        };
        if due {
            self.log_summary();
        }
    }
}

/// Installs a summary sink for the process. A sink installed earlier stays in
/// place; the returned sink then sees no records.
pub fn install(every: u64) -> Arc<SummarySink> {
    let sink = SummarySink::new(every);
    if !install_metrics_sink(sink.clone()) {
        warn!("metrics sink already installed, summary disabled");
    }
    sink
}

#[cfg(test)]
mod tests {
    use super::*;
    use raidfs::RaidMode;
    use raidfs::metrics::OpKind;

    fn raid_op(op: OpKind, bytes: u64, error: bool) -> RaidOp {
        RaidOp {
            op,
            mode: RaidMode::Raid1,
            bytes,
            latency_seconds: 0.002,
            error,
        }
    }

    #[test]
    fn raid_ops_fold_per_kind() {
        let sink = SummarySink::new(100);
        sink.record_raid_op(raid_op(OpKind::Write, 512, false));
        sink.record_raid_op(raid_op(OpKind::Write, 100, true));
        sink.record_raid_op(raid_op(OpKind::Read, 64, false));

        assert_eq!(sink.calls(), 3);
        let write = sink.op_stats("write").expect("write stats");
        assert_eq!((write.count, write.errors, write.bytes), (2, 1, 612));
        assert!((write.mean_latency_ms() - 2.0).abs() < 1e-9);
        assert_eq!(sink.op_stats("read").map(|s| s.count), Some(1));
        assert!(sink.op_stats("mkdir").is_none());
    }

    #[test]
    fn disk_ops_grow_the_table() {
        let sink = SummarySink::new(1);
        sink.record_disk_op(DiskOp {
            disk: 2,
            op: OpKind::Write,
            bytes: 10,
            latency_seconds: 0.0,
            error: false,
        });
        assert_eq!(sink.disk_stats(2).map(|s| s.bytes), Some(10));
        assert_eq!(sink.disk_stats(0).map(|s| s.count), Some(0));
        assert!(sink.disk_stats(3).is_none());
        sink.log_summary();
    }

    #[test]
    fn zero_interval_is_clamped() {
        let sink = SummarySink::new(0);
        sink.record_raid_op(raid_op(OpKind::Getattr, 0, false));
        assert_eq!(sink.calls(), 1);
    }
}
