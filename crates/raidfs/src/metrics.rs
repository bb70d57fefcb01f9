use std::sync::{Arc, OnceLock};

use crate::layout::stripe::RaidMode;

/// Engine call a record refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpKind {
    Getattr,
    Mknod,
    Mkdir,
    Unlink,
    Rmdir,
    Read,
    Write,
    Readdir,
}

impl OpKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Getattr => "getattr",
            Self::Mknod => "mknod",
            Self::Mkdir => "mkdir",
            Self::Unlink => "unlink",
            Self::Rmdir => "rmdir",
            Self::Read => "read",
            Self::Write => "write",
            Self::Readdir => "readdir",
        }
    }

    /// Calls that change disk contents.
    #[must_use]
    pub const fn mutates(self) -> bool {
        matches!(
            self,
            Self::Mknod | Self::Mkdir | Self::Unlink | Self::Rmdir | Self::Write
        )
    }
}

/// One pass of a call over a single disk.
#[derive(Clone, Debug)]
pub struct DiskOp {
    pub disk: usize,
    pub op: OpKind,
    pub bytes: u64,
    pub latency_seconds: f64,
    pub error: bool,
}

/// One complete engine call.
#[derive(Copy, Clone, Debug)]
pub struct RaidOp {
    pub op: OpKind,
    pub mode: RaidMode,
    pub bytes: u64,
    pub latency_seconds: f64,
    pub error: bool,
}

pub trait MetricsSink: Send + Sync + 'static {
    fn record_disk_op(&self, op: DiskOp);
    fn record_raid_op(&self, op: RaidOp);
}

static METRICS_SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

/// Installs the process-wide sink. Only the first call wins.
pub fn install_metrics_sink(sink: Arc<dyn MetricsSink>) -> bool {
    METRICS_SINK.set(sink).is_ok()
}

pub fn is_enabled() -> bool {
    METRICS_SINK.get().is_some()
}

pub fn record_disk_op(op: DiskOp) {
    if let Some(sink) = METRICS_SINK.get() {
        sink.record_disk_op(op);
    }
}

pub fn record_raid_op(op: RaidOp) {
    if let Some(sink) = METRICS_SINK.get() {
        sink.record_raid_op(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct TestSink {
        disk_ops: Mutex<Vec<DiskOp>>,
        raid_ops: Mutex<Vec<RaidOp>>,
    }

    impl MetricsSink for TestSink {
        fn record_disk_op(&self, op: DiskOp) {
            self.disk_ops.lock().unwrap().push(op);
        }

        fn record_raid_op(&self, op: RaidOp) {
            self.raid_ops.lock().unwrap().push(op);
        }
    }

    #[test]
    fn metrics_sink_records_ops_when_enabled() {
        let sink = Arc::new(TestSink {
            disk_ops: Mutex::new(Vec::new()),
            raid_ops: Mutex::new(Vec::new()),
        });

        assert!(install_metrics_sink(sink.clone()));
        assert!(is_enabled());
        assert!(!install_metrics_sink(sink.clone()), "second install must lose");

        record_disk_op(DiskOp {
            disk: 1,
            op: OpKind::Write,
            bytes: 2048,
            latency_seconds: 0.15,
            error: false,
        });
        record_raid_op(RaidOp {
            op: OpKind::Read,
            mode: RaidMode::Raid1V,
            bytes: 512,
            latency_seconds: 0.05,
            error: true,
        });

        // Engine tests in the same binary may record too; look for ours.
        let disk_ops = sink.disk_ops.lock().unwrap();
        assert!(
            disk_ops
                .iter()
                .any(|d| d.disk == 1 && d.bytes == 2048 && d.op == OpKind::Write && !d.error)
        );

        let raid_ops = sink.raid_ops.lock().unwrap();
        assert!(raid_ops.iter().any(|r| r.bytes == 512
            && r.error
            && r.op == OpKind::Read
            && r.mode == RaidMode::Raid1V));
    }

    #[test]
    fn op_names_are_lowercase_call_names() {
        assert_eq!(OpKind::Getattr.as_str(), "getattr");
        assert_eq!(OpKind::Readdir.as_str(), "readdir");
        assert!(OpKind::Write.mutates());
        assert!(!OpKind::Read.mutates());
    }
}
