use std::path::Path;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::FsResult;
use crate::layout::inode::Owner;
use crate::layout::stripe::RaidMode;
use crate::layout::stripe::fingerprint::{Additive, Fingerprint};
use crate::metrics::{self, DiskOp, OpKind, RaidOp};
use crate::retention::array::DiskArray;

use super::session::Session;
use super::types::RaidFs;

impl RaidFs<Additive> {
    #[must_use]
    pub fn new(array: DiskArray) -> Self {
        Self::with_fingerprint(array, Additive)
    }

    /// Maps and validates the images, then builds the engine over them.
    ///
    /// # Errors
    /// Returns the disk set's validation error.
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> FsResult<Self> {
        Ok(Self::new(DiskArray::open(paths)?))
    }
}

impl<F: Fingerprint> RaidFs<F> {
    #[must_use]
    pub fn with_fingerprint(array: DiskArray, fingerprint: F) -> Self {
        Self {
            array,
            fingerprint,
            owner: Owner::current(),
            ops: 0,
        }
    }

    /// Owner stamped on inodes this engine creates.
    #[must_use]
    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    #[must_use]
    pub const fn array(&self) -> &DiskArray {
        &self.array
    }

    #[must_use]
    pub const fn mode(&self) -> RaidMode {
        self.array.mode()
    }

    /// Number of calls served so far.
    #[must_use]
    pub const fn op_count(&self) -> u64 {
        self.ops
    }

    /// # Errors
    /// Returns the first flush failure.
    pub fn flush(&self) -> FsResult<()> {
        self.array.flush()
    }

    /// `run` wraps one call: it opens the session, runs `body` and records
    /// the outcome.
    pub(crate) fn run<T>(
        &mut self,
        kind: OpKind,
        body: impl FnOnce(&mut Self, &mut Session) -> FsResult<T>,
    ) -> FsResult<T> {
        self.ops += 1;
        let mut session = Session::begin(self.array.mode(), self.array.len(), self.ops);
        let started = Instant::now();
        let result = body(self, &mut session);
        if let Err(e) = &result {
            session.fail();
            debug!(op = kind.as_str(), seq = session.op(), errno = e.errno(), "call failed: {e}");
        }
        metrics::record_raid_op(RaidOp {
            op: kind,
            mode: session.mode(),
            bytes: session.bytes(),
            latency_seconds: started.elapsed().as_secs_f64(),
            error: result.is_err(),
        });
        result
    }

    /// `pass` runs `body` against the array with the session pointed at
    /// `disk`. A failure after disk 0 aborts the fan-out; disks already
    /// visited keep their changes.
    pub(crate) fn pass<T>(
        &mut self,
        session: &mut Session,
        kind: OpKind,
        disk: usize,
        bytes: u64,
        body: impl FnOnce(&mut DiskArray) -> FsResult<T>,
    ) -> FsResult<T> {
        session.target(disk);
        let started = Instant::now();
        let result = body(&mut self.array);
        metrics::record_disk_op(DiskOp {
            disk,
            op: kind,
            bytes,
            latency_seconds: started.elapsed().as_secs_f64(),
            error: result.is_err(),
        });
        match &result {
            Ok(_) => debug!(op = kind.as_str(), seq = session.op(), disk, "pass done"),
            Err(e) if disk > 0 && kind.mutates() => warn!(
                op = kind.as_str(),
                seq = session.op(),
                disk,
                "fan-out aborted, disks 0..{disk} keep their changes: {e}"
            ),
            Err(_) => {}
        }
        result
    }
}
