use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fuser::{FileAttr, FileType};
use raidfs::layout::constants::BLOCK_SIZE;
use raidfs::{Attr, Fingerprint, RaidFs};
use tracing::{info, warn};

use crate::fs::inodes::{InoTable, ino_for};
use crate::metrics_runtime::SummarySink;

use super::types::FuseFs;

impl<F: Fingerprint> FuseFs<F> {
    #[must_use]
    pub fn new(engine: RaidFs<F>) -> Self {
        Self {
            engine,
            inodes: InoTable::new(),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Option<Arc<SummarySink>>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn file_attr(attr: &Attr) -> FileAttr {
        let kind = if attr.is_dir() {
            FileType::Directory
        } else {
            FileType::RegularFile
        };
        FileAttr {
            ino: ino_for(attr.num),
            size: attr.size,
            blocks: attr.blocks,
            atime: system_time(attr.atime),
            mtime: system_time(attr.mtime),
            ctime: system_time(attr.ctime),
            crtime: system_time(attr.ctime),
            kind,
            perm: (attr.mode & 0o7777) as u16,
            nlink: attr.nlinks,
            uid: attr.uid,
            gid: attr.gid,
            rdev: 0,
            blksize: BLOCK_SIZE as u32,
            flags: 0,
        }
    }

    /// `path_of` returns the path bound to `ino`.
    ///
    /// # Errors
    /// Returns `ENOENT` for an id no lookup has produced.
    pub fn path_of(&self, ino: u64) -> Result<String, i32> {
        self.inodes.path(ino).map(str::to_owned).ok_or(libc::ENOENT)
    }

    /// `attr_at` stats `path` and binds its id to it.
    ///
    /// # Errors
    /// Returns the errno of the engine failure.
    pub fn attr_at(&mut self, path: &str) -> Result<FileAttr, i32> {
        let attr = self.engine.getattr(path).map_err(|e| e.errno())?;
        let file_attr = Self::file_attr(&attr);
        self.inodes.remember(file_attr.ino, path.to_owned());
        Ok(file_attr)
    }

    /// `child_of` turns a kernel `(parent, name)` pair into an engine path.
    ///
    /// # Errors
    /// Returns `EINVAL` for names that are not UTF-8 and `ENOENT` for an
    /// unknown parent.
    pub fn child_of(&self, parent: u64, name: &OsStr) -> Result<String, i32> {
        let name = name.to_str().ok_or(libc::EINVAL)?;
        self.inodes.child_path(parent, name)
    }

    /// Flushes the disks and logs the final metrics summary.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.engine.flush() {
            warn!("flush on unmount failed: {e}");
        }
        if let Some(metrics) = &self.metrics {
            metrics.log_summary();
        }
        info!(calls = self.engine.op_count(), "unmounted");
    }
}

fn system_time(secs: i64) -> SystemTime {
    match u64::try_from(secs) {
        Ok(secs) => UNIX_EPOCH + Duration::from_secs(secs),
        Err(_) => UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()),
    }
}
