use fuser::FileAttr;
use raidfs::{Fingerprint, RaidMode};

use super::types::FuseFs;

/// Block and inode totals reported by statfs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatCounts {
    pub blocks: u64,
    pub bfree: u64,
    pub files: u64,
    pub ffree: u64,
}

impl<F: Fingerprint> FuseFs<F> {
    /// Attributes are fixed after creation apart from what writes change.
    /// Time updates are accepted and ignored so `touch` works; a size equal
    /// to the current one is a no-op.
    pub(crate) fn check_setattr(
        &mut self,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
    ) -> Result<FileAttr, i32> {
        let path = self.path_of(ino)?;
        let attr = self.attr_at(&path)?;
        if mode.is_some() || uid.is_some() || gid.is_some() {
            return Err(libc::EPERM);
        }
        if size.is_some_and(|s| s != attr.size) {
            return Err(libc::EOPNOTSUPP);
        }
        Ok(attr)
    }

    /// Under RAID0 every disk contributes its data region; mirrors report
    /// the capacity of one copy.
    pub(crate) fn stat_counts(&self) -> Result<StatCounts, i32> {
        let array = self.engine.array();
        let geometry = array.geometry();
        let holders = match array.mode() {
            RaidMode::Raid0 => array.len(),
            RaidMode::Raid1 | RaidMode::Raid1V => 1,
        };

        let data = array.data_bitmap();
        let mut blocks = 0;
        let mut used = 0;
        for disk in 0..holders {
            blocks += geometry.block_count;
            used += data
                .count_allocated(array.disk(disk))
                .map_err(|e| e.errno())?;
        }
        let used_inodes = array
            .inode_bitmap()
            .count_allocated(array.disk(0))
            .map_err(|e| e.errno())?;

        Ok(StatCounts {
            blocks,
            bfree: blocks.saturating_sub(used),
            files: geometry.inode_count,
            ffree: geometry.inode_count.saturating_sub(used_inodes),
        })
    }
}
