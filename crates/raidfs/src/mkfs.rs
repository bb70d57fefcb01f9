//! Image formatter: lays out a fresh filesystem across a disk set.

use tracing::{debug, info};

use crate::error::{FsError, FsResult};
use crate::layout::constants::{INODE_RECORD_SIZE, ROOT_INO, ROOT_MODE};
use crate::layout::inode::{Inode, Owner, unix_now};
use crate::layout::stripe::RaidMode;
use crate::layout::superblock::{Geometry, Superblock};
use crate::retention::disk::Disk;

/// Smallest disk set the formatter accepts.
pub const MIN_DISKS: usize = 2;

/// FormatOptions describes the filesystem `format` writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    pub mode: RaidMode,
    /// Requested inode count, rounded up to a multiple of 32.
    pub inodes: u64,
    /// Requested data block count, rounded up to a multiple of 32.
    pub blocks: u64,
    pub fs_id: u32,
}

impl FormatOptions {
    /// `new` derives the filesystem id from the current time.
    #[must_use]
    pub fn new(mode: RaidMode, inodes: u64, blocks: u64) -> Self {
        Self {
            mode,
            inodes,
            blocks,
            fs_id: unix_now() as u32,
        }
    }

    /// # Errors
    /// Returns [`FsError::Configuration`] when the counts overflow the layout.
    pub fn geometry(&self) -> FsResult<Geometry> {
        Geometry::compute(self.inodes, self.blocks).ok_or_else(|| {
            FsError::Configuration(format!(
                "{} inodes and {} blocks do not fit a disk image",
                self.inodes, self.blocks
            ))
        })
    }
}

/// `format` writes a superblock, empty bitmaps and the root directory inode
/// to every disk. Device order follows the order of `disks`.
///
/// # Errors
/// Returns [`FsError::Configuration`] for fewer than two disks, zero counts,
/// or an image too small for the layout. Nothing is written in those cases.
pub fn format(disks: &mut [Disk], opts: &FormatOptions) -> FsResult<Geometry> {
    if disks.len() < MIN_DISKS {
        return Err(FsError::Configuration(format!(
            "at least {MIN_DISKS} disks required, got {}",
            disks.len()
        )));
    }
    if opts.inodes == 0 || opts.blocks == 0 {
        return Err(FsError::Configuration(
            "inode and block counts must be positive".into(),
        ));
    }

    let geometry = opts.geometry()?;
    let needed = geometry.required_len().unwrap_or(u64::MAX);
    if let Some(small) = disks.iter().find(|d| d.len() < needed) {
        return Err(FsError::Configuration(format!(
            "{}: image of {} bytes is too small, layout needs {needed}",
            small.path().display(),
            small.len()
        )));
    }

    let owner = Owner::current();
    let now = unix_now();
    let disk_count = disks.len() as u64;
    let inode_bitmap = geometry.inode_bitmap();
    let data_bitmap = geometry.data_bitmap();

    for (order, disk) in disks.iter_mut().enumerate() {
        let sb = Superblock {
            geometry,
            fs_id: opts.fs_id,
            raid_mode: opts.mode,
            device_order: order as u64,
            disk_count,
        };
        disk.write_all_at(0, &sb.to_bytes())?;
        inode_bitmap.clear_all(disk)?;
        data_bitmap.clear_all(disk)?;

        let root_at = inode_bitmap.unit_offset(u64::from(ROOT_INO));
        disk.zero(root_at, INODE_RECORD_SIZE)?;
        inode_bitmap.mark(disk, u64::from(ROOT_INO))?;

        let mut root = Inode::zeroed(ROOT_INO);
        root.mode = ROOT_MODE;
        root.uid = owner.uid;
        root.gid = owner.gid;
        root.nlinks = 1;
        root.atime = now;
        root.mtime = now;
        root.ctime = now;
        disk.write_all_at(root_at, &root.to_bytes())?;
        disk.flush()?;
        debug!(order, path = %disk.path().display(), "disk formatted");
    }

    info!(
        mode = %opts.mode,
        disks = disk_count,
        inodes = geometry.inode_count,
        blocks = geometry.block_count,
        fs_id = opts.fs_id,
        "filesystem created"
    );
    Ok(geometry)
}
