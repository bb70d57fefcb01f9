#[cfg(test)]
mod array_tests;

use std::fmt::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{FsError, FsResult};
use crate::layout::bits::Bitmap;
use crate::layout::constants::{INODE_RECORD_SIZE, ROOT_INO, SUPERBLOCK_SIZE};
use crate::layout::inode::Inode;
use crate::layout::stripe::RaidMode;
use crate::layout::superblock::{Geometry, Superblock};
use crate::retention::disk::Disk;

/// DiskArray is the validated disk set of one filesystem instance, held in
/// canonical device order: `disk(i)` is the disk whose superblock records
/// `device_order == i`, whatever order the images were supplied in.
pub struct DiskArray {
    disks: Vec<Disk>,
    superblocks: Vec<Superblock>,
    mode: RaidMode,
    geometry: Geometry,
    fs_id: u32,
}

impl DiskArray {
    /// Maps every image and assembles the set.
    ///
    /// # Errors
    /// Returns an error if an image cannot be mapped or the set is invalid.
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> FsResult<Self> {
        let disks = paths
            .iter()
            .map(|p| Disk::open(p.as_ref()))
            .collect::<FsResult<Vec<_>>>()?;
        Self::assemble(disks)
    }

    /// Validates already mapped disks and reorders them by device order.
    ///
    /// # Errors
    /// Returns [`FsError::Configuration`] when the disks do not form one set
    /// and [`FsError::Corrupt`] when a root inode is missing or not a directory.
    pub fn assemble(disks: Vec<Disk>) -> FsResult<Self> {
        if disks.is_empty() {
            return Err(FsError::Configuration("no disks supplied".into()));
        }

        let mut superblocks = Vec::with_capacity(disks.len());
        for disk in &disks {
            let mut buf = [0u8; SUPERBLOCK_SIZE];
            let n = disk.read_at(0, &mut buf);
            let sb = Superblock::parse(&buf[..n]).map_err(|e| {
                FsError::Configuration(format!("{}: {e}", disk.path().display()))
            })?;
            superblocks.push(sb);
        }

        let first = superblocks[0];
        for (disk, sb) in disks.iter().zip(&superblocks) {
            let name = disk.path().display();
            if sb.fs_id != first.fs_id {
                return Err(FsError::Configuration(format!(
                    "{name}: filesystem id {:#x} differs from {:#x}",
                    sb.fs_id, first.fs_id
                )));
            }
            if sb.raid_mode != first.raid_mode {
                return Err(FsError::Configuration(format!(
                    "{name}: raid mode {} differs from {}",
                    sb.raid_mode, first.raid_mode
                )));
            }
            if sb.geometry != first.geometry || sb.disk_count != first.disk_count {
                return Err(FsError::Configuration(format!(
                    "{name}: geometry differs from the rest of the set"
                )));
            }
            let g = sb.geometry;
            if g.inode_count == 0
                || g.block_count == 0
                || Geometry::compute(g.inode_count, g.block_count) != Some(g)
            {
                return Err(FsError::Configuration(format!(
                    "{name}: region layout does not match {} inodes and {} blocks",
                    g.inode_count, g.block_count
                )));
            }
            let needed = g.required_len().unwrap_or(u64::MAX);
            if disk.len() < needed {
                return Err(FsError::Configuration(format!(
                    "{name}: image of {} bytes is smaller than the {needed} bytes its layout declares",
                    disk.len()
                )));
            }
        }

        let count = disks.len();
        if first.raid_mode.is_mirrored() && count < 2 {
            return Err(FsError::Configuration(format!(
                "{} needs at least two disks, got {count}",
                first.raid_mode
            )));
        }
        if first.disk_count != count as u64 {
            return Err(FsError::Configuration(format!(
                "filesystem was formatted for {} disks, got {count}",
                first.disk_count
            )));
        }

        let mut slots: Vec<Option<(Disk, Superblock)>> = (0..count).map(|_| None).collect();
        for (disk, sb) in disks.into_iter().zip(superblocks) {
            let order = usize::try_from(sb.device_order)
                .ok()
                .filter(|o| *o < count)
                .ok_or_else(|| {
                    FsError::Configuration(format!(
                        "{}: device order {} out of range",
                        disk.path().display(),
                        sb.device_order
                    ))
                })?;
            if slots[order].is_some() {
                return Err(FsError::Configuration(format!(
                    "{}: device order {order} claimed twice",
                    disk.path().display()
                )));
            }
            debug!(order, path = %disk.path().display(), "disk placed");
            slots[order] = Some((disk, sb));
        }

        let (disks, superblocks): (Vec<_>, Vec<_>) = slots.into_iter().flatten().unzip();
        let array = Self {
            disks,
            superblocks,
            mode: first.raid_mode,
            geometry: first.geometry,
            fs_id: first.fs_id,
        };
        array.verify_roots()?;

        info!(
            mode = %array.mode,
            disks = count,
            fs_id = array.fs_id,
            inodes = array.geometry.inode_count,
            blocks = array.geometry.block_count,
            "disk set assembled"
        );
        Ok(array)
    }

    fn verify_roots(&self) -> FsResult<()> {
        let bitmap = self.inode_bitmap();
        for (i, disk) in self.disks.iter().enumerate() {
            if !bitmap.is_allocated(disk, u64::from(ROOT_INO))? {
                return Err(FsError::Corrupt(format!("disk {i}: root inode not allocated")));
            }
            let mut raw = [0u8; INODE_RECORD_SIZE];
            disk.read_exact_at(bitmap.unit_offset(u64::from(ROOT_INO)), &mut raw)?;
            if !Inode::from_bytes(&raw).is_dir() {
                return Err(FsError::Corrupt(format!(
                    "disk {i}: root inode is not a directory"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.disks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }

    #[must_use]
    pub const fn mode(&self) -> RaidMode {
        self.mode
    }

    #[must_use]
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    pub const fn fs_id(&self) -> u32 {
        self.fs_id
    }

    #[must_use]
    pub const fn inode_bitmap(&self) -> Bitmap {
        self.geometry.inode_bitmap()
    }

    #[must_use]
    pub const fn data_bitmap(&self) -> Bitmap {
        self.geometry.data_bitmap()
    }

    #[must_use]
    pub fn superblock(&self, i: usize) -> &Superblock {
        &self.superblocks[i]
    }

    #[must_use]
    pub fn disk(&self, i: usize) -> &Disk {
        &self.disks[i]
    }

    pub fn disk_mut(&mut self, i: usize) -> &mut Disk {
        &mut self.disks[i]
    }

    /// Flushes every mapping.
    ///
    /// # Errors
    /// Returns the first flush failure.
    pub fn flush(&self) -> FsResult<()> {
        for disk in &self.disks {
            disk.flush()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn status_string(&self) -> String {
        let mut out = String::new();
        for (i, (d, sb)) in self.disks.iter().zip(&self.superblocks).enumerate() {
            let _ = writeln!(
                out,
                "disk {i}: {} (order={}, len={}, path={})",
                self.mode,
                sb.device_order,
                d.len(),
                d.path().display()
            );
        }
        out
    }
}
