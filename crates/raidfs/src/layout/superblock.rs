//! Per-disk superblock header and region geometry.

use super::bits::Bitmap;
use super::constants::{BLOCK_SIZE, MAGIC, SUPERBLOCK_SIZE, UNIT_ALIGN};
use super::stripe::RaidMode;
use crate::error::Unit;

/// Region offsets and unit counts; identical on every disk of a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub inode_count: u64,
    pub block_count: u64,
    pub inode_bitmap_offset: u64,
    pub data_bitmap_offset: u64,
    pub inode_table_offset: u64,
    pub data_region_offset: u64,
}

impl Geometry {
    /// `compute` rounds both counts up to a multiple of 32 and lays the regions
    /// out after the superblock: inode bitmap, data bitmap, inode table
    /// (block aligned), data region. Returns `None` when the layout does not
    /// fit in a 64-bit byte offset.
    #[must_use]
    pub fn compute(inodes: u64, blocks: u64) -> Option<Self> {
        let inode_count = inodes.div_ceil(UNIT_ALIGN).checked_mul(UNIT_ALIGN)?;
        let block_count = blocks.div_ceil(UNIT_ALIGN).checked_mul(UNIT_ALIGN)?;

        let inode_bitmap_offset = SUPERBLOCK_SIZE as u64;
        let data_bitmap_offset = inode_bitmap_offset.checked_add(inode_count.div_ceil(8))?;
        let bitmaps_end = data_bitmap_offset.checked_add(block_count.div_ceil(8))?;
        let inode_table_offset = bitmaps_end.div_ceil(BLOCK_SIZE).checked_mul(BLOCK_SIZE)?;
        let data_region_offset =
            inode_table_offset.checked_add(inode_count.checked_mul(BLOCK_SIZE)?)?;

        let geometry = Self {
            inode_count,
            block_count,
            inode_bitmap_offset,
            data_bitmap_offset,
            inode_table_offset,
            data_region_offset,
        };
        geometry.required_len().map(|_| geometry)
    }

    /// `required_len` is the smallest image size holding every region, or
    /// `None` if it overflows.
    #[must_use]
    pub const fn required_len(&self) -> Option<u64> {
        match self.block_count.checked_mul(BLOCK_SIZE) {
            Some(data) => self.data_region_offset.checked_add(data),
            None => None,
        }
    }

    /// `inode_bitmap` guards the inode table, one block-sized slot per inode.
    #[must_use]
    pub const fn inode_bitmap(&self) -> Bitmap {
        Bitmap {
            kind: Unit::Inode,
            offset: self.inode_bitmap_offset,
            units: self.inode_count,
            base: self.inode_table_offset,
            unit_size: BLOCK_SIZE,
        }
    }

    /// `data_bitmap` guards the data region.
    #[must_use]
    pub const fn data_bitmap(&self) -> Bitmap {
        Bitmap {
            kind: Unit::Block,
            offset: self.data_bitmap_offset,
            units: self.block_count,
            base: self.data_region_offset,
            unit_size: BLOCK_SIZE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Superblock {
    pub geometry: Geometry,
    pub fs_id: u32,
    pub raid_mode: RaidMode,
    pub device_order: u64,
    pub disk_count: u64,
}

/// Reasons a superblock header fails to decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuperblockError {
    Short,
    BadMagic,
    UnknownRaidMode(u32),
}

impl std::fmt::Display for SuperblockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Short => f.write_str("image shorter than a superblock"),
            Self::BadMagic => f.write_str("bad magic"),
            Self::UnknownRaidMode(m) => write!(f, "unknown raid mode {m}"),
        }
    }
}

impl Superblock {
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SUPERBLOCK_SIZE] {
        let g = &self.geometry;
        let mut buf = [0u8; SUPERBLOCK_SIZE];
        buf[0..8].copy_from_slice(&MAGIC);
        buf[8..16].copy_from_slice(&g.inode_count.to_le_bytes());
        buf[16..24].copy_from_slice(&g.block_count.to_le_bytes());
        buf[24..32].copy_from_slice(&g.inode_bitmap_offset.to_le_bytes());
        buf[32..40].copy_from_slice(&g.data_bitmap_offset.to_le_bytes());
        buf[40..48].copy_from_slice(&g.inode_table_offset.to_le_bytes());
        buf[48..56].copy_from_slice(&g.data_region_offset.to_le_bytes());
        buf[56..60].copy_from_slice(&self.fs_id.to_le_bytes());
        buf[60..64].copy_from_slice(&self.raid_mode.as_raw().to_le_bytes());
        buf[64..72].copy_from_slice(&self.device_order.to_le_bytes());
        buf[72..80].copy_from_slice(&self.disk_count.to_le_bytes());
        buf
    }

    /// # Errors
    /// Returns an error on a short buffer, a bad magic or an unknown mode.
    pub fn parse(buf: &[u8]) -> Result<Self, SuperblockError> {
        if buf.len() < SUPERBLOCK_SIZE {
            return Err(SuperblockError::Short);
        }
        if buf[0..8] != MAGIC {
            return Err(SuperblockError::BadMagic);
        }
        let u64_at = |at: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&buf[at..at + 8]);
            u64::from_le_bytes(raw)
        };
        let u32_at = |at: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&buf[at..at + 4]);
            u32::from_le_bytes(raw)
        };

        let mode = u32_at(60);
        let raid_mode =
            RaidMode::from_raw(mode).ok_or(SuperblockError::UnknownRaidMode(mode))?;

        Ok(Self {
            geometry: Geometry {
                inode_count: u64_at(8),
                block_count: u64_at(16),
                inode_bitmap_offset: u64_at(24),
                data_bitmap_offset: u64_at(32),
                inode_table_offset: u64_at(40),
                data_region_offset: u64_at(48),
            },
            fs_id: u32_at(56),
            raid_mode,
            device_order: u64_at(64),
            disk_count: u64_at(72),
        })
    }
}
