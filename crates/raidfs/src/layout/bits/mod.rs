//! Free-unit bitmaps over a disk region, with the unit storage they guard.

#[cfg(test)]
mod bits_tests;

use crate::error::{FsError, FsResult, Unit};
use crate::retention::disk::Disk;

const WORD_BITS: u64 = 32;
const WORD_BYTES: u64 = 4;

/// Bitmap is a view of one allocation bitmap on a disk. Bit `u` lives in the
/// little-endian word `u / 32` at position `u % 32`; unit `u` owns
/// `unit_size` bytes at `base + u * unit_size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub kind: Unit,
    pub offset: u64,
    pub units: u64,
    pub base: u64,
    pub unit_size: u64,
}

impl Bitmap {
    #[inline]
    const fn locate(unit: u64) -> (u64, u32) {
        (unit / WORD_BITS, (unit % WORD_BITS) as u32)
    }

    fn word_offset(&self, word: u64) -> u64 {
        self.offset + word * WORD_BYTES
    }

    #[inline]
    /// `unit_offset` returns the byte offset of the storage owned by `unit`.
    pub const fn unit_offset(&self, unit: u64) -> u64 {
        self.base + unit * self.unit_size
    }

    /// `unit_at` maps a storage offset back to the unit owning it.
    #[must_use]
    pub const fn unit_at(&self, offset: u64) -> Option<u64> {
        if offset < self.base || (offset - self.base) % self.unit_size != 0 {
            return None;
        }
        let unit = (offset - self.base) / self.unit_size;
        if unit < self.units { Some(unit) } else { None }
    }

    /// `is_allocated` reports whether the bit for `unit` is set.
    ///
    /// # Errors
    /// Returns an error if the bitmap word lies outside the disk image.
    pub fn is_allocated(&self, disk: &Disk, unit: u64) -> FsResult<bool> {
        if unit >= self.units {
            return Ok(false);
        }
        let (word, bit) = Self::locate(unit);
        let w = disk.read_u32(self.word_offset(word))?;
        Ok((w >> bit) & 1 == 1)
    }

    /// `allocate` scans words in index order, claims the lowest free unit and
    /// returns it.
    ///
    /// # Errors
    /// Returns [`FsError::OutOfSpace`] when every unit is taken.
    pub fn allocate(&self, disk: &mut Disk) -> FsResult<u64> {
        let words = self.units.div_ceil(WORD_BITS);
        for word in 0..words {
            let at = self.word_offset(word);
            let w = disk.read_u32(at)?;
            if w == u32::MAX {
                continue;
            }
            let bit = w.trailing_ones();
            let unit = word * WORD_BITS + u64::from(bit);
            if unit >= self.units {
                break;
            }
            disk.write_u32(at, w | (1 << bit))?;
            return Ok(unit);
        }
        Err(FsError::OutOfSpace(self.kind))
    }

    /// `release` clears the bit for `unit` and zero-fills the unit's storage.
    ///
    /// # Errors
    /// Returns an error if `unit` is out of range or the disk access fails.
    pub fn release(&self, disk: &mut Disk, unit: u64) -> FsResult<()> {
        if unit >= self.units {
            return Err(FsError::Corrupt(format!(
                "release of {} unit {unit} beyond {}",
                self.kind, self.units
            )));
        }
        let size = usize::try_from(self.unit_size)
            .map_err(|_| FsError::Corrupt(format!("unit size {}", self.unit_size)))?;
        disk.zero(self.unit_offset(unit), size)?;

        let (word, bit) = Self::locate(unit);
        let at = self.word_offset(word);
        let w = disk.read_u32(at)?;
        disk.write_u32(at, w & !(1 << bit))
    }

    /// `count_allocated` returns the number of set bits.
    ///
    /// # Errors
    /// Returns an error if the bitmap lies outside the disk image.
    pub fn count_allocated(&self, disk: &Disk) -> FsResult<u64> {
        let mut total = 0;
        for unit in 0..self.units {
            if self.is_allocated(disk, unit)? {
                total += 1;
            }
        }
        Ok(total)
    }

    /// `clear_all` zeroes every bitmap word, used when formatting.
    ///
    /// # Errors
    /// Returns an error if the bitmap lies outside the disk image.
    pub fn clear_all(&self, disk: &mut Disk) -> FsResult<()> {
        let bytes = self.units.div_ceil(WORD_BITS) * WORD_BYTES;
        let len = usize::try_from(bytes)
            .map_err(|_| FsError::Configuration(format!("bitmap of {bytes} bytes")))?;
        disk.zero(self.offset, len)
    }

    /// `mark` sets the bit for `unit` without scanning, used when formatting.
    ///
    /// # Errors
    /// Returns an error if the bitmap lies outside the disk image.
    pub fn mark(&self, disk: &mut Disk, unit: u64) -> FsResult<()> {
        let (word, bit) = Self::locate(unit);
        let at = self.word_offset(word);
        let w = disk.read_u32(at)?;
        disk.write_u32(at, w | (1 << bit))
    }
}
