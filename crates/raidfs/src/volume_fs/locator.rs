//! Maps (inode, byte offset) to the disk and byte holding it.

use tracing::debug;

use super::inode_store;
use crate::error::{FsError, FsResult};
use crate::layout::constants::{BLOCK_SIZE, DIRECT_PTRS, INDIRECT_SLOT, MAX_BLOCKS, PTR_SIZE};
use crate::layout::inode::Inode;
use crate::layout::stripe::RaidMode;
use crate::retention::array::DiskArray;

/// Physical position of one byte of an inode's data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub disk: usize,
    pub offset: u64,
}

fn block_index(offset: u64) -> FsResult<u64> {
    let index = offset / BLOCK_SIZE;
    if index >= MAX_BLOCKS {
        return Err(FsError::OutOfRange(offset));
    }
    Ok(index)
}

fn indirect_slot_offset(indirect: u64, index: u64) -> u64 {
    indirect + (index - DIRECT_PTRS as u64) * PTR_SIZE
}

/// `pointer` reads the block pointer for logical block `index` out of the
/// copy of `inode` held by `disk`. A missing indirect block reads as 0.
///
/// # Errors
/// Returns an error if the indirect block lies outside the image.
pub fn pointer(array: &DiskArray, inode: &Inode, index: u64, disk: usize) -> FsResult<u64> {
    if index < DIRECT_PTRS as u64 {
        return Ok(inode.blocks[index as usize]);
    }
    let indirect = inode.blocks[INDIRECT_SLOT];
    if indirect == 0 {
        return Ok(0);
    }
    array.disk(disk).read_u64(indirect_slot_offset(indirect, index))
}

/// `lookup` resolves `offset` without allocating. Holes yield `None`.
///
/// # Errors
/// Returns [`FsError::OutOfRange`] past the addressable size of an inode.
pub fn lookup(
    array: &DiskArray,
    inode: &Inode,
    offset: u64,
    disk: usize,
) -> FsResult<Option<Location>> {
    let index = block_index(offset)?;
    let ptr = pointer(array, inode, index, disk)?;
    if ptr == 0 {
        return Ok(None);
    }
    Ok(Some(Location {
        disk: array.mode().data_disk(index, disk, array.len()),
        offset: ptr + offset % BLOCK_SIZE,
    }))
}

/// `resolve` is [`lookup`] that can fill holes. With `allocate` set a
/// missing indirect block and data block are allocated and the new pointers
/// persisted: on the addressed disk for mirrored modes, on every disk's copy
/// under RAID0. `inode` is updated in place.
///
/// # Errors
/// Returns [`FsError::OutOfRange`] before any allocation when `offset` is
/// past the addressable size, and [`FsError::OutOfSpace`] when a bitmap is
/// exhausted.
pub fn resolve(
    array: &mut DiskArray,
    inode: &mut Inode,
    offset: u64,
    allocate: bool,
    disk: usize,
) -> FsResult<Option<Location>> {
    let index = block_index(offset)?;
    if !allocate {
        return lookup(array, inode, offset, disk);
    }
    if let Some(found) = lookup(array, inode, offset, disk)? {
        return Ok(Some(found));
    }

    if index >= DIRECT_PTRS as u64 && inode.blocks[INDIRECT_SLOT] == 0 {
        ensure_indirect(array, inode, disk)?;
    }

    let mode = array.mode();
    let data_disk = mode.data_disk(index, disk, array.len());
    let bitmap = array.data_bitmap();
    let unit = bitmap.allocate(array.disk_mut(data_disk))?;
    let ptr = bitmap.unit_offset(unit);
    debug!(num = inode.num, index, data_disk, ptr, "block allocated");

    match mode {
        RaidMode::Raid0 => {
            for i in 0..array.len() {
                let mut copy = if i == disk {
                    *inode
                } else {
                    inode_store::get(array, inode.num, i)?.ok_or_else(|| {
                        FsError::Corrupt(format!("inode {} missing on disk {i}", inode.num))
                    })?
                };
                set_pointer(array, &mut copy, index, ptr, i)?;
                if i == disk {
                    *inode = copy;
                }
            }
        }
        RaidMode::Raid1 | RaidMode::Raid1V => set_pointer(array, inode, index, ptr, disk)?,
    }

    Ok(Some(Location {
        disk: data_disk,
        offset: ptr + offset % BLOCK_SIZE,
    }))
}

/// Writes `ptr` into the slot for `index` of the copy held by `disk`. Direct
/// slots live in the inode record, indirect slots in the disk's own indirect
/// block.
fn set_pointer(
    array: &mut DiskArray,
    inode: &mut Inode,
    index: u64,
    ptr: u64,
    disk: usize,
) -> FsResult<()> {
    if index < DIRECT_PTRS as u64 {
        inode.blocks[index as usize] = ptr;
        return inode_store::store(array, inode, disk);
    }
    let indirect = inode.blocks[INDIRECT_SLOT];
    if indirect == 0 {
        return Err(FsError::Corrupt(format!(
            "inode {} has no indirect block on disk {disk}",
            inode.num
        )));
    }
    array
        .disk_mut(disk)
        .write_u64(indirect_slot_offset(indirect, index), ptr)
}

/// Gives the inode an indirect block. Under RAID0 every disk receives a
/// private one, allocated from its own bitmap.
fn ensure_indirect(array: &mut DiskArray, inode: &mut Inode, disk: usize) -> FsResult<()> {
    let bitmap = array.data_bitmap();
    let targets = match array.mode() {
        RaidMode::Raid0 => 0..array.len(),
        RaidMode::Raid1 | RaidMode::Raid1V => disk..disk + 1,
    };
    for i in targets {
        let mut copy = if i == disk {
            *inode
        } else {
            inode_store::get(array, inode.num, i)?.ok_or_else(|| {
                FsError::Corrupt(format!("inode {} missing on disk {i}", inode.num))
            })?
        };
        if copy.blocks[INDIRECT_SLOT] == 0 {
            let unit = bitmap.allocate(array.disk_mut(i))?;
            copy.blocks[INDIRECT_SLOT] = bitmap.unit_offset(unit);
            inode_store::store(array, &copy, i)?;
            debug!(num = inode.num, disk = i, "indirect block allocated");
        }
        if i == disk {
            *inode = copy;
        }
    }
    Ok(())
}
