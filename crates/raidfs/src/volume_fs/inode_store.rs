//! Inode lookup, creation and release against one disk of the set.

use crate::error::{FsError, FsResult};
use crate::layout::constants::INODE_RECORD_SIZE;
use crate::layout::inode::{Inode, Owner, unix_now};
use crate::retention::array::DiskArray;

/// `get` returns the inode only when its bitmap bit is set.
///
/// # Errors
/// Returns an error if the slot cannot be read.
pub fn get(array: &DiskArray, num: u32, disk: usize) -> FsResult<Option<Inode>> {
    let bitmap = array.inode_bitmap();
    if !bitmap.is_allocated(array.disk(disk), u64::from(num))? {
        return Ok(None);
    }
    let mut raw = [0u8; INODE_RECORD_SIZE];
    array
        .disk(disk)
        .read_exact_at(bitmap.unit_offset(u64::from(num)), &mut raw)?;
    Ok(Some(Inode::from_bytes(&raw)))
}

/// `create` claims the lowest free slot and returns a zeroed inode numbered
/// after it. The zeroed record is written so a stale slot never leaks.
///
/// # Errors
/// Returns [`FsError::OutOfSpace`] when the inode table is full.
pub fn create(array: &mut DiskArray, disk: usize) -> FsResult<Inode> {
    let bitmap = array.inode_bitmap();
    let unit = bitmap.allocate(array.disk_mut(disk))?;
    let num = u32::try_from(unit)
        .map_err(|_| FsError::Corrupt(format!("inode number {unit} overflows")))?;
    let inode = Inode::zeroed(num);
    store(array, &inode, disk)?;
    Ok(inode)
}

/// `initialize` stamps a fresh inode with its mode, owner and times.
pub fn initialize(inode: &mut Inode, mode: u32, owner: Owner) {
    let now = unix_now();
    inode.mode = mode;
    inode.uid = owner.uid;
    inode.gid = owner.gid;
    inode.size = 0;
    inode.nlinks = 1;
    inode.atime = now;
    inode.mtime = now;
    inode.ctime = now;
}

/// `store` writes `inode` back to its slot on `disk`.
///
/// # Errors
/// Returns an error if the slot lies outside the image.
pub fn store(array: &mut DiskArray, inode: &Inode, disk: usize) -> FsResult<()> {
    let at = array.inode_bitmap().unit_offset(u64::from(inode.num));
    array.disk_mut(disk).write_all_at(at, &inode.to_bytes())
}

/// `mirror` applies `update` to the copy of inode `num` held by every disk.
///
/// # Errors
/// Returns [`FsError::Corrupt`] if a disk lacks the inode.
pub fn mirror(array: &mut DiskArray, num: u32, update: impl Fn(&mut Inode)) -> FsResult<()> {
    for disk in 0..array.len() {
        let mut inode = get(array, num, disk)?
            .ok_or_else(|| FsError::Corrupt(format!("inode {num} missing on disk {disk}")))?;
        update(&mut inode);
        store(array, &inode, disk)?;
    }
    Ok(())
}

/// `release` zero-fills the slot and clears its bit. Blocks owned by the
/// inode must already be released.
///
/// # Errors
/// Returns an error if the bitmap or slot cannot be written.
pub fn release(array: &mut DiskArray, num: u32, disk: usize) -> FsResult<()> {
    let bitmap = array.inode_bitmap();
    bitmap.release(array.disk_mut(disk), u64::from(num))
}
