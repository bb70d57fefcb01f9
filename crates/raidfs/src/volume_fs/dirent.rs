//! Directory content: a flat run of fixed-size entries read through the
//! block locator.

use tracing::debug;

use super::inode_store;
use super::locator::{self, Location};
use crate::error::{FsError, FsResult};
use crate::layout::constants::{BLOCK_SIZE, DENTRY_SIZE, MAX_NAME_LEN};
use crate::layout::dentry::{Dentry, NUM_FIELD_OFFSET};
use crate::layout::inode::Inode;
use crate::layout::stripe::RaidMode;
use crate::retention::array::DiskArray;

/// `check_name` rejects names that cannot be stored in an entry.
///
/// # Errors
/// Returns [`FsError::InvalidPath`] for empty, `.`, `..` or slash-carrying
/// names and [`FsError::NameTooLong`] past the name field.
pub fn check_name(name: &str) -> FsResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(FsError::InvalidPath(name.to_owned()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(FsError::NameTooLong(MAX_NAME_LEN));
    }
    Ok(())
}

/// `scan` walks every slot of `dir` in order, tombstones included. Slots in
/// an unallocated block are skipped.
///
/// # Errors
/// Returns an error if a slot cannot be read.
pub fn scan(array: &DiskArray, dir: &Inode, disk: usize) -> FsResult<Vec<(Location, Dentry)>> {
    let mut slots = Vec::new();
    let mut off = 0;
    while off < dir.size {
        let Some(loc) = locator::lookup(array, dir, off, disk)? else {
            off = (off / BLOCK_SIZE + 1) * BLOCK_SIZE;
            continue;
        };
        let mut raw = [0u8; DENTRY_SIZE as usize];
        array.disk(loc.disk).read_exact_at(loc.offset, &mut raw)?;
        slots.push((loc, Dentry::from_bytes(&raw)));
        off += DENTRY_SIZE;
    }
    Ok(slots)
}

/// `entries` lists the live entries of `dir`.
///
/// # Errors
/// Returns an error if a slot cannot be read.
pub fn entries(array: &DiskArray, dir: &Inode, disk: usize) -> FsResult<Vec<Dentry>> {
    Ok(scan(array, dir, disk)?
        .into_iter()
        .filter_map(|(_, d)| d.is_live().then_some(d))
        .collect())
}

/// `find` returns the inode number of the first live entry called `name`.
///
/// # Errors
/// Returns an error if a slot cannot be read.
pub fn find(array: &DiskArray, dir: &Inode, name: &str, disk: usize) -> FsResult<Option<u32>> {
    Ok(scan(array, dir, disk)?
        .into_iter()
        .find(|(_, d)| d.is_live() && d.matches(name))
        .map(|(_, d)| d.num))
}

/// `insert` links `child` into `parent` under `name`. The first tombstone is
/// reused; otherwise the directory grows by one block and the entry opens it.
/// The parent's link count goes up by one, and its size by a block on growth.
///
/// # Errors
/// Returns [`FsError::AlreadyExists`] for a taken name and the allocator's
/// errors when the directory cannot grow.
pub fn insert(
    array: &mut DiskArray,
    parent: &mut Inode,
    child: u32,
    name: &str,
    disk: usize,
) -> FsResult<()> {
    check_name(name)?;
    let slots = scan(array, parent, disk)?;
    if slots.iter().any(|(_, d)| d.is_live() && d.matches(name)) {
        return Err(FsError::AlreadyExists);
    }

    let entry = Dentry::new(name, child);
    let free = slots.iter().find(|(_, d)| !d.is_live()).map(|(loc, _)| *loc);
    let grew = free.is_none();
    let loc = match free {
        Some(loc) => loc,
        None => {
            let end = parent.size;
            locator::resolve(array, parent, end, true, disk)?.ok_or_else(|| {
                FsError::Corrupt(format!("directory {} did not grow", parent.num))
            })?
        }
    };
    array
        .disk_mut(loc.disk)
        .write_all_at(loc.offset, &entry.to_bytes())?;

    parent.nlinks += 1;
    if grew {
        parent.size += BLOCK_SIZE;
    }
    debug!(parent = parent.num, child, name, grew, "entry inserted");
    persist_parent(array, parent, disk)
}

/// `delete` tombstones the entry pointing at `child` by zeroing its number
/// field, and drops one link from `parent`.
///
/// # Errors
/// Returns [`FsError::NotFound`] if no live entry points at `child`.
pub fn delete(array: &mut DiskArray, parent: &mut Inode, child: u32, disk: usize) -> FsResult<()> {
    let loc = scan(array, parent, disk)?
        .into_iter()
        .find(|(_, d)| d.is_live() && d.num == child)
        .map(|(loc, _)| loc)
        .ok_or(FsError::NotFound)?;
    array
        .disk_mut(loc.disk)
        .write_u32(loc.offset + NUM_FIELD_OFFSET, 0)?;

    parent.nlinks = parent.nlinks.saturating_sub(1);
    debug!(parent = parent.num, child, "entry deleted");
    persist_parent(array, parent, disk)
}

fn persist_parent(array: &mut DiskArray, parent: &Inode, disk: usize) -> FsResult<()> {
    match array.mode() {
        RaidMode::Raid0 => {
            let (nlinks, size) = (parent.nlinks, parent.size);
            inode_store::mirror(array, parent.num, |p| {
                p.nlinks = nlinks;
                p.size = size;
            })
        }
        RaidMode::Raid1 | RaidMode::Raid1V => inode_store::store(array, parent, disk),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::constants::{DENTRIES_PER_BLOCK, ROOT_INO};
    use crate::test_utils::formatted_array;

    fn root(array: &DiskArray, disk: usize) -> Inode {
        inode_store::get(array, ROOT_INO, disk)
            .expect("get")
            .expect("root")
    }

    #[test]
    fn check_name_limits() {
        assert!(check_name("a").is_ok());
        assert!(check_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(matches!(
            check_name(&"x".repeat(MAX_NAME_LEN + 1)),
            Err(FsError::NameTooLong(27))
        ));
        for bad in ["", ".", "..", "a/b"] {
            assert!(matches!(check_name(bad), Err(FsError::InvalidPath(_))));
        }
    }

    #[test]
    fn insert_grows_by_one_block_then_fills_it() {
        let (_images, mut array) = formatted_array(RaidMode::Raid1, 2, 32, 64);
        let mut dir = root(&array, 0);

        insert(&mut array, &mut dir, 3, "first", 0).expect("insert");
        assert_eq!(dir.size, BLOCK_SIZE);
        assert_eq!(dir.nlinks, 2);
        insert(&mut array, &mut dir, 4, "second", 0).expect("insert");
        assert_eq!(dir.size, BLOCK_SIZE, "second entry fits the same block");
        assert_eq!(dir.nlinks, 3);

        let slots = scan(&array, &dir, 0).expect("scan");
        assert_eq!(slots.len() as u64, DENTRIES_PER_BLOCK);
        assert_eq!(find(&array, &dir, "second", 0).expect("find"), Some(4));
        assert_eq!(root(&array, 0), dir, "parent persisted");
    }

    #[test]
    fn tombstone_is_reused() {
        let (_images, mut array) = formatted_array(RaidMode::Raid1, 2, 32, 64);
        let mut dir = root(&array, 0);
        insert(&mut array, &mut dir, 3, "a", 0).expect("insert");
        insert(&mut array, &mut dir, 4, "b", 0).expect("insert");
        let first_slot = scan(&array, &dir, 0).expect("scan")[0].0;

        delete(&mut array, &mut dir, 3, 0).expect("delete");
        assert_eq!(find(&array, &dir, "a", 0).expect("find"), None);
        assert_eq!(dir.nlinks, 2);

        insert(&mut array, &mut dir, 5, "c", 0).expect("insert");
        let slots = scan(&array, &dir, 0).expect("scan");
        assert_eq!(slots[0].0, first_slot);
        assert_eq!(slots[0].1.num, 5);
        assert_eq!(dir.size, BLOCK_SIZE);
    }

    #[test]
    fn full_block_grows_into_a_second_block() {
        let (_images, mut array) = formatted_array(RaidMode::Raid1, 2, 32, 64);
        let mut dir = root(&array, 0);
        for i in 0..=DENTRIES_PER_BLOCK {
            let num = u32::try_from(i + 1).expect("num");
            insert(&mut array, &mut dir, num, &format!("f{i}"), 0).expect("insert");
        }
        assert_eq!(dir.size, 2 * BLOCK_SIZE);
        assert_eq!(entries(&array, &dir, 0).expect("entries").len() as u64, DENTRIES_PER_BLOCK + 1);
    }

    #[test]
    fn insert_rejects_duplicate_names() {
        let (_images, mut array) = formatted_array(RaidMode::Raid1, 2, 32, 64);
        let mut dir = root(&array, 0);
        insert(&mut array, &mut dir, 3, "dupe", 0).expect("insert");
        let err = insert(&mut array, &mut dir, 4, "dupe", 0).expect_err("duplicate");
        assert!(matches!(err, FsError::AlreadyExists));
        assert_eq!(dir.nlinks, 2);
    }

    #[test]
    fn delete_of_absent_child_is_not_found() {
        let (_images, mut array) = formatted_array(RaidMode::Raid1, 2, 32, 64);
        let mut dir = root(&array, 0);
        let err = delete(&mut array, &mut dir, 9, 0).expect_err("absent");
        assert!(matches!(err, FsError::NotFound));
    }

    #[test]
    fn raid0_parent_metadata_is_mirrored() {
        let (_images, mut array) = formatted_array(RaidMode::Raid0, 3, 32, 64);
        let mut dir = root(&array, 0);
        insert(&mut array, &mut dir, 1, "x", 0).expect("insert");
        for disk in 0..3 {
            let copy = root(&array, disk);
            assert_eq!(copy.nlinks, 2);
            assert_eq!(copy.size, BLOCK_SIZE);
            assert_eq!(copy.blocks, dir.blocks);
        }
    }
}
