use tracing::{debug, info};

use crate::error::{FsError, FsResult};
use crate::layout::constants::{DIRECT_PTRS, INDIRECT_SLOT, MAX_BLOCKS, ROOT_INO};
use crate::layout::inode::Inode;
use crate::layout::stripe::RaidMode;
use crate::layout::stripe::fingerprint::Fingerprint;
use crate::metrics::OpKind;
use crate::retention::array::DiskArray;

use super::session::State;
use super::types::RaidFs;
use super::{dirent, inode_store, locator, path};

impl<F: Fingerprint> RaidFs<F> {
    /// `unlink` removes a file: its blocks, its entry and its inode.
    ///
    /// # Errors
    /// Returns [`FsError::IsADirectory`] for directories and the path errors.
    pub fn unlink(&mut self, path: &str) -> FsResult<()> {
        self.remove_node(OpKind::Unlink, path, |_, inode, _| {
            if inode.is_dir() {
                return Err(FsError::IsADirectory);
            }
            Ok(())
        })
    }

    /// `rmdir` removes an empty directory through the same path as `unlink`.
    ///
    /// # Errors
    /// Returns [`FsError::NotADirectory`] for files, [`FsError::NotEmpty`]
    /// while entries remain and [`FsError::InvalidPath`] for the root.
    pub fn rmdir(&mut self, path: &str) -> FsResult<()> {
        self.remove_node(OpKind::Rmdir, path, |array, inode, disk| {
            if !inode.is_dir() {
                return Err(FsError::NotADirectory);
            }
            if !dirent::entries(array, inode, disk)?.is_empty() {
                return Err(FsError::NotEmpty);
            }
            Ok(())
        })
    }

    fn remove_node(
        &mut self,
        kind: OpKind,
        path: &str,
        check: impl Fn(&DiskArray, &Inode, usize) -> FsResult<()>,
    ) -> FsResult<()> {
        self.run(kind, |fs, session| {
            for disk in session.passes() {
                fs.pass(session, kind, disk, 0, |array| {
                    let inode = path::resolve(array, path, disk)?;
                    if inode.num == ROOT_INO {
                        return Err(FsError::InvalidPath(path.to_owned()));
                    }
                    check(&*array, &inode, disk)?;
                    remove_on(array, path, &inode, disk)
                })?;
            }
            session.complete(State::DeleteReady);
            info!(op = kind.as_str(), path, "removed");
            Ok(())
        })
    }
}

/// Shared removal: release the data, tombstone the parent entry, then free
/// the inode.
fn remove_on(array: &mut DiskArray, path: &str, inode: &Inode, disk: usize) -> FsResult<()> {
    let (parent_path, _) = path::split_parent(path)?;
    let mut parent = path::resolve(array, &parent_path, disk)?;

    release_blocks(array, inode, disk)?;
    dirent::delete(array, &mut parent, inode.num, disk)?;

    match array.mode() {
        RaidMode::Raid0 => {
            for i in 0..array.len() {
                inode_store::release(array, inode.num, i)?;
            }
        }
        RaidMode::Raid1 | RaidMode::Raid1V => inode_store::release(array, inode.num, disk)?,
    }
    debug!(num = inode.num, parent = parent.num, disk, "inode released");
    Ok(())
}

/// `release_blocks` returns every block `inode` owns to the bitmap of the
/// disk holding it. Under RAID0 data blocks go back to their stripe disk and
/// each disk frees its own indirect block.
///
/// # Errors
/// Returns [`FsError::Corrupt`] for a pointer outside the data region.
pub fn release_blocks(array: &mut DiskArray, inode: &Inode, disk: usize) -> FsResult<()> {
    let bitmap = array.data_bitmap();
    let mode = array.mode();
    let disks = array.len();

    let mut owned = Vec::new();
    for index in 0..MAX_BLOCKS {
        if index >= DIRECT_PTRS as u64 && inode.blocks[INDIRECT_SLOT] == 0 {
            break;
        }
        let ptr = locator::pointer(array, inode, index, disk)?;
        if ptr != 0 {
            owned.push((mode.data_disk(index, disk, disks), ptr));
        }
    }

    let indirect_holders: Vec<usize> = match mode {
        RaidMode::Raid0 => (0..disks).collect(),
        RaidMode::Raid1 | RaidMode::Raid1V => vec![disk],
    };
    for holder in indirect_holders {
        let copy = if holder == disk {
            Some(*inode)
        } else {
            inode_store::get(array, inode.num, holder)?
        };
        if let Some(ind) = copy.map(|c| c.blocks[INDIRECT_SLOT]).filter(|p| *p != 0) {
            owned.push((holder, ind));
        }
    }

    for (holder, ptr) in owned {
        let unit = bitmap.unit_at(ptr).ok_or_else(|| {
            FsError::Corrupt(format!(
                "inode {} points outside the data region: {ptr}",
                inode.num
            ))
        })?;
        bitmap.release(array.disk_mut(holder), unit)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::FsError;
    use crate::layout::constants::BLOCK_SIZE;
    use crate::layout::stripe::RaidMode;
    use crate::test_utils::{payload, test_fs};

    fn usage(fs: &crate::volume_fs::RaidFs) -> Vec<(u64, u64)> {
        let array = fs.array();
        (0..array.len())
            .map(|d| {
                (
                    array.inode_bitmap().count_allocated(array.disk(d)).expect("inodes"),
                    array.data_bitmap().count_allocated(array.disk(d)).expect("blocks"),
                )
            })
            .collect()
    }

    #[test]
    fn unlink_returns_every_block_on_the_right_disk() {
        for mode in [RaidMode::Raid0, RaidMode::Raid1, RaidMode::Raid1V] {
            let (_images, mut fs) = test_fs(mode, 3);
            fs.mknod("/keep", 0o644).expect("mknod");
            let before = usage(&fs);

            fs.mknod("/f", 0o644).expect("mknod");
            fs.write("/f", &payload(12 * BLOCK_SIZE as usize), 0).expect("write");
            assert_ne!(usage(&fs), before);

            fs.unlink("/f").expect("unlink");
            assert_eq!(usage(&fs), before, "{mode}");
            assert!(matches!(fs.getattr("/f"), Err(FsError::NotFound)));
            assert_eq!(fs.getattr("/").expect("root").nlinks, 2);
        }
    }

    #[test]
    fn released_inode_is_reused_lowest_first() {
        let (_images, mut fs) = test_fs(RaidMode::Raid1, 2);
        fs.mknod("/a", 0o644).expect("mknod");
        fs.mknod("/b", 0o644).expect("mknod");
        let a = fs.getattr("/a").expect("a").num;
        fs.unlink("/a").expect("unlink");
        fs.mknod("/c", 0o644).expect("mknod");
        assert_eq!(fs.getattr("/c").expect("c").num, a);
    }

    #[test]
    fn unlink_refuses_directories() {
        let (_images, mut fs) = test_fs(RaidMode::Raid1, 2);
        fs.mkdir("/d", 0o755).expect("mkdir");
        assert!(matches!(fs.unlink("/d"), Err(FsError::IsADirectory)));
        assert!(matches!(fs.unlink("/"), Err(FsError::InvalidPath(_))));
        assert!(matches!(fs.unlink("/missing"), Err(FsError::NotFound)));
    }

    #[test]
    fn rmdir_refuses_non_empty_and_files() {
        let (_images, mut fs) = test_fs(RaidMode::Raid0, 2);
        fs.mkdir("/d", 0o755).expect("mkdir");
        fs.mknod("/d/f", 0o644).expect("mknod");
        fs.mknod("/g", 0o644).expect("mknod");

        let err = fs.rmdir("/d").expect_err("not empty");
        assert!(matches!(err, FsError::NotEmpty));
        assert_eq!(err.errno(), libc::ENOTEMPTY);
        assert!(matches!(fs.rmdir("/g"), Err(FsError::NotADirectory)));
        assert!(matches!(fs.rmdir("/"), Err(FsError::InvalidPath(_))));

        fs.unlink("/d/f").expect("unlink");
        fs.rmdir("/d").expect("rmdir");
        assert!(matches!(fs.getattr("/d"), Err(FsError::NotFound)));
    }

    #[test]
    fn rmdir_releases_the_directory_block() {
        let (_images, mut fs) = test_fs(RaidMode::Raid1V, 3);
        fs.mknod("/keep", 0o644).expect("mknod");
        let before = usage(&fs);
        fs.mkdir("/d", 0o755).expect("mkdir");
        fs.mknod("/d/x", 0o644).expect("mknod");
        fs.unlink("/d/x").expect("unlink");
        fs.rmdir("/d").expect("rmdir");
        assert_eq!(usage(&fs), before);
    }
}
