use tracing::{debug, info};

use crate::error::{FsError, FsResult};
use crate::layout::constants::{S_IFDIR, S_IFREG};
use crate::layout::inode::{Inode, Owner};
use crate::layout::stripe::RaidMode;
use crate::layout::stripe::fingerprint::Fingerprint;
use crate::metrics::OpKind;
use crate::retention::array::DiskArray;

use super::session::State;
use super::types::RaidFs;
use super::{dirent, inode_store, path};

const PERM_MASK: u32 = 0o7777;

impl<F: Fingerprint> RaidFs<F> {
    /// `mknod` creates an empty regular file.
    ///
    /// # Errors
    /// Returns [`FsError::AlreadyExists`] for a taken name, the path errors of
    /// the parent lookup and [`FsError::OutOfSpace`] on exhaustion.
    pub fn mknod(&mut self, path: &str, mode: u32) -> FsResult<()> {
        self.create_node(OpKind::Mknod, path, S_IFREG | (mode & PERM_MASK))
    }

    /// `mkdir` creates an empty directory.
    ///
    /// # Errors
    /// Same as [`Self::mknod`].
    pub fn mkdir(&mut self, path: &str, mode: u32) -> FsResult<()> {
        self.create_node(OpKind::Mkdir, path, S_IFDIR | (mode & PERM_MASK))
    }

    fn create_node(&mut self, kind: OpKind, path: &str, mode: u32) -> FsResult<()> {
        let (parent_path, name) = path::split_parent(path)?;
        dirent::check_name(name)?;
        let owner = self.owner;

        self.run(kind, |fs, session| {
            for disk in session.passes() {
                fs.pass(session, kind, disk, 0, |array| {
                    create_on(array, &parent_path, name, mode, owner, disk)
                })?;
            }
            session.complete(State::WriteReady);
            info!(op = kind.as_str(), path, "created");
            Ok(())
        })
    }
}

/// One disk's share of a create. Under RAID0 the inode is claimed on every
/// disk so the tables stay identical; the entry goes through `disk`.
fn create_on(
    array: &mut DiskArray,
    parent_path: &str,
    name: &str,
    mode: u32,
    owner: Owner,
    disk: usize,
) -> FsResult<()> {
    let mut parent = path::resolve(array, parent_path, disk)?;
    if !parent.is_dir() {
        return Err(FsError::NotADirectory);
    }
    if dirent::find(array, &parent, name, disk)?.is_some() {
        return Err(FsError::AlreadyExists);
    }

    let holders: Vec<usize> = match array.mode() {
        RaidMode::Raid0 => (0..array.len()).collect(),
        RaidMode::Raid1 | RaidMode::Raid1V => vec![disk],
    };
    let mut inode = Inode::default();
    let mut claimed = Vec::with_capacity(holders.len());
    for &holder in &holders {
        let created = match inode_store::create(array, holder) {
            Ok(created) => created,
            Err(e) => {
                unwind(array, inode.num, &claimed);
                return Err(e);
            }
        };
        claimed.push(holder);
        if claimed.len() > 1 && created.num != inode.num {
            unwind(array, created.num, &[holder]);
            unwind(array, inode.num, &claimed[..claimed.len() - 1]);
            return Err(FsError::Corrupt(format!(
                "inode tables diverge: disk {holder} handed out {} instead of {}",
                created.num, inode.num
            )));
        }
        inode = created;
        inode_store::initialize(&mut inode, mode, owner);
        if let Err(e) = inode_store::store(array, &inode, holder) {
            unwind(array, inode.num, &claimed);
            return Err(e);
        }
    }

    if let Err(e) = dirent::insert(array, &mut parent, inode.num, name, disk) {
        unwind(array, inode.num, &claimed);
        return Err(e);
    }
    debug!(num = inode.num, parent = parent.num, disk, "node linked");
    Ok(())
}

/// Releases a freshly claimed inode after a failed create.
fn unwind(array: &mut DiskArray, num: u32, disks: &[usize]) {
    for &disk in disks {
        if let Err(e) = inode_store::release(array, num, disk) {
            debug!(num, disk, "release after failed create: {e}");
        }
    }
}
