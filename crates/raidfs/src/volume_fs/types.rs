use crate::layout::constants::{BLOCK_SIZE, S_IFDIR, S_IFMT};
use crate::layout::inode::{Inode, Owner};
use crate::layout::stripe::fingerprint::{Additive, Fingerprint};
use crate::retention::array::DiskArray;

/// RaidFs owns a validated disk set and serves the eight filesystem calls.
/// `F` fingerprints mirror copies for verified reads.
pub struct RaidFs<F: Fingerprint = Additive> {
    pub(crate) array: DiskArray,
    pub(crate) fingerprint: F,
    pub(crate) owner: Owner,
    pub(crate) ops: u64,
}

/// Attributes reported by `getattr`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attr {
    pub num: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub nlinks: u32,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
    /// Size in 512-byte units.
    pub blocks: u64,
}

impl Attr {
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }
}

impl From<&Inode> for Attr {
    fn from(inode: &Inode) -> Self {
        Self {
            num: inode.num,
            mode: inode.mode,
            uid: inode.uid,
            gid: inode.gid,
            size: inode.size,
            nlinks: inode.nlinks,
            atime: inode.atime,
            mtime: inode.mtime,
            ctime: inode.ctime,
            blocks: inode.size.div_ceil(BLOCK_SIZE),
        }
    }
}

/// One name emitted by `readdir`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub num: u32,
    pub is_dir: bool,
}
