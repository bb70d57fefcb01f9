//! Fixed-size inode record.

use std::time::{SystemTime, UNIX_EPOCH};

use super::constants::{INODE_RECORD_SIZE, N_PTRS, S_IFDIR, S_IFMT, S_IFREG};

/// Owner and group stamped on new inodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

impl Owner {
    /// `current` returns the ids of the running process.
    #[must_use]
    pub fn current() -> Self {
        Self {
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }
}

/// Seconds since the epoch, as stored in inode timestamps.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Decoded copy of one inode slot. Mutations only reach the disk through the
/// inode store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Inode {
    pub num: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub nlinks: u32,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
    /// Six direct pointers followed by the indirect pointer. 0 = unallocated.
    pub blocks: [u64; N_PTRS],
}

impl Inode {
    #[must_use]
    pub const fn zeroed(num: u32) -> Self {
        Self {
            num,
            mode: 0,
            uid: 0,
            gid: 0,
            size: 0,
            nlinks: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
            blocks: [0; N_PTRS],
        }
    }

    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    #[must_use]
    pub const fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; INODE_RECORD_SIZE] {
        let mut buf = [0u8; INODE_RECORD_SIZE];
        buf[0..4].copy_from_slice(&self.num.to_le_bytes());
        buf[4..8].copy_from_slice(&self.mode.to_le_bytes());
        buf[8..12].copy_from_slice(&self.uid.to_le_bytes());
        buf[12..16].copy_from_slice(&self.gid.to_le_bytes());
        buf[16..24].copy_from_slice(&self.size.to_le_bytes());
        buf[24..28].copy_from_slice(&self.nlinks.to_le_bytes());
        buf[32..40].copy_from_slice(&self.atime.to_le_bytes());
        buf[40..48].copy_from_slice(&self.mtime.to_le_bytes());
        buf[48..56].copy_from_slice(&self.ctime.to_le_bytes());
        for (i, ptr) in self.blocks.iter().enumerate() {
            let at = 56 + i * 8;
            buf[at..at + 8].copy_from_slice(&ptr.to_le_bytes());
        }
        buf
    }

    #[must_use]
    pub fn from_bytes(buf: &[u8; INODE_RECORD_SIZE]) -> Self {
        let u32_at = |at: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&buf[at..at + 4]);
            u32::from_le_bytes(raw)
        };
        let u64_at = |at: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&buf[at..at + 8]);
            u64::from_le_bytes(raw)
        };
        let i64_at = |at: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&buf[at..at + 8]);
            i64::from_le_bytes(raw)
        };

        let mut blocks = [0u64; N_PTRS];
        for (i, ptr) in blocks.iter_mut().enumerate() {
            *ptr = u64_at(56 + i * 8);
        }

        Self {
            num: u32_at(0),
            mode: u32_at(4),
            uid: u32_at(8),
            gid: u32_at(12),
            size: u64_at(16),
            nlinks: u32_at(24),
            atime: i64_at(32),
            mtime: i64_at(40),
            ctime: i64_at(48),
            blocks,
        }
    }
}
