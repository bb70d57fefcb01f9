//! Constants the FUSE adapter reports to the kernel.

use std::time::Duration;

/// FS_NAME is the filesystem name shown in the mount table.
pub const FS_NAME: &str = "raidfs";
/// TTL controls kernel cache TTL for attribute entries.
pub const TTL: Duration = Duration::from_secs(1);
/// INO_OFFSET maps engine inode numbers onto FUSE ids, which start at 1.
pub const INO_OFFSET: u64 = 1;
/// ROOT_ID is the FUSE id of the root directory.
pub const ROOT_ID: u64 = fuser::FUSE_ROOT_ID;
