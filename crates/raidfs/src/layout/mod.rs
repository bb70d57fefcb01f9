//! On-disk format: superblock, bitmaps, inode and directory records, and the
//! per-mode placement rules.

pub mod bits;
pub mod constants;
pub mod dentry;
pub mod inode;
pub mod stripe;
pub mod superblock;
