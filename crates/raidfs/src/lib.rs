//! RAID-aware filesystem engine over memory-mapped disk images.
#![allow(clippy::cargo_common_metadata)]

pub mod error;
pub mod layout;
pub mod metrics;
pub mod mkfs;
pub mod retention;
pub mod volume_fs;

pub use error::{FsError, FsResult};
pub use layout::stripe::RaidMode;
pub use layout::stripe::fingerprint::{Additive, Fingerprint, Sha256};
pub use mkfs::{FormatOptions, format};
pub use retention::array::DiskArray;
pub use retention::disk::Disk;
pub use volume_fs::{Attr, DirEntry, RaidFs};
