//! The filesystem engine: path-based calls fanned out over a disk set.

mod core;
pub mod dirent;
pub mod inode_store;
pub mod locator;
mod ops_attr;
mod ops_create;
mod ops_delete;
mod ops_dir;
mod ops_io;
pub mod path;
pub mod session;
mod types;

pub use session::{Session, State};
pub use types::{Attr, DirEntry, RaidFs};
