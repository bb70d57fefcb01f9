//! FUSE adapter over the RAID filesystem engine.

pub mod adapter;
pub mod constants;
pub mod inodes;

pub use adapter::FuseFs;
pub use constants::*;
