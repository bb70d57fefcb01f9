//! Backing disks and the validated, canonically ordered disk set.

pub mod array;
pub mod disk;
