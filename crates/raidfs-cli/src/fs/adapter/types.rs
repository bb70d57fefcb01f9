use std::sync::Arc;

use raidfs::{Additive, Fingerprint, RaidFs};

use crate::fs::inodes::InoTable;
use crate::metrics_runtime::SummarySink;

/// FuseFs serves kernel requests from a RAID engine. FUSE ids are engine
/// inode numbers shifted by one; `inodes` keeps the path behind each id.
pub struct FuseFs<F: Fingerprint = Additive> {
    pub engine: RaidFs<F>,
    pub inodes: InoTable,
    pub metrics: Option<Arc<SummarySink>>,
}
