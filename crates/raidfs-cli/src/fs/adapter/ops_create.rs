use std::ffi::OsStr;

use fuser::FileAttr;
use raidfs::Fingerprint;

use super::types::FuseFs;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeKind {
    File,
    Dir,
}

impl<F: Fingerprint> FuseFs<F> {
    pub(crate) fn make_node(
        &mut self,
        parent: u64,
        name: &OsStr,
        mode: u32,
        kind: NodeKind,
    ) -> Result<FileAttr, i32> {
        let path = self.child_of(parent, name)?;
        let created = match kind {
            NodeKind::File => self.engine.mknod(&path, mode),
            NodeKind::Dir => self.engine.mkdir(&path, mode),
        };
        created.map_err(|e| e.errno())?;
        self.attr_at(&path)
    }

    pub(crate) fn remove_node(
        &mut self,
        parent: u64,
        name: &OsStr,
        kind: NodeKind,
    ) -> Result<(), i32> {
        let path = self.child_of(parent, name)?;
        let removed = match kind {
            NodeKind::File => self.engine.unlink(&path),
            NodeKind::Dir => self.engine.rmdir(&path),
        };
        removed.map_err(|e| e.errno())?;
        self.inodes.forget(&path);
        Ok(())
    }
}
