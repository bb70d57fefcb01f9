//! Absolute path resolution by directory scans.

use super::{dirent, inode_store};
use crate::error::{FsError, FsResult};
use crate::layout::constants::ROOT_INO;
use crate::layout::inode::Inode;
use crate::retention::array::DiskArray;

fn components(path: &str) -> FsResult<impl Iterator<Item = &str>> {
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| FsError::InvalidPath(path.to_owned()))?;
    Ok(rest.split('/').filter(|c| !c.is_empty()))
}

/// `root` loads inode 0 of `disk`.
///
/// # Errors
/// Returns [`FsError::Corrupt`] when the root slot is not allocated.
pub fn root(array: &DiskArray, disk: usize) -> FsResult<Inode> {
    inode_store::get(array, ROOT_INO, disk)?
        .ok_or_else(|| FsError::Corrupt(format!("root inode missing on disk {disk}")))
}

/// `resolve` walks `path` from the root of `disk`, one component at a time.
/// The first live entry with a matching name wins.
///
/// # Errors
/// Returns [`FsError::NotFound`] at the first missing component and
/// [`FsError::NotADirectory`] when descending through a non-directory.
pub fn resolve(array: &DiskArray, path: &str, disk: usize) -> FsResult<Inode> {
    let mut current = root(array, disk)?;
    for name in components(path)? {
        if !current.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let num = dirent::find(array, &current, name, disk)?.ok_or(FsError::NotFound)?;
        current = inode_store::get(array, num, disk)?.ok_or_else(|| {
            FsError::Corrupt(format!("entry {name} points at free inode {num}"))
        })?;
    }
    Ok(current)
}

/// `split_parent` separates the last component from its parent path.
/// `"/a/b"` gives `("/a", "b")`; the root has no parent.
///
/// # Errors
/// Returns [`FsError::InvalidPath`] for relative paths and the root.
pub fn split_parent(path: &str) -> FsResult<(String, &str)> {
    let parts: Vec<&str> = components(path)?.collect();
    let Some((name, parents)) = parts.split_last() else {
        return Err(FsError::InvalidPath(path.to_owned()));
    };
    Ok((format!("/{}", parents.join("/")), *name))
}
