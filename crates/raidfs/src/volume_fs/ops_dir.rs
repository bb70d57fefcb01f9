use crate::error::{FsError, FsResult};
use crate::layout::stripe::fingerprint::Fingerprint;
use crate::metrics::OpKind;

use super::session::State;
use super::types::{DirEntry, RaidFs};
use super::{dirent, inode_store, path};

impl<F: Fingerprint> RaidFs<F> {
    /// `readdir` emits `.`, `..` and then every live entry of the directory
    /// at `path`, in slot order, as disk 0 records them.
    ///
    /// # Errors
    /// Returns [`FsError::NotADirectory`] for files and the path errors.
    pub fn readdir(&mut self, path: &str, mut emit: impl FnMut(DirEntry)) -> FsResult<()> {
        self.run(OpKind::Readdir, |fs, session| {
            let listing = fs.pass(session, OpKind::Readdir, 0, 0, |array| {
                let dir = path::resolve(array, path, 0)?;
                if !dir.is_dir() {
                    return Err(FsError::NotADirectory);
                }
                let parent = match path::split_parent(path) {
                    Ok((parent_path, _)) => path::resolve(array, &parent_path, 0)?.num,
                    Err(_) => dir.num,
                };

                let mut listing = vec![
                    DirEntry {
                        name: ".".into(),
                        num: dir.num,
                        is_dir: true,
                    },
                    DirEntry {
                        name: "..".into(),
                        num: parent,
                        is_dir: true,
                    },
                ];
                for entry in dirent::entries(array, &dir, 0)? {
                    let is_dir = inode_store::get(array, entry.num, 0)?
                        .is_some_and(|child| child.is_dir());
                    listing.push(DirEntry {
                        name: entry.name(),
                        num: entry.num,
                        is_dir,
                    });
                }
                Ok(listing)
            })?;

            for entry in listing {
                emit(entry);
            }
            session.complete(State::ReadReady);
            Ok(())
        })
    }
}
