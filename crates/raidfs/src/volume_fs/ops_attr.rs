use crate::error::FsResult;
use crate::layout::stripe::fingerprint::Fingerprint;
use crate::metrics::OpKind;

use super::path;
use super::session::State;
use super::types::{Attr, RaidFs};

impl<F: Fingerprint> RaidFs<F> {
    /// `getattr` reports the attributes of `path` as disk 0 sees them.
    ///
    /// # Errors
    /// Returns [`crate::FsError::NotFound`] for a missing path.
    pub fn getattr(&mut self, path: &str) -> FsResult<Attr> {
        self.run(OpKind::Getattr, |fs, session| {
            let inode = fs.pass(session, OpKind::Getattr, 0, 0, |array| {
                path::resolve(array, path, 0)
            })?;
            session.complete(State::ReadReady);
            Ok(Attr::from(&inode))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::FsError;
    use crate::layout::constants::{ROOT_MODE, S_IFREG};
    use crate::layout::stripe::RaidMode;
    use crate::test_utils::test_fs;

    #[test]
    fn root_attributes_come_from_format() {
        let (_images, mut fs) = test_fs(RaidMode::Raid0, 2);
        let attr = fs.getattr("/").expect("getattr");
        assert_eq!(attr.num, 0);
        assert_eq!(attr.mode, ROOT_MODE);
        assert_eq!(attr.nlinks, 1);
        assert_eq!(attr.size, 0);
        assert!(attr.is_dir());
    }

    #[test]
    fn file_attributes_track_writes() {
        let (_images, mut fs) = test_fs(RaidMode::Raid1, 2);
        fs.mknod("/f", 0o640).expect("mknod");
        fs.write("/f", &[7u8; 700], 0).expect("write");
        let attr = fs.getattr("/f").expect("getattr");
        assert_eq!(attr.mode, S_IFREG | 0o640);
        assert_eq!(attr.size, 700);
        assert_eq!(attr.blocks, 2);
        assert!(!attr.is_dir());
    }

    #[test]
    fn missing_path_is_not_found() {
        let (_images, mut fs) = test_fs(RaidMode::Raid1, 2);
        assert!(matches!(fs.getattr("/ghost"), Err(FsError::NotFound)));
        assert_eq!(fs.getattr("/ghost").err().map(|e| e.errno()), Some(libc::ENOENT));
    }
}
