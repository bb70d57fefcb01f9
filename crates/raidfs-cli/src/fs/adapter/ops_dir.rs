use std::ffi::OsStr;

use fuser::{FileAttr, FileType};
use raidfs::Fingerprint;

use crate::fs::inodes::ino_for;

use super::types::FuseFs;

impl<F: Fingerprint> FuseFs<F> {
    pub(crate) fn lookup_entry(&mut self, parent: u64, name: &OsStr) -> Result<FileAttr, i32> {
        let path = self.child_of(parent, name)?;
        self.attr_at(&path)
    }

    pub(crate) fn list_dir_entries(&mut self, ino: u64) -> Result<Vec<(u64, FileType, String)>, i32> {
        let path = self.path_of(ino)?;
        let mut entries = Vec::new();
        self.engine
            .readdir(&path, |entry| {
                let kind = if entry.is_dir {
                    FileType::Directory
                } else {
                    FileType::RegularFile
                };
                entries.push((ino_for(entry.num), kind, entry.name));
            })
            .map_err(|e| e.errno())?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::constants::ROOT_ID;
    use crate::fs::test_utils::create_test_fs;
    use raidfs::RaidMode;

    #[test]
    fn lookup_binds_nested_paths() {
        let (_images, mut fs) = create_test_fs(RaidMode::Raid1, 2);
        fs.engine.mkdir("/a", 0o755).expect("mkdir");
        fs.engine.mknod("/a/b", 0o644).expect("mknod");

        let a = fs.lookup_entry(ROOT_ID, OsStr::new("a")).expect("a");
        let b = fs.lookup_entry(a.ino, OsStr::new("b")).expect("b");
        assert_eq!(b.kind, FileType::RegularFile);
        assert_eq!(fs.path_of(b.ino).as_deref(), Ok("/a/b"));
        assert_eq!(
            fs.lookup_entry(a.ino, OsStr::new("zz")).err(),
            Some(libc::ENOENT)
        );
    }

    #[test]
    fn listing_shifts_numbers_and_marks_directories() {
        let (_images, mut fs) = create_test_fs(RaidMode::Raid0, 2);
        fs.engine.mknod("/f", 0o644).expect("mknod");
        fs.engine.mkdir("/d", 0o755).expect("mkdir");

        let entries = fs.list_dir_entries(ROOT_ID).expect("readdir");
        let names: Vec<_> = entries.iter().map(|e| e.2.as_str()).collect();
        assert_eq!(names, [".", "..", "f", "d"]);
        assert_eq!(entries[0].0, ROOT_ID);
        assert_eq!(entries[1].0, ROOT_ID);
        assert_eq!(entries[2].1, FileType::RegularFile);
        assert_eq!(entries[3].1, FileType::Directory);
        assert!(entries[2].0 > ROOT_ID);
    }

    #[test]
    fn listing_unknown_or_file_ids_fails() {
        let (_images, mut fs) = create_test_fs(RaidMode::Raid1, 2);
        let f = {
            fs.engine.mknod("/f", 0o644).expect("mknod");
            fs.lookup_entry(ROOT_ID, OsStr::new("f")).expect("lookup")
        };
        assert_eq!(fs.list_dir_entries(f.ino), Err(libc::ENOTDIR));
        assert_eq!(fs.list_dir_entries(12345), Err(libc::ENOENT));
    }
}
