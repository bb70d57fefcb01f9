use raidfs::Fingerprint;

use super::types::FuseFs;

impl<F: Fingerprint> FuseFs<F> {
    pub(crate) fn read_data(&mut self, ino: u64, offset: i64, size: u32) -> Result<Vec<u8>, i32> {
        let offset = u64::try_from(offset).map_err(|_| libc::EINVAL)?;
        let path = self.path_of(ino)?;
        let mut buf = vec![0u8; size as usize];
        let n = self
            .engine
            .read(&path, &mut buf, offset)
            .map_err(|e| e.errno())?;
        buf.truncate(n);
        Ok(buf)
    }

    pub(crate) fn write_data(&mut self, ino: u64, offset: i64, data: &[u8]) -> Result<u32, i32> {
        let offset = u64::try_from(offset).map_err(|_| libc::EINVAL)?;
        let path = self.path_of(ino)?;
        let n = self
            .engine
            .write(&path, data, offset)
            .map_err(|e| e.errno())?;
        Ok(u32::try_from(n).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use rand::RngCore;
    use raidfs::RaidMode;

    use crate::fs::constants::ROOT_ID;
    use crate::fs::test_utils::create_test_fs;

    fn payload(len: usize) -> Vec<u8> {
        let mut data = vec![0u8; len];
        rand::rng().fill_bytes(&mut data);
        data
    }

    #[test]
    fn write_then_read_through_ids() {
        for mode in [RaidMode::Raid0, RaidMode::Raid1, RaidMode::Raid1V] {
            let (_images, mut fs) = create_test_fs(mode, 3);
            fs.engine.mknod("/f", 0o644).expect("mknod");
            let ino = fs.lookup_entry(ROOT_ID, OsStr::new("f")).expect("lookup").ino;

            let data = payload(2000);
            assert_eq!(fs.write_data(ino, 100, &data), Ok(2000));
            let back = fs.read_data(ino, 100, 4096).expect("read");
            assert_eq!(back, data, "{mode}");

            let head = fs.read_data(ino, 0, 100).expect("read hole");
            assert!(head.iter().all(|b| *b == 0));
            assert_eq!(fs.read_data(ino, 5000, 10), Ok(Vec::new()));
        }
    }

    #[test]
    fn negative_offsets_and_unknown_ids_are_rejected() {
        let (_images, mut fs) = create_test_fs(RaidMode::Raid1, 2);
        fs.engine.mknod("/f", 0o644).expect("mknod");
        let ino = fs.lookup_entry(ROOT_ID, OsStr::new("f")).expect("lookup").ino;
        assert_eq!(fs.read_data(ino, -1, 10), Err(libc::EINVAL));
        assert_eq!(fs.write_data(ino, -1, b"x"), Err(libc::EINVAL));
        assert_eq!(fs.read_data(777, 0, 10), Err(libc::ENOENT));
    }

    #[test]
    fn oversized_write_is_efbig_and_directory_read_is_eisdir() {
        let (_images, mut fs) = create_test_fs(RaidMode::Raid1, 2);
        fs.engine.mknod("/f", 0o644).expect("mknod");
        let ino = fs.lookup_entry(ROOT_ID, OsStr::new("f")).expect("lookup").ino;
        assert_eq!(fs.write_data(ino, 70 * 512, b"x"), Err(libc::EFBIG));
        assert_eq!(fs.read_data(ROOT_ID, 0, 10), Err(libc::EISDIR));
    }
}
