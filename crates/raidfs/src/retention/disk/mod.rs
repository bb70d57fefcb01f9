
use memmap2::{MmapMut, MmapOptions};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{FsError, FsResult};

/// One backing disk image, mapped read-write in full.
pub struct Disk {
    path: PathBuf,
    _file: File,
    map: MmapMut,
    len: u64,
}

impl Disk {
    /// Maps an existing image at its current length.
    ///
    /// # Errors
    /// Returns an error if the image cannot be opened or mapped.
    pub fn open(path: impl AsRef<Path>) -> FsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)?;
        let len = file.metadata()?.len();
        Self::map_file(path, file, len)
    }

    /// Opens or creates an image and sizes it to `len` bytes before mapping.
    ///
    /// # Errors
    /// Returns an error if the disk image cannot be created/opened or mapped.
    pub fn open_prealloc(path: impl AsRef<Path>, len: u64) -> FsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.set_len(len)?;
        Self::map_file(path, file, len)
    }

    fn map_file(path: PathBuf, file: File, len: u64) -> FsResult<Self> {
        if len == 0 {
            return Err(FsError::Configuration(format!(
                "disk image {} is empty",
                path.display()
            )));
        }
        let map_len = usize::try_from(len).map_err(|_| {
            FsError::Configuration(format!("disk length {len} exceeds addressable size"))
        })?;
        let map = unsafe { MmapOptions::new().len(map_len).map_mut(&file)? };

        Ok(Self {
            path,
            _file: file,
            map,
            len,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn read_at(&self, off: u64, buf: &mut [u8]) -> usize {
        let Ok(off) = usize::try_from(off) else {
            return 0;
        };
        let Ok(disk_len) = usize::try_from(self.len) else {
            return 0;
        };
        if off >= disk_len {
            return 0;
        }
        let end = off.saturating_add(buf.len()).min(disk_len);
        let src = &self.map[off..end];
        let n = src.len();
        buf[..n].copy_from_slice(src);
        n
    }

    pub fn write_at(&mut self, off: u64, data: &[u8]) -> usize {
        let Ok(off) = usize::try_from(off) else {
            return 0;
        };
        let Ok(disk_len) = usize::try_from(self.len) else {
            return 0;
        };
        if off >= disk_len {
            return 0;
        }
        let end = off.saturating_add(data.len()).min(disk_len);
        let dst = &mut self.map[off..end];
        let n = dst.len();
        dst.copy_from_slice(&data[..n]);
        n
    }

    /// Like [`Self::read_at`], but a truncated access is an I/O failure.
    ///
    /// # Errors
    /// Returns [`FsError::Io`] if the range runs past the end of the image.
    pub fn read_exact_at(&self, off: u64, buf: &mut [u8]) -> FsResult<()> {
        if self.read_at(off, buf) == buf.len() {
            Ok(())
        } else {
            Err(self.out_of_bounds(off, buf.len()))
        }
    }

    /// Like [`Self::write_at`], but a truncated access is an I/O failure.
    ///
    /// # Errors
    /// Returns [`FsError::Io`] if the range runs past the end of the image.
    pub fn write_all_at(&mut self, off: u64, data: &[u8]) -> FsResult<()> {
        if !self.contains(off, data.len()) {
            return Err(self.out_of_bounds(off, data.len()));
        }
        self.write_at(off, data);
        Ok(())
    }

    /// Zero-fills `len` bytes starting at `off`.
    ///
    /// # Errors
    /// Returns [`FsError::Io`] if the range runs past the end of the image.
    pub fn zero(&mut self, off: u64, len: usize) -> FsResult<()> {
        if !self.contains(off, len) {
            return Err(self.out_of_bounds(off, len));
        }
        // contains() guarantees the range fits in usize.
        let start = off as usize;
        self.map[start..start + len].fill(0);
        Ok(())
    }

    pub fn read_u32(&self, off: u64) -> FsResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact_at(off, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn write_u32(&mut self, off: u64, val: u32) -> FsResult<()> {
        self.write_all_at(off, &val.to_le_bytes())
    }

    pub fn read_u64(&self, off: u64) -> FsResult<u64> {
        let mut buf = [0u8; 8];
        self.read_exact_at(off, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn write_u64(&mut self, off: u64, val: u64) -> FsResult<()> {
        self.write_all_at(off, &val.to_le_bytes())
    }

    /// Flushes dirty pages of the mapping back to the image file.
    ///
    /// # Errors
    /// Returns an error if the kernel rejects the msync.
    pub fn flush(&self) -> FsResult<()> {
        self.map.flush()?;
        Ok(())
    }

    fn contains(&self, off: u64, len: usize) -> bool {
        off.checked_add(len as u64)
            .is_some_and(|end| end <= self.len)
    }

    fn out_of_bounds(&self, off: u64, len: usize) -> FsError {
        FsError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "{}: access of {len} bytes at {off} runs past the image end ({})",
                self.path.display(),
                self.len
            ),
        ))
    }
}
