use tracing::{debug, warn};

use crate::error::{FsError, FsResult};
use crate::layout::constants::{BLOCK_SIZE, MAX_FILE_SIZE};
use crate::layout::inode::{Inode, unix_now};
use crate::layout::stripe::RaidMode;
use crate::layout::stripe::fingerprint::Fingerprint;
use crate::layout::stripe::vote;
use crate::metrics::OpKind;
use crate::retention::array::DiskArray;

use super::session::{Session, State};
use super::types::RaidFs;
use super::{inode_store, locator, path};

impl<F: Fingerprint> RaidFs<F> {
    /// `read` fills `buf` from `offset` and returns the number of bytes
    /// read. Nothing past the file size is returned; holes read as zeros.
    /// RAID1V reads vote among all mirrors first and serve the winner's bytes.
    ///
    /// # Errors
    /// Returns [`FsError::IsADirectory`] for directories and the path errors.
    pub fn read(&mut self, path: &str, buf: &mut [u8], offset: u64) -> FsResult<usize> {
        self.run(OpKind::Read, |fs, session| {
            let n = match session.mode() {
                RaidMode::Raid0 | RaidMode::Raid1 => {
                    fs.pass(session, OpKind::Read, 0, buf.len() as u64, |array| {
                        read_on(array, path, buf, offset, 0)
                    })?
                }
                RaidMode::Raid1V => fs.verified_read(session, path, buf, offset)?,
            };
            session.add_bytes(n as u64);
            session.complete(State::ReadReady);
            Ok(n)
        })
    }

    /// Reads the range from every mirror, fingerprints each copy and returns
    /// the bytes of the copy with the most agreeing peers.
    fn verified_read(
        &mut self,
        session: &mut Session,
        path: &str,
        buf: &mut [u8],
        offset: u64,
    ) -> FsResult<usize> {
        let mut copies: Vec<Option<Vec<u8>>> = Vec::with_capacity(session.disks());
        let mut first_err = None;
        for disk in 0..session.disks() {
            let mut copy = vec![0u8; buf.len()];
            let got = self.pass(session, OpKind::Read, disk, buf.len() as u64, |array| {
                read_on(array, path, &mut copy, offset, disk)
            });
            match got {
                Ok(n) => {
                    copy.truncate(n);
                    copies.push(Some(copy));
                }
                Err(e) => {
                    debug!(disk, "mirror did not vote: {e}");
                    copies.push(None);
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        let prints: Vec<_> = copies
            .iter()
            .map(|c| c.as_deref().map(|bytes| self.fingerprint.fingerprint(bytes)))
            .collect();
        let Some(winner) = vote::elect(&prints) else {
            return Err(first_err.unwrap_or(FsError::NotFound));
        };
        let outvoted = vote::dissenters(&prints, winner);
        if !outvoted.is_empty() {
            warn!(seq = session.op(), winner, ?outvoted, path, "mirrors disagree");
        }
        session.target(winner);

        let Some(Some(bytes)) = copies.get(winner) else {
            return Err(FsError::Corrupt(format!("vote picked silent disk {winner}")));
        };
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// `write` stores `data` at `offset`, allocating blocks as needed, and
    /// returns `data.len()`. The size grows to `offset + data.len()` when the
    /// write runs past the end.
    ///
    /// # Errors
    /// Returns [`FsError::OutOfRange`] before touching any disk when the end
    /// of the write is past the largest file size, [`FsError::IsADirectory`]
    /// for directories and [`FsError::OutOfSpace`] when blocks run out.
    pub fn write(&mut self, path: &str, data: &[u8], offset: u64) -> FsResult<usize> {
        self.run(OpKind::Write, |fs, session| {
            let end = offset
                .checked_add(data.len() as u64)
                .filter(|end| *end <= MAX_FILE_SIZE)
                .ok_or(FsError::OutOfRange(offset.saturating_add(data.len() as u64)))?;
            for disk in session.passes() {
                fs.pass(session, OpKind::Write, disk, data.len() as u64, |array| {
                    write_on(array, path, data, offset, end, disk)
                })?;
            }
            session.add_bytes(data.len() as u64);
            session.complete(State::WriteReady);
            Ok(data.len())
        })
    }
}

fn read_on(
    array: &DiskArray,
    path: &str,
    buf: &mut [u8],
    offset: u64,
    disk: usize,
) -> FsResult<usize> {
    let inode = path::resolve(array, path, disk)?;
    if inode.is_dir() {
        return Err(FsError::IsADirectory);
    }
    read_range(array, &inode, buf, offset, disk)
}

/// `read_range` copies file bytes starting at `offset` into `buf`, stopping
/// at the file size.
///
/// # Errors
/// Returns an error if a block lies outside its image.
pub fn read_range(
    array: &DiskArray,
    inode: &Inode,
    buf: &mut [u8],
    offset: u64,
    disk: usize,
) -> FsResult<usize> {
    if offset >= inode.size {
        return Ok(0);
    }
    let want = usize::try_from((inode.size - offset).min(buf.len() as u64))
        .map_err(|_| FsError::Corrupt(format!("inode {} size {}", inode.num, inode.size)))?;

    let mut done = 0;
    while done < want {
        let pos = offset + done as u64;
        let in_block = (BLOCK_SIZE - pos % BLOCK_SIZE) as usize;
        let chunk = in_block.min(want - done);
        let dst = &mut buf[done..done + chunk];
        match locator::lookup(array, inode, pos, disk)? {
            Some(loc) => array.disk(loc.disk).read_exact_at(loc.offset, dst)?,
            None => dst.fill(0),
        }
        done += chunk;
    }
    Ok(done)
}

fn write_on(
    array: &mut DiskArray,
    path: &str,
    data: &[u8],
    offset: u64,
    end: u64,
    disk: usize,
) -> FsResult<()> {
    let mut inode = path::resolve(array, path, disk)?;
    if inode.is_dir() {
        return Err(FsError::IsADirectory);
    }

    let mut done = 0;
    while done < data.len() {
        let pos = offset + done as u64;
        let in_block = (BLOCK_SIZE - pos % BLOCK_SIZE) as usize;
        let chunk = in_block.min(data.len() - done);
        let loc = locator::resolve(array, &mut inode, pos, true, disk)?.ok_or_else(|| {
            FsError::Corrupt(format!("inode {} block at {pos} not allocated", inode.num))
        })?;
        array
            .disk_mut(loc.disk)
            .write_all_at(loc.offset, &data[done..done + chunk])?;
        done += chunk;
    }

    let size = if data.is_empty() { inode.size } else { inode.size.max(end) };
    let now = unix_now();
    match array.mode() {
        RaidMode::Raid0 => inode_store::mirror(array, inode.num, |i| {
            i.size = size;
            i.mtime = now;
            i.ctime = now;
        }),
        RaidMode::Raid1 | RaidMode::Raid1V => {
            inode.size = size;
            inode.mtime = now;
            inode.ctime = now;
            inode_store::store(array, &inode, disk)
        }
    }
}
