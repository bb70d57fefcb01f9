//! Error taxonomy shared by every layer of the engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file or directory")]
    NotFound,

    #[error("no free {0} left")]
    OutOfSpace(Unit),

    #[error("offset {0} is beyond the addressable range of an inode")]
    OutOfRange(u64),

    #[error("invalid disk set: {0}")]
    Configuration(String),

    #[error("corrupt filesystem: {0}")]
    Corrupt(String),

    #[error("backing store failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("entry already exists")]
    AlreadyExists,

    #[error("not a directory")]
    NotADirectory,

    #[error("is a directory")]
    IsADirectory,

    #[error("directory not empty")]
    NotEmpty,

    #[error("name longer than {0} bytes")]
    NameTooLong(usize),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Kind of allocation unit an [`FsError::OutOfSpace`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Inode,
    Block,
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inode => f.write_str("inodes"),
            Self::Block => f.write_str("data blocks"),
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;

impl FsError {
    /// `errno` maps the error onto the POSIX code reported to the dispatcher.
    #[must_use]
    pub const fn errno(&self) -> i32 {
        match self {
            Self::NotFound => libc::ENOENT,
            Self::OutOfSpace(_) => libc::ENOSPC,
            Self::OutOfRange(_) => libc::EFBIG,
            Self::Configuration(_) | Self::InvalidPath(_) => libc::EINVAL,
            Self::Corrupt(_) | Self::Io(_) => libc::EIO,
            Self::AlreadyExists => libc::EEXIST,
            Self::NotADirectory => libc::ENOTDIR,
            Self::IsADirectory => libc::EISDIR,
            Self::NotEmpty => libc::ENOTEMPTY,
            Self::NameTooLong(_) => libc::ENAMETOOLONG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_mapping_matches_posix_codes() {
        assert_eq!(FsError::NotFound.errno(), libc::ENOENT);
        assert_eq!(FsError::OutOfSpace(Unit::Block).errno(), libc::ENOSPC);
        assert_eq!(FsError::OutOfRange(1 << 20).errno(), libc::EFBIG);
        assert_eq!(FsError::NotEmpty.errno(), libc::ENOTEMPTY);
        assert_eq!(FsError::Corrupt("root".into()).errno(), libc::EIO);
    }

    #[test]
    fn out_of_space_names_the_unit() {
        let msg = FsError::OutOfSpace(Unit::Inode).to_string();
        assert_eq!(msg, "no free inodes left");
    }
}
