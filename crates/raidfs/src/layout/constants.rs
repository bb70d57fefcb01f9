//! On-disk format constants.

/// BLOCK_SIZE is the size of a data block and of an inode slot in bytes.
pub const BLOCK_SIZE: u64 = 512;
/// MAGIC identifies the filesystem format on disk.
pub const MAGIC: [u8; 8] = *b"RAIDWFS\0";
/// SUPERBLOCK_SIZE is the encoded size of the superblock header.
pub const SUPERBLOCK_SIZE: usize = 80;
/// ROOT_INO is the inode number of the root directory.
pub const ROOT_INO: u32 = 0;

/// DIRECT_PTRS is the number of direct block pointers in an inode.
pub const DIRECT_PTRS: usize = 6;
/// INDIRECT_SLOT is the pointer slot holding the indirect block.
pub const INDIRECT_SLOT: usize = DIRECT_PTRS;
/// N_PTRS is the number of pointer slots in an inode.
pub const N_PTRS: usize = DIRECT_PTRS + 1;
/// PTR_SIZE is the encoded size of a block pointer.
pub const PTR_SIZE: u64 = 8;
/// PTRS_PER_BLOCK is the number of pointers held by an indirect block.
pub const PTRS_PER_BLOCK: usize = (BLOCK_SIZE / PTR_SIZE) as usize;
/// MAX_BLOCKS is the number of logical blocks a single inode can address.
pub const MAX_BLOCKS: u64 = (DIRECT_PTRS + PTRS_PER_BLOCK) as u64;
/// MAX_FILE_SIZE is the largest byte size an inode can reach.
pub const MAX_FILE_SIZE: u64 = MAX_BLOCKS * BLOCK_SIZE;
/// INODE_RECORD_SIZE is the encoded size of an inode inside its slot.
pub const INODE_RECORD_SIZE: usize = 112;

/// NAME_FIELD_LEN is the width of the name field of a directory entry.
pub const NAME_FIELD_LEN: usize = 28;
/// MAX_NAME_LEN leaves room for the terminating NUL.
pub const MAX_NAME_LEN: usize = NAME_FIELD_LEN - 1;
/// DENTRY_SIZE is the byte size of one directory entry.
pub const DENTRY_SIZE: u64 = 32;
/// DENTRIES_PER_BLOCK is the number of entries a directory block holds.
pub const DENTRIES_PER_BLOCK: u64 = BLOCK_SIZE / DENTRY_SIZE;

/// UNIT_ALIGN is the granularity inode and block counts are rounded up to.
pub const UNIT_ALIGN: u64 = 32;

pub const S_IFMT: u32 = 0o170_000;
pub const S_IFDIR: u32 = 0o040_000;
pub const S_IFREG: u32 = 0o100_000;
/// ROOT_MODE is the mode given to the root directory at format time.
pub const ROOT_MODE: u32 = S_IFDIR | 0o755;
