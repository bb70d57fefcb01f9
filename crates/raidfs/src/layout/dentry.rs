use super::constants::{DENTRY_SIZE, NAME_FIELD_LEN};

/// Offset of the inode-number field inside an entry.
pub const NUM_FIELD_OFFSET: u64 = NAME_FIELD_LEN as u64;

/// One directory slot: a NUL-padded name and an inode number. Number 0 marks a
/// tombstone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dentry {
    pub name: [u8; NAME_FIELD_LEN],
    pub num: u32,
}

impl Dentry {
    /// Callers validate the name length first; longer names are cut to the field.
    #[must_use]
    pub fn new(name: &str, num: u32) -> Self {
        let bytes = name.as_bytes();
        let len = bytes.len().min(NAME_FIELD_LEN);
        let mut field = [0u8; NAME_FIELD_LEN];
        field[..len].copy_from_slice(&bytes[..len]);
        Self { name: field, num }
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.num != 0
    }

    #[must_use]
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(NAME_FIELD_LEN);
        &self.name[..end]
    }

    #[must_use]
    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; DENTRY_SIZE as usize] {
        let mut buf = [0u8; DENTRY_SIZE as usize];
        buf[..NAME_FIELD_LEN].copy_from_slice(&self.name);
        buf[NAME_FIELD_LEN..].copy_from_slice(&self.num.to_le_bytes());
        buf
    }

    #[must_use]
    pub fn from_bytes(buf: &[u8; DENTRY_SIZE as usize]) -> Self {
        let mut name = [0u8; NAME_FIELD_LEN];
        name.copy_from_slice(&buf[..NAME_FIELD_LEN]);
        let mut num = [0u8; 4];
        num.copy_from_slice(&buf[NAME_FIELD_LEN..]);
        Self {
            name,
            num: u32::from_le_bytes(num),
        }
    }
}
