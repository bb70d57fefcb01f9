//! Maps FUSE ids to the paths the engine resolves.

use std::collections::HashMap;

use super::constants::{INO_OFFSET, ROOT_ID};

/// `ino_for` returns the FUSE id of engine inode `num`.
#[must_use]
pub fn ino_for(num: u32) -> u64 {
    u64::from(num) + INO_OFFSET
}

/// InoTable remembers the path each id was last looked up under. Entries are
/// added by lookup and create and dropped on removal.
#[derive(Debug)]
pub struct InoTable {
    paths: HashMap<u64, String>,
}

impl InoTable {
    #[must_use]
    pub fn new() -> Self {
        let mut paths = HashMap::new();
        paths.insert(ROOT_ID, "/".to_owned());
        Self { paths }
    }

    #[must_use]
    pub fn path(&self, ino: u64) -> Option<&str> {
        self.paths.get(&ino).map(String::as_str)
    }

    /// `child_path` joins `name` onto the path of `parent`.
    ///
    /// # Errors
    /// Returns `ENOENT` for an unknown parent.
    pub fn child_path(&self, parent: u64, name: &str) -> Result<String, i32> {
        let base = self.path(parent).ok_or(libc::ENOENT)?;
        if base == "/" {
            Ok(format!("/{name}"))
        } else {
            Ok(format!("{base}/{name}"))
        }
    }

    pub fn remember(&mut self, ino: u64, path: String) {
        self.paths.insert(ino, path);
    }

    /// Drops every id currently bound to `path`.
    pub fn forget(&mut self, path: &str) {
        self.paths.retain(|ino, p| *ino == ROOT_ID || p.as_str() != path);
    }
}
