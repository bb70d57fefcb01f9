//! RAID modes and the placement rules each one applies to data blocks.

pub mod fingerprint;
pub mod vote;

/// RaidMode is the redundancy scheme recorded in every superblock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RaidMode {
    /// Data blocks striped round-robin; metadata mirrored on every disk.
    Raid0,
    /// Full independent copy on every disk; reads served by disk 0.
    Raid1,
    /// Like RAID1, but reads are reconciled by a majority vote.
    Raid1V,
}

impl RaidMode {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Raid0),
            1 => Some(Self::Raid1),
            2 => Some(Self::Raid1V),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_raw(self) -> u32 {
        match self {
            Self::Raid0 => 0,
            Self::Raid1 => 1,
            Self::Raid1V => 2,
        }
    }

    /// Mirrored modes keep a full copy of every block on every disk.
    #[must_use]
    pub const fn is_mirrored(self) -> bool {
        matches!(self, Self::Raid1 | Self::Raid1V)
    }

    /// `data_disk` picks the disk holding the data of logical block `index`.
    /// Mirrored modes keep everything on the addressed disk.
    #[must_use]
    pub const fn data_disk(self, index: u64, addressed: usize, disks: usize) -> usize {
        match self {
            Self::Raid0 => (index % disks as u64) as usize,
            Self::Raid1 | Self::Raid1V => addressed,
        }
    }
}

impl std::fmt::Display for RaidMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raid0 => f.write_str("raid0"),
            Self::Raid1 => f.write_str("raid1"),
            Self::Raid1V => f.write_str("raid1v"),
        }
    }
}
