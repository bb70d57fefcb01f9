use std::ops::Range;

use crate::layout::stripe::RaidMode;

/// State of one engine call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Init,
    ReadReady,
    WriteReady,
    DeleteReady,
    Error,
}

/// Session is created per call and threaded through every disk pass of it.
#[derive(Clone, Debug)]
pub struct Session {
    state: State,
    disk: usize,
    disks: usize,
    mode: RaidMode,
    op: u64,
    bytes: u64,
}

impl Session {
    #[must_use]
    pub const fn begin(mode: RaidMode, disks: usize, op: u64) -> Self {
        Self {
            state: State::Init,
            disk: 0,
            disks,
            mode,
            op,
            bytes: 0,
        }
    }

    /// `passes` lists the disks a mutating call is repeated on. RAID0 runs
    /// once against disk 0 and fans metadata out internally; mirrored modes
    /// repeat the call on every disk in device order.
    #[must_use]
    pub const fn passes(&self) -> Range<usize> {
        match self.mode {
            RaidMode::Raid0 => 0..1,
            RaidMode::Raid1 | RaidMode::Raid1V => 0..self.disks,
        }
    }

    /// `target` points the session at the disk of the next pass.
    pub const fn target(&mut self, disk: usize) {
        self.disk = disk;
    }

    /// `complete` moves a successful call into its terminal state.
    pub fn complete(&mut self, state: State) {
        debug_assert!(state != State::Init && state != State::Error);
        self.state = state;
    }

    pub const fn fail(&mut self) {
        self.state = State::Error;
    }

    pub const fn add_bytes(&mut self, n: u64) {
        self.bytes += n;
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub const fn disk(&self) -> usize {
        self.disk
    }

    #[must_use]
    pub const fn disks(&self) -> usize {
        self.disks
    }

    #[must_use]
    pub const fn mode(&self) -> RaidMode {
        self.mode
    }

    #[must_use]
    pub const fn op(&self) -> u64 {
        self.op
    }

    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }
}
