use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "raidfs", author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Lay out a fresh filesystem across a set of disk images.
    Mkfs(MkfsArgs),

    /// Serve a formatted disk set at a mount point.
    Mount(MountArgs),
}

#[derive(Args, Debug)]
pub struct MkfsArgs {
    #[arg(short = 'r', long = "raid", env = "RAIDFS_RAID", value_enum)]
    pub raid: RaidArg,

    /// Inode count, rounded up to a multiple of 32.
    #[arg(short = 'i', long, env = "RAIDFS_INODES")]
    pub inodes: u64,

    /// Data block count per disk, rounded up to a multiple of 32.
    #[arg(short = 'b', long, env = "RAIDFS_BLOCKS")]
    pub blocks: u64,

    /// Disk image, once per member. Device order follows argument order.
    #[arg(short = 'd', long = "disk", required = true)]
    pub disks: Vec<PathBuf>,

    /// Create or resize every image to this many bytes before formatting.
    #[arg(long, env = "RAIDFS_DISK_SIZE")]
    pub size: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MountArgs {
    /// Member images, in any order.
    #[arg(required = true, num_args = 1..)]
    pub images: Vec<PathBuf>,

    pub mount_point: PathBuf,

    #[arg(long, env = "RAIDFS_ALLOW_OTHER")]
    pub allow_other: bool,

    /// Fingerprint compared between mirrors on RAID1V reads.
    #[arg(long, env = "RAIDFS_FINGERPRINT", value_enum, default_value_t = FingerprintArg::Additive)]
    pub fingerprint: FingerprintArg,

    /// Log an operation summary every N calls. 0 disables the summary sink.
    #[arg(long, env = "RAIDFS_METRICS_EVERY", default_value_t = 0)]
    pub metrics_every: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RaidArg {
    #[value(name = "0", alias = "raid0")]
    Raid0,
    #[value(name = "1", alias = "raid1")]
    Raid1,
    #[value(name = "1v", alias = "raid1v")]
    Raid1V,
}

impl From<RaidArg> for raidfs::RaidMode {
    fn from(arg: RaidArg) -> Self {
        match arg {
            RaidArg::Raid0 => Self::Raid0,
            RaidArg::Raid1 => Self::Raid1,
            RaidArg::Raid1V => Self::Raid1V,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FingerprintArg {
    Additive,
    Sha256,
}
