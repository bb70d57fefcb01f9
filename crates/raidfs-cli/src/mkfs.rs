use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use raidfs::{Disk, FormatOptions};
use tracing::debug;

use crate::cli::MkfsArgs;

pub(crate) fn run_mkfs(args: &MkfsArgs) -> Result<()> {
    let opts = FormatOptions::new(args.raid.into(), args.inodes, args.blocks);
    let geometry = opts.geometry().context("invalid filesystem layout")?;
    let required = geometry
        .required_len()
        .context("filesystem layout overflows a disk image")?;

    let mut seen = HashSet::new();
    for path in &args.disks {
        if !seen.insert(path) {
            bail!("disk image {} listed more than once", path.display());
        }
    }
    if let Some(size) = args.size
        && size < required
    {
        bail!("--size {size} is below the {required} bytes this layout needs");
    }

    let mut disks = args
        .disks
        .iter()
        .map(|path| open_image(path, args.size))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        disks = disks.len(),
        required,
        preallocated = args.size.is_some(),
        "disk images opened"
    );
    raidfs::format(&mut disks, &opts).context("failed to format disk set")?;
    Ok(())
}

fn open_image(path: &Path, size: Option<u64>) -> Result<Disk> {
    let disk = match size {
        Some(len) => Disk::open_prealloc(path, len),
        None => Disk::open(path),
    };
    disk.with_context(|| format!("failed to open disk image {}", path.display()))
}
