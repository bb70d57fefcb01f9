use std::path::Path;

use anyhow::{Context, Result};
use fuser::MountOption;
use raidfs::{Additive, DiskArray, Fingerprint, RaidFs, Sha256};
use tracing::info;

use crate::cli::{FingerprintArg, MountArgs};
use crate::fs::{FS_NAME, FuseFs};
use crate::metrics_runtime;

pub(crate) fn mount_options(allow_other: bool) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::RW,
        MountOption::FSName(FS_NAME.into()),
        MountOption::DefaultPermissions,
    ];
    if allow_other {
        options.push(MountOption::AllowOther);
    }
    options
}

fn serve<F: Fingerprint>(fs: FuseFs<F>, mount_point: &Path, options: &[MountOption]) -> Result<()> {
    fuser::mount2(fs, mount_point, options)
        .with_context(|| format!("failed to mount filesystem at {}", mount_point.display()))
}

pub(crate) fn run_mount(args: &MountArgs) -> Result<()> {
    let array = DiskArray::open(&args.images).context("failed to assemble disk set")?;
    info!(
        mode = %array.mode(),
        disks = array.len(),
        fs_id = array.fs_id(),
        "disk set assembled"
    );
    for line in array.status_string().lines() {
        info!("{line}");
    }

    let metrics = (args.metrics_every > 0).then(|| metrics_runtime::install(args.metrics_every));
    let options = mount_options(args.allow_other);
    info!(mount_point = %args.mount_point.display(), "mounting");

    match args.fingerprint {
        FingerprintArg::Additive => serve(
            FuseFs::new(RaidFs::with_fingerprint(array, Additive)).with_metrics(metrics),
            &args.mount_point,
            &options,
        ),
        FingerprintArg::Sha256 => serve(
            FuseFs::new(RaidFs::with_fingerprint(array, Sha256)).with_metrics(metrics),
            &args.mount_point,
            &options,
        ),
    }
}
