use crate::error::FsError;
use crate::layout::constants::{INODE_RECORD_SIZE, SUPERBLOCK_SIZE};
use crate::layout::inode::Inode;
use crate::layout::stripe::RaidMode;
use crate::layout::superblock::{Geometry, Superblock};
use crate::retention::array::DiskArray;
use crate::retention::disk::Disk;
use crate::test_utils::formatted_disks;

fn rewrite_superblock(disk: &mut Disk, f: impl FnOnce(&mut Superblock)) {
    let mut raw = [0u8; SUPERBLOCK_SIZE];
    disk.read_exact_at(0, &mut raw).expect("read sb");
    let mut sb = Superblock::parse(&raw).expect("parse sb");
    f(&mut sb);
    disk.write_all_at(0, &sb.to_bytes()).expect("write sb");
}

fn assemble_err(disks: Vec<Disk>) -> FsError {
    DiskArray::assemble(disks).err().expect("assemble must fail")
}

#[test]
fn assemble_accepts_a_formatted_set() {
    let (_images, disks) = formatted_disks(RaidMode::Raid1V, 3, 32, 64);
    let array = DiskArray::assemble(disks).expect("assemble");
    assert_eq!(array.len(), 3);
    assert_eq!(array.mode(), RaidMode::Raid1V);
    assert_eq!(array.fs_id(), 0x5eed);
    assert_eq!(array.geometry().inode_count, 32);
    assert!(array.status_string().contains("disk 2: raid1v"));
}

#[test]
fn assemble_reorders_by_device_order() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid0, 3, 32, 64);
    let paths: Vec<_> = disks.iter().map(|d| d.path().to_path_buf()).collect();
    disks.reverse();

    let array = DiskArray::assemble(disks).expect("assemble");
    for (i, path) in paths.iter().enumerate() {
        assert_eq!(array.disk(i).path(), path.as_path());
        assert_eq!(array.superblock(i).device_order, i as u64);
    }
}

#[test]
fn open_maps_images_from_paths() {
    let (images, disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    drop(disks);
    let paths: Vec<_> = images.files.iter().map(|f| f.path()).collect();
    let array = DiskArray::open(&paths).expect("open");
    assert_eq!(array.len(), 2);
}

#[test]
fn assemble_rejects_mismatched_ids() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    rewrite_superblock(&mut disks[1], |sb| sb.fs_id ^= 1);
    assert!(matches!(assemble_err(disks), FsError::Configuration(_)));
}

#[test]
fn assemble_rejects_mismatched_modes() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    rewrite_superblock(&mut disks[0], |sb| sb.raid_mode = RaidMode::Raid0);
    assert!(matches!(assemble_err(disks), FsError::Configuration(_)));
}

#[test]
fn assemble_rejects_missing_member() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid0, 3, 32, 32);
    disks.pop();
    assert!(matches!(assemble_err(disks), FsError::Configuration(_)));
}

#[test]
fn assemble_rejects_single_mirror() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    disks.pop();
    rewrite_superblock(&mut disks[0], |sb| sb.disk_count = 1);
    let err = assemble_err(disks);
    assert!(matches!(err, FsError::Configuration(ref m) if m.contains("at least two")));
}

#[test]
fn assemble_rejects_duplicate_device_order() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    rewrite_superblock(&mut disks[1], |sb| sb.device_order = 0);
    assert!(matches!(assemble_err(disks), FsError::Configuration(_)));
}

#[test]
fn assemble_rejects_bad_magic() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    disks[1].write_all_at(0, b"NOTRAID!").expect("clobber");
    assert!(matches!(assemble_err(disks), FsError::Configuration(_)));
}

#[test]
fn assemble_rejects_too_small_image() {
    let (images, disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    let len = disks[1].len();
    drop(disks);
    images.files[1].as_file().set_len(len - 512).expect("shrink");

    let disks = images
        .files
        .iter()
        .map(|f| Disk::open(f.path()).expect("open"))
        .collect();
    assert!(matches!(assemble_err(disks), FsError::Configuration(_)));
}

#[test]
fn assemble_rejects_non_directory_root() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    let at = {
        let mut raw = [0u8; SUPERBLOCK_SIZE];
        disks[1].read_exact_at(0, &mut raw).expect("read sb");
        Superblock::parse(&raw).expect("parse").geometry.inode_table_offset
    };
    let mut rec = [0u8; INODE_RECORD_SIZE];
    disks[1].read_exact_at(at, &mut rec).expect("read root");
    let mut root = Inode::from_bytes(&rec);
    root.mode = crate::layout::constants::S_IFREG | 0o644;
    disks[1].write_all_at(at, &root.to_bytes()).expect("write root");

    assert!(matches!(assemble_err(disks), FsError::Corrupt(_)));
}

#[test]
fn assemble_rejects_unallocated_root() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid0, 2, 32, 32);
    let g = {
        let mut raw = [0u8; SUPERBLOCK_SIZE];
        disks[0].read_exact_at(0, &mut raw).expect("read sb");
        Superblock::parse(&raw).expect("parse").geometry
    };
    g.inode_bitmap().clear_all(&mut disks[0]).expect("clear");
    assert!(matches!(assemble_err(disks), FsError::Corrupt(_)));
}

#[test]
fn assemble_rejects_block_count_past_u64() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    for disk in &mut disks {
        rewrite_superblock(disk, |sb| sb.geometry.block_count = u64::MAX / 256);
    }
    assert!(matches!(assemble_err(disks), FsError::Configuration(_)));
}

#[test]
fn assemble_rejects_data_region_over_inode_table() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    for disk in &mut disks {
        rewrite_superblock(disk, |sb| {
            sb.geometry.data_region_offset = sb.geometry.inode_table_offset;
        });
    }
    let err = assemble_err(disks);
    assert!(matches!(err, FsError::Configuration(ref m) if m.contains("region layout")));
}

#[test]
fn assemble_rejects_zero_counts() {
    let (_images, mut disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    for disk in &mut disks {
        rewrite_superblock(disk, |sb| {
            sb.geometry = Geometry::compute(0, 32).expect("geometry");
        });
    }
    assert!(matches!(assemble_err(disks), FsError::Configuration(_)));
}

#[test]
fn assemble_reports_image_shorter_than_superblock() {
    let (images, disks) = formatted_disks(RaidMode::Raid1, 2, 32, 32);
    drop(disks);
    images.files[1].as_file().set_len(16).expect("shrink");

    let disks = images
        .files
        .iter()
        .map(|f| Disk::open(f.path()).expect("open"))
        .collect();
    let err = assemble_err(disks);
    assert!(matches!(err, FsError::Configuration(ref m) if m.contains("shorter than a superblock")));
}
