use crate::error::{FsError, Unit};
use crate::layout::bits::Bitmap;
use crate::retention::disk::Disk;
use tempfile::NamedTempFile;

const UNITS: u64 = 64;
const UNIT_SIZE: u64 = 16;
const BASE: u64 = 64;

fn bitmap() -> Bitmap {
    Bitmap {
        kind: Unit::Block,
        offset: 0,
        units: UNITS,
        base: BASE,
        unit_size: UNIT_SIZE,
    }
}

fn scratch(tf: &NamedTempFile) -> Disk {
    Disk::open_prealloc(tf.path(), BASE + UNITS * UNIT_SIZE).expect("open_prealloc")
}

#[test]
fn allocate_hands_out_lowest_free_unit_first() {
    let tf = NamedTempFile::new().expect("tmp file");
    let mut d = scratch(&tf);
    let bm = bitmap();

    for expected in 0..5 {
        assert_eq!(bm.allocate(&mut d).expect("allocate"), expected);
    }
    bm.release(&mut d, 2).expect("release");
    assert_eq!(bm.allocate(&mut d).expect("allocate"), 2, "hole must be reused");
    assert_eq!(bm.allocate(&mut d).expect("allocate"), 5);
}

#[test]
fn allocation_crosses_word_boundaries() {
    let tf = NamedTempFile::new().expect("tmp file");
    let mut d = scratch(&tf);
    let bm = bitmap();

    for _ in 0..32 {
        bm.allocate(&mut d).expect("allocate");
    }
    assert_eq!(d.read_u32(0).expect("word 0"), u32::MAX);
    assert_eq!(bm.allocate(&mut d).expect("allocate"), 32);
    assert_eq!(d.read_u32(4).expect("word 1"), 1);
}

#[test]
fn release_clears_bit_and_zero_fills_storage() {
    let tf = NamedTempFile::new().expect("tmp file");
    let mut d = scratch(&tf);
    let bm = bitmap();

    let unit = bm.allocate(&mut d).expect("allocate");
    d.write_all_at(bm.unit_offset(unit), &[0xAB; UNIT_SIZE as usize])
        .expect("fill");
    assert!(bm.is_allocated(&d, unit).expect("bit"));

    bm.release(&mut d, unit).expect("release");
    assert!(!bm.is_allocated(&d, unit).expect("bit"));
    let mut back = [0xFFu8; UNIT_SIZE as usize];
    d.read_exact_at(bm.unit_offset(unit), &mut back).expect("read");
    assert_eq!(back, [0u8; UNIT_SIZE as usize]);
}

#[test]
fn exhaustion_reports_out_of_space_without_touching_bits() {
    let tf = NamedTempFile::new().expect("tmp file");
    let mut d = scratch(&tf);
    let bm = bitmap();

    for _ in 0..UNITS {
        bm.allocate(&mut d).expect("allocate");
    }
    let before = (d.read_u32(0).expect("w0"), d.read_u32(4).expect("w1"));
    let err = bm.allocate(&mut d).expect_err("full bitmap");
    assert!(matches!(err, FsError::OutOfSpace(Unit::Block)));
    assert_eq!(
        (d.read_u32(0).expect("w0"), d.read_u32(4).expect("w1")),
        before
    );
    assert_eq!(bm.count_allocated(&d).expect("count"), UNITS);
}

#[test]
fn release_beyond_range_is_corrupt() {
    let tf = NamedTempFile::new().expect("tmp file");
    let mut d = scratch(&tf);
    let err = bitmap().release(&mut d, UNITS).expect_err("out of range");
    assert!(matches!(err, FsError::Corrupt(_)));
}

#[test]
fn unit_at_inverts_unit_offset() {
    let bm = bitmap();
    assert_eq!(bm.unit_at(bm.unit_offset(7)), Some(7));
    assert_eq!(bm.unit_at(BASE - 1), None);
    assert_eq!(bm.unit_at(BASE + 1), None, "must be unit aligned");
    assert_eq!(bm.unit_at(bm.unit_offset(UNITS)), None);
}

#[test]
fn mark_and_clear_all_drive_the_bits_directly() {
    let tf = NamedTempFile::new().expect("tmp file");
    let mut d = scratch(&tf);
    let bm = bitmap();

    bm.mark(&mut d, 40).expect("mark");
    assert!(bm.is_allocated(&d, 40).expect("bit"));
    assert_eq!(bm.count_allocated(&d).expect("count"), 1);

    bm.clear_all(&mut d).expect("clear");
    assert_eq!(bm.count_allocated(&d).expect("count"), 0);
}
