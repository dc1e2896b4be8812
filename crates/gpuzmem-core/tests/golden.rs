use std::fs;
use std::path::{Path, PathBuf};

use gpuzmem_core::{DecodeError, FileRegion, Stat, decode_region};

fn golden_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("golden")
        .join(name)
}

fn load_expected_stat(name: &str) -> Stat {
    let expected_path = golden_dir(name).join("expected_stat.json");
    let expected_json = fs::read_to_string(&expected_path).expect("read expected_stat.json");
    serde_json::from_str(&expected_json).expect("parse expected stat")
}

fn run_golden(name: &str) -> Stat {
    let input = golden_dir(name).join("region.bin");
    let expected = load_expected_stat(name);

    let actual = decode_region(&FileRegion::new(input)).expect("decode region");

    let actual_value = serde_json::to_value(&actual).expect("serialize actual");
    let expected_value = serde_json::to_value(&expected).expect("serialize expected");
    assert_eq!(actual_value, expected_value, "golden mismatch in {name}");
    actual
}

#[test]
fn golden_populated() {
    let stat = run_golden("populated");
    assert!(!stat.is_busy());
    assert_eq!(stat.get_sensor_value("GPU Temperature"), Some(42.5));
    assert_eq!(
        stat.get_sensor("GPU Temperature").map(|s| s.unit.as_str()),
        Some("\u{b0}C")
    );
    assert_eq!(stat.get_sensor_value("GPU Load"), Some(99.0));
}

#[test]
fn golden_duplicates() {
    let stat = run_golden("duplicates");
    assert!(stat.is_busy());
    assert_eq!(stat.get_record("CardName"), Some("second"));
    assert_eq!(
        stat.available_records(),
        ["CardName", "DriverVersion", "CardName"]
    );
    assert_eq!(stat.get_sensor_value("Memory Used"), Some(1024.0));
}

#[test]
fn golden_idle_region_has_no_data() {
    let input = golden_dir("idle").join("region.bin");
    let err = decode_region(&FileRegion::new(input)).unwrap_err();
    assert!(matches!(err, DecodeError::NoData));
}
