use std::fs;
use std::path::{Path, PathBuf};

use gpuzmem_core::region::layout;
use gpuzmem_core::{FileRegion, decode_region};

/// Writes every golden case: the `region.bin` bytes and, for cases that
/// decode, the `expected_stat.json` the golden tests compare against.
fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/golden");
    let cases = [
        ("populated", populated()),
        ("duplicates", duplicates()),
        ("idle", RegionSpec::default()),
    ];
    for (name, spec) in &cases {
        let dir = root.join(name);
        let region_path = dir.join("region.bin");
        write_region(&region_path, spec)?;
        write_expected(&region_path, &dir.join("expected_stat.json"))?;
    }
    Ok(())
}

#[derive(Default)]
struct RegionSpec {
    version: u32,
    busy: u32,
    last_update: u32,
    records: Vec<(usize, &'static str, &'static str)>,
    sensors: Vec<SensorSpec>,
}

struct SensorSpec {
    slot: usize,
    name: &'static str,
    unit: &'static str,
    digits: u32,
    value: f64,
}

fn populated() -> RegionSpec {
    RegionSpec {
        version: 1,
        busy: 0,
        last_update: 123_456,
        records: vec![
            (0, "CardName", "NVIDIA GeForce RTX 3080"),
            (1, "GPUName", "GA102"),
            (3, "BIOSVersion", "94.02.42.00.A9"),
            (4, "MemSize", "10240"),
        ],
        sensors: vec![
            SensorSpec {
                slot: 0,
                name: "GPU Clock",
                unit: "MHz",
                digits: 1,
                value: 1905.0,
            },
            SensorSpec {
                slot: 1,
                name: "GPU Temperature",
                unit: "\u{b0}C",
                digits: 1,
                value: 42.5,
            },
            SensorSpec {
                slot: 3,
                name: "Fan Speed (%)",
                unit: "%",
                digits: 0,
                value: 37.0,
            },
            SensorSpec {
                slot: 127,
                name: "GPU Load",
                unit: "%",
                digits: 0,
                value: 99.0,
            },
        ],
    }
}

fn duplicates() -> RegionSpec {
    RegionSpec {
        version: 1,
        busy: 1,
        last_update: 7,
        records: vec![
            (0, "CardName", "first"),
            (2, "DriverVersion", "31.0.15.3179"),
            (9, "CardName", "second"),
        ],
        sensors: vec![
            SensorSpec {
                slot: 5,
                name: "Memory Used",
                unit: "MB",
                digits: 0,
                value: 512.0,
            },
            SensorSpec {
                slot: 6,
                name: "Memory Used",
                unit: "MB",
                digits: 0,
                value: 1024.0,
            },
        ],
    }
}

fn write_region(path: &Path, spec: &RegionSpec) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    fs::write(path, build_region(spec))
        .map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

fn write_expected(region_path: &Path, expected_path: &Path) -> Result<(), String> {
    match decode_region(&FileRegion::new(region_path)) {
        Ok(stat) => {
            let json = serde_json::to_string(&stat)
                .map_err(|err| format!("failed to encode stat: {}", err))?;
            fs::write(expected_path, json)
                .map_err(|err| format!("failed to write {}: {}", expected_path.display(), err))
        }
        Err(err) if err.is_no_data() => {
            eprintln!("{}: no expected stat ({})", region_path.display(), err);
            Ok(())
        }
        Err(err) => Err(format!("{}: {}", region_path.display(), err)),
    }
}

fn build_region(spec: &RegionSpec) -> Vec<u8> {
    let mut region = vec![0u8; layout::REGION_SIZE];
    region[0..4].copy_from_slice(&spec.version.to_be_bytes());
    region[4..8].copy_from_slice(&spec.busy.to_be_bytes());
    region[8..12].copy_from_slice(&spec.last_update.to_be_bytes());

    for &(slot, key, value) in &spec.records {
        let offset = layout::record_slot_offset(slot);
        put_text(&mut region, offset, key);
        put_text(&mut region, offset + layout::RECORD_KEY_SIZE, value);
    }

    for sensor in &spec.sensors {
        let offset = layout::sensor_slot_offset(sensor.slot);
        put_text(&mut region, offset, sensor.name);
        let unit_offset = offset + layout::SENSOR_NAME_SIZE;
        put_text(&mut region, unit_offset, sensor.unit);
        let digits_offset = unit_offset + layout::SENSOR_UNIT_SIZE;
        region[digits_offset..digits_offset + layout::SENSOR_DIGITS_SIZE]
            .copy_from_slice(&sensor.digits.to_be_bytes());
        let value_offset = digits_offset + layout::SENSOR_DIGITS_SIZE;
        region[value_offset..value_offset + layout::SENSOR_VALUE_SIZE]
            .copy_from_slice(&sensor.value.to_le_bytes());
    }

    region
}

fn put_text(region: &mut [u8], offset: usize, text: &str) {
    for (idx, unit) in text.encode_utf16().enumerate() {
        let at = offset + idx * layout::TEXT_UNIT_SIZE;
        region[at..at + layout::TEXT_UNIT_SIZE].copy_from_slice(&unit.to_le_bytes());
    }
}
