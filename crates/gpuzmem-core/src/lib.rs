//! gpuzmem core library for decoding the GPU-Z shared-memory region.
//!
//! GPU-Z publishes a fixed-size region holding three header counters, 128
//! key/value record slots and 128 sensor slots. This crate decodes one
//! snapshot of that region into a `Stat`: sources attach to the bytes, the
//! region decoder (layout/reader/parser) walks the fixed layout, and the
//! result is validated before it is returned. Decoding is byte-oriented and
//! side-effect free; all I/O is isolated in `source`.
//!
//! Invariants:
//! - A decode consumes exactly `REGION_SIZE` bytes or fails with a short read.
//! - Available records and sensors keep slot order, duplicates included.
//! - A region with no populated slot is reported as `DecodeError::NoData`.
//! - Serialized output is deterministic (maps are ordered by key).
//!
//! # Examples
//! ```no_run
//! use gpuzmem_core::{DEFAULT_REGION_NAME, FileRegion, decode_region};
//!
//! let path = format!("/dev/shm/{DEFAULT_REGION_NAME}");
//! let stat = decode_region(&FileRegion::new(path))?;
//! if let Some(temp) = stat.get_sensor_value("GPU Temperature") {
//!     println!("GPU temperature: {temp}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod region;
pub mod source;

pub use region::error::DecodeError;
pub use region::layout::REGION_SIZE;
pub use region::{decode, decode_region, decode_source};
pub use source::{
    DEFAULT_REGION_NAME, FileRegion, FileSource, MemoryRegion, RegionOpener, RegionSource,
    SliceSource, SourceError,
};

/// One sensor slot: a named reading with its unit and display precision.
///
/// # Examples
/// ```
/// use gpuzmem_core::SensorRecord;
///
/// let sensor = SensorRecord {
///     name: "GPU Clock".to_string(),
///     unit: "MHz".to_string(),
///     digits: 1,
///     value: 1905.0,
/// };
/// assert_eq!(sensor.display_value(), "1905.0 MHz");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Sensor name as published by the producer.
    pub name: String,
    /// Unit label (e.g., "MHz", "%", "°C").
    pub unit: String,
    /// Suggested number of fractional digits for display.
    pub digits: u32,
    /// Current reading.
    pub value: f64,
}

impl SensorRecord {
    /// Largest precision `display_value` honours; an f64 carries no more
    /// significant fractional digits than this.
    pub const MAX_DISPLAY_DIGITS: u32 = 17;

    /// Format the value with the suggested precision, followed by the unit.
    ///
    /// The precision is capped at `MAX_DISPLAY_DIGITS`, since a torn or hostile
    /// producer can publish any `digits`.
    pub fn display_value(&self) -> String {
        let digits = self.digits.min(Self::MAX_DISPLAY_DIGITS) as usize;
        let value = format!("{:.*}", digits, self.value);
        if self.unit.is_empty() {
            value
        } else {
            format!("{} {}", value, self.unit)
        }
    }
}

/// Decoded snapshot of the region.
///
/// Built fresh by each decode call and never modified afterwards.
/// Deserialization applies the same invariants a decode guarantees: every
/// available name has an entry, every entry is listed under its own name, and
/// at least one record or sensor is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StatFields")]
pub struct Stat {
    /// Producer layout version.
    pub version: u32,
    /// Nonzero while the producer was updating the region.
    pub busy: u32,
    /// Producer tick of the last update (opaque).
    pub last_update: u32,
    records: BTreeMap<String, String>,
    available_records: Vec<String>,
    sensors: BTreeMap<String, SensorRecord>,
    available_sensors: Vec<String>,
}

#[derive(Deserialize)]
struct StatFields {
    version: u32,
    busy: u32,
    last_update: u32,
    records: BTreeMap<String, String>,
    available_records: Vec<String>,
    sensors: BTreeMap<String, SensorRecord>,
    available_sensors: Vec<String>,
}

impl TryFrom<StatFields> for Stat {
    type Error = String;

    fn try_from(fields: StatFields) -> Result<Self, Self::Error> {
        if fields.records.is_empty() && fields.sensors.is_empty() {
            return Err("stat has no records and no sensors".to_string());
        }
        check_listed("record", &fields.available_records, fields.records.keys())?;
        check_listed("sensor", &fields.available_sensors, fields.sensors.keys())?;
        if let Some((key, sensor)) = fields.sensors.iter().find(|(key, s)| **key != s.name) {
            return Err(format!("sensor entry '{}' is named '{}'", key, sensor.name));
        }
        Ok(Self {
            version: fields.version,
            busy: fields.busy,
            last_update: fields.last_update,
            records: fields.records,
            available_records: fields.available_records,
            sensors: fields.sensors,
            available_sensors: fields.available_sensors,
        })
    }
}

fn check_listed<'a>(
    kind: &str,
    available: &[String],
    mut keys: impl Iterator<Item = &'a String> + Clone,
) -> Result<(), String> {
    if let Some(name) = available.iter().find(|name| !keys.clone().any(|key| key == *name)) {
        return Err(format!("available {kind} '{name}' has no entry"));
    }
    if let Some(key) = keys.find(|key| !available.contains(key)) {
        return Err(format!("{kind} '{key}' is missing from the available list"));
    }
    Ok(())
}

impl Stat {
    pub(crate) fn new(version: u32, busy: u32, last_update: u32) -> Self {
        Self {
            version,
            busy,
            last_update,
            records: BTreeMap::new(),
            available_records: Vec::new(),
            sensors: BTreeMap::new(),
            available_sensors: Vec::new(),
        }
    }

    pub(crate) fn insert_record(&mut self, key: String, value: String) {
        self.available_records.push(key.clone());
        self.records.insert(key, value);
    }

    pub(crate) fn insert_sensor(&mut self, sensor: SensorRecord) {
        self.available_sensors.push(sensor.name.clone());
        self.sensors.insert(sensor.name.clone(), sensor);
    }

    /// Whether the snapshot was taken while the producer was writing; the
    /// contents may then be torn.
    pub fn is_busy(&self) -> bool {
        self.busy != 0
    }

    /// Look up a record value by key.
    pub fn get_record(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }

    /// Look up a full sensor record by name.
    pub fn get_sensor(&self, name: &str) -> Option<&SensorRecord> {
        self.sensors.get(name)
    }

    /// Look up a sensor's current value by name.
    pub fn get_sensor_value(&self, name: &str) -> Option<f64> {
        self.get_sensor(name).map(|sensor| sensor.value)
    }

    /// Record keys in slot order, duplicates included.
    pub fn available_records(&self) -> &[String] {
        &self.available_records
    }

    /// Sensor names in slot order, duplicates included.
    pub fn available_sensors(&self) -> &[String] {
        &self.available_sensors
    }

    pub fn records(&self) -> &BTreeMap<String, String> {
        &self.records
    }

    pub fn sensors(&self) -> &BTreeMap<String, SensorRecord> {
        &self.sensors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stat() -> Stat {
        let mut stat = Stat::new(2, 0, 77);
        stat.insert_record("CardName".to_string(), "Radeon".to_string());
        stat.insert_record("Memory Type".to_string(), "GDDR6".to_string());
        stat.insert_sensor(SensorRecord {
            name: "GPU Load".to_string(),
            unit: "%".to_string(),
            digits: 0,
            value: 37.0,
        });
        stat
    }

    #[test]
    fn lookups_match_available_lists() {
        let stat = sample_stat();
        assert_eq!(stat.get_record("CardName"), Some("Radeon"));
        assert_eq!(stat.get_record("BIOS"), None);
        assert_eq!(stat.get_sensor_value("GPU Load"), Some(37.0));
        assert!(stat.get_sensor("Fan Speed").is_none());
        assert_eq!(stat.get_sensor_value("Fan Speed"), None);

        for key in stat.available_records() {
            assert!(stat.get_record(key).is_some());
        }
        for name in stat.available_sensors() {
            assert!(stat.get_sensor(name).is_some());
        }
    }

    #[test]
    fn busy_flag_is_any_nonzero() {
        let mut stat = sample_stat();
        assert!(!stat.is_busy());
        stat.busy = 0x8000_0000;
        assert!(stat.is_busy());
    }

    #[test]
    fn display_value_uses_digits() {
        let sensor = SensorRecord {
            name: "GPU Voltage".to_string(),
            unit: "V".to_string(),
            digits: 3,
            value: 0.8123,
        };
        assert_eq!(sensor.display_value(), "0.812 V");

        let unitless = SensorRecord {
            unit: String::new(),
            digits: 0,
            ..sensor
        };
        assert_eq!(unitless.display_value(), "1");
    }

    #[test]
    fn display_value_caps_oversized_digits() {
        let sensor = SensorRecord {
            name: "Torn".to_string(),
            unit: "W".to_string(),
            digits: u32::MAX,
            value: 1.5,
        };
        let shown = sensor.display_value();
        assert!(shown.starts_with("1.5000"));
        assert!(shown.ends_with(" W"));
        let fraction = shown.trim_end_matches(" W").split('.').nth(1).unwrap();
        assert_eq!(fraction.len(), SensorRecord::MAX_DISPLAY_DIGITS as usize);
    }

    #[test]
    fn stat_serializes_with_ordered_maps() {
        let value = serde_json::to_value(sample_stat()).expect("stat json");
        assert_eq!(value["version"], 2);
        assert_eq!(value["last_update"], 77);
        assert_eq!(value["records"]["Memory Type"], "GDDR6");
        assert_eq!(value["available_records"][0], "CardName");
        assert_eq!(value["sensors"]["GPU Load"]["unit"], "%");

        let json = serde_json::to_string(&sample_stat()).expect("stat json");
        let card = json.find("\"CardName\":").expect("card key");
        let memory = json.find("\"Memory Type\":").expect("memory key");
        assert!(card < memory);
    }

    #[test]
    fn stat_round_trips_through_json() {
        let stat = sample_stat();
        let json = serde_json::to_string(&stat).expect("stat json");
        let parsed: Stat = serde_json::from_str(&json).expect("parse stat");
        assert_eq!(parsed, stat);
    }

    #[test]
    fn deserialize_rejects_inconsistent_stat() {
        let mut value = serde_json::to_value(sample_stat()).expect("stat json");
        value["available_records"] = serde_json::json!(["CardName"]);
        let err = serde_json::from_value::<Stat>(value).unwrap_err();
        assert!(err.to_string().contains("Memory Type"));

        let mut value = serde_json::to_value(sample_stat()).expect("stat json");
        value["available_sensors"] = serde_json::json!(["GPU Load", "Fan"]);
        assert!(serde_json::from_value::<Stat>(value).is_err());

        let mut value = serde_json::to_value(sample_stat()).expect("stat json");
        value["sensors"]["GPU Load"]["name"] = serde_json::json!("Other");
        assert!(serde_json::from_value::<Stat>(value).is_err());
    }

    #[test]
    fn deserialize_rejects_empty_stat() {
        let json = r#"{"version":1,"busy":0,"last_update":0,"records":{},
            "available_records":[],"sensors":{},"available_sensors":[]}"#;
        let err = serde_json::from_str::<Stat>(json).unwrap_err();
        assert!(err.to_string().contains("no records and no sensors"));
    }
}
