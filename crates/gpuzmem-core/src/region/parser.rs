use crate::source::{RegionOpener, RegionSource};
use crate::{SensorRecord, Stat};

use super::error::DecodeError;
use super::layout;
use super::reader::ByteCursor;

/// Attach to a region through `opener` and decode it.
///
/// The opener is invoked once with `region_size`. Once it has succeeded the
/// source is released before returning, whatever the outcome of decoding.
///
/// # Errors
/// `DecodeError::SourceUnavailable` when the opener fails,
/// `DecodeError::ShortRead` when the region is smaller than the layout, and
/// `DecodeError::NoData` when no record or sensor slot is populated.
pub fn decode<O: RegionOpener>(opener: O, region_size: usize) -> Result<Stat, DecodeError> {
    let mut source = opener.open(region_size)?;
    let result = decode_source(&mut source);
    source.release();
    result
}

/// Decode a region of the standard size.
pub fn decode_region<O: RegionOpener>(opener: O) -> Result<Stat, DecodeError> {
    decode(opener, layout::REGION_SIZE)
}

/// Run the fixed read sequence against an already attached source.
///
/// The caller keeps ownership of the source and is responsible for releasing
/// it.
pub fn decode_source<S: RegionSource>(source: &mut S) -> Result<Stat, DecodeError> {
    let mut cursor = ByteCursor::new(source);

    let version = cursor.read_u32_be("header.version")?;
    let busy = cursor.read_u32_be("header.busy")?;
    let last_update = cursor.read_u32_be("header.last_update")?;
    let mut stat = Stat::new(version, busy, last_update);

    for _ in 0..layout::RECORD_SLOT_COUNT {
        let key = cursor.read_fixed_text("record.key", layout::RECORD_KEY_SIZE)?;
        let value = cursor.read_fixed_text("record.value", layout::RECORD_VALUE_SIZE)?;
        if !key.is_empty() {
            stat.insert_record(key, value);
        }
    }

    for _ in 0..layout::SENSOR_SLOT_COUNT {
        let name = cursor.read_fixed_text("sensor.name", layout::SENSOR_NAME_SIZE)?;
        let unit = cursor.read_fixed_text("sensor.unit", layout::SENSOR_UNIT_SIZE)?;
        let digits = cursor.read_u32_be("sensor.digits")?;
        let value = cursor.read_f64_le("sensor.value")?;
        cursor.skip("sensor.padding", layout::SENSOR_SLOT_PADDING)?;
        if !name.is_empty() {
            stat.insert_sensor(SensorRecord {
                name,
                unit,
                digits,
                value,
            });
        }
    }

    debug_assert_eq!(cursor.offset(), layout::REGION_SIZE);

    if stat.records().is_empty() && stat.sensors().is_empty() {
        return Err(DecodeError::NoData);
    }
    Ok(stat)
}
