pub const HEADER_FIELD_SIZE: usize = 4;
pub const HEADER_SIZE: usize = 3 * HEADER_FIELD_SIZE;

pub const RECORD_SLOT_COUNT: usize = 128;
pub const RECORD_KEY_SIZE: usize = 512;
pub const RECORD_VALUE_SIZE: usize = 512;
pub const RECORD_SLOT_SIZE: usize = RECORD_KEY_SIZE + RECORD_VALUE_SIZE;

pub const SENSOR_SLOT_COUNT: usize = 128;
pub const SENSOR_NAME_SIZE: usize = 512;
pub const SENSOR_UNIT_SIZE: usize = 16;
pub const SENSOR_DIGITS_SIZE: usize = 4;
pub const SENSOR_VALUE_SIZE: usize = 8;
/// Width of the published sensor slot; the fields above fill its head.
pub const SENSOR_SLOT_SIZE: usize = 624;
/// Unused bytes after `value` in every sensor slot.
pub const SENSOR_SLOT_PADDING: usize =
    SENSOR_SLOT_SIZE - (SENSOR_NAME_SIZE + SENSOR_UNIT_SIZE + SENSOR_DIGITS_SIZE + SENSOR_VALUE_SIZE);

pub const RECORDS_OFFSET: usize = HEADER_SIZE;
pub const SENSORS_OFFSET: usize = RECORDS_OFFSET + RECORD_SLOT_COUNT * RECORD_SLOT_SIZE;

/// Total size of the published region in bytes.
pub const REGION_SIZE: usize = SENSORS_OFFSET + SENSOR_SLOT_COUNT * SENSOR_SLOT_SIZE;

/// Width of one encoded text unit; only the low byte carries the character.
pub const TEXT_UNIT_SIZE: usize = 2;

pub const fn record_slot_offset(index: usize) -> usize {
    RECORDS_OFFSET + index * RECORD_SLOT_SIZE
}

pub const fn sensor_slot_offset(index: usize) -> usize {
    SENSORS_OFFSET + index * SENSOR_SLOT_SIZE
}
