//! GPU-Z shared-memory region decoding.
//!
//! The region follows a layered structure:
//! - `layout`: field widths, slot counts and offsets (source of truth)
//! - `reader`: forward-only cursor with typed reads and the narrow text rule
//! - `parser`: the fixed read sequence that assembles a `Stat`
//! - `error`: explicit, actionable errors
//!
//! Integer fields are big-endian while the sensor value is a little-endian
//! double; both follow the producer's in-memory layout and are decoded per
//! field. Slots with an empty key or name are skipped without ending the
//! scan, since later slots may still be populated.
//!
//! The parser never logs and keeps no state between calls; polling is left to
//! callers.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{decode, decode_region, decode_source};
