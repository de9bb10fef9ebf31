//! # Type System
//!
//! The value and type vocabulary shared by the schema and the row writer:
//!
//! - `property`: on-disk `PropertyType` of a field and per-type slot widths
//! - `value`: `Value`, the tagged runtime variant callers supply
//! - `temporal`: date/time composites, timestamp validation, wall clock
//! - `geography`: geographic shapes and WKB serialization

pub mod geography;
pub mod property;
pub mod temporal;
pub mod value;

pub use geography::{Coord, GeoShape, Geography};
pub use property::{ElementType, PropertyType};
pub use temporal::{now_micros, to_timestamp, Date, DateTime, Duration, Time, MAX_TIMESTAMP};
pub use value::{NullKind, Value};
