//! # rowcodec - Schema-Driven Row Encoder
//!
//! `rowcodec` implements the writer side of a graph store's "row format v2":
//! compact, self-describing binary records whose layout is fully determined
//! by a schema. A record is a header, a null bitmap, a fixed region with one
//! slot per field, a tail of variable-length payloads, and a wall-clock
//! trailer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowcodec::{FieldDef, PropertyType, RowWriter, Schema};
//!
//! let schema = Schema::new(1, vec![
//!     FieldDef::new("id", PropertyType::Int64),
//!     FieldDef::new("name", PropertyType::String).nullable(),
//! ]);
//!
//! let mut writer = RowWriter::new(&schema);
//! writer.set_i64(0, 42)?;
//! writer.set_str(1, "Alice")?;
//! let encoded = writer.finish()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------+
//! |        RowWriter (row::writer)       |
//! |  typed setters / coercion / finish   |
//! +------------------+-------------------+
//! |  Schema (schema) |  Value (types)    |
//! |  offsets, nulls, |  runtime variants |
//! |  defaults        |  temporal, geo    |
//! +------------------+-------------------+
//! ```
//!
//! The writer borrows its schema and owns its buffer; it is single-owner and
//! single-threaded by design. Recoverable failures come back as
//! [`WriteError`]; programming errors (version overflow, reseeding against
//! the wrong schema, corrupt defaults) panic.
//!
//! ## Module Overview
//!
//! - [`row`]: the row writer, header codec, and reader contract
//! - [`schema`]: field metadata, offsets, default-value expressions
//! - [`types`]: property types, runtime values, temporal and geographic types

pub mod row;
pub mod schema;
pub mod types;

pub use row::{RowReader, RowWriter, WriteError, WriteResult};
pub use schema::{DefaultValueContext, Expression, Field, FieldDef, Literal, Schema};
pub use types::{
    Coord, Date, DateTime, Duration, GeoShape, Geography, NullKind, PropertyType, Time, Value,
};
