//! # Row Encoding
//!
//! This module provides `RowWriter`, which encodes one record of the v2 row
//! format against a borrowed schema. The layout is fully schema-determined;
//! records carry no per-field type tags.
//!
//! ## Record Binary Layout
//!
//! ```text
//! +------------------+------------------+------------------+------------------+----------------+
//! | Header           | Null Bitmap      | Fixed Region     | Tail             | Timestamp      |
//! | (1..=8 bytes)    | [u8; (N+7)/8]    | [u8; fixed_size] | [u8; ...]        | (u64 LE)       |
//! +------------------+------------------+------------------+------------------+----------------+
//! ```
//!
//! | Component | Description |
//! |-----------|-------------|
//! | **Header** | `0b0000_1kkk` signature byte, then *k* little-endian schema-version bytes |
//! | **Null Bitmap** | 1 bit per nullable field, MSB-first within each byte; `1` = NULL |
//! | **Fixed Region** | one slot per field at its schema-computed offset |
//! | **Tail** | variable-length payloads (strings, WKB, containers) in write order |
//! | **Timestamp** | wall-clock microseconds at finalization |
//!
//! ## Module Structure
//!
//! - `writer`: `RowWriter` construction, typed setters, finalization
//! - `header`: the 1-to-8-byte header codec
//! - `reader`: the `RowReader` collaborator contract for re-encoding rows
//! - `error`: `WriteError` result codes

pub mod error;
mod header;
pub mod reader;
pub mod writer;


pub use error::{WriteError, WriteResult};
pub use header::MAX_VERSION;
pub use reader::RowReader;
pub use writer::RowWriter;
