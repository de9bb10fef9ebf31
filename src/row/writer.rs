//! # RowWriter - Record Construction
//!
//! `RowWriter` builds one encoded record against a borrowed schema. Typed
//! setters coerce caller values into each field's on-disk property type and
//! mutate the byte buffer in place; `finish` fills unset fields from their
//! defaults (or null), canonicalizes rewritten variable-length fields, and
//! stamps the record with the wall clock.
//!
//! ## Usage
//!
//! ```ignore
//! let mut writer = RowWriter::new(&schema);
//! writer.set_i64(0, 42)?;
//! writer.set_str(1, "hello")?;
//! let encoded = writer.finish()?;
//! ```
//!
//! ## Variable-Length Writes
//!
//! The first write of a string or geography field appends its bytes to the
//! buffer tail and stores `(offset, length)` in the fixed slot. Overwriting
//! such a field cannot reuse the tail bytes, so the writer latches
//! out-of-space mode: the new bytes go to a side list and the slot stores
//! `(0, side-list index)` until `finish` rebuilds a contiguous tail. List and
//! set payloads are never rebuilt; re-writing one merely orphans its old tail
//! bytes.

use hashbrown::HashSet;
use smallvec::SmallVec;
use tracing::error;

use crate::row::error::{WriteError, WriteResult};
use crate::row::header;
use crate::row::reader::RowReader;
use crate::schema::{DefaultValueContext, Schema};
use crate::types::geography::{GeoShape, Geography};
use crate::types::property::{ElementType, PropertyType};
use crate::types::temporal::{now_micros, to_timestamp, Date, DateTime, Duration, Time};
use crate::types::value::{DedupKey, Value};

pub struct RowWriter<'a> {
    schema: &'a Schema,
    buf: Vec<u8>,
    header_len: usize,
    num_null_bytes: usize,
    is_set: SmallVec<[bool; 32]>,
    out_of_space: bool,
    str_list: SmallVec<[Vec<u8>; 4]>,
    approx_str_len: usize,
}

impl<'a> RowWriter<'a> {
    /// Creates an empty writer bound to `schema`.
    ///
    /// Panics if the schema version exceeds the 7-byte header limit.
    pub fn new(schema: &'a Schema) -> Self {
        let mut buf = Vec::with_capacity(
            schema.fixed_size() + schema.num_nullable_fields() / 8 + 8 + 1024,
        );
        let header_len = header::append_header(&mut buf, schema.version());
        let num_null_bytes = schema.num_null_bytes();
        buf.resize(header_len + num_null_bytes + schema.fixed_size(), 0);

        let mut is_set = SmallVec::new();
        is_set.resize(schema.num_fields(), false);

        Self {
            schema,
            buf,
            header_len,
            num_null_bytes,
            is_set,
            out_of_space: false,
            str_list: SmallVec::new(),
            approx_str_len: 0,
        }
    }

    /// Re-opens an encoded record (trailer included) for in-place editing.
    /// Every field starts out set, so overwriting a variable-length field
    /// immediately takes the out-of-space path.
    ///
    /// Panics if the record was encoded with a different schema version.
    pub fn from_encoded(schema: &'a Schema, encoded: Vec<u8>) -> Self {
        let mut buf = encoded;
        assert!(buf.len() > 8, "encoded record shorter than its trailer");
        buf.truncate(buf.len() - 8);

        let (header_len, version) = header::decode_header(&buf);
        assert_eq!(
            version,
            schema.version(),
            "record encoded with schema version {version}, bound schema has version {}",
            schema.version()
        );

        let num_null_bytes = schema.num_null_bytes();
        let approx_str_len = buf
            .len()
            .saturating_sub(header_len + num_null_bytes + schema.fixed_size());

        let mut is_set = SmallVec::new();
        is_set.resize(schema.num_fields(), true);

        Self {
            schema,
            buf,
            header_len,
            num_null_bytes,
            is_set,
            out_of_space: false,
            str_list: SmallVec::new(),
            approx_str_len,
        }
    }

    /// Builds a writer by copying every field of a decoded row. Per-field
    /// write failures are swallowed and the field marked set regardless; the
    /// reader is trusted to match the schema.
    pub fn from_reader<R: RowReader>(reader: &'a R) -> Self {
        let mut writer = RowWriter::new(reader.schema());
        for i in 0..reader.num_fields() {
            match reader.value(i) {
                Value::Null(_) => {
                    let _ = writer.set_null(i);
                }
                Value::Bool(v) => {
                    let _ = writer.set_bool(i, v);
                }
                Value::Int(v) => {
                    let _ = writer.set_i64(i, v);
                }
                Value::Float(v) => {
                    let _ = writer.set_f64(i, v);
                }
                Value::Str(v) => {
                    let _ = writer.set_str(i, &v);
                }
                Value::Date(v) => {
                    let _ = writer.set_date(i, v);
                }
                Value::Time(v) => {
                    let _ = writer.set_time(i, v);
                }
                Value::DateTime(v) => {
                    let _ = writer.set_datetime(i, v);
                }
                Value::Duration(v) => {
                    let _ = writer.set_duration(i, v);
                }
                Value::Geography(v) => {
                    let _ = writer.set_geography(i, &v);
                }
                Value::List(v) => {
                    let _ = writer.set_list(i, &v);
                }
                Value::Set(v) => {
                    let _ = writer.set_set(i, &v);
                }
            }
            writer.is_set[i] = true;
        }
        writer
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    // ---- null bitmap -------------------------------------------------------

    // Bit `pos` lives at byte `header_len + pos / 8`, most significant first.

    fn set_null_bit(&mut self, pos: usize) {
        self.buf[self.header_len + (pos >> 3)] |= 0x80 >> (pos & 7);
    }

    fn clear_null_bit(&mut self, pos: usize) {
        self.buf[self.header_len + (pos >> 3)] &= !(0x80 >> (pos & 7));
    }

    fn check_null_bit(&self, pos: usize) -> bool {
        self.buf[self.header_len + (pos >> 3)] & (0x80 >> (pos & 7)) != 0
    }

    // ---- setters -----------------------------------------------------------

    /// Stores a plain NULL in a nullable field. The fixed slot's bytes are
    /// left untouched.
    pub fn set_null(&mut self, index: usize) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        let Some(pos) = field.null_flag_pos() else {
            return Err(WriteError::NotNullable);
        };
        self.set_null_bit(pos);
        self.is_set[index] = true;
        Ok(())
    }

    pub fn set_null_by_name(&mut self, name: &str) -> WriteResult {
        let index = self
            .schema
            .field_index(name)
            .ok_or(WriteError::UnknownField)?;
        self.set_null(index)
    }

    /// Dispatches a runtime value to the typed setter for its variant.
    pub fn set_value(&mut self, index: usize, value: &Value) -> WriteResult {
        if index >= self.schema.num_fields() {
            return Err(WriteError::UnknownField);
        }
        match value {
            Value::Null(kind) => {
                if kind.is_bad() {
                    // error-carrying nulls are never valid property values
                    return Err(WriteError::TypeMismatch);
                }
                self.set_null(index)
            }
            Value::Bool(v) => self.set_bool(index, *v),
            Value::Int(v) => self.set_i64(index, *v),
            Value::Float(v) => self.set_f64(index, *v),
            Value::Str(v) => self.set_str(index, v),
            Value::Date(v) => self.set_date(index, *v),
            Value::Time(v) => self.set_time(index, *v),
            Value::DateTime(v) => self.set_datetime(index, *v),
            Value::Duration(v) => self.set_duration(index, *v),
            Value::Geography(v) => self.set_geography(index, v),
            Value::List(v) => self.set_list(index, v),
            Value::Set(v) => self.set_set(index, v),
        }
    }

    pub fn set_value_by_name(&mut self, name: &str, value: &Value) -> WriteResult {
        let index = self
            .schema
            .field_index(name)
            .ok_or(WriteError::UnknownField)?;
        self.set_value(index, value)
    }

    pub fn set_bool(&mut self, index: usize, v: bool) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        let off = self.header_len + self.num_null_bytes + field.offset();
        match field.prop_type() {
            PropertyType::Bool | PropertyType::Int8 => {
                self.buf[off] = v as u8;
            }
            PropertyType::Int16 | PropertyType::Int32 | PropertyType::Int64 => {
                // The slot may hold stale bytes (reseed flows); the whole
                // width must read back as 0 or 1.
                self.buf[off..off + field.size()].fill(0);
                self.buf[off] = v as u8;
            }
            _ => return Err(WriteError::TypeMismatch),
        }
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    pub fn set_i8(&mut self, index: usize, v: i8) -> WriteResult {
        self.write_int(index, v as i64, false)
    }

    pub fn set_i16(&mut self, index: usize, v: i16) -> WriteResult {
        self.write_int(index, v as i64, false)
    }

    pub fn set_i32(&mut self, index: usize, v: i32) -> WriteResult {
        self.write_int(index, v as i64, true)
    }

    pub fn set_i64(&mut self, index: usize, v: i64) -> WriteResult {
        self.write_int(index, v, true)
    }

    // Unsigned inputs are reinterpreted as the same-width signed integer
    // (u64::MAX stores as int64 -1). This is part of the format's contract.

    pub fn set_u8(&mut self, index: usize, v: u8) -> WriteResult {
        self.set_i8(index, v as i8)
    }

    pub fn set_u16(&mut self, index: usize, v: u16) -> WriteResult {
        self.set_i16(index, v as i16)
    }

    pub fn set_u32(&mut self, index: usize, v: u32) -> WriteResult {
        self.set_i32(index, v as i32)
    }

    pub fn set_u64(&mut self, index: usize, v: u64) -> WriteResult {
        self.set_i64(index, v as i64)
    }

    /// Shared integer path. Timestamp destinations accept only 32- and
    /// 64-bit sources, mirroring the width set the validator is defined for.
    fn write_int(&mut self, index: usize, v: i64, allow_timestamp: bool) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        let off = self.header_len + self.num_null_bytes + field.offset();
        match field.prop_type() {
            PropertyType::Bool => {
                self.buf[off] = if v == 0 { 0x00 } else { 0x01 };
            }
            PropertyType::Int8 => {
                if v > i8::MAX as i64 || v < i8::MIN as i64 {
                    return Err(WriteError::OutOfRange);
                }
                self.buf[off] = v as i8 as u8;
            }
            PropertyType::Int16 => {
                if v > i16::MAX as i64 || v < i16::MIN as i64 {
                    return Err(WriteError::OutOfRange);
                }
                self.put(off, &(v as i16).to_le_bytes());
            }
            PropertyType::Int32 => {
                if v > i32::MAX as i64 || v < i32::MIN as i64 {
                    return Err(WriteError::OutOfRange);
                }
                self.put(off, &(v as i32).to_le_bytes());
            }
            PropertyType::Int64 => {
                self.put(off, &v.to_le_bytes());
            }
            PropertyType::Timestamp if allow_timestamp => {
                let ts = to_timestamp(v).map_err(|_| WriteError::OutOfRange)?;
                self.put(off, &ts.to_le_bytes());
            }
            PropertyType::Float => {
                self.put(off, &(v as f32).to_le_bytes());
            }
            PropertyType::Double => {
                self.put(off, &(v as f64).to_le_bytes());
            }
            _ => return Err(WriteError::TypeMismatch),
        }
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    /// Float-to-integer coercion rounds half away from zero (`f32::round`),
    /// then range-checks in the source type so destinations whose maximum is
    /// not exactly representable are not spuriously rejected.
    pub fn set_f32(&mut self, index: usize, v: f32) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        let off = self.header_len + self.num_null_bytes + field.offset();
        match field.prop_type() {
            PropertyType::Int8 => {
                if v > i8::MAX as f32 || v < i8::MIN as f32 {
                    return Err(WriteError::OutOfRange);
                }
                self.buf[off] = v.round() as i8 as u8;
            }
            PropertyType::Int16 => {
                if v > i16::MAX as f32 || v < i16::MIN as f32 {
                    return Err(WriteError::OutOfRange);
                }
                self.put(off, &(v.round() as i16).to_le_bytes());
            }
            PropertyType::Int32 => {
                if v > i32::MAX as f32 || v < i32::MIN as f32 {
                    return Err(WriteError::OutOfRange);
                }
                self.put(off, &(v.round() as i32).to_le_bytes());
            }
            PropertyType::Int64 => {
                if v > i64::MAX as f32 || v < i64::MIN as f32 {
                    return Err(WriteError::OutOfRange);
                }
                self.put(off, &(v.round() as i64).to_le_bytes());
            }
            PropertyType::Float => {
                self.put(off, &v.to_le_bytes());
            }
            PropertyType::Double => {
                self.put(off, &(v as f64).to_le_bytes());
            }
            _ => return Err(WriteError::TypeMismatch),
        }
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    pub fn set_f64(&mut self, index: usize, v: f64) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        let off = self.header_len + self.num_null_bytes + field.offset();
        match field.prop_type() {
            PropertyType::Int8 => {
                if v > i8::MAX as f64 || v < i8::MIN as f64 {
                    return Err(WriteError::OutOfRange);
                }
                self.buf[off] = v.round() as i8 as u8;
            }
            PropertyType::Int16 => {
                if v > i16::MAX as f64 || v < i16::MIN as f64 {
                    return Err(WriteError::OutOfRange);
                }
                self.put(off, &(v.round() as i16).to_le_bytes());
            }
            PropertyType::Int32 => {
                if v > i32::MAX as f64 || v < i32::MIN as f64 {
                    return Err(WriteError::OutOfRange);
                }
                self.put(off, &(v.round() as i32).to_le_bytes());
            }
            PropertyType::Int64 => {
                if v > i64::MAX as f64 || v < i64::MIN as f64 {
                    return Err(WriteError::OutOfRange);
                }
                self.put(off, &(v.round() as i64).to_le_bytes());
            }
            PropertyType::Float => {
                if v > f32::MAX as f64 || v < f32::MIN as f64 {
                    return Err(WriteError::OutOfRange);
                }
                self.put(off, &(v as f32).to_le_bytes());
            }
            PropertyType::Double => {
                self.put(off, &v.to_le_bytes());
            }
            _ => return Err(WriteError::TypeMismatch),
        }
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    pub fn set_str(&mut self, index: usize, v: &str) -> WriteResult {
        self.write_var(index, v.as_bytes(), false)
    }

    pub fn set_date(&mut self, index: usize, v: Date) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        if field.prop_type() != PropertyType::Date {
            return Err(WriteError::TypeMismatch);
        }
        let off = self.header_len + self.num_null_bytes + field.offset();
        self.put(off, &v.year.to_le_bytes());
        self.buf[off + 2] = v.month as u8;
        self.buf[off + 3] = v.day as u8;
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    pub fn set_time(&mut self, index: usize, v: Time) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        if field.prop_type() != PropertyType::Time {
            return Err(WriteError::TypeMismatch);
        }
        let off = self.header_len + self.num_null_bytes + field.offset();
        self.buf[off] = v.hour as u8;
        self.buf[off + 1] = v.minute as u8;
        self.buf[off + 2] = v.sec as u8;
        self.put(off + 3, &v.microsec.to_le_bytes());
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    pub fn set_datetime(&mut self, index: usize, v: DateTime) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        if field.prop_type() != PropertyType::DateTime {
            return Err(WriteError::TypeMismatch);
        }
        let off = self.header_len + self.num_null_bytes + field.offset();
        self.put(off, &v.year.to_le_bytes());
        self.buf[off + 2] = v.month as u8;
        self.buf[off + 3] = v.day as u8;
        self.buf[off + 4] = v.hour as u8;
        self.buf[off + 5] = v.minute as u8;
        self.buf[off + 6] = v.sec as u8;
        self.put(off + 7, &v.microsec.to_le_bytes());
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    pub fn set_duration(&mut self, index: usize, v: Duration) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        if field.prop_type() != PropertyType::Duration {
            return Err(WriteError::TypeMismatch);
        }
        let off = self.header_len + self.num_null_bytes + field.offset();
        self.put(off, &v.seconds.to_le_bytes());
        self.put(off + 8, &v.microseconds.to_le_bytes());
        self.put(off + 12, &v.months.to_le_bytes());
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    /// Serializes the shape to WKB and stores it through the variable-length
    /// path. The field's declared shape constraint is enforced first.
    pub fn set_geography(&mut self, index: usize, v: &Geography) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        let declared = field.geo_shape();
        if declared != GeoShape::Any && declared != v.shape() {
            return Err(WriteError::TypeMismatch);
        }
        let wkb = v.as_wkb();
        self.write_var(index, &wkb, true)
    }

    pub fn set_list(&mut self, index: usize, values: &[Value]) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        let Some(elem) = field.prop_type().list_element() else {
            error!(field = field.name(), ty = ?field.prop_type(), "list written to a non-list field");
            return Err(WriteError::TypeMismatch);
        };
        self.check_elements(field.name(), elem, values)?;

        let off = self.header_len + self.num_null_bytes + field.offset();
        if self.is_set[index] {
            self.out_of_space = true;
        }
        let tail_offset = self.buf.len() as i32;
        self.buf
            .extend_from_slice(&(values.len() as i32).to_le_bytes());
        for item in values {
            self.append_element(item);
        }
        self.put(off, &tail_offset.to_le_bytes());
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    /// Like [`set_list`], but duplicate elements (by value equality) are
    /// dropped, first occurrence winning. The persisted count is the number
    /// of elements actually written.
    ///
    /// [`set_list`]: RowWriter::set_list
    pub fn set_set(&mut self, index: usize, values: &[Value]) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        let Some(elem) = field.prop_type().set_element() else {
            error!(field = field.name(), ty = ?field.prop_type(), "set written to a non-set field");
            return Err(WriteError::TypeMismatch);
        };
        self.check_elements(field.name(), elem, values)?;

        let mut seen: HashSet<DedupKey> = HashSet::with_capacity(values.len());
        let mut unique: Vec<&Value> = Vec::with_capacity(values.len());
        for item in values {
            match item.dedup_key() {
                Some(key) => {
                    if seen.insert(key) {
                        unique.push(item);
                    }
                }
                None => unique.push(item),
            }
        }

        let off = self.header_len + self.num_null_bytes + field.offset();
        if self.is_set[index] {
            self.out_of_space = true;
        }
        let tail_offset = self.buf.len() as i32;
        self.buf
            .extend_from_slice(&(unique.len() as i32).to_le_bytes());
        for item in unique {
            self.append_element(item);
        }
        self.put(off, &tail_offset.to_le_bytes());
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    /// Consumes the writer: fills unset fields from defaults or null,
    /// collapses out-of-space strings into a fresh contiguous tail, appends
    /// the wall-clock trailer, and yields the encoded record.
    pub fn finish(mut self) -> Result<Vec<u8>, WriteError> {
        self.fill_unset_fields()?;
        if self.out_of_space {
            self.buf = self.canonicalize();
        }
        let ts = now_micros();
        self.buf.extend_from_slice(&ts.to_le_bytes());
        Ok(self.buf)
    }

    // ---- internals ---------------------------------------------------------

    fn put(&mut self, off: usize, bytes: &[u8]) {
        self.buf[off..off + bytes.len()].copy_from_slice(bytes);
    }

    fn mark_set(&mut self, index: usize, null_flag_pos: Option<usize>) {
        if let Some(pos) = null_flag_pos {
            self.clear_null_bit(pos);
        }
        self.is_set[index] = true;
    }

    fn check_elements(&self, name: &str, elem: ElementType, values: &[Value]) -> WriteResult {
        for item in values {
            if !item.is_element_of(elem) {
                error!(field = name, expected = ?elem, got = ?item, "container element type mismatch");
                return Err(WriteError::TypeMismatch);
            }
        }
        Ok(())
    }

    /// Appends one validated container element to the tail. Integers persist
    /// as 32-bit and floats as single precision; this is the format, not an
    /// optimization.
    fn append_element(&mut self, item: &Value) {
        match item {
            Value::Str(s) => {
                self.buf
                    .extend_from_slice(&(s.len() as i32).to_le_bytes());
                self.buf.extend_from_slice(s.as_bytes());
            }
            Value::Int(v) => {
                self.buf.extend_from_slice(&(*v as i32).to_le_bytes());
            }
            Value::Float(v) => {
                self.buf.extend_from_slice(&(*v as f32).to_le_bytes());
            }
            _ => unreachable!("container elements are validated before appending"),
        }
    }

    fn write_var(&mut self, index: usize, v: &[u8], is_wkb: bool) -> WriteResult {
        let schema = self.schema;
        let field = schema.field(index).ok_or(WriteError::UnknownField)?;
        let off = self.header_len + self.num_null_bytes + field.offset();
        match field.prop_type() {
            PropertyType::Geography if !is_wkb => return Err(WriteError::TypeMismatch),
            PropertyType::String | PropertyType::Geography => {
                if self.is_set[index] {
                    // The previous value still occupies the tail; repoint
                    // through the side list and reconcile at finish.
                    self.out_of_space = true;
                }
                let (str_offset, str_len) = if self.out_of_space {
                    self.str_list.push(v.to_vec());
                    (0i32, (self.str_list.len() - 1) as i32)
                } else {
                    let offset = self.buf.len() as i32;
                    self.buf.extend_from_slice(v);
                    (offset, v.len() as i32)
                };
                self.put(off, &str_offset.to_le_bytes());
                self.put(off + 4, &str_len.to_le_bytes());
                self.approx_str_len += v.len();
            }
            PropertyType::FixedString => {
                let size = field.size();
                let len = if v.len() > size {
                    utf8_cut(v, size)
                } else {
                    v.len()
                };
                self.put(off, &v[..len]);
                if len < size {
                    self.buf[off + len..off + size].fill(0);
                }
            }
            _ => return Err(WriteError::TypeMismatch),
        }
        self.mark_set(index, field.null_flag_pos());
        Ok(())
    }

    /// Finalize-time pass over unset fields: evaluate the default, or mark
    /// null, or fail. A default that does not coerce into its own field is a
    /// corrupt schema and panics.
    fn fill_unset_fields(&mut self) -> WriteResult {
        let schema = self.schema;
        let ctx = DefaultValueContext;
        for (i, field) in schema.fields().iter().enumerate() {
            if self.is_set[i] {
                continue;
            }
            match field.default_value() {
                Some(expr) => match expr.eval(&ctx) {
                    Value::Null(_) => {
                        let Some(pos) = field.null_flag_pos() else {
                            panic!(
                                "default for non-nullable field {:?} evaluated to null",
                                field.name()
                            );
                        };
                        self.set_null_bit(pos);
                        self.is_set[i] = true;
                    }
                    value => {
                        if let Err(e) = self.set_value(i, &value) {
                            panic!(
                                "default for field {:?} does not coerce into {:?}: {e}",
                                field.name(),
                                field.prop_type()
                            );
                        }
                    }
                },
                None => match field.null_flag_pos() {
                    Some(pos) => {
                        self.set_null_bit(pos);
                        self.is_set[i] = true;
                    }
                    None => return Err(WriteError::FieldUnset),
                },
            }
        }
        Ok(())
    }

    /// Rebuilds the buffer with a contiguous tail: header, null bitmap and
    /// fixed region are copied verbatim, then every string/geography payload
    /// is re-appended in schema order and its slot repointed. List and set
    /// tails are not carried over.
    fn canonicalize(&self) -> Vec<u8> {
        let data_end = self.header_len + self.num_null_bytes + self.schema.fixed_size();
        let mut temp = Vec::with_capacity(data_end + self.approx_str_len + 8);
        temp.extend_from_slice(&self.buf[..data_end]);

        for field in self.schema.fields() {
            if !field.prop_type().is_variable() {
                continue;
            }
            let off = self.header_len + self.num_null_bytes + field.offset();

            let mut new_offset = temp.len() as i32;
            let mut str_len;
            match field.null_flag_pos() {
                Some(pos) if self.check_null_bit(pos) => {
                    new_offset = 0;
                    str_len = 0;
                }
                _ => {
                    let old_offset = read_i32_le(&self.buf, off);
                    str_len = read_i32_le(&self.buf, off + 4);
                    if old_offset > 0 {
                        let start = old_offset as usize;
                        temp.extend_from_slice(&self.buf[start..start + str_len as usize]);
                    } else {
                        // (0, n) points at the side list
                        let bytes = &self.str_list[str_len as usize];
                        temp.extend_from_slice(bytes);
                        str_len = bytes.len() as i32;
                    }
                }
            }

            temp[off..off + 4].copy_from_slice(&new_offset.to_le_bytes());
            temp[off + 4..off + 8].copy_from_slice(&str_len.to_le_bytes());
        }
        temp
    }
}

fn read_i32_le(buf: &[u8], off: usize) -> i32 {
    i32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// Largest prefix of `bytes` not longer than `limit` that does not split a
/// UTF-8 code point. `limit` must be less than `bytes.len()`.
fn utf8_cut(bytes: &[u8], limit: usize) -> usize {
    let mut cut = limit;
    while cut > 0 && bytes[cut] & 0xC0 == 0x80 {
        cut -= 1;
    }
    cut
}
