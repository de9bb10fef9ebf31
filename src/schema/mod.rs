//! # Schema Definitions
//!
//! This module provides `Schema`, the read-only field metadata a row writer
//! is bound to. A schema is built from `FieldDef`s; construction pre-computes
//! each field's byte offset in the fixed region, assigns null-flag positions
//! to nullable fields (densely, in declaration order), and indexes fields by
//! name for the by-name setters.
//!
//! ## Schema Internals
//!
//! - `fields`: computed field metadata in declaration order
//! - `by_name`: field name → ordinal index
//! - `fixed_size`: total width of the fixed region
//! - `num_nullable`: nullable field count, sizing the null bitmap
//!
//! ## Default Values
//!
//! A field may carry a default as an [`Expression`]. Expressions are opaque
//! to the writer; at finalize time each unset field's expression is reduced
//! to a [`Value`] literal in a [`DefaultValueContext`] (an evaluation context
//! with no variables) and routed through the ordinary typed write path.
//! [`Literal`] is the trivial expression that evaluates to itself; richer
//! evaluators can implement the trait externally.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::types::geography::GeoShape;
use crate::types::property::PropertyType;
use crate::types::value::Value;

/// Evaluation context for default-value expressions. Carries no variables;
/// any expression that needs one is malformed for this use.
#[derive(Debug, Default)]
pub struct DefaultValueContext;

/// A default-value expression attached to a schema field.
pub trait Expression: fmt::Debug + Send + Sync {
    /// Reduces the expression to a literal value.
    fn eval(&self, ctx: &DefaultValueContext) -> Value;
}

/// An expression that evaluates to a fixed literal.
#[derive(Debug, Clone)]
pub struct Literal {
    value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Expression for Literal {
    fn eval(&self, _ctx: &DefaultValueContext) -> Value {
        self.value.clone()
    }
}

/// Input description of one field, consumed by [`Schema::new`].
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    prop_type: PropertyType,
    nullable: bool,
    fixed_len: usize,
    geo_shape: GeoShape,
    default: Option<Arc<dyn Expression>>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, prop_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            prop_type,
            nullable: false,
            fixed_len: 0,
            geo_shape: GeoShape::Any,
            default: None,
        }
    }

    /// A `FIXED_STRING` field with its declared byte length.
    pub fn fixed_string(name: impl Into<String>, len: usize) -> Self {
        let mut def = Self::new(name, PropertyType::FixedString);
        def.fixed_len = len;
        def
    }

    /// A `GEOGRAPHY` field constrained to the given shape.
    pub fn geography(name: impl Into<String>, shape: GeoShape) -> Self {
        let mut def = Self::new(name, PropertyType::Geography);
        def.geo_shape = shape;
        def
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, expr: impl Expression + 'static) -> Self {
        self.default = Some(Arc::new(expr));
        self
    }
}

/// Computed metadata for one schema field.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    prop_type: PropertyType,
    offset: usize,
    size: usize,
    null_flag_pos: Option<usize>,
    geo_shape: GeoShape,
    default: Option<Arc<dyn Expression>>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prop_type(&self) -> PropertyType {
        self.prop_type
    }

    /// Byte offset of this field's slot within the fixed region.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Slot width in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn nullable(&self) -> bool {
        self.null_flag_pos.is_some()
    }

    /// Bit position in the null bitmap; `None` for non-nullable fields.
    pub fn null_flag_pos(&self) -> Option<usize> {
        self.null_flag_pos
    }

    pub fn geo_shape(&self) -> GeoShape {
        self.geo_shape
    }

    pub fn default_value(&self) -> Option<&Arc<dyn Expression>> {
        self.default.as_ref()
    }
}

/// Read-only schema a row writer is bound to.
#[derive(Debug, Clone)]
pub struct Schema {
    version: u64,
    fields: Vec<Field>,
    by_name: HashMap<String, usize>,
    fixed_size: usize,
    num_nullable: usize,
}

impl Schema {
    pub fn new(version: u64, defs: Vec<FieldDef>) -> Self {
        let mut fields = Vec::with_capacity(defs.len());
        let mut by_name = HashMap::with_capacity(defs.len());
        let mut offset = 0;
        let mut num_nullable = 0;

        for (idx, def) in defs.into_iter().enumerate() {
            let size = match def.prop_type.slot_size() {
                Some(s) => s,
                None => def.fixed_len,
            };
            let null_flag_pos = if def.nullable {
                num_nullable += 1;
                Some(num_nullable - 1)
            } else {
                None
            };
            by_name.insert(def.name.clone(), idx);
            fields.push(Field {
                name: def.name,
                prop_type: def.prop_type,
                offset,
                size,
                null_flag_pos,
                geo_shape: def.geo_shape,
                default: def.default,
            });
            offset += size;
        }

        Self {
            version,
            fields,
            by_name,
            fixed_size: offset,
            num_nullable,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total width of the fixed region in bytes.
    pub fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    pub fn num_nullable_fields(&self) -> usize {
        self.num_nullable
    }

    /// Null bitmap width: one bit per nullable field, rounded up to bytes.
    pub fn num_null_bytes(&self) -> usize {
        self.num_nullable.div_ceil(8)
    }
}
