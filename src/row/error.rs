//! Writer error codes.
//!
//! Every recoverable failure the writer can report. These are deterministic
//! consequences of caller input and schema; none is retryable. Programming
//! errors (schema version overflow, reseeding with a mismatched schema,
//! a corrupt default expression) panic instead.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    #[error("field index or name does not exist in the schema")]
    UnknownField,
    #[error("value type does not coerce into the field's property type")]
    TypeMismatch,
    #[error("value does not fit the destination type's range")]
    OutOfRange,
    #[error("cannot store null in a non-nullable field")]
    NotNullable,
    #[error("a non-nullable field without a default was never set")]
    FieldUnset,
}

pub type WriteResult = Result<(), WriteError>;
