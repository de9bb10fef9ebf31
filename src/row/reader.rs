//! Row reader collaborator contract.
//!
//! The writer never decodes records itself; when a row must be re-encoded
//! from an existing decoded form, the source is anything implementing
//! [`RowReader`]. The contract is deliberately narrow: a schema, a field
//! count, and one materialized [`Value`] per field.

use crate::schema::Schema;
use crate::types::value::Value;

pub trait RowReader {
    /// The schema the read row was decoded with.
    fn schema(&self) -> &Schema;

    fn num_fields(&self) -> usize {
        self.schema().num_fields()
    }

    /// Materializes the value of field `index`. Nulls are reported as
    /// `Value::Null`.
    fn value(&self, index: usize) -> Value;
}
