//! Async PostgreSQL operations, one module per group of tables.
//!
//! Cascades are left to the foreign keys declared in the migrations. The
//! functions here only check what the schema cannot express on its own or
//! what deserves a clearer error than a raw constraint violation.

use crate::error::{ModelError, ModelResult};

pub mod channel;
pub mod club;
pub mod feedback;
pub mod membership;
pub mod project;
pub mod user;

fn expect_deleted(rows: usize, entity: &'static str, id: i32) -> ModelResult<()> {
    if rows == 0 {
        return Err(ModelError::not_found(entity, id));
    }
    Ok(())
}
