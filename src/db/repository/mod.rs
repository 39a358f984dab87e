//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `rusqlite::Connection`, one sub-module
//! per table. All public functions are re-exported here.

mod alert;
mod reading;

pub use alert::*;
pub use reading::*;
