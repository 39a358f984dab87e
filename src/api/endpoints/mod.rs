//! API endpoint handlers.
//!
//! Handlers stay thin: extract, hop onto the blocking pool, and call into
//! `vitals`, `db` or `sheet`.

pub mod admin;
pub mod alerts;
pub mod health;
pub mod readings;
pub mod refresh;
pub mod sheet;
