//! # clarion-directory
//!
//! The Address Book (§4.6): contact storage and on-call resolution. Also
//! the one component every other service queries read-only (`/oncall`)
//! when a caller asks for the literal alias `"oncall"` instead of a phone
//! number.

pub mod config;
pub mod csv_io;
pub mod db;
pub mod models;
pub mod routes;

pub use db::DirectoryDb;
