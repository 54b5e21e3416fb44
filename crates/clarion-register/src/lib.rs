//! # clarion-register
//!
//! The Call Register (§4.1): the authoritative state store for call
//! cycles. Every other component mutates call state only through this
//! crate's HTTP surface — except `clarion-monitor` and `clarion-recaller`,
//! which link [`db::RegisterDb`] directly for the two operations (raw
//! event persistence, retry/backup sweep queries) that §6's route table
//! doesn't expose over HTTP.

pub mod config;
pub mod db;
pub mod models;
pub mod routes;

pub use db::{AckOutcome, RegisterDb};
