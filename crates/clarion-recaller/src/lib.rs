//! # clarion-recaller
//!
//! The Recaller (§4.3): the periodic retry/escalation loop. Links
//! `clarion-register`'s database layer directly for the sweep queries
//! (there is no HTTP route for them in §6, mirroring how `clarion-monitor`
//! shares the same crate for event persistence), and talks to the Dialer
//! and Address Book over HTTP like every other peer relationship in this
//! system.

pub mod config;
pub mod dialer_client;
pub mod directory_client;
pub mod sweep;
