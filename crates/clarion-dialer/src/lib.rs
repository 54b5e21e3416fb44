//! # clarion-dialer
//!
//! The Asterisk Dialer (§4.2): places outbound calls through the PBX's
//! HTTP control API, resolves the `"oncall"` alias via the Address Book,
//! drives per-channel audio playback, and hosts the in-process outbound
//! call queue.

pub mod channel;
pub mod config;
pub mod dialer;
pub mod dispatch;
pub mod oncall;
pub mod pbx_client;
pub mod queue;
pub mod register_client;
pub mod routes;
pub mod sms_client;

pub use dialer::Dialer;
