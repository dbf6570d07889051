//! `topup-auth` — the audit gate: who may decide tickets.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod gate;

pub use gate::{ActorContext, AuditConfig, AuditGate, SingleChannelGate};
