//! `topup-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod amount;
pub mod error;
pub mod id;

pub use amount::Amount;
pub use error::{CoreError, CoreResult};
pub use id::{ChannelId, EntryId, ExternalId, TicketId, UserId};
