//! `topup-tickets` — topup ticket workflow domain.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! state machine here is the sole gatekeeper for when a topup may credit the
//! ledger.

pub mod ticket;

pub use ticket::{Decision, NewTicket, ProofRef, Ticket, TicketStatus};
