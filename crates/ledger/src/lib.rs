//! `topup-ledger` — append-only credit ledger domain.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! ledger is the single source of truth for balances: a balance is always the
//! sum over a user's entries, never a stored number of its own.

pub mod entry;

pub use entry::{EntryRef, EntryType, LedgerEntry, NewEntry};
