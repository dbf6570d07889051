//! Durable store contracts for the directory, ledger, and ticket tables.
//!
//! All mutation of shared state goes through these traits; nothing caches
//! mutable state in process memory across requests. The decide transition is
//! the only operation with cross-request mutual-exclusion requirements, and
//! both implementations realize it as a single atomic compare-and-set.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use topup_core::{Amount, CoreResult, ExternalId, TicketId, UserId};
use topup_directory::{ContactProfile, User};
use topup_ledger::{LedgerEntry, NewEntry};
use topup_tickets::{NewTicket, ProofRef, Ticket};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Account directory persistence.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Insert on first contact, refresh the profile afterwards. Keyed by
    /// `external_id`; the internal id and `created_at` never change.
    async fn upsert_contact(&self, profile: ContactProfile) -> CoreResult<User>;

    async fn find_by_external(&self, external_id: ExternalId) -> CoreResult<Option<User>>;

    async fn get_user(&self, user_id: UserId) -> CoreResult<Option<User>>;
}

/// Append-only credit ledger persistence.
///
/// A balance is always the sum over the user's rows, recomputed per call.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append one immutable row and return it with its assigned id.
    async fn append(&self, entry: NewEntry) -> CoreResult<LedgerEntry>;

    /// Sum of all entry amounts for the user; zero when there are none.
    async fn balance(&self, user_id: UserId) -> CoreResult<Amount>;

    /// Most-recent-first slice of the user's entries.
    async fn recent_entries(&self, user_id: UserId, limit: u32) -> CoreResult<Vec<LedgerEntry>>;
}

/// Topup ticket persistence, including the conditional decide transition.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(&self, ticket: NewTicket) -> CoreResult<Ticket>;

    async fn get(&self, ticket_id: TicketId) -> CoreResult<Option<Ticket>>;

    /// Set the proof handle on the user's active PENDING ticket (the one
    /// with the highest id). Overwrites any previous handle. Fails with
    /// `NoActiveTicket` when the user has no PENDING ticket.
    async fn attach_proof(&self, user_id: UserId, proof: ProofRef) -> CoreResult<Ticket>;

    /// PENDING -> APPROVED as one conditional update, with the TOPUP ledger
    /// entry committed in the same atomic step. When the conditional update
    /// matches zero rows the result is `AlreadyDecided`, or `NotFound` for
    /// an id that never existed.
    async fn approve(
        &self,
        ticket_id: TicketId,
        override_amount: Option<Amount>,
        audited_by: ExternalId,
        audited_at: DateTime<Utc>,
    ) -> CoreResult<(Ticket, LedgerEntry)>;

    /// PENDING -> REJECTED as one conditional update. Never touches the
    /// ledger.
    async fn reject(
        &self,
        ticket_id: TicketId,
        audited_by: ExternalId,
        audited_at: DateTime<Utc>,
    ) -> CoreResult<Ticket>;
}

/// The full durable store behind the workflow.
pub trait Store: DirectoryStore + LedgerStore + TicketStore {}

impl<T: DirectoryStore + LedgerStore + TicketStore> Store for T {}
