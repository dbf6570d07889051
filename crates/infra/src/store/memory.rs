//! In-memory store for tests/dev.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use topup_core::{Amount, CoreError, CoreResult, EntryId, ExternalId, TicketId, UserId};
use topup_directory::{ContactProfile, User};
use topup_ledger::{LedgerEntry, NewEntry};
use topup_tickets::{Decision, NewTicket, ProofRef, Ticket, TicketStatus};

use super::{DirectoryStore, LedgerStore, TicketStore};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    entries: Vec<LedgerEntry>,
    tickets: Vec<Ticket>,
}

impl Tables {
    fn push_entry(&mut self, entry: NewEntry) -> LedgerEntry {
        let row = LedgerEntry {
            id: EntryId::new((self.entries.len() + 1) as i64),
            user_id: entry.user_id(),
            amount: entry.amount(),
            entry_type: entry.entry_type(),
            entry_ref: entry.entry_ref(),
            note: entry.note().map(str::to_owned),
            created_by: entry.created_by(),
            created_at: Utc::now(),
        };
        self.entries.push(row.clone());
        row
    }
}

/// In-memory implementation of the store contracts.
///
/// A single `RwLock` over all tables stands in for the database: the decide
/// transition checks and flips the status under one write lock, which gives
/// the same exactly-once guarantee as the conditional UPDATE. Rows are never
/// removed, so vector positions double as insertion order and `len + 1` is a
/// valid next id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn upsert_contact(&self, profile: ContactProfile) -> CoreResult<User> {
        let mut tables = self.tables.write().unwrap();
        if let Some(user) = tables
            .users
            .iter_mut()
            .find(|u| u.external_id == profile.external_id)
        {
            user.refresh_profile(&profile);
            return Ok(user.clone());
        }

        let user = User {
            id: UserId::new((tables.users.len() + 1) as i64),
            external_id: profile.external_id,
            username: profile.username,
            display_name: profile.display_name,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_external(&self, external_id: ExternalId) -> CoreResult<Option<User>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn get_user(&self, user_id: UserId) -> CoreResult<Option<User>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn append(&self, entry: NewEntry) -> CoreResult<LedgerEntry> {
        let mut tables = self.tables.write().unwrap();
        Ok(tables.push_entry(entry))
    }

    async fn balance(&self, user_id: UserId) -> CoreResult<Amount> {
        let tables = self.tables.read().unwrap();
        let sum = tables
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.amount.minor())
            .sum();
        Ok(Amount::from_minor(sum))
    }

    async fn recent_entries(&self, user_id: UserId, limit: u32) -> CoreResult<Vec<LedgerEntry>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create(&self, ticket: NewTicket) -> CoreResult<Ticket> {
        let mut tables = self.tables.write().unwrap();
        let row = Ticket {
            id: TicketId::new((tables.tickets.len() + 1) as i64),
            user_id: ticket.user_id(),
            declared_amount: ticket.declared_amount(),
            proof_ref: None,
            status: TicketStatus::Pending,
            audited_amount: None,
            audited_by: None,
            audited_at: None,
            created_at: Utc::now(),
        };
        tables.tickets.push(row.clone());
        Ok(row)
    }

    async fn get(&self, ticket_id: TicketId) -> CoreResult<Option<Ticket>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.tickets.iter().find(|t| t.id == ticket_id).cloned())
    }

    async fn attach_proof(&self, user_id: UserId, proof: ProofRef) -> CoreResult<Ticket> {
        let mut tables = self.tables.write().unwrap();
        let ticket = tables
            .tickets
            .iter_mut()
            .filter(|t| t.user_id == user_id && t.is_pending())
            .max_by_key(|t| t.id)
            .ok_or(CoreError::NoActiveTicket)?;
        ticket.proof_ref = Some(proof);
        Ok(ticket.clone())
    }

    async fn approve(
        &self,
        ticket_id: TicketId,
        override_amount: Option<Amount>,
        audited_by: ExternalId,
        audited_at: DateTime<Utc>,
    ) -> CoreResult<(Ticket, LedgerEntry)> {
        let mut tables = self.tables.write().unwrap();
        let index = tables
            .tickets
            .iter()
            .position(|t| t.id == ticket_id)
            .ok_or(CoreError::NotFound)?;

        let decided = tables.tickets[index].clone().decided(
            Decision::Approve,
            override_amount,
            audited_by,
            audited_at,
        )?;
        let amount = decided
            .audited_amount
            .ok_or_else(|| CoreError::storage("approved ticket missing audited amount"))?;
        if !tables.users.iter().any(|u| u.id == decided.user_id) {
            return Err(CoreError::storage(format!(
                "ticket #{ticket_id} references a missing user"
            )));
        }

        let entry = NewEntry::topup_for_ticket(decided.user_id, amount, decided.id, audited_by)?;
        let row = tables.push_entry(entry);
        tables.tickets[index] = decided.clone();
        Ok((decided, row))
    }

    async fn reject(
        &self,
        ticket_id: TicketId,
        audited_by: ExternalId,
        audited_at: DateTime<Utc>,
    ) -> CoreResult<Ticket> {
        let mut tables = self.tables.write().unwrap();
        let index = tables
            .tickets
            .iter()
            .position(|t| t.id == ticket_id)
            .ok_or(CoreError::NotFound)?;

        let decided =
            tables.tickets[index]
                .clone()
                .decided(Decision::Reject, None, audited_by, audited_at)?;
        tables.tickets[index] = decided.clone();
        Ok(decided)
    }
}
