use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use topup_core::{Amount, CoreError, CoreResult, EntryId, ExternalId, TicketId, UserId};

/// Classification of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Topup,
    Adjustment,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topup => "TOPUP",
            Self::Adjustment => "ADJUSTMENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TOPUP" => Some(Self::Topup),
            "ADJUSTMENT" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// Reference from a ledger entry back to the record that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryRef {
    Ticket(TicketId),
}

impl EntryRef {
    pub fn ref_type(&self) -> &'static str {
        match self {
            Self::Ticket(_) => "TICKET",
        }
    }

    pub fn ref_id(&self) -> i64 {
        match self {
            Self::Ticket(id) => id.get(),
        }
    }
}

/// An immutable row of the credit ledger.
///
/// Entries are never updated or deleted. `amount` is signed: positive
/// credits, negative debits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub amount: Amount,
    pub entry_type: EntryType,
    pub entry_ref: Option<EntryRef>,
    pub note: Option<String>,
    pub created_by: ExternalId,
    pub created_at: DateTime<Utc>,
}

/// A validated, not-yet-persisted ledger entry.
///
/// Construction is the only ledger-side validation point: a zero amount is
/// rejected here. Sign conventions and authorization belong to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    user_id: UserId,
    amount: Amount,
    entry_type: EntryType,
    entry_ref: Option<EntryRef>,
    note: Option<String>,
    created_by: ExternalId,
}

impl NewEntry {
    pub fn new(
        user_id: UserId,
        amount: Amount,
        entry_type: EntryType,
        created_by: ExternalId,
    ) -> CoreResult<Self> {
        if amount.is_zero() {
            return Err(CoreError::invalid_amount(
                "ledger entries must move a non-zero amount",
            ));
        }
        Ok(Self {
            user_id,
            amount,
            entry_type,
            entry_ref: None,
            note: None,
            created_by,
        })
    }

    /// Topup credited from an approved ticket.
    pub fn topup_for_ticket(
        user_id: UserId,
        amount: Amount,
        ticket_id: TicketId,
        audited_by: ExternalId,
    ) -> CoreResult<Self> {
        Ok(Self::new(user_id, amount, EntryType::Topup, audited_by)?
            .with_ref(EntryRef::Ticket(ticket_id))
            .with_note(format!("topup ticket #{ticket_id}")))
    }

    pub fn with_ref(mut self, entry_ref: EntryRef) -> Self {
        self.entry_ref = Some(entry_ref);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn entry_ref(&self) -> Option<EntryRef> {
        self.entry_ref
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn created_by(&self) -> ExternalId {
        self.created_by
    }
}
