//! Request/response DTOs and JSON mapping helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use topup_auth::ActorContext;
use topup_core::{ChannelId, ExternalId};
use topup_directory::ContactProfile;
use topup_infra::AccountOverview;
use topup_ledger::LedgerEntry;
use topup_tickets::{Decision, Ticket, TicketStatus};

/// The actor block every inbound event carries.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorDto {
    pub external_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Channel the event originated from (consulted by the audit gate).
    pub channel: i64,
}

impl ActorDto {
    pub fn external(&self) -> ExternalId {
        ExternalId::new(self.external_id)
    }

    pub fn profile(&self) -> ContactProfile {
        ContactProfile {
            external_id: self.external(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
        }
    }

    pub fn context(&self) -> ActorContext {
        ActorContext::new(self.external(), ChannelId::new(self.channel))
    }
}

/// Inbound events, validated once at the boundary.
///
/// The workflow behind this type only ever sees well-typed calls; raw
/// transport payloads never reach it. Amounts travel as major-unit decimal
/// strings ("100.00").
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "intent", rename_all = "kebab-case")]
pub enum InboundEvent {
    CreateTicket {
        actor: ActorDto,
        declared_amount: String,
    },
    AttachProof {
        actor: ActorDto,
        proof_ref: String,
    },
    Decide {
        actor: ActorDto,
        ticket_id: i64,
        decision: Decision,
        #[serde(default)]
        audited_amount: Option<String>,
    },
}

impl InboundEvent {
    pub fn actor(&self) -> &ActorDto {
        match self {
            Self::CreateTicket { actor, .. }
            | Self::AttachProof { actor, .. }
            | Self::Decide { actor, .. } => actor,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketDto {
    pub id: i64,
    pub user_id: i64,
    pub declared_amount: String,
    pub proof_ref: Option<String>,
    pub status: TicketStatus,
    pub audited_amount: Option<String>,
    pub audited_by: Option<i64>,
    pub audited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Ticket> for TicketDto {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id.get(),
            user_id: ticket.user_id.get(),
            declared_amount: ticket.declared_amount.to_decimal(),
            proof_ref: ticket.proof_ref.map(|p| p.as_str().to_owned()),
            status: ticket.status,
            audited_amount: ticket.audited_amount.map(|a| a.to_decimal()),
            audited_by: ticket.audited_by.map(|a| a.get()),
            audited_at: ticket.audited_at,
            created_at: ticket.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LedgerEntryDto {
    pub id: i64,
    pub amount: String,
    pub amount_minor: i64,
    pub entry_type: topup_ledger::EntryType,
    pub ref_type: Option<String>,
    pub ref_id: Option<i64>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryDto {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id.get(),
            amount: entry.amount.to_decimal(),
            amount_minor: entry.amount.minor(),
            entry_type: entry.entry_type,
            ref_type: entry.entry_ref.map(|r| r.ref_type().to_owned()),
            ref_id: entry.entry_ref.map(|r| r.ref_id()),
            note: entry.note,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceDto {
    pub external_id: i64,
    pub balance: String,
    pub balance_minor: i64,
}

#[derive(Debug, Serialize)]
pub struct OverviewDto {
    pub external_id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub balance: String,
    pub balance_minor: i64,
    pub recent: Vec<LedgerEntryDto>,
}

impl From<AccountOverview> for OverviewDto {
    fn from(overview: AccountOverview) -> Self {
        Self {
            external_id: overview.user.external_id.get(),
            username: overview.user.username,
            display_name: overview.user.display_name,
            registered_at: overview.user.created_at,
            balance: overview.balance.to_decimal(),
            balance_minor: overview.balance.minor(),
            recent: overview.recent.into_iter().map(Into::into).collect(),
        }
    }
}
