//! Outbound notification port.
//!
//! The workflow states *what happened*; delivery mechanics (chat API, email,
//! push) live behind [`Notifier`] in the transport layer.

use async_trait::async_trait;

use topup_core::{Amount, ChannelId, ExternalId, TicketId};
use topup_tickets::ProofRef;

/// Where a notice is delivered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Recipient {
    User(ExternalId),
    AdminChannel(ChannelId),
}

/// Workflow outcomes surfaced to humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    TicketCreated {
        ticket_id: TicketId,
        declared_amount: Amount,
    },
    ProofReceived {
        ticket_id: TicketId,
    },
    /// Review card for the admin channel: everything needed to decide.
    ReviewRequested {
        ticket_id: TicketId,
        requester: String,
        declared_amount: Amount,
        proof_ref: ProofRef,
    },
    TicketApproved {
        ticket_id: TicketId,
        credited_amount: Amount,
    },
    TicketRejected {
        ticket_id: TicketId,
    },
}

/// Outbound port for user/admin messaging.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: Recipient, notice: Notice);
}

/// Default notifier: structured log lines only.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, recipient: Recipient, notice: Notice) {
        tracing::info!(?recipient, ?notice, "notice");
    }
}
