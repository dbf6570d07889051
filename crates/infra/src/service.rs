//! Topup workflow orchestration.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use topup_auth::{ActorContext, AuditGate};
use topup_core::{Amount, ChannelId, CoreError, CoreResult, ExternalId, TicketId};
use topup_directory::{ContactProfile, User};
use topup_ledger::LedgerEntry;
use topup_tickets::{Decision, NewTicket, ProofRef, Ticket};

use crate::notify::{Notice, Notifier, Recipient};
use crate::store::Store;

/// Entries shown in an account overview.
const OVERVIEW_ENTRIES: u32 = 5;

/// The ticket workflow plus its collaborators.
///
/// Every method is one short-lived unit of work. The service holds no
/// mutable state of its own, so a single instance is shared across
/// concurrent requests.
pub struct TopupService {
    store: Arc<dyn Store>,
    gate: Arc<dyn AuditGate>,
    notifier: Arc<dyn Notifier>,
    admin_channel: ChannelId,
}

impl TopupService {
    pub fn new(
        store: Arc<dyn Store>,
        gate: Arc<dyn AuditGate>,
        notifier: Arc<dyn Notifier>,
        admin_channel: ChannelId,
    ) -> Self {
        Self {
            store,
            gate,
            notifier,
            admin_channel,
        }
    }

    /// Upsert the contact profile for an inbound actor.
    pub async fn register_contact(&self, profile: ContactProfile) -> CoreResult<User> {
        self.store.upsert_contact(profile.normalized()).await
    }

    /// Open a new PENDING ticket for the declared amount. Prior PENDING
    /// tickets for the same user are left as they are.
    #[instrument(skip(self), fields(external_id = %external_id))]
    pub async fn create_ticket(
        &self,
        external_id: ExternalId,
        declared_amount: Amount,
    ) -> CoreResult<Ticket> {
        let user = self.require_user(external_id).await?;
        let ticket = self
            .store
            .create(NewTicket::new(user.id, declared_amount)?)
            .await?;

        info!(ticket_id = %ticket.id, user_id = %user.id, "ticket created");
        self.notifier
            .notify(
                Recipient::User(external_id),
                Notice::TicketCreated {
                    ticket_id: ticket.id,
                    declared_amount,
                },
            )
            .await;
        Ok(ticket)
    }

    /// Attach proof to the user's active PENDING ticket and hand the ticket
    /// to the admin channel for review.
    #[instrument(skip(self, proof), fields(external_id = %external_id))]
    pub async fn attach_proof(
        &self,
        external_id: ExternalId,
        proof: ProofRef,
    ) -> CoreResult<Ticket> {
        let user = self.require_user(external_id).await?;
        let ticket = self.store.attach_proof(user.id, proof.clone()).await?;

        self.notifier
            .notify(
                Recipient::AdminChannel(self.admin_channel),
                Notice::ReviewRequested {
                    ticket_id: ticket.id,
                    requester: user.handle(),
                    declared_amount: ticket.declared_amount,
                    proof_ref: proof,
                },
            )
            .await;
        self.notifier
            .notify(
                Recipient::User(external_id),
                Notice::ProofReceived {
                    ticket_id: ticket.id,
                },
            )
            .await;
        Ok(ticket)
    }

    /// Decide a pending ticket.
    ///
    /// The gate is consulted before anything else; a deny leaves the ticket
    /// and the ledger untouched. Approval credits the ledger in the same
    /// atomic step as the status flip; rejection never touches it.
    #[instrument(skip(self, ctx), fields(ticket_id = %ticket_id, actor = %ctx.actor))]
    pub async fn decide(
        &self,
        ticket_id: TicketId,
        decision: Decision,
        override_amount: Option<Amount>,
        ctx: &ActorContext,
    ) -> CoreResult<Ticket> {
        if !self.gate.authorize(ctx) {
            warn!(channel = %ctx.channel, "decision denied");
            return Err(CoreError::Unauthorized);
        }
        if let Some(amount) = override_amount {
            if !amount.is_positive() {
                return Err(CoreError::invalid_amount("audited amount must be positive"));
            }
        }

        let now = Utc::now();
        match decision {
            Decision::Approve => {
                let (ticket, entry) = self
                    .store
                    .approve(ticket_id, override_amount, ctx.actor, now)
                    .await?;
                info!(entry_id = %entry.id, amount = entry.amount.minor(), "ticket approved");

                let user = self
                    .store
                    .get_user(ticket.user_id)
                    .await?
                    .ok_or_else(|| {
                        CoreError::storage(format!(
                            "approved ticket #{ticket_id} references a missing user"
                        ))
                    })?;
                let notice = Notice::TicketApproved {
                    ticket_id,
                    credited_amount: entry.amount,
                };
                self.notifier
                    .notify(Recipient::User(user.external_id), notice.clone())
                    .await;
                self.notifier
                    .notify(Recipient::AdminChannel(self.admin_channel), notice)
                    .await;
                Ok(ticket)
            }
            Decision::Reject => {
                let ticket = self.store.reject(ticket_id, ctx.actor, now).await?;
                info!("ticket rejected");
                self.notifier
                    .notify(
                        Recipient::AdminChannel(self.admin_channel),
                        Notice::TicketRejected { ticket_id },
                    )
                    .await;
                Ok(ticket)
            }
        }
    }

    /// Current balance, derived from the ledger.
    pub async fn balance(&self, external_id: ExternalId) -> CoreResult<Amount> {
        let user = self.require_user(external_id).await?;
        self.store.balance(user.id).await
    }

    /// Profile + balance + the most recent ledger movements.
    pub async fn account_overview(&self, external_id: ExternalId) -> CoreResult<AccountOverview> {
        let user = self.require_user(external_id).await?;
        let balance = self.store.balance(user.id).await?;
        let recent = self.store.recent_entries(user.id, OVERVIEW_ENTRIES).await?;
        Ok(AccountOverview {
            user,
            balance,
            recent,
        })
    }

    pub async fn recent_entries(
        &self,
        external_id: ExternalId,
        limit: u32,
    ) -> CoreResult<Vec<LedgerEntry>> {
        let user = self.require_user(external_id).await?;
        self.store.recent_entries(user.id, limit).await
    }

    pub async fn ticket(&self, ticket_id: TicketId) -> CoreResult<Ticket> {
        self.store.get(ticket_id).await?.ok_or(CoreError::NotFound)
    }

    async fn require_user(&self, external_id: ExternalId) -> CoreResult<User> {
        self.store
            .find_by_external(external_id)
            .await?
            .ok_or(CoreError::NotFound)
    }
}

/// Report combining who the user is, what they hold, and what moved last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountOverview {
    pub user: User,
    pub balance: Amount,
    pub recent: Vec<LedgerEntry>,
}
