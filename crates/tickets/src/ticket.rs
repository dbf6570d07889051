use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use topup_core::{Amount, CoreError, CoreResult, ExternalId, TicketId, UserId};

/// Lifecycle of a topup ticket.
///
/// `Pending` is the only state that may transition; `Approved` and
/// `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Pending,
    Approved,
    Rejected,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// An auditor's verdict on a pending ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// Opaque handle to uploaded payment evidence.
///
/// Resolving the handle to actual bytes is the proof store's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofRef(String);

impl ProofRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProofRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user's request to add credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    pub declared_amount: Amount,
    pub proof_ref: Option<ProofRef>,
    pub status: TicketStatus,
    pub audited_amount: Option<Amount>,
    pub audited_by: Option<ExternalId>,
    pub audited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_pending(&self) -> bool {
        self.status == TicketStatus::Pending
    }

    /// The amount an approval credits: the auditor's override if given,
    /// otherwise the declared amount.
    pub fn resolve_audited_amount(&self, override_amount: Option<Amount>) -> Amount {
        override_amount.unwrap_or(self.declared_amount)
    }

    /// Attach (or replace) the payment proof handle.
    pub fn with_proof(mut self, proof: ProofRef) -> Self {
        self.proof_ref = Some(proof);
        self
    }

    /// Apply an auditor decision.
    ///
    /// Returns `AlreadyDecided` when the ticket is no longer `Pending`.
    /// Approval records the audited amount; rejection records none. The
    /// ledger side effect of an approval is the store's job, in the same
    /// atomic step as this transition.
    pub fn decided(
        mut self,
        decision: Decision,
        override_amount: Option<Amount>,
        audited_by: ExternalId,
        audited_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if self.status.is_terminal() {
            return Err(CoreError::AlreadyDecided);
        }

        match decision {
            Decision::Approve => {
                let amount = self.resolve_audited_amount(override_amount);
                if !amount.is_positive() {
                    return Err(CoreError::invalid_amount(
                        "audited amount must be positive",
                    ));
                }
                self.status = TicketStatus::Approved;
                self.audited_amount = Some(amount);
            }
            Decision::Reject => {
                self.status = TicketStatus::Rejected;
            }
        }

        self.audited_by = Some(audited_by);
        self.audited_at = Some(audited_at);
        Ok(self)
    }
}

/// A validated, not-yet-persisted ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewTicket {
    user_id: UserId,
    declared_amount: Amount,
}

impl NewTicket {
    /// Declared amounts must be strictly positive.
    pub fn new(user_id: UserId, declared_amount: Amount) -> CoreResult<Self> {
        if !declared_amount.is_positive() {
            return Err(CoreError::invalid_amount(
                "declared amount must be positive",
            ));
        }
        Ok(Self {
            user_id,
            declared_amount,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn declared_amount(&self) -> Amount {
        self.declared_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_ticket() -> Ticket {
        Ticket {
            id: TicketId::new(1),
            user_id: UserId::new(7),
            declared_amount: Amount::from_minor(10_000),
            proof_ref: None,
            status: TicketStatus::Pending,
            audited_amount: None,
            audited_by: None,
            audited_at: None,
            created_at: Utc::now(),
        }
    }

    fn auditor() -> ExternalId {
        ExternalId::new(555)
    }

    #[test]
    fn approval_defaults_to_declared_amount() {
        let ticket = pending_ticket()
            .decided(Decision::Approve, None, auditor(), Utc::now())
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::Approved);
        assert_eq!(ticket.audited_amount, Some(Amount::from_minor(10_000)));
        assert_eq!(ticket.audited_by, Some(auditor()));
        assert!(ticket.audited_at.is_some());
    }

    #[test]
    fn approval_records_the_override() {
        let ticket = pending_ticket()
            .decided(
                Decision::Approve,
                Some(Amount::from_minor(8_000)),
                auditor(),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(ticket.audited_amount, Some(Amount::from_minor(8_000)));
        assert_eq!(ticket.declared_amount, Amount::from_minor(10_000));
    }

    #[test]
    fn rejection_records_no_amount() {
        let ticket = pending_ticket()
            .decided(Decision::Reject, None, auditor(), Utc::now())
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::Rejected);
        assert_eq!(ticket.audited_amount, None);
        assert_eq!(ticket.audited_by, Some(auditor()));
    }

    #[test]
    fn terminal_tickets_are_immune() {
        let approved = pending_ticket()
            .decided(Decision::Approve, None, auditor(), Utc::now())
            .unwrap();
        let rejected = pending_ticket()
            .decided(Decision::Reject, None, auditor(), Utc::now())
            .unwrap();

        for terminal in [approved, rejected] {
            for decision in [Decision::Approve, Decision::Reject] {
                let err = terminal
                    .clone()
                    .decided(decision, None, auditor(), Utc::now())
                    .unwrap_err();
                assert_eq!(err, CoreError::AlreadyDecided);
            }
        }
    }

    #[test]
    fn non_positive_override_is_rejected() {
        for minor in [0, -100] {
            let err = pending_ticket()
                .decided(
                    Decision::Approve,
                    Some(Amount::from_minor(minor)),
                    auditor(),
                    Utc::now(),
                )
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidAmount(_)));
        }
    }

    #[test]
    fn new_ticket_requires_positive_declared_amount() {
        assert!(NewTicket::new(UserId::new(1), Amount::from_minor(1)).is_ok());
        for minor in [0, -1] {
            let err = NewTicket::new(UserId::new(1), Amount::from_minor(minor)).unwrap_err();
            assert!(matches!(err, CoreError::InvalidAmount(_)));
        }
    }

    #[test]
    fn reattaching_proof_overwrites() {
        let ticket = pending_ticket()
            .with_proof(ProofRef::new("file-1"))
            .with_proof(ProofRef::new("file-2"));
        assert_eq!(ticket.proof_ref, Some(ProofRef::new("file-2")));
    }

    #[test]
    fn status_strings_match_the_check_constraint() {
        for status in [
            TicketStatus::Pending,
            TicketStatus::Approved,
            TicketStatus::Rejected,
        ] {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("CANCELLED"), None);
    }
}
