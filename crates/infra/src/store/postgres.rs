//! Postgres-backed store implementation.
//!
//! ## Error Mapping
//!
//! | SQLx error | Mapped to | Scenario |
//! |------------|-----------|----------|
//! | Database (foreign key violation, `23503`) | `Storage` | ledger insert for a vanished user (consistency fault, surfaced loudly) |
//! | Database (check violation, `23514`) | `Storage` | a status value outside the CHECK constraint |
//! | PoolClosed / network / other | `Storage` | transient failures, safe to retry at the transport layer |
//!
//! The decide transition is a single conditional
//! `UPDATE ... WHERE status = 'PENDING'`; the affected-row count separates
//! success from `AlreadyDecided`. Approval's ledger insert shares the
//! transaction, so a failure at any point rolls back to "nothing happened".

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use tracing::instrument;

use topup_core::{Amount, CoreError, CoreResult, EntryId, ExternalId, TicketId, UserId};
use topup_directory::{ContactProfile, User};
use topup_ledger::{EntryRef, EntryType, LedgerEntry, NewEntry};
use topup_tickets::{NewTicket, ProofRef, Ticket, TicketStatus};

use super::{DirectoryStore, LedgerStore, TicketStore};

const TICKET_COLUMNS: &str = "id, user_id, declared_amount, proof_ref, status, \
     audited_amount, audited_by, audited_at, created_at";

const ENTRY_COLUMNS: &str =
    "id, user_id, amount, entry_type, ref_type, ref_id, note, created_by, created_at";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id           BIGSERIAL PRIMARY KEY,
        external_id  BIGINT NOT NULL UNIQUE,
        username     TEXT,
        display_name TEXT,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS credit_ledger (
        id         BIGSERIAL PRIMARY KEY,
        user_id    BIGINT NOT NULL REFERENCES users (id),
        amount     BIGINT NOT NULL,
        entry_type TEXT NOT NULL,
        ref_type   TEXT,
        ref_id     BIGINT,
        note       TEXT,
        created_by BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS topup_tickets (
        id              BIGSERIAL PRIMARY KEY,
        user_id         BIGINT NOT NULL REFERENCES users (id),
        declared_amount BIGINT NOT NULL,
        proof_ref       TEXT,
        status          TEXT NOT NULL DEFAULT 'PENDING'
                        CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED')),
        audited_amount  BIGINT,
        audited_by      BIGINT,
        audited_at      TIMESTAMPTZ,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_credit_ledger_user ON credit_ledger (user_id, id DESC)",
    r#"
    CREATE INDEX IF NOT EXISTS idx_topup_tickets_active
        ON topup_tickets (user_id, id DESC)
        WHERE status = 'PENDING'
    "#,
];

/// Postgres-backed durable store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool (Arc + Send + Sync). Every mutation is
/// either a single statement or an explicit transaction.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create tables and indexes if they do not exist yet. Idempotent.
    pub async fn ensure_schema(&self) -> CoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(storage_error)?;
        }
        Ok(())
    }

    /// Zero rows from a conditional update: the ticket is either gone or
    /// already decided.
    async fn decided_or_missing(&self, ticket_id: TicketId) -> CoreError {
        match sqlx::query("SELECT 1 FROM topup_tickets WHERE id = $1")
            .bind(ticket_id.get())
            .fetch_optional(&*self.pool)
            .await
        {
            Ok(Some(_)) => CoreError::AlreadyDecided,
            Ok(None) => CoreError::NotFound,
            Err(err) => storage_error(err),
        }
    }
}

fn storage_error(err: sqlx::Error) -> CoreError {
    CoreError::storage(err.to_string())
}

fn user_from_row(row: &PgRow) -> CoreResult<User> {
    Ok(User {
        id: UserId::new(row.try_get("id").map_err(storage_error)?),
        external_id: ExternalId::new(row.try_get("external_id").map_err(storage_error)?),
        username: row.try_get("username").map_err(storage_error)?,
        display_name: row.try_get("display_name").map_err(storage_error)?,
        created_at: row.try_get("created_at").map_err(storage_error)?,
    })
}

fn entry_from_row(row: &PgRow) -> CoreResult<LedgerEntry> {
    let entry_type: String = row.try_get("entry_type").map_err(storage_error)?;
    let entry_type = EntryType::parse(&entry_type)
        .ok_or_else(|| CoreError::storage(format!("unknown entry type '{entry_type}'")))?;

    let ref_type: Option<String> = row.try_get("ref_type").map_err(storage_error)?;
    let ref_id: Option<i64> = row.try_get("ref_id").map_err(storage_error)?;
    let entry_ref = match (ref_type.as_deref(), ref_id) {
        (None, _) => None,
        (Some("TICKET"), Some(id)) => Some(EntryRef::Ticket(TicketId::new(id))),
        (Some(other), _) => {
            return Err(CoreError::storage(format!(
                "inconsistent ledger reference {other:?}/{ref_id:?}"
            )));
        }
    };

    Ok(LedgerEntry {
        id: EntryId::new(row.try_get("id").map_err(storage_error)?),
        user_id: UserId::new(row.try_get("user_id").map_err(storage_error)?),
        amount: Amount::from_minor(row.try_get("amount").map_err(storage_error)?),
        entry_type,
        entry_ref,
        note: row.try_get("note").map_err(storage_error)?,
        created_by: ExternalId::new(row.try_get("created_by").map_err(storage_error)?),
        created_at: row.try_get("created_at").map_err(storage_error)?,
    })
}

fn ticket_from_row(row: &PgRow) -> CoreResult<Ticket> {
    let status: String = row.try_get("status").map_err(storage_error)?;
    let status = TicketStatus::parse(&status)
        .ok_or_else(|| CoreError::storage(format!("unknown ticket status '{status}'")))?;

    let proof_ref: Option<String> = row.try_get("proof_ref").map_err(storage_error)?;
    let audited_amount: Option<i64> = row.try_get("audited_amount").map_err(storage_error)?;
    let audited_by: Option<i64> = row.try_get("audited_by").map_err(storage_error)?;

    Ok(Ticket {
        id: TicketId::new(row.try_get("id").map_err(storage_error)?),
        user_id: UserId::new(row.try_get("user_id").map_err(storage_error)?),
        declared_amount: Amount::from_minor(
            row.try_get("declared_amount").map_err(storage_error)?,
        ),
        proof_ref: proof_ref.map(ProofRef::new),
        status,
        audited_amount: audited_amount.map(Amount::from_minor),
        audited_by: audited_by.map(ExternalId::new),
        audited_at: row.try_get("audited_at").map_err(storage_error)?,
        created_at: row.try_get("created_at").map_err(storage_error)?,
    })
}

/// Insert one ledger row on the given executor (pool or open transaction).
async fn insert_entry<'e, E>(executor: E, entry: &NewEntry) -> CoreResult<LedgerEntry>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(&format!(
        "INSERT INTO credit_ledger \
             (user_id, amount, entry_type, ref_type, ref_id, note, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(entry.user_id().get())
    .bind(entry.amount().minor())
    .bind(entry.entry_type().as_str())
    .bind(entry.entry_ref().map(|r| r.ref_type()))
    .bind(entry.entry_ref().map(|r| r.ref_id()))
    .bind(entry.note())
    .bind(entry.created_by().get())
    .fetch_one(executor)
    .await
    .map_err(storage_error)?;

    entry_from_row(&row)
}

#[async_trait]
impl DirectoryStore for PgStore {
    #[instrument(skip(self, profile), fields(external_id = %profile.external_id))]
    async fn upsert_contact(&self, profile: ContactProfile) -> CoreResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (external_id, username, display_name) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (external_id) DO UPDATE \
                 SET username = EXCLUDED.username, \
                     display_name = EXCLUDED.display_name \
             RETURNING id, external_id, username, display_name, created_at",
        )
        .bind(profile.external_id.get())
        .bind(&profile.username)
        .bind(&profile.display_name)
        .fetch_one(&*self.pool)
        .await
        .map_err(storage_error)?;

        user_from_row(&row)
    }

    async fn find_by_external(&self, external_id: ExternalId) -> CoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, external_id, username, display_name, created_at \
             FROM users WHERE external_id = $1",
        )
        .bind(external_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user(&self, user_id: UserId) -> CoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, external_id, username, display_name, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id()))]
    async fn append(&self, entry: NewEntry) -> CoreResult<LedgerEntry> {
        insert_entry(&*self.pool, &entry).await
    }

    async fn balance(&self, user_id: UserId) -> CoreResult<Amount> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT AS balance \
             FROM credit_ledger WHERE user_id = $1",
        )
        .bind(user_id.get())
        .fetch_one(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(Amount::from_minor(
            row.try_get("balance").map_err(storage_error)?,
        ))
    }

    async fn recent_entries(&self, user_id: UserId, limit: u32) -> CoreResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM credit_ledger \
             WHERE user_id = $1 ORDER BY id DESC LIMIT $2"
        ))
        .bind(user_id.get())
        .bind(i64::from(limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(entry_from_row).collect()
    }
}

#[async_trait]
impl TicketStore for PgStore {
    #[instrument(skip(self, ticket), fields(user_id = %ticket.user_id()))]
    async fn create(&self, ticket: NewTicket) -> CoreResult<Ticket> {
        let row = sqlx::query(&format!(
            "INSERT INTO topup_tickets (user_id, declared_amount) \
             VALUES ($1, $2) RETURNING {TICKET_COLUMNS}"
        ))
        .bind(ticket.user_id().get())
        .bind(ticket.declared_amount().minor())
        .fetch_one(&*self.pool)
        .await
        .map_err(storage_error)?;

        ticket_from_row(&row)
    }

    async fn get(&self, ticket_id: TicketId) -> CoreResult<Option<Ticket>> {
        let row = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM topup_tickets WHERE id = $1"
        ))
        .bind(ticket_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn attach_proof(&self, user_id: UserId, proof: ProofRef) -> CoreResult<Ticket> {
        let row = sqlx::query(&format!(
            "UPDATE topup_tickets SET proof_ref = $2 \
             WHERE id = ( \
                 SELECT id FROM topup_tickets \
                 WHERE user_id = $1 AND status = 'PENDING' \
                 ORDER BY id DESC LIMIT 1 \
             ) \
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(user_id.get())
        .bind(proof.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_error)?;

        match row {
            Some(row) => ticket_from_row(&row),
            None => Err(CoreError::NoActiveTicket),
        }
    }

    #[instrument(skip(self), fields(ticket_id = %ticket_id))]
    async fn approve(
        &self,
        ticket_id: TicketId,
        override_amount: Option<Amount>,
        audited_by: ExternalId,
        audited_at: DateTime<Utc>,
    ) -> CoreResult<(Ticket, LedgerEntry)> {
        if let Some(amount) = override_amount {
            if !amount.is_positive() {
                return Err(CoreError::invalid_amount("audited amount must be positive"));
            }
        }

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let row = sqlx::query(&format!(
            "UPDATE topup_tickets \
             SET status = 'APPROVED', \
                 audited_amount = COALESCE($2, declared_amount), \
                 audited_by = $3, \
                 audited_at = $4 \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(ticket_id.get())
        .bind(override_amount.map(|a| a.minor()))
        .bind(audited_by.get())
        .bind(audited_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?;

        let Some(row) = row else {
            drop(tx);
            return Err(self.decided_or_missing(ticket_id).await);
        };

        let ticket = ticket_from_row(&row)?;
        let amount = ticket
            .audited_amount
            .ok_or_else(|| CoreError::storage("approved ticket missing audited amount"))?;
        let entry = NewEntry::topup_for_ticket(ticket.user_id, amount, ticket.id, audited_by)?;
        let entry = insert_entry(&mut *tx, &entry).await?;

        tx.commit().await.map_err(storage_error)?;
        Ok((ticket, entry))
    }

    #[instrument(skip(self), fields(ticket_id = %ticket_id))]
    async fn reject(
        &self,
        ticket_id: TicketId,
        audited_by: ExternalId,
        audited_at: DateTime<Utc>,
    ) -> CoreResult<Ticket> {
        let row = sqlx::query(&format!(
            "UPDATE topup_tickets \
             SET status = 'REJECTED', audited_by = $2, audited_at = $3 \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(ticket_id.get())
        .bind(audited_by.get())
        .bind(audited_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_error)?;

        match row {
            Some(row) => ticket_from_row(&row),
            None => Err(self.decided_or_missing(ticket_id).await),
        }
    }
}
