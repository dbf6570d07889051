//! Infrastructure layer: durable stores, notification port, workflow service.

pub mod notify;
pub mod service;
pub mod store;

pub use notify::{Notice, Notifier, Recipient, TracingNotifier};
pub use service::{AccountOverview, TopupService};
pub use store::{DirectoryStore, LedgerStore, MemoryStore, PgStore, Store, TicketStore};
