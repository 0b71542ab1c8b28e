//! Core of the paper shop: catalog, star ledger, pricing and payment
//! reconciliation on top of a SQLite database.

pub use accounts::Account;
pub use catalog_entries::{EntryKind, Paper};
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder};
pub use ownerships::OwnedPaper;
pub use payload::{InvoiceRequest, PaymentPayload, STARS_CURRENCY};
pub use pricing::{DEFAULT_PAPER_PRICE, bulk_discounted, bulk_total};

pub use ops::purchases::{BulkOutcome, PurchaseOutcome};
pub use ops::reconcile::ReconcileOutcome;

mod accounts;
mod catalog_entries;
mod consumed_payments;
mod error;
mod ops;
mod ownerships;
mod payload;
mod pricing;

type ResultEngine<T> = Result<T, EngineError>;
