use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod catalog {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepartmentList {
        pub departments: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SemesterList {
        pub semesters: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct YearList {
        pub years: Vec<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PaperView {
        pub id: i64,
        pub department: String,
        pub semester: String,
        pub year: String,
        pub name: String,
        /// Opaque delivery handle (a Telegram file id for the bot).
        pub locator: String,
        pub price: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaperList {
        pub papers: Vec<PaperView>,
    }

    /// Query-string selector for catalog listings.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BranchQuery {
        pub department: Option<String>,
        pub semester: Option<String>,
        pub year: Option<String>,
    }

    /// Request body for registering an empty branch.
    ///
    /// `department` alone creates a department, adding `semester` creates a
    /// semester, adding `year` creates a year.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BranchNew {
        pub department: String,
        pub semester: Option<String>,
        pub year: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaperNew {
        pub department: String,
        pub semester: String,
        pub year: String,
        pub name: String,
        pub locator: String,
        /// Stars; the server applies the default price when absent.
        pub price: Option<i64>,
    }

    /// Prefix delete. The most specific segment present decides the scope;
    /// `name` deletes a single paper.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Prune {
        pub department: String,
        pub semester: Option<String>,
        pub year: Option<String>,
        pub name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Pruned {
        pub removed: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PriceUpdate {
        pub price: i64,
    }
}

pub mod wallet {
    use super::*;
    use catalog::PaperView;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct OwnedPaperView {
        pub paper: PaperView,
        pub granted_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileView {
        pub stars: i64,
        pub owned: Vec<OwnedPaperView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopUpNew {
        pub amount: i64,
    }

    /// Everything needed to send a payment-provider invoice.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct InvoiceView {
        pub title: String,
        pub description: String,
        pub payload: String,
        pub amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TelegramIds {
        pub ids: Vec<i64>,
    }
}

pub mod purchase {
    use super::*;
    use catalog::PaperView;
    use wallet::InvoiceView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseNew {
        pub paper_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BulkPurchaseNew {
        pub department: String,
        pub semester: String,
        pub year: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "status", rename_all = "snake_case")]
    pub enum PurchaseResult {
        AlreadyOwned {
            name: String,
            locator: String,
        },
        Purchased {
            name: String,
            locator: String,
            remaining_stars: i64,
        },
        InvoiceRequired {
            invoice: InvoiceView,
        },
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "status", rename_all = "snake_case")]
    pub enum BulkPurchaseResult {
        AlreadyOwnedAll,
        Purchased {
            papers: Vec<PaperView>,
            charged: i64,
            remaining_stars: i64,
        },
        InvoiceRequired {
            invoice: InvoiceView,
        },
    }

    /// A confirmed payment as reported by the provider.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconcileNew {
        pub payload: String,
        pub amount: i64,
        pub charge_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "status", rename_all = "snake_case")]
    pub enum ReconcileResult {
        Credited {
            amount: i64,
            new_balance: i64,
        },
        Granted {
            papers: Vec<PaperView>,
        },
        Replayed,
    }
}
