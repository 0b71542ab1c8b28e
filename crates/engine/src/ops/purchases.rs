//! The purchase paths: direct debit when the balance covers the price,
//! otherwise an invoice request for the payment provider.
//!
//! An uncovered balance is never surfaced as an error. The caller gets an
//! [`InvoiceRequest`] instead and the money arrives later through
//! reconciliation.

use std::collections::HashSet;

use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, InvoiceRequest, Paper, PaymentPayload, ResultEngine, ownerships,
    pricing::{bulk_discounted, bulk_total},
};

use super::{Engine, with_tx};

/// Result of a single-paper purchase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// The account already owns the paper; deliver it again, charge nothing.
    AlreadyOwned { name: String, locator: String },
    /// Debit and grant applied atomically.
    Purchased {
        name: String,
        locator: String,
        remaining_stars: i64,
    },
    /// Balance does not cover the price; issue this invoice.
    InvoiceRequired(InvoiceRequest),
}

/// Result of a bulk purchase at a (department, semester, year) tuple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Every paper at the tuple was already owned.
    AlreadyOwnedAll,
    /// The missing papers, what they cost after discount, and what is left.
    Purchased {
        papers: Vec<Paper>,
        charged: i64,
        remaining_stars: i64,
    },
    InvoiceRequired(InvoiceRequest),
}

impl Engine {
    /// Buy one paper for a Telegram user.
    ///
    /// Idempotent: a repeat purchase short-circuits to `AlreadyOwned`. Debit
    /// and grant run in one database transaction; if the grant fails the
    /// debit rolls back with it.
    pub async fn purchase_paper(
        &self,
        telegram_id: i64,
        paper_id: i64,
    ) -> ResultEngine<PurchaseOutcome> {
        with_tx!(self, |db_tx| {
            let paper = self.paper_on(&db_tx, paper_id).await?;
            let account = self.get_or_create_account_on(&db_tx, telegram_id).await?;

            if self.owns_on(&db_tx, account.id, paper.id).await? {
                return Ok(PurchaseOutcome::AlreadyOwned {
                    name: paper.name,
                    locator: paper.locator,
                });
            }

            if account.stars < paper.price {
                return Ok(PurchaseOutcome::InvoiceRequired(single_invoice(&paper)));
            }

            // The conditional debit can still lose against a concurrent
            // purchase; fall back to the invoice path in that case.
            match self.debit_on(&db_tx, account.id, paper.price).await {
                Ok(()) => {}
                Err(EngineError::InsufficientFunds(_)) => {
                    return Ok(PurchaseOutcome::InvoiceRequired(single_invoice(&paper)));
                }
                Err(err) => return Err(err),
            }
            self.grant_on(&db_tx, account.id, paper.id).await?;

            let remaining = self.get_or_create_account_on(&db_tx, telegram_id).await?;
            Ok(PurchaseOutcome::Purchased {
                name: paper.name,
                locator: paper.locator,
                remaining_stars: remaining.stars,
            })
        })
    }

    /// Buy every paper at a tuple the user does not own yet, at the bundle
    /// discount.
    pub async fn purchase_bulk(
        &self,
        telegram_id: i64,
        department: &str,
        semester: &str,
        year: &str,
    ) -> ResultEngine<BulkOutcome> {
        with_tx!(self, |db_tx| {
            let papers = self.papers_on(&db_tx, department, semester, year).await?;
            if papers.is_empty() {
                return Err(EngineError::EmptySet(format!(
                    "{department}/{semester}/{year}"
                )));
            }

            let account = self.get_or_create_account_on(&db_tx, telegram_id).await?;

            let paper_ids: Vec<i64> = papers.iter().map(|p| p.id).collect();
            let owned: HashSet<i64> = ownerships::Entity::find()
                .filter(ownerships::Column::AccountId.eq(account.id))
                .filter(ownerships::Column::PaperId.is_in(paper_ids))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|row| row.paper_id)
                .collect();

            let missing: Vec<Paper> = papers
                .into_iter()
                .filter(|p| !owned.contains(&p.id))
                .collect();
            if missing.is_empty() {
                return Ok(BulkOutcome::AlreadyOwnedAll);
            }

            let charged = bulk_discounted(bulk_total(missing.iter().map(|p| p.price)));

            if account.stars < charged {
                return Ok(BulkOutcome::InvoiceRequired(bulk_invoice(
                    department,
                    semester,
                    year,
                    missing.len(),
                    charged,
                )));
            }

            match self.debit_on(&db_tx, account.id, charged).await {
                Ok(()) => {}
                Err(EngineError::InsufficientFunds(_)) => {
                    return Ok(BulkOutcome::InvoiceRequired(bulk_invoice(
                        department,
                        semester,
                        year,
                        missing.len(),
                        charged,
                    )));
                }
                Err(err) => return Err(err),
            }
            for paper in &missing {
                self.grant_on(&db_tx, account.id, paper.id).await?;
            }

            let remaining = self.get_or_create_account_on(&db_tx, telegram_id).await?;
            Ok(BulkOutcome::Purchased {
                papers: missing,
                charged,
                remaining_stars: remaining.stars,
            })
        })
    }

    /// Issue an invoice request that credits `amount` stars once paid.
    pub async fn top_up(&self, telegram_id: i64, amount: i64) -> ResultEngine<InvoiceRequest> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "top-up must be positive, got {amount}"
            )));
        }

        // Make the account visible before the money arrives.
        self.get_or_create_account(telegram_id).await?;

        Ok(InvoiceRequest {
            title: format!("{amount} stars"),
            description: format!("Add {amount} stars to your balance"),
            payload: PaymentPayload::TopUp { amount }.encode(),
            amount,
        })
    }
}

fn single_invoice(paper: &Paper) -> InvoiceRequest {
    InvoiceRequest {
        title: paper.name.clone(),
        description: format!(
            "{} / {} / {}",
            paper.department, paper.semester, paper.year
        ),
        payload: PaymentPayload::Paper { paper_id: paper.id }.encode(),
        amount: paper.price,
    }
}

fn bulk_invoice(
    department: &str,
    semester: &str,
    year: &str,
    count: usize,
    charged: i64,
) -> InvoiceRequest {
    InvoiceRequest {
        title: format!("All papers {department} {semester} {year}"),
        description: format!("{count} papers, bundle discount applied"),
        payload: PaymentPayload::Bulk {
            department: department.to_string(),
            semester: semester.to_string(),
            year: year.to_string(),
        }
        .encode(),
        amount: charged,
    }
}
