//! Applying confirmed payments to the ledger.
//!
//! The provider echoes back the invoice payload, the paid amount and a charge
//! id. Routing is decided by the payload alone; the charge id keys the replay
//! guard. Everything a reconciliation does, including the replay marker,
//! happens in one database transaction.

use chrono::Utc;
use sea_orm::{ActiveValue, DbErr, TransactionTrait, prelude::*, sea_query::OnConflict};

use crate::{
    EngineError, Paper, PaymentPayload, ResultEngine, consumed_payments,
};

use super::{Engine, with_tx};

/// What a confirmed payment did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A top-up: stars credited, new balance reported.
    Credited { amount: i64, new_balance: i64 },
    /// A paper or bundle payment: the papers granted by this confirmation.
    /// Empty when everything was already owned.
    Granted { papers: Vec<Paper> },
    /// The charge id was seen before; nothing changed.
    Replayed,
}

impl Engine {
    /// Apply a confirmed payment.
    ///
    /// A malformed payload fails before any ledger state is touched. A
    /// replayed `charge_id` is a no-op. A `single_paper` payload whose paper
    /// was pruned in the meantime fails with `NotFound` and consumes
    /// nothing, so the confirmation can be retried.
    pub async fn reconcile(
        &self,
        telegram_id: i64,
        raw_payload: &str,
        amount: i64,
        charge_id: &str,
    ) -> ResultEngine<ReconcileOutcome> {
        let payload = PaymentPayload::decode(raw_payload)?;

        with_tx!(self, |db_tx| {
            let marker = consumed_payments::ActiveModel {
                charge_id: ActiveValue::Set(charge_id.to_string()),
                payload: ActiveValue::Set(raw_payload.to_string()),
                amount: ActiveValue::Set(amount),
                consumed_at: ActiveValue::Set(Utc::now()),
            };
            let insert = consumed_payments::Entity::insert(marker).on_conflict(
                OnConflict::column(consumed_payments::Column::ChargeId)
                    .do_nothing()
                    .to_owned(),
            );
            match insert.exec(&db_tx).await {
                Ok(_) => {}
                Err(DbErr::RecordNotInserted) => return Ok(ReconcileOutcome::Replayed),
                Err(err) => return Err(err.into()),
            }

            let account = self.get_or_create_account_on(&db_tx, telegram_id).await?;

            match payload {
                PaymentPayload::TopUp { .. } => {
                    // Credit what the provider confirmed, which is what was
                    // actually paid, not what the invoice asked for.
                    self.credit_on(&db_tx, account.id, amount).await?;
                    let refreshed = self.get_or_create_account_on(&db_tx, telegram_id).await?;
                    Ok(ReconcileOutcome::Credited {
                        amount,
                        new_balance: refreshed.stars,
                    })
                }
                PaymentPayload::Paper { paper_id } => {
                    let paper = self.paper_on(&db_tx, paper_id).await?;
                    let granted = self.grant_on(&db_tx, account.id, paper.id).await?;
                    let papers = if granted { vec![paper] } else { Vec::new() };
                    Ok(ReconcileOutcome::Granted { papers })
                }
                PaymentPayload::Bulk {
                    department,
                    semester,
                    year,
                } => {
                    let papers = self
                        .papers_on(&db_tx, &department, &semester, &year)
                        .await?;
                    if papers.is_empty() {
                        return Err(EngineError::EmptySet(format!(
                            "{department}/{semester}/{year}"
                        )));
                    }

                    let mut granted = Vec::new();
                    for paper in papers {
                        if self.grant_on(&db_tx, account.id, paper.id).await? {
                            granted.push(paper);
                        }
                    }
                    Ok(ReconcileOutcome::Granted { papers: granted })
                }
            }
        })
    }
}
