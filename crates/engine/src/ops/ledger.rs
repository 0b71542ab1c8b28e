use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DbErr, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, OnConflict},
    prelude::*,
};

use crate::{
    Account, EngineError, OwnedPaper, Paper, ResultEngine, accounts, catalog_entries, ownerships,
};

use super::Engine;

impl Engine {
    /// Account snapshot by Telegram id.
    pub async fn account(&self, telegram_id: i64) -> ResultEngine<Account> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::TelegramId.eq(telegram_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("account {telegram_id}")))?;

        Ok(Account::from(model))
    }

    /// Fetch the account for a Telegram user, creating it with 0 stars on
    /// first contact.
    pub async fn get_or_create_account(&self, telegram_id: i64) -> ResultEngine<Account> {
        self.get_or_create_account_on(&self.database, telegram_id)
            .await
    }

    /// Add stars to an account. `amount` must be positive.
    pub async fn credit(&self, account_id: i64, amount: i64) -> ResultEngine<()> {
        self.credit_on(&self.database, account_id, amount).await
    }

    /// Papers owned by an account, in grant order.
    pub async fn owned_papers(&self, account_id: i64) -> ResultEngine<Vec<OwnedPaper>> {
        self.owned_papers_on(&self.database, account_id).await
    }

    /// Telegram ids of every account, for broadcast notifications.
    pub async fn telegram_ids(&self) -> ResultEngine<Vec<i64>> {
        let ids: Vec<i64> = accounts::Entity::find()
            .select_only()
            .column(accounts::Column::TelegramId)
            .order_by_asc(accounts::Column::Id)
            .into_tuple()
            .all(&self.database)
            .await?;
        Ok(ids)
    }

    /// Insert-or-ignore keyed on the unique `telegram_id` index, then read
    /// back. Two racing first contacts both end up with the same row.
    pub(crate) async fn get_or_create_account_on<C: ConnectionTrait>(
        &self,
        db: &C,
        telegram_id: i64,
    ) -> ResultEngine<Account> {
        let fresh = accounts::ActiveModel {
            id: ActiveValue::NotSet,
            telegram_id: ActiveValue::Set(telegram_id),
            stars: ActiveValue::Set(0),
        };
        let insert = accounts::Entity::insert(fresh).on_conflict(
            OnConflict::column(accounts::Column::TelegramId)
                .do_nothing()
                .to_owned(),
        );
        match insert.exec(db).await {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(err) => return Err(err.into()),
        }

        let model = accounts::Entity::find()
            .filter(accounts::Column::TelegramId.eq(telegram_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("account {telegram_id}")))?;

        Ok(Account::from(model))
    }

    pub(crate) async fn credit_on<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
        amount: i64,
    ) -> ResultEngine<()> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "credit must be positive, got {amount}"
            )));
        }

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Stars,
                Expr::col(accounts::Column::Stars).add(amount),
            )
            .filter(accounts::Column::Id.eq(account_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound(format!("account {account_id}")));
        }
        Ok(())
    }

    /// Conditional debit: succeeds only when the balance covers the amount,
    /// so the balance can never go negative, not even under concurrency.
    pub(crate) async fn debit_on<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
        amount: i64,
    ) -> ResultEngine<()> {
        if amount < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "debit must not be negative, got {amount}"
            )));
        }

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Stars,
                Expr::col(accounts::Column::Stars).sub(amount),
            )
            .filter(accounts::Column::Id.eq(account_id))
            .filter(accounts::Column::Stars.gte(amount))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::InsufficientFunds(format!(
                "account {account_id} cannot cover {amount} stars"
            )));
        }
        Ok(())
    }

    /// Idempotent grant. Returns whether the ownership row was new.
    pub(crate) async fn grant_on<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
        paper_id: i64,
    ) -> ResultEngine<bool> {
        let row = ownerships::ActiveModel {
            account_id: ActiveValue::Set(account_id),
            paper_id: ActiveValue::Set(paper_id),
            granted_at: ActiveValue::Set(Utc::now()),
        };
        let insert = ownerships::Entity::insert(row).on_conflict(
            OnConflict::columns([
                ownerships::Column::AccountId,
                ownerships::Column::PaperId,
            ])
            .do_nothing()
            .to_owned(),
        );
        match insert.exec(db).await {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn owns_on<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
        paper_id: i64,
    ) -> ResultEngine<bool> {
        let found = ownerships::Entity::find_by_id((account_id, paper_id))
            .one(db)
            .await?;
        Ok(found.is_some())
    }

    pub(crate) async fn owned_papers_on<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
    ) -> ResultEngine<Vec<OwnedPaper>> {
        let rows = ownerships::Entity::find()
            .filter(ownerships::Column::AccountId.eq(account_id))
            .order_by_asc(ownerships::Column::GrantedAt)
            .order_by_asc(ownerships::Column::PaperId)
            .find_also_related(catalog_entries::Entity)
            .all(db)
            .await?;

        // Pruned papers leave orphan ownership rows behind; nothing to show
        // for those.
        Ok(rows
            .into_iter()
            .filter_map(|(row, entry)| {
                entry.map(|entry| OwnedPaper {
                    paper: Paper::from(entry),
                    granted_at: row.granted_at,
                })
            })
            .collect())
    }
}
