//! Consumed payment charges, keyed by the provider charge id.
//!
//! Reconciliation inserts a row here in the same database transaction as the
//! credit or grant it performs. A charge id that is already present means the
//! payment was applied before and the replay must not touch the ledger again.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "consumed_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub charge_id: String,
    pub payload: String,
    pub amount: i64,
    pub consumed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
