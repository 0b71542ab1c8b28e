//! Star accounts, one per Telegram user.

use sea_orm::entity::prelude::*;

/// A wallet of stars.
///
/// Accounts are created lazily the first time a Telegram user touches the
/// shop. The balance is debited only through the conditional update in the
/// ledger ops, so it can never go below zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub telegram_id: i64,
    pub stars: i64,
}

impl From<Model> for Account {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            telegram_id: value.telegram_id,
            stars: value.stars,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub telegram_id: i64,
    pub stars: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ownerships::Entity")]
    Ownerships,
}

impl Related<super::ownerships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ownerships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
