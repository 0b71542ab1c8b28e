//! Ownership rows: which account owns which paper.
//!
//! The composite primary key makes grants exactly-once at the schema level;
//! a second grant of the same pair is a no-op, never a duplicate row.

use sea_orm::entity::prelude::*;

use crate::Paper;

/// A paper together with when it was granted to the account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedPaper {
    pub paper: Paper,
    pub granted_at: DateTimeUtc,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ownerships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub paper_id: i64,
    pub granted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::catalog_entries::Entity",
        from = "Column::PaperId",
        to = "super::catalog_entries::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    CatalogEntries,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::catalog_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CatalogEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
