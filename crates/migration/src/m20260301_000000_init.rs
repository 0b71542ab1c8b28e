//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for the paper shop:
//!
//! - `api_users`: Basic-auth credentials for HTTP API clients
//! - `catalog_entries`: papers plus placeholder rows for empty branches
//! - `accounts`: star balances, one per Telegram user
//! - `ownerships`: which account owns which paper
//! - `consumed_payments`: replay guard for payment reconciliation

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ApiUsers {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum CatalogEntries {
    Table,
    Id,
    Kind,
    Department,
    Semester,
    Year,
    Name,
    Locator,
    Price,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    TelegramId,
    Stars,
}

#[derive(Iden)]
enum Ownerships {
    Table,
    AccountId,
    PaperId,
    GrantedAt,
}

#[derive(Iden)]
enum ConsumedPayments {
    Table,
    ChargeId,
    Payload,
    Amount,
    ConsumedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiUsers::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApiUsers::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CatalogEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CatalogEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CatalogEntries::Kind).string().not_null())
                    .col(
                        ColumnDef::new(CatalogEntries::Department)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CatalogEntries::Semester).string().not_null())
                    .col(ColumnDef::new(CatalogEntries::Year).string().not_null())
                    .col(ColumnDef::new(CatalogEntries::Name).string().not_null())
                    .col(ColumnDef::new(CatalogEntries::Locator).string().not_null())
                    .col(
                        ColumnDef::new(CatalogEntries::Price)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-catalog_entries-identity-unique")
                    .table(CatalogEntries::Table)
                    .col(CatalogEntries::Department)
                    .col(CatalogEntries::Semester)
                    .col(CatalogEntries::Year)
                    .col(CatalogEntries::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-catalog_entries-branch")
                    .table(CatalogEntries::Table)
                    .col(CatalogEntries::Department)
                    .col(CatalogEntries::Semester)
                    .col(CatalogEntries::Year)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::TelegramId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Stars)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-telegram_id-unique")
                    .table(Accounts::Table)
                    .col(Accounts::TelegramId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // No foreign key to catalog_entries: pruning a branch keeps the
        // ownership rows, buyers do not lose what they paid for.
        manager
            .create_table(
                Table::create()
                    .table(Ownerships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ownerships::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Ownerships::PaperId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Ownerships::GrantedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(Ownerships::AccountId)
                            .col(Ownerships::PaperId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ownerships-account_id")
                            .from(Ownerships::Table, Ownerships::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ownerships-paper_id")
                    .table(Ownerships::Table)
                    .col(Ownerships::PaperId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConsumedPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConsumedPayments::ChargeId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConsumedPayments::Payload)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumedPayments::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumedPayments::ConsumedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(ConsumedPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ownerships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CatalogEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiUsers::Table).to_owned())
            .await?;
        Ok(())
    }
}
