//! Schema version 1 - every collection of the local store.
//!
//! - `transactions`: expenses, incomes and transfers between accounts
//! - `budgets`: spending limits per category and period
//! - `accounts`: places where money is kept (cash, bank, cards, e-money)
//! - `categories`: user-facing expense categories
//! - `account_types`: display configuration for account kinds
//! - `auth`: opaque key/value rows owned by the identity collaborator
//!
//! There are no foreign keys: transactions reference accounts, budgets and
//! categories by id only, and dangling references are tolerated.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Description,
    Amount,
    Kind,
    Subkind,
    Category,
    Date,
    AccountId,
    ToAccountId,
    BudgetId,
    Tags,
    IncludedInBudget,
    StatementDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    Name,
    Amount,
    Category,
    Period,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    Type,
    Balance,
    CreditLimit,
    StatementDay,
    PaymentDay,
    IsActive,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    Icon,
    Color,
    IsDefault,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AccountTypes {
    Table,
    Id,
    Name,
    Type,
    Icon,
    Color,
    IsDefault,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Auth {
    Table,
    Key,
    Payload,
    UpdatedAt,
}

/// Create a non-unique single-column index, skipping it when it already exists.
async fn create_index<T, C>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    col: C,
) -> Result<(), DbErr>
where
    T: Iden + 'static,
    C: Iden + 'static,
{
    manager
        .create_index(
            Index::create()
                .name(name)
                .table(table)
                .col(col)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Description).string().not_null())
                    .col(ColumnDef::new(Transactions::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Subkind).string().not_null())
                    .col(ColumnDef::new(Transactions::Category).string())
                    .col(ColumnDef::new(Transactions::Date).date().not_null())
                    .col(ColumnDef::new(Transactions::AccountId).string().not_null())
                    .col(ColumnDef::new(Transactions::ToAccountId).string())
                    .col(ColumnDef::new(Transactions::BudgetId).string())
                    .col(ColumnDef::new(Transactions::Tags).json().not_null())
                    .col(
                        ColumnDef::new(Transactions::IncludedInBudget)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Transactions::StatementDate).date())
                    .col(ColumnDef::new(Transactions::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Transactions::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx-transactions-date", Transactions::Date),
            ("idx-transactions-category", Transactions::Category),
            ("idx-transactions-kind", Transactions::Kind),
            ("idx-transactions-subkind", Transactions::Subkind),
            ("idx-transactions-account_id", Transactions::AccountId),
            ("idx-transactions-to_account_id", Transactions::ToAccountId),
            ("idx-transactions-budget_id", Transactions::BudgetId),
            ("idx-transactions-created_at", Transactions::CreatedAt),
        ] {
            create_index(manager, name, Transactions::Table, col).await?;
        }

        // ───────────────────────────────────────────────────────────────────
        // 2. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Budgets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Budgets::Name).string().not_null())
                    .col(ColumnDef::new(Budgets::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Budgets::Category).string().not_null())
                    .col(ColumnDef::new(Budgets::Period).string().not_null())
                    .col(ColumnDef::new(Budgets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Budgets::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx-budgets-category", Budgets::Category),
            ("idx-budgets-period", Budgets::Period),
            ("idx-budgets-created_at", Budgets::CreatedAt),
        ] {
            create_index(manager, name, Budgets::Table, col).await?;
        }

        // ───────────────────────────────────────────────────────────────────
        // 3. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::Type).string().not_null())
                    .col(ColumnDef::new(Accounts::Balance).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::CreditLimit).big_integer())
                    .col(ColumnDef::new(Accounts::StatementDay).small_integer())
                    .col(ColumnDef::new(Accounts::PaymentDay).small_integer())
                    .col(
                        ColumnDef::new(Accounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Accounts::Description).string())
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx-accounts-type", Accounts::Type),
            ("idx-accounts-is_active", Accounts::IsActive),
            ("idx-accounts-created_at", Accounts::CreatedAt),
        ] {
            create_index(manager, name, Accounts::Table, col).await?;
        }

        // ───────────────────────────────────────────────────────────────────
        // 4. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Icon).string())
                    .col(ColumnDef::new(Categories::Color).string())
                    .col(
                        ColumnDef::new(Categories::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Categories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Categories::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Categories::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx-categories-name", Categories::Name),
            ("idx-categories-is_active", Categories::IsActive),
            ("idx-categories-created_at", Categories::CreatedAt),
        ] {
            create_index(manager, name, Categories::Table, col).await?;
        }

        // ───────────────────────────────────────────────────────────────────
        // 5. Account types
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AccountTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountTypes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountTypes::Name).string().not_null())
                    .col(ColumnDef::new(AccountTypes::Type).string().not_null())
                    .col(ColumnDef::new(AccountTypes::Icon).string())
                    .col(ColumnDef::new(AccountTypes::Color).string())
                    .col(
                        ColumnDef::new(AccountTypes::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AccountTypes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(AccountTypes::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(AccountTypes::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx-account_types-type", AccountTypes::Type),
            ("idx-account_types-is_active", AccountTypes::IsActive),
            ("idx-account_types-created_at", AccountTypes::CreatedAt),
        ] {
            create_index(manager, name, AccountTypes::Table, col).await?;
        }

        // ───────────────────────────────────────────────────────────────────
        // 6. Auth
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Auth::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Auth::Key).string().not_null().primary_key())
                    .col(ColumnDef::new(Auth::Payload).json().not_null())
                    .col(ColumnDef::new(Auth::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Auth::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountTypes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).if_exists().to_owned())
            .await
    }
}
