//! The `migrations` ledger table.
//!
//! A name is present in the ledger iff that file's SQL was committed in the
//! same transaction as the ledger row. Rows are only ever inserted.

use sea_orm::sea_query::{ColumnDef, Expr, Order, Query, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DbErr, DeriveIden};

#[derive(DeriveIden)]
pub(crate) enum Migrations {
    Table,
    Id,
    Name,
    ExecutedAt,
}

pub(crate) fn create_ledger_statement() -> TableCreateStatement {
    Table::create()
        .table(Migrations::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Migrations::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(Migrations::Name)
                .string_len(255)
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(Migrations::ExecutedAt)
                .timestamp_with_time_zone()
                .default(Expr::current_timestamp()),
        )
        .to_owned()
}

/// Create the ledger table unless it already exists. Safe to call on every run.
///
/// `name` carries a unique constraint. A ledger created by an older tool
/// without the constraint is left as is.
pub async fn ensure_ledger<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    db.execute(backend.build(&create_ledger_statement())).await?;
    Ok(())
}

/// Every migration name recorded in the ledger, in insertion order.
pub async fn load_applied_names<C>(db: &C) -> Result<Vec<String>, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Query::select()
        .column(Migrations::Name)
        .from(Migrations::Table)
        .order_by(Migrations::Id, Order::Asc)
        .to_owned();

    let backend = db.get_database_backend();
    let rows = db.query_all(backend.build(&stmt)).await?;

    rows.iter()
        .map(|row| row.try_get::<String>("", "name"))
        .collect()
}

/// Insert a ledger row. Callers run this inside the migration's transaction.
pub async fn record_applied<C>(db: &C, name: &str) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Query::insert()
        .into_table(Migrations::Table)
        .columns([Migrations::Name])
        .values_panic([name.into()])
        .to_owned();

    let backend = db.get_database_backend();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sea_orm::DatabaseBackend;

    use super::*;

    #[test]
    fn test_ledger_table_is_named_migrations() {
        let sql = DatabaseBackend::Postgres
            .build(&create_ledger_statement())
            .sql;
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"migrations\""), "{sql}");
        assert!(sql.contains("\"name\""), "{sql}");
        assert!(sql.contains("UNIQUE"), "{sql}");
        assert!(sql.contains("CURRENT_TIMESTAMP"), "{sql}");
    }

    #[test]
    fn test_insert_binds_name_as_parameter() {
        let stmt = Query::insert()
            .into_table(Migrations::Table)
            .columns([Migrations::Name])
            .values_panic(["001_init.sql".into()])
            .to_owned();
        let built = DatabaseBackend::Postgres.build(&stmt);

        assert!(built.sql.contains("$1"), "{}", built.sql);
        assert!(!built.sql.contains("001_init.sql"), "{}", built.sql);
    }
}
