//! Schema Manager: applies and reverts the offers table migration.
//!
//! The manager checks the live catalog before every DDL statement so that a
//! repeated `apply` reports [`SchemaError::Conflict`] and a `revert` without a
//! table reports [`SchemaError::Missing`]. The Postgres catalog maps the
//! server's own `duplicate_table`/`undefined_table` errors the same way, which
//! covers two migrators racing between the check and the statement.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tracing::{error, info};

use crate::error::SchemaError;
use crate::schema::{drop_table_sql, offers_table, ColumnDef, ColumnType, TableDef};

/// A versioned, reversible schema change.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub table: TableDef,
}

impl Migration {
    pub fn create_offers() -> Self {
        Migration {
            version: 20260129000000,
            description: "Create offers table",
            table: offers_table(),
        }
    }
}

/// Storage-side primitives the Schema Manager needs.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// Live column shape of `table`, or `None` when the table does not exist.
    async fn table_columns(&self, table: &str) -> Result<Option<Vec<ColumnDef>>, SchemaError>;

    async fn create_table(&self, table: &TableDef) -> Result<(), SchemaError>;

    async fn drop_table(&self, table: &str) -> Result<(), SchemaError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: &'static str,
    pub columns: Option<Vec<ColumnDef>>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.columns.is_some()
    }
}

pub struct SchemaManager<C> {
    catalog: C,
    migration: Migration,
}

impl<C: SchemaCatalog> SchemaManager<C> {
    pub fn new(catalog: C) -> Self {
        SchemaManager {
            catalog,
            migration: Migration::create_offers(),
        }
    }

    /// Creates the migration's table. Fails with `Conflict` if it already exists.
    pub async fn apply(&self) -> Result<(), SchemaError> {
        let table = &self.migration.table;
        info!(
            "Applying migration {} ({})",
            self.migration.version, self.migration.description
        );

        if self.catalog.table_columns(&table.name).await?.is_some() {
            return Err(SchemaError::conflict(table.name.as_str()));
        }

        self.catalog.create_table(table).await?;

        info!("Migration {} applied", self.migration.version);
        Ok(())
    }

    /// Drops the migration's table. Fails with `Missing` if it does not exist.
    pub async fn revert(&self) -> Result<(), SchemaError> {
        let table = &self.migration.table;
        info!(
            "Reverting migration {} ({})",
            self.migration.version, self.migration.description
        );

        if self.catalog.table_columns(&table.name).await?.is_none() {
            return Err(SchemaError::missing(table.name.as_str()));
        }

        self.catalog.drop_table(&table.name).await?;

        info!("Migration {} reverted", self.migration.version);
        Ok(())
    }

    pub async fn status(&self) -> Result<MigrationStatus, SchemaError> {
        let columns = self.catalog.table_columns(&self.migration.table.name).await?;

        Ok(MigrationStatus {
            version: self.migration.version,
            description: self.migration.description,
            columns,
        })
    }
}

/// [`SchemaCatalog`] over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgCatalog {
    pool: Pool,
}

impl PgCatalog {
    pub fn new(pool: Pool) -> Self {
        PgCatalog { pool }
    }

    /// Runs one DDL statement inside its own transaction.
    async fn execute_ddl(&self, sql: &str, table: &str) -> Result<(), SchemaError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        tx.batch_execute(sql).await.map_err(|e| {
            error!("DDL on table '{}' failed: {}", table, e);
            map_ddl_error(e, table)
        })?;

        tx.commit().await?;
        Ok(())
    }
}

fn map_ddl_error(err: tokio_postgres::Error, table: &str) -> SchemaError {
    match err.code() {
        Some(&SqlState::DUPLICATE_TABLE) => SchemaError::conflict(table),
        Some(&SqlState::UNDEFINED_TABLE) => SchemaError::missing(table),
        _ => SchemaError::from(err),
    }
}

fn column_type_from_catalog(data_type: &str, max_length: Option<i32>, serial: bool) -> ColumnType {
    match (data_type, max_length) {
        ("integer", _) if serial => ColumnType::Serial,
        ("character varying", Some(len)) if len > 0 => ColumnType::Varchar(len as u32),
        ("text", _) => ColumnType::Text,
        (other, _) => ColumnType::Other(other.to_string()),
    }
}

#[async_trait]
impl SchemaCatalog for PgCatalog {
    async fn table_columns(&self, table: &str) -> Result<Option<Vec<ColumnDef>>, SchemaError> {
        let client = self.pool.get().await?;

        let query = r#"
            SELECT
                c.column_name::text,
                c.data_type::text,
                c.character_maximum_length::int4,
                c.is_nullable = 'YES',
                COALESCE(c.column_default LIKE 'nextval(%', false),
                EXISTS (
                    SELECT 1
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage k
                      ON tc.constraint_name = k.constraint_name
                     AND tc.table_schema = k.table_schema
                    WHERE tc.table_schema = c.table_schema
                      AND tc.table_name = c.table_name
                      AND tc.constraint_type = 'PRIMARY KEY'
                      AND k.column_name = c.column_name
                )
            FROM information_schema.columns c
            WHERE c.table_schema = current_schema()
              AND c.table_name = $1
            ORDER BY c.ordinal_position
        "#;

        let rows = client.query(query, &[&table]).await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let columns = rows
            .iter()
            .map(|row| {
                let data_type: String = row.get(1);
                let max_length: Option<i32> = row.get(2);
                let serial: bool = row.get(4);

                ColumnDef {
                    name: row.get(0),
                    column_type: column_type_from_catalog(&data_type, max_length, serial),
                    nullable: row.get(3),
                    primary_key: row.get(5),
                }
            })
            .collect();

        Ok(Some(columns))
    }

    async fn create_table(&self, table: &TableDef) -> Result<(), SchemaError> {
        self.execute_ddl(&table.create_sql(), &table.name).await
    }

    async fn drop_table(&self, table: &str) -> Result<(), SchemaError> {
        self.execute_ddl(&drop_table_sql(table), table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio_test::{assert_err, assert_ok};

    /// Catalog that keeps table shapes in memory.
    #[derive(Clone, Default)]
    struct MemoryCatalog {
        tables: Arc<Mutex<HashMap<String, Vec<ColumnDef>>>>,
    }

    #[async_trait]
    impl SchemaCatalog for MemoryCatalog {
        async fn table_columns(&self, table: &str) -> Result<Option<Vec<ColumnDef>>, SchemaError> {
            Ok(self.tables.lock().unwrap().get(table).cloned())
        }

        async fn create_table(&self, table: &TableDef) -> Result<(), SchemaError> {
            let mut tables = self.tables.lock().unwrap();
            if tables.contains_key(&table.name) {
                return Err(SchemaError::conflict(table.name.as_str()));
            }
            tables.insert(table.name.clone(), table.columns.clone());
            Ok(())
        }

        async fn drop_table(&self, table: &str) -> Result<(), SchemaError> {
            match self.tables.lock().unwrap().remove(table) {
                Some(_) => Ok(()),
                None => Err(SchemaError::missing(table)),
            }
        }
    }

    /// Catalog whose every call fails, as when the database is down.
    struct BrokenCatalog;

    #[async_trait]
    impl SchemaCatalog for BrokenCatalog {
        async fn table_columns(&self, _table: &str) -> Result<Option<Vec<ColumnDef>>, SchemaError> {
            Err(SchemaError::Storage("connection refused".to_string()))
        }

        async fn create_table(&self, _table: &TableDef) -> Result<(), SchemaError> {
            Err(SchemaError::Storage("connection refused".to_string()))
        }

        async fn drop_table(&self, _table: &str) -> Result<(), SchemaError> {
            Err(SchemaError::Storage("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_apply_creates_offers_table() {
        let catalog = MemoryCatalog::default();
        let manager = SchemaManager::new(catalog.clone());

        assert_ok!(manager.apply().await);

        let columns = catalog.table_columns("offers").await.unwrap();
        assert_eq!(columns, Some(offers_table().columns));
    }

    #[tokio::test]
    async fn test_second_apply_conflicts() {
        let manager = SchemaManager::new(MemoryCatalog::default());

        assert_ok!(manager.apply().await);
        let err = assert_err!(manager.apply().await);
        assert!(matches!(err, SchemaError::Conflict { ref table } if table == "offers"));
    }

    #[tokio::test]
    async fn test_revert_without_apply_is_missing() {
        let manager = SchemaManager::new(MemoryCatalog::default());

        let err = assert_err!(manager.revert().await);
        assert!(matches!(err, SchemaError::Missing { ref table } if table == "offers"));
    }

    #[tokio::test]
    async fn test_revert_twice_is_missing() {
        let manager = SchemaManager::new(MemoryCatalog::default());

        assert_ok!(manager.apply().await);
        assert_ok!(manager.revert().await);
        let err = assert_err!(manager.revert().await);
        assert!(matches!(err, SchemaError::Missing { .. }));
    }

    #[tokio::test]
    async fn test_apply_revert_apply_keeps_shape() {
        let catalog = MemoryCatalog::default();
        let manager = SchemaManager::new(catalog.clone());

        assert_ok!(manager.apply().await);
        let first = manager.status().await.unwrap().columns;

        assert_ok!(manager.revert().await);
        assert!(!manager.status().await.unwrap().is_applied());

        assert_ok!(manager.apply().await);
        let second = manager.status().await.unwrap().columns;

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_status_reports_migration() {
        let manager = SchemaManager::new(MemoryCatalog::default());

        let status = manager.status().await.unwrap();
        assert_eq!(status.version, 20260129000000);
        assert_eq!(status.description, "Create offers table");
        assert!(!status.is_applied());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let manager = SchemaManager::new(BrokenCatalog);

        assert!(matches!(manager.apply().await, Err(SchemaError::Storage(_))));
        assert!(matches!(manager.revert().await, Err(SchemaError::Storage(_))));
    }

    #[test]
    fn test_column_type_from_catalog() {
        assert_eq!(column_type_from_catalog("integer", None, true), ColumnType::Serial);
        assert_eq!(
            column_type_from_catalog("character varying", Some(255), false),
            ColumnType::Varchar(255)
        );
        assert_eq!(column_type_from_catalog("text", None, false), ColumnType::Text);
        assert_eq!(
            column_type_from_catalog("integer", None, false),
            ColumnType::Other("integer".to_string())
        );
    }
}
