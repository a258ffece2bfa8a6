//! Table definitions for the persisted offer schema and their DDL rendering.

use std::fmt;

/// Name of the table holding offers.
pub const OFFERS_TABLE: &str = "offers";

/// Column types used by the offer schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing 4-byte integer (`SERIAL`).
    Serial,
    Varchar(u32),
    Text,
    /// A type found in a live database that this crate never creates.
    Other(String),
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Serial => write!(f, "SERIAL"),
            ColumnType::Varchar(len) => write!(f, "VARCHAR({})", len),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Other(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDef {
            name: name.into(),
            column_type,
            nullable: false,
            primary_key: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.column_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if self.nullable {
            sql.push_str(" DEFAULT NULL");
        } else {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        TableDef {
            name: name.into(),
            columns,
        }
    }

    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDef::to_sql).collect();
        format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.name,
            columns.join(",\n    ")
        )
    }
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE {}", table)
}

/// `offers(id SERIAL PRIMARY KEY, title VARCHAR(255) NOT NULL, description TEXT NULL)`
pub fn offers_table() -> TableDef {
    TableDef::new(
        OFFERS_TABLE,
        vec![
            ColumnDef::new("id", ColumnType::Serial).primary_key(),
            ColumnDef::new("title", ColumnType::Varchar(255)),
            ColumnDef::new("description", ColumnType::Text).nullable(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offers_create_sql() {
        let expected = "CREATE TABLE offers (\n    id SERIAL PRIMARY KEY,\n    title VARCHAR(255) NOT NULL,\n    description TEXT DEFAULT NULL\n)";
        assert_eq!(offers_table().create_sql(), expected);
    }

    #[test]
    fn test_offers_drop_sql() {
        assert_eq!(drop_table_sql(OFFERS_TABLE), "DROP TABLE offers");
    }

    #[test]
    fn test_offers_columns() {
        let table = offers_table();
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "description"]);

        assert!(table.columns[0].primary_key);
        assert!(!table.columns[1].nullable);
        assert!(table.columns[2].nullable);
    }
}
