use crate::dialect::Dialect;
use anyhow::{bail, Result};
use rusqlite::Connection;

#[macro_export]
macro_rules! warehouse_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Allow unused_mut because the variable is only mutated when optional
            // field assignments are passed to the macro (e.g., `non_null = true`)
            #[allow(unused_mut)]
            let mut column = $crate::schema::Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_identity: false,
                is_dist_key: false,
                is_sort_key: false,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    VarChar,
    Integer,
    BigInt,
    SmallInt,
    Float8,
    Timestamp,
}

impl SqlType {
    pub fn render(&self, dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Redshift => match self {
                SqlType::VarChar => "VARCHAR",
                SqlType::Integer => "INT",
                SqlType::BigInt => "BIGINT",
                SqlType::SmallInt => "SMALLINT",
                SqlType::Float8 => "FLOAT8",
                SqlType::Timestamp => "TIMESTAMP",
            },
            // Timestamps are stored as ISO-8601 text so strftime() can read them.
            Dialect::Sqlite => match self {
                SqlType::VarChar | SqlType::Timestamp => "TEXT",
                SqlType::Integer | SqlType::BigInt | SqlType::SmallInt => "INTEGER",
                SqlType::Float8 => "REAL",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    /// Surrogate key assigned by the engine on insert.
    pub is_identity: bool,
    /// Redshift distribution key; ignored by other dialects.
    pub is_dist_key: bool,
    /// Redshift sort key; ignored by other dialects.
    pub is_sort_key: bool,
}

impl Column {
    fn render(&self, dialect: Dialect) -> String {
        if self.is_identity {
            return match dialect {
                Dialect::Redshift => format!("{} BIGINT IDENTITY(0,1) PRIMARY KEY", self.name),
                Dialect::Sqlite => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", self.name),
            };
        }

        let mut sql = format!("{} {}", self.name, self.sql_type.render(dialect));
        if dialect == Dialect::Redshift {
            if self.is_dist_key {
                sql.push_str(" DISTKEY");
            }
            if self.is_sort_key {
                sql.push_str(" SORTKEY");
            }
        }
        if self.non_null {
            sql.push_str(" NOT NULL");
        }
        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn create_sql(&self, dialect: Dialect) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.render(dialect)))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE IF NOT EXISTS {}\n(\n{}\n)", self.name, columns)
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Columns a bulk insert has to supply, i.e. everything but the identity.
    pub fn insertable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_identity)
    }

    /// Checks that an existing SQLite table has the expected shape.
    ///
    /// `CREATE TABLE IF NOT EXISTS` keeps whatever table is already there, so
    /// a leftover table with a different layout is caught here instead of by
    /// the first statement that touches it.
    pub fn validate_sqlite(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns: Vec<(String, String, bool, bool)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i32>(3)? == 1,
                    row.get::<_, i32>(5)? > 0,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;

        if actual_columns.is_empty() {
            bail!("Table {} does not exist", self.name);
        }

        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}. Found column names: {}, expected: {}",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                actual_columns
                    .iter()
                    .map(|c| c.0.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.column_names().join(", ")
            );
        }

        for ((name, sql_type, non_null, is_primary_key), expected) in
            actual_columns.iter().zip(self.columns.iter())
        {
            if !name.eq_ignore_ascii_case(expected.name) {
                bail!(
                    "Table {} Column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    name
                );
            }
            let expected_type = if expected.is_identity {
                "INTEGER"
            } else {
                expected.sql_type.render(Dialect::Sqlite)
            };
            if !sql_type.eq_ignore_ascii_case(expected_type) {
                bail!(
                    "Table {} Column {} type mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected_type,
                    sql_type
                );
            }
            if *non_null != expected.non_null {
                bail!(
                    "Table {} Column {} non-null mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.non_null,
                    non_null
                );
            }
            let expected_pk = expected.is_primary_key || expected.is_identity;
            if *is_primary_key != expected_pk {
                bail!(
                    "Table {} Column {} primary key mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected_pk,
                    is_primary_key
                );
            }
        }
        Ok(())
    }
}
