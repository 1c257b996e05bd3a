//! SQLite-backed warehouse for local runs and tests.

use super::Warehouse;
use crate::dialect::Dialect;
use crate::error::{EtlError, Result};
use crate::loader;
use crate::schema::Table;
use crate::statements::Statement;
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
pub struct SqliteWarehouse {
    conn: Connection,
}

fn schema_error(table: &Table, message: impl ToString) -> EtlError {
    EtlError::Schema {
        table: table.name,
        message: message.to_string(),
    }
}

impl SqliteWarehouse {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            EtlError::Connection(format!("cannot open SQLite warehouse {:?}: {}", path, e))
        })?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| EtlError::Connection(format!("cannot open in-memory SQLite: {}", e)))?;
        Ok(Self { conn })
    }

    /// Read access for inspecting the warehouse contents.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Warehouse for SqliteWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, statement: &Statement) -> Result<u64> {
        if let Statement::Load(load) = statement {
            return loader::load(&mut self.conn, load);
        }

        let sql = statement.render(Dialect::Sqlite)?;
        debug!("Executing on SQLite:\n{}", sql);
        if let Statement::Transform(transform) = statement {
            let rows = self
                .conn
                .execute(&sql, [])
                .map_err(|e| EtlError::Transform {
                    transform: transform.name().to_string(),
                    message: e.to_string(),
                })?;
            return Ok(rows as u64);
        }

        let table = statement.target();
        self.conn
            .execute(&sql, [])
            .map_err(|e| schema_error(table, e))?;
        if let Statement::CreateTable(_) = statement {
            table
                .validate_sqlite(&self.conn)
                .map_err(|e| schema_error(table, e))?;
        }
        Ok(0)
    }

    fn row_count(&mut self, table: &Table) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |r| {
                r.get(0)
            })
            .map_err(|e| schema_error(table, e))?;
        Ok(count as u64)
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| EtlError::Connection(format!("error closing SQLite warehouse: {}", e)))
    }
}
