//! Redshift warehouse over the Postgres wire protocol.

use super::Warehouse;
use crate::config::RedshiftSettings;
use crate::dialect::Dialect;
use crate::error::{EtlError, LoadError, Result};
use crate::schema::Table;
use crate::statements::Statement;
use postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::debug;

pub struct RedshiftWarehouse {
    client: Client,
}

impl RedshiftWarehouse {
    pub fn connect(settings: &RedshiftSettings) -> Result<Self> {
        // TODO: offer TLS once clusters with require_ssl have to be supported.
        let client = postgres::Config::new()
            .host(&settings.host)
            .port(settings.port)
            .dbname(&settings.dbname)
            .user(&settings.user)
            .password(&settings.password)
            .connect(NoTls)
            .map_err(|e| {
                EtlError::Connection(format!(
                    "cannot connect to {}:{}/{}: {}",
                    settings.host, settings.port, settings.dbname, e
                ))
            })?;
        Ok(Self { client })
    }

    /// Runs `sql` through the simple query protocol, which Redshift accepts
    /// for COPY and DDL alike, and sums the affected-row counts.
    fn simple_execute(&mut self, sql: &str) -> std::result::Result<u64, postgres::Error> {
        let messages = self.client.simple_query(sql)?;
        Ok(messages
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::CommandComplete(rows) => Some(*rows),
                _ => None,
            })
            .sum())
    }
}

fn classify(statement: &Statement, e: postgres::Error) -> EtlError {
    if e.is_closed() {
        return EtlError::Connection(format!("connection to Redshift lost: {}", e));
    }
    let message = match e.as_db_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    };
    match statement {
        Statement::DropTable(table) | Statement::CreateTable(table) => EtlError::Schema {
            table: table.name,
            message,
        },
        Statement::Load(load) => EtlError::Load(LoadError::Sql {
            table: load.target.name,
            message: format!("{} (see stl_load_errors for rejected records)", message),
        }),
        Statement::Transform(transform) => EtlError::Transform {
            transform: transform.name().to_string(),
            message,
        },
    }
}

impl Warehouse for RedshiftWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }

    fn execute(&mut self, statement: &Statement) -> Result<u64> {
        let sql = statement.render(Dialect::Redshift)?;
        debug!("Executing on Redshift: {}", statement.describe());
        self.simple_execute(&sql)
            .map_err(|e| classify(statement, e))
    }

    fn row_count(&mut self, table: &Table) -> Result<u64> {
        let messages = self
            .client
            .simple_query(&format!("SELECT COUNT(*) FROM {}", table.name))
            .map_err(|e| EtlError::Schema {
                table: table.name,
                message: e.to_string(),
            })?;
        messages
            .iter()
            .find_map(|message| match message {
                SimpleQueryMessage::Row(row) => row.get(0).and_then(|v| v.parse::<u64>().ok()),
                _ => None,
            })
            .ok_or_else(|| EtlError::Schema {
                table: table.name,
                message: "COUNT(*) returned no row".to_string(),
            })
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.client
            .close()
            .map_err(|e| EtlError::Connection(format!("error closing Redshift connection: {}", e)))
    }
}
