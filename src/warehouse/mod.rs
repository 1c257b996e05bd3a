//! Warehouse connections statements are executed against.

mod redshift;
mod sqlite;

pub use redshift::RedshiftWarehouse;
pub use sqlite::SqliteWarehouse;

use crate::config::WarehouseSettings;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::Table;
use crate::statements::Statement;
use tracing::info;

/// One blocking connection to a warehouse.
///
/// Not safe to share between concurrent pipeline runs: statements drop and
/// recreate tables without any locking.
pub trait Warehouse {
    fn dialect(&self) -> Dialect;

    /// Executes one statement and returns the number of rows it affected.
    fn execute(&mut self, statement: &Statement) -> Result<u64>;

    fn row_count(&mut self, table: &Table) -> Result<u64>;

    fn close(self: Box<Self>) -> Result<()>;
}

/// Opens a connection to the configured warehouse.
pub fn connect(settings: &WarehouseSettings) -> Result<Box<dyn Warehouse>> {
    match settings {
        WarehouseSettings::Redshift(redshift) => {
            info!(
                "Connecting to Redshift at {}:{}/{}",
                redshift.host, redshift.port, redshift.dbname
            );
            Ok(Box::new(RedshiftWarehouse::connect(redshift)?))
        }
        WarehouseSettings::Sqlite { path } => {
            info!("Opening SQLite warehouse at {:?}", path);
            Ok(Box::new(SqliteWarehouse::open(path)?))
        }
    }
}
