//! Statements a pipeline hands to a warehouse, in dialect-neutral form.

mod load;
mod transform;

pub use load::{JsonFormat, LoadStatement, TimeFormat};
pub use transform::Transform;

use crate::config::ConfigError;
use crate::dialect::Dialect;
use crate::error::{EtlError, Result};
use crate::schema::Table;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    DropTable(&'static Table),
    CreateTable(&'static Table),
    Load(LoadStatement),
    Transform(Transform),
}

impl Statement {
    pub fn render(&self, dialect: Dialect) -> Result<String> {
        match self {
            Statement::DropTable(table) => Ok(table.drop_sql()),
            Statement::CreateTable(table) => Ok(table.create_sql(dialect)),
            Statement::Load(load) => load.render(dialect).map_err(|e| {
                EtlError::Configuration(ConfigError::Malformed {
                    key: format!("{} load", load.target.name),
                    reason: e.to_string(),
                })
            }),
            Statement::Transform(transform) => Ok(transform.sql(dialect)),
        }
    }

    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            Statement::DropTable(table) => format!("drop {}", table.name),
            Statement::CreateTable(table) => format!("create {}", table.name),
            Statement::Load(load) => format!("load {}", load.target.name),
            Statement::Transform(transform) => {
                format!("{} -> {}", transform.name(), transform.target().name)
            }
        }
    }

    /// The table the statement writes to.
    pub fn target(&self) -> &'static Table {
        match self {
            Statement::DropTable(table) | Statement::CreateTable(table) => table,
            Statement::Load(load) => load.target,
            Statement::Transform(transform) => transform.target(),
        }
    }
}
