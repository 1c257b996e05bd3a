//! Pipeline driver: sequences drop, create, load and transform statements
//! against one warehouse connection.
//!
//! Statements run strictly one after the other; the first failure stops the
//! run and is returned unchanged. There is no retry and no rollback beyond
//! what the warehouse does for a single statement.

use crate::config::PipelineConfig;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::ALL_TABLES;
use crate::statements::{LoadStatement, Statement, Transform};
use crate::warehouse::Warehouse;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Full refresh: drop-all, create-all, load-all, transform-all.
    #[default]
    Full,
    /// Drop-all then create-all.
    CreateTables,
    /// Load-all then transform-all into tables that already exist.
    Etl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementOutcome {
    pub description: String,
    pub rows: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub statements: Vec<StatementOutcome>,
    /// Row counts of every table after the run, when the run loaded data.
    pub table_rows: Vec<(&'static str, u64)>,
}

impl RunReport {
    pub fn rows_in(&self, table: &str) -> Option<u64> {
        self.table_rows
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, rows)| *rows)
    }
}

pub struct Pipeline {
    drop_statements: Vec<Statement>,
    create_statements: Vec<Statement>,
    load_statements: Vec<Statement>,
    transform_statements: Vec<Statement>,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            drop_statements: ALL_TABLES
                .iter()
                .map(|table| Statement::DropTable(*table))
                .collect(),
            create_statements: ALL_TABLES
                .iter()
                .map(|table| Statement::CreateTable(*table))
                .collect(),
            load_statements: vec![
                Statement::Load(LoadStatement::events(config)),
                Statement::Load(LoadStatement::songs(config)),
            ],
            transform_statements: Transform::ALL
                .iter()
                .map(|t| Statement::Transform(*t))
                .collect(),
        }
    }

    pub fn drop_statements(&self) -> &[Statement] {
        &self.drop_statements
    }

    pub fn create_statements(&self) -> &[Statement] {
        &self.create_statements
    }

    pub fn load_statements(&self) -> &[Statement] {
        &self.load_statements
    }

    pub fn transform_statements(&self) -> &[Statement] {
        &self.transform_statements
    }

    /// The ordered statements of a stage.
    pub fn plan(&self, stage: Stage) -> Vec<&Statement> {
        let groups = match stage {
            Stage::Full => vec![
                self.drop_statements(),
                self.create_statements(),
                self.load_statements(),
                self.transform_statements(),
            ],
            Stage::CreateTables => vec![self.drop_statements(), self.create_statements()],
            Stage::Etl => vec![self.load_statements(), self.transform_statements()],
        };
        groups.into_iter().flatten().collect()
    }

    /// The plan as a SQL script in `dialect`.
    pub fn render(&self, stage: Stage, dialect: Dialect) -> Result<String> {
        let mut script = String::new();
        for statement in self.plan(stage) {
            script.push_str(&statement.render(dialect)?);
            script.push_str(";\n\n");
        }
        Ok(script)
    }

    pub fn run(&self, warehouse: &mut dyn Warehouse, stage: Stage) -> Result<RunReport> {
        let plan = self.plan(stage);
        let mut report = RunReport::default();
        info!(
            "Running {:?} stage: {} statements on {}",
            stage,
            plan.len(),
            warehouse.dialect()
        );

        for (i, statement) in plan.iter().enumerate() {
            let description = statement.describe();
            info!("[{}/{}] {}", i + 1, plan.len(), description);
            if let Statement::Transform(transform) = statement {
                let sources: Vec<&str> = transform.sources().iter().map(|t| t.name).collect();
                debug!("{} reads {}", transform, sources.join(", "));
            }
            let started = Instant::now();
            let rows = warehouse.execute(statement)?;
            let elapsed = started.elapsed();
            if matches!(statement, Statement::Load(_) | Statement::Transform(_)) {
                info!("{}: {} rows in {:?}", description, rows, elapsed);
            }
            report.statements.push(StatementOutcome {
                description,
                rows,
                elapsed,
            });
        }

        if stage != Stage::CreateTables {
            for table in ALL_TABLES {
                let rows = warehouse.row_count(table)?;
                info!("{}: {} rows", table.name, rows);
                report.table_rows.push((table.name, rows));
            }
        }
        Ok(report)
    }
}
