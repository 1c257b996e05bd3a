//! Local bulk loader.
//!
//! Executes a [`LoadStatement`] against SQLite, which has no COPY: source
//! files are read from the local filesystem, split into JSON records, mapped
//! onto the staging columns and inserted with bound parameters in a single
//! transaction. A load whose rejected records exceed the statement's
//! tolerance inserts nothing.

pub mod jsonpaths;
pub mod records;

use crate::error::{EtlError, LoadError, Result};
use crate::schema::{Column, Table};
use crate::statements::{JsonFormat, LoadStatement};
use jsonpaths::JsonPath;
use records::{coerce, split_records, Rejection};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// How a record is turned into column values.
enum Mapping {
    Auto,
    Paths(Vec<JsonPath>),
}

/// Turns a local source URI into a path. Only `file://` URIs and bare paths
/// are reachable from here.
fn local_path(uri: &str) -> Result<PathBuf> {
    if let Some(path) = uri.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if let Some((scheme, _)) = uri.split_once("://") {
        return Err(EtlError::Connection(format!(
            "{} is not reachable from a local warehouse (scheme '{}'); stage the files locally",
            uri, scheme
        )));
    }
    Ok(PathBuf::from(uri))
}

fn read_error(table: &'static Table, uri: &str, e: std::io::Error) -> EtlError {
    match e.kind() {
        ErrorKind::PermissionDenied => EtlError::Load(LoadError::AccessDenied {
            table: table.name,
            uri: uri.to_string(),
            reason: e.to_string(),
        }),
        _ => EtlError::Connection(format!("cannot read {}: {}", uri, e)),
    }
}

/// Lists the files behind a source: the file itself, or every `*.json` file
/// below a directory in path order.
fn source_files(table: &'static Table, uri: &str) -> Result<Vec<PathBuf>> {
    let root = local_path(uri)?;
    if !root.exists() {
        return Err(EtlError::Connection(format!("source {} does not exist", uri)));
    }
    if root.is_file() {
        return Ok(vec![root]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            match e.into_io_error() {
                Some(io) => read_error(table, &path.display().to_string(), io),
                None => EtlError::Connection(format!("cannot walk {}", path.display())),
            }
        })?;
        let is_json = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn load_mapping(statement: &LoadStatement) -> Result<Mapping> {
    let uri = match &statement.format {
        JsonFormat::Auto => return Ok(Mapping::Auto),
        JsonFormat::JsonPaths(uri) => uri,
    };
    let path = local_path(uri)?;
    let text = std::fs::read_to_string(&path).map_err(|e| read_error(statement.target, uri, e))?;
    let paths = jsonpaths::parse_document(&text).map_err(|reason| LoadError::FormatSpec {
        uri: uri.clone(),
        reason,
    })?;

    let expected = statement.target.insertable_columns().count();
    if paths.len() != expected {
        return Err(LoadError::FormatSpec {
            uri: uri.clone(),
            reason: format!(
                "{} paths for {} columns of {}",
                paths.len(),
                expected,
                statement.target.name
            ),
        }
        .into());
    }
    Ok(Mapping::Paths(paths))
}

fn build_row(
    record: &Value,
    columns: &[&Column],
    mapping: &Mapping,
    statement: &LoadStatement,
) -> std::result::Result<Vec<SqlValue>, String> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let field = match mapping {
                // Exact, case-sensitive key match; anything else stays NULL.
                Mapping::Auto => record.get(column.name),
                Mapping::Paths(paths) => paths[i].evaluate(record),
            };
            coerce(field, column, statement.time_format)
        })
        .collect()
}

fn insert_sql(table: &Table, columns: &[&Column]) -> String {
    let names = columns.iter().map(|c| c.name).collect::<Vec<_>>().join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name, names, placeholders
    )
}

/// Runs `statement` on `conn` and returns the number of rows inserted.
pub fn load(conn: &mut Connection, statement: &LoadStatement) -> Result<u64> {
    let table = statement.target;
    let sql_error = |e: rusqlite::Error| {
        EtlError::Load(LoadError::Sql {
            table: table.name,
            message: e.to_string(),
        })
    };

    let files = source_files(table, &statement.source_uri)?;
    let mapping = load_mapping(statement)?;
    debug!(
        "Loading {} from {} file(s); storage credential and region are not used locally",
        table.name,
        files.len()
    );

    let columns: Vec<&Column> = table.insertable_columns().collect();
    let tx = conn.transaction().map_err(sql_error)?;
    let mut inserted = 0u64;
    let mut rejected: Vec<(PathBuf, Rejection)> = Vec::new();
    {
        let mut insert = tx.prepare(&insert_sql(table, &columns)).map_err(sql_error)?;
        for file in &files {
            let text = match std::fs::read(file) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        rejected.push((
                            file.clone(),
                            Rejection {
                                line: 1,
                                reason: format!("not UTF-8: {}", e),
                            },
                        ));
                        continue;
                    }
                },
                Err(e) => return Err(read_error(table, &file.display().to_string(), e)),
            };

            let (records, rejections) = split_records(&text);
            rejected.extend(rejections.into_iter().map(|r| (file.clone(), r)));
            for record in records {
                match build_row(&record.value, &columns, &mapping, statement) {
                    Ok(row) => {
                        insert
                            .execute(params_from_iter(row.iter()))
                            .map_err(sql_error)?;
                        inserted += 1;
                    }
                    Err(reason) => rejected.push((
                        file.clone(),
                        Rejection {
                            line: record.line,
                            reason,
                        },
                    )),
                }
            }
        }
    }

    for (file, rejection) in &rejected {
        warn!(
            "Rejected record for {} at {}:{}: {}",
            table.name,
            file.display(),
            rejection.line,
            rejection.reason
        );
    }

    if rejected.len() > statement.max_errors as usize {
        let (file, first) = &rejected[0];
        // Dropping the transaction rolls back every insert of this load.
        return Err(LoadError::Rejected {
            table: table.name,
            rejected: rejected.len(),
            max_errors: statement.max_errors,
            first: format!("{}:{}: {}", file.display(), first.line, first.reason),
        }
        .into());
    }

    tx.commit().map_err(sql_error)?;
    info!(
        "Loaded {} rows into {} from {} file(s), {} rejected",
        inserted,
        table.name,
        files.len(),
        rejected.len()
    );
    Ok(inserted)
}
