//! Splitting source files into JSON records and coercing field values into
//! column values.

use crate::schema::{Column, SqlType};
use crate::statements::TimeFormat;
use chrono::{DateTime, NaiveDateTime};
use rusqlite::types::Value as SqlValue;
use serde_json::{Deserializer, Value};

/// Storage format of timestamp columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based line the record starts on.
    pub line: usize,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub line: usize,
    pub reason: String,
}

/// Line numbers for increasing byte offsets, counting each newline once.
struct LineCursor {
    offset: usize,
    line: usize,
}

impl LineCursor {
    fn new() -> Self {
        Self { offset: 0, line: 1 }
    }

    /// 1-based line of `offset`, which must not precede the previous call's.
    fn advance(&mut self, text: &str, offset: usize) -> usize {
        self.line += text[self.offset..offset].matches('\n').count();
        self.offset = offset;
        self.line
    }
}

/// Byte offset where the `line`-th (1-based) line of `text` starts, or the end
/// of `text` when it has fewer lines.
fn line_start(text: &str, line: usize) -> usize {
    if line <= 1 {
        return 0;
    }
    text.match_indices('\n')
        .nth(line - 2)
        .map(|(i, _)| i + 1)
        .unwrap_or(text.len())
}

/// Splits `text` into JSON objects, newline-delimited or concatenated.
///
/// A record that fails to parse is rejected and reading resumes on the line
/// after the parse error, so one broken line does not hide the rest of the
/// file. Well-formed values that are not objects are rejected too.
pub fn split_records(text: &str) -> (Vec<Record>, Vec<Rejection>) {
    let mut records = Vec::new();
    let mut rejections = Vec::new();
    let mut offset = 0;
    let mut cursor = LineCursor::new();

    while offset < text.len() {
        let rest = &text[offset..];
        let start = offset + (rest.len() - rest.trim_start().len());
        if start >= text.len() {
            break;
        }
        let line = cursor.advance(text, start);

        let mut stream = Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            None => break,
            Some(Ok(value)) => {
                offset = start + stream.byte_offset();
                if value.is_object() {
                    records.push(Record { line, value });
                } else {
                    rejections.push(Rejection {
                        line,
                        reason: "record is not a JSON object".to_string(),
                    });
                }
            }
            Some(Err(e)) => {
                rejections.push(Rejection {
                    line,
                    reason: format!("malformed JSON: {}", e),
                });
                let resume = start + line_start(&text[start..], e.line().max(1) + 1);
                offset = resume.max(start + 1).min(text.len());
                // Keep on a char boundary when the error sat inside a multi-byte char.
                while !text.is_char_boundary(offset) {
                    offset += 1;
                }
            }
        }
    }

    (records, rejections)
}

fn integer_from_f64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn integer_from_str(s: &str) -> Option<i64> {
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integer_from_f64))
}

fn check_range(column: &Column, n: i64) -> Result<SqlValue, String> {
    let (min, max) = match column.sql_type {
        SqlType::SmallInt => (i16::MIN as i64, i16::MAX as i64),
        SqlType::Integer => (i32::MIN as i64, i32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    };
    if n < min || n > max {
        return Err(format!("{}: {} is out of range", column.name, n));
    }
    Ok(SqlValue::Integer(n))
}

fn format_millis(column: &Column, millis: i64) -> Result<SqlValue, String> {
    DateTime::from_timestamp_millis(millis)
        .map(|ts| SqlValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()))
        .ok_or_else(|| format!("{}: {} ms is not a valid timestamp", column.name, millis))
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.fZ"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Converts one JSON field into the value stored in `column`.
///
/// Absent fields and JSON nulls become NULL. Empty strings become NULL in
/// numeric and timestamp columns.
pub fn coerce(
    value: Option<&Value>,
    column: &Column,
    time_format: Option<TimeFormat>,
) -> Result<SqlValue, String> {
    let value = match value {
        None | Some(Value::Null) => return Ok(SqlValue::Null),
        Some(v) => v,
    };
    let mismatch = || {
        format!(
            "{}: cannot store {} in a {:?} column",
            column.name, value, column.sql_type
        )
    };

    match column.sql_type {
        SqlType::VarChar => Ok(SqlValue::Text(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })),
        SqlType::Integer | SqlType::BigInt | SqlType::SmallInt => match value {
            Value::Number(n) => {
                let int = n
                    .as_i64()
                    .or_else(|| n.as_f64().and_then(integer_from_f64))
                    .ok_or_else(mismatch)?;
                check_range(column, int)
            }
            Value::String(s) if s.trim().is_empty() => Ok(SqlValue::Null),
            Value::String(s) => check_range(column, integer_from_str(s.trim()).ok_or_else(mismatch)?),
            _ => Err(mismatch()),
        },
        SqlType::Float8 => match value {
            Value::Number(n) => n.as_f64().map(SqlValue::Real).ok_or_else(mismatch),
            Value::String(s) if s.trim().is_empty() => Ok(SqlValue::Null),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::Real)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        SqlType::Timestamp => match (value, time_format) {
            (Value::String(s), _) if s.trim().is_empty() => Ok(SqlValue::Null),
            (Value::Number(n), Some(TimeFormat::EpochMillis)) => {
                let millis = n
                    .as_i64()
                    .or_else(|| n.as_f64().and_then(integer_from_f64))
                    .ok_or_else(mismatch)?;
                format_millis(column, millis)
            }
            (Value::String(s), Some(TimeFormat::EpochMillis)) => {
                format_millis(column, integer_from_str(s.trim()).ok_or_else(mismatch)?)
            }
            (Value::String(s), None) => parse_timestamp(s.trim())
                .map(|ts| SqlValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()))
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse_column;
    use serde_json::json;

    const USER_ID: Column = warehouse_column!("userId", SqlType::Integer);
    const ITEM: Column = warehouse_column!("item", SqlType::SmallInt);
    const LENGTH: Column = warehouse_column!("length", SqlType::Float8);
    const NAME: Column = warehouse_column!("name", SqlType::VarChar);
    const TS: Column = warehouse_column!("ts", SqlType::Timestamp);

    #[test]
    fn test_split_newline_delimited_and_concatenated() {
        let text = "{\"a\": 1}\n{\"a\": 2}{\"a\": 3}\n\n  {\n  \"a\": 4\n}\n";
        let (records, rejections) = split_records(text);
        assert!(rejections.is_empty());
        let lines: Vec<_> = records.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 2, 2, 4]);
        assert_eq!(records[3].value, json!({"a": 4}));
    }

    #[test]
    fn test_split_resumes_after_malformed_line() {
        let text = "{\"a\": 1}\n{\"a\": oops}\n{\"a\": 3}\n";
        let (records, rejections) = split_records(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value, json!({"a": 3}));
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].line, 2);
        assert!(rejections[0].reason.starts_with("malformed JSON"));
    }

    #[test]
    fn test_split_rejects_truncated_tail_and_non_objects() {
        let text = "[1, 2]\n{\"a\": 1}\n{\"a\": ";
        let (records, rejections) = split_records(text);
        assert_eq!(records.len(), 1);
        assert_eq!(rejections.len(), 2);
        assert_eq!(rejections[0].reason, "record is not a JSON object");
        assert_eq!(rejections[1].line, 3);
    }

    #[test]
    fn test_split_large_file_in_linear_time() {
        let record = json!({
            "artist": "Coldplay",
            "song": "Fix You",
            "userAgent": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4) AppleWebKit/537.36",
            "ts": 1541106106796i64,
        })
        .to_string();
        let lines = 40_000;
        let mut text = String::with_capacity(lines * (record.len() + 1));
        for i in 1..=lines {
            if i == lines - 1 {
                text.push_str("{\"artist\": oops}");
            } else {
                text.push_str(&record);
            }
            text.push('\n');
        }

        let started = std::time::Instant::now();
        let (records, rejections) = split_records(&text);
        let elapsed = started.elapsed();

        assert_eq!(records.len(), lines - 1);
        assert_eq!(records.last().unwrap().line, lines);
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].line, lines - 1);
        assert!(
            elapsed < std::time::Duration::from_secs(5),
            "splitting {} lines took {:?}",
            lines,
            elapsed
        );
    }

    #[test]
    fn test_split_empty_input() {
        let (records, rejections) = split_records("  \n\n");
        assert!(records.is_empty());
        assert!(rejections.is_empty());
    }

    #[test]
    fn test_coerce_integers() {
        assert_eq!(coerce(Some(&json!(7)), &USER_ID, None), Ok(SqlValue::Integer(7)));
        assert_eq!(coerce(Some(&json!("39")), &USER_ID, None), Ok(SqlValue::Integer(39)));
        assert_eq!(coerce(Some(&json!(12.0)), &USER_ID, None), Ok(SqlValue::Integer(12)));
        assert_eq!(coerce(Some(&json!("")), &USER_ID, None), Ok(SqlValue::Null));
        assert_eq!(coerce(None, &USER_ID, None), Ok(SqlValue::Null));
        assert!(coerce(Some(&json!(1.5)), &USER_ID, None).is_err());
        assert!(coerce(Some(&json!("abc")), &USER_ID, None).is_err());
        assert!(coerce(Some(&json!(true)), &USER_ID, None).is_err());
        assert!(coerce(Some(&json!(40000)), &ITEM, None).is_err());
        assert!(coerce(Some(&json!(3_000_000_000i64)), &USER_ID, None).is_err());
    }

    #[test]
    fn test_coerce_floats_and_text() {
        assert_eq!(coerce(Some(&json!(294.5)), &LENGTH, None), Ok(SqlValue::Real(294.5)));
        assert_eq!(coerce(Some(&json!("1.25")), &LENGTH, None), Ok(SqlValue::Real(1.25)));
        assert_eq!(
            coerce(Some(&json!(35.14968)), &NAME, None),
            Ok(SqlValue::Text("35.14968".to_string()))
        );
        assert_eq!(
            coerce(Some(&json!({"k": 1})), &NAME, None),
            Ok(SqlValue::Text("{\"k\":1}".to_string()))
        );
        assert_eq!(
            coerce(Some(&json!("Fix You")), &NAME, None),
            Ok(SqlValue::Text("Fix You".to_string()))
        );
    }

    #[test]
    fn test_coerce_epoch_millis() {
        let expected = Ok(SqlValue::Text("2018-11-01 21:01:46.796".to_string()));
        assert_eq!(
            coerce(Some(&json!(1541106106796i64)), &TS, Some(TimeFormat::EpochMillis)),
            expected
        );
        assert_eq!(
            coerce(Some(&json!("1541106106796")), &TS, Some(TimeFormat::EpochMillis)),
            expected
        );
        assert!(coerce(Some(&json!("yesterday")), &TS, Some(TimeFormat::EpochMillis)).is_err());
    }

    #[test]
    fn test_coerce_timestamp_text() {
        assert_eq!(
            coerce(Some(&json!("2018-11-01T21:01:46")), &TS, None),
            Ok(SqlValue::Text("2018-11-01 21:01:46.000".to_string()))
        );
        assert!(coerce(Some(&json!(1541106106796i64)), &TS, None).is_err());
    }
}
