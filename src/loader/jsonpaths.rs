//! JSONPaths documents mapping JSON fields onto table columns.
//!
//! A document looks like `{"jsonpaths": ["$['artist']", "$.auth", "$.tags[0]"]}`
//! and lists one path per target column, in column order. Only plain member
//! and array-index steps are supported; there are no wildcards or filters.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

#[derive(Deserialize)]
struct JsonPathsDocument {
    jsonpaths: Vec<String>,
}

/// Parses a whole JSONPaths document.
pub fn parse_document(text: &str) -> Result<Vec<JsonPath>, String> {
    let document: JsonPathsDocument =
        serde_json::from_str(text).map_err(|e| format!("not a JSONPaths document: {}", e))?;
    document
        .jsonpaths
        .iter()
        .enumerate()
        .map(|(i, expr)| JsonPath::parse(expr).map_err(|e| format!("path #{}: {}", i + 1, e)))
        .collect()
}

impl JsonPath {
    pub fn parse(expr: &str) -> Result<Self, String> {
        let chars: Vec<char> = expr.trim().chars().collect();
        if chars.first() != Some(&'$') {
            return Err(format!("'{}' must start with '$'", expr));
        }

        let mut segments = Vec::new();
        let mut pos = 1;
        while pos < chars.len() {
            match chars[pos] {
                '.' => {
                    let start = pos + 1;
                    let mut end = start;
                    while end < chars.len() && chars[end] != '.' && chars[end] != '[' {
                        end += 1;
                    }
                    if end == start {
                        return Err(format!("'{}': empty member name at {}", expr, pos));
                    }
                    let name: String = chars[start..end].iter().collect();
                    if name == "*" {
                        return Err(format!("'{}': wildcards are not supported", expr));
                    }
                    segments.push(PathSegment::Key(name));
                    pos = end;
                }
                '[' => {
                    let (segment, next) = parse_bracket(&chars, pos + 1)
                        .map_err(|e| format!("'{}': {}", expr, e))?;
                    segments.push(segment);
                    pos = next;
                }
                other => {
                    return Err(format!("'{}': unexpected '{}' at {}", expr, other, pos));
                }
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Follows the path into `value`. A missing member or index yields `None`.
    pub fn evaluate<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match segment {
                PathSegment::Key(key) => current.as_object()?.get(key),
                PathSegment::Index(index) => current.as_array()?.get(*index),
            })
    }
}

/// Parses the inside of a `[...]` step starting right after the `[`.
/// Returns the segment and the position after the closing `]`.
fn parse_bracket(chars: &[char], start: usize) -> Result<(PathSegment, usize), String> {
    match chars.get(start) {
        Some(&quote) if quote == '\'' || quote == '"' => {
            let mut name = String::new();
            let mut pos = start + 1;
            loop {
                match chars.get(pos) {
                    None => return Err("unterminated quoted member".to_string()),
                    Some('\\') => {
                        let escaped = chars
                            .get(pos + 1)
                            .ok_or_else(|| "dangling escape".to_string())?;
                        name.push(*escaped);
                        pos += 2;
                    }
                    Some(&c) if c == quote => {
                        pos += 1;
                        break;
                    }
                    Some(&c) => {
                        name.push(c);
                        pos += 1;
                    }
                }
            }
            if chars.get(pos) != Some(&']') {
                return Err(format!("expected ']' at {}", pos));
            }
            Ok((PathSegment::Key(name), pos + 1))
        }
        Some(c) if c.is_ascii_digit() => {
            let mut pos = start;
            while chars.get(pos).is_some_and(|c| c.is_ascii_digit()) {
                pos += 1;
            }
            let digits: String = chars[start..pos].iter().collect();
            let index = digits
                .parse::<usize>()
                .map_err(|e| format!("bad index '{}': {}", digits, e))?;
            if chars.get(pos) != Some(&']') {
                return Err(format!("expected ']' at {}", pos));
            }
            Ok((PathSegment::Index(index), pos + 1))
        }
        Some('*') => Err("wildcards are not supported".to_string()),
        Some(c) => Err(format!("unexpected '{}' at {}", c, start)),
        None => Err("unterminated '['".to_string()),
    }
}
