//! Output formats.
//!
//! Formatters are lazy iterators over text chunks: nothing is read from the
//! row source before the first chunk is requested, and a failed row ends the
//! output right after the error is passed on.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::store::Row;
use crate::stream::{WithLast, WithLastExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Structured records, for in-process callers.
    Raw,
    Tsv,
    Json,
    /// The compiled query instead of its results.
    Query,
}

impl Format {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "raw" => Some(Self::Raw),
            "tsv" | "tab" | "text" | "table" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            "query" => Some(Self::Query),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Tsv | Self::Query => "text/plain; charset=utf-8",
            Self::Raw => "application/x-ndjson",
        }
    }
}

/// A boxed chunk stream that can be handed to another thread.
pub type Chunks = Box<dyn Iterator<Item = Result<String>> + Send>;

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.replace(['\t', '\n', '\r'], " ")),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Text of one tab separated cell.
pub fn tsv_cell(value: &Value) -> String {
    if let Some(text) = scalar_text(value) {
        return text;
    }
    if let Value::Array(items) = value {
        let flat: Option<Vec<String>> = items
            .iter()
            .map(|item| if item.is_null() { None } else { scalar_text(item) })
            .collect();
        if let Some(flat) = flat {
            return flat.join(";");
        }
    }
    value.to_string()
}

fn tsv_line(cells: impl Iterator<Item = String>) -> String {
    let mut line = cells.collect::<Vec<_>>().join("\t");
    line.push('\n');
    line
}

pub struct Tsv<I> {
    rows: I,
    columns: Arc<[String]>,
    header: bool,
    done: bool,
}

impl<I> Iterator for Tsv<I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.header {
            self.header = false;
            return Some(Ok(tsv_line(self.columns.iter().cloned())));
        }
        match self.rows.next() {
            None => {
                self.done = true;
                None
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            Some(Ok(row)) => Some(Ok(tsv_line(row.iter().map(tsv_cell)))),
        }
    }
}

pub fn tsv<I>(rows: I, columns: Arc<[String]>, header: bool) -> Tsv<I>
where
    I: Iterator<Item = Result<Row>>,
{
    Tsv { rows, columns, header, done: false }
}

/// Pairs the column names with the values of a row.
pub fn record(columns: &[String], row: Row) -> Map<String, Value> {
    columns.iter().cloned().zip(row).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JsonState {
    Fresh,
    Open,
    Done,
}

/// A JSON array written one row per chunk: `[`, rows separated by `,`, then `]`.
pub struct Json<I: Iterator> {
    rows: WithLast<I>,
    columns: Arc<[String]>,
    state: JsonState,
}

impl<I> Json<I>
where
    I: Iterator<Item = Result<Row>>,
{
    fn row_chunk(&mut self, row: Row, last: bool) -> Result<String> {
        let mut chunk = if self.state == JsonState::Fresh { "[\n".to_string() } else { String::new() };
        chunk.push_str(&serde_json::to_string(&record(&self.columns, row))?);
        if last {
            chunk.push_str("\n]");
            self.state = JsonState::Done;
        } else {
            chunk.push_str(",\n");
            self.state = JsonState::Open;
        }
        Ok(chunk)
    }
}

impl<I> Iterator for Json<I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == JsonState::Done {
            return None;
        }
        match self.rows.next() {
            None if self.state == JsonState::Fresh => {
                self.state = JsonState::Done;
                Some(Ok("[]".to_string()))
            }
            // The lookahead already saw the end, so this is not reached after a row.
            None => {
                self.state = JsonState::Done;
                None
            }
            Some((Err(e), _)) => {
                self.state = JsonState::Done;
                Some(Err(e))
            }
            Some((Ok(row), last)) => {
                let chunk = self.row_chunk(row, last);
                if chunk.is_err() {
                    self.state = JsonState::Done;
                }
                Some(chunk)
            }
        }
    }
}

pub fn json<I>(rows: I, columns: Arc<[String]>) -> Json<I>
where
    I: Iterator<Item = Result<Row>>,
{
    Json { rows: rows.with_last(), columns, state: JsonState::Fresh }
}

/// Structured records for the raw format.
pub struct Records<I> {
    rows: I,
    columns: Arc<[String]>,
}

impl<I> Iterator for Records<I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<Map<String, Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| row.map(|row| record(&self.columns, row)))
    }
}

pub fn records<I>(rows: I, columns: Arc<[String]>) -> Records<I>
where
    I: Iterator<Item = Result<Row>>,
{
    Records { rows, columns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cells_flatten_lists_and_booleans() {
        assert_eq!(tsv_cell(&json!(true)), "1");
        assert_eq!(tsv_cell(&json!(null)), "");
        assert_eq!(tsv_cell(&json!(["a", "b"])), "a;b");
        assert_eq!(tsv_cell(&json!({"k": 1})), "{\"k\":1}");
    }

    #[test]
    fn format_names_and_synonyms() {
        for name in ["tsv", "tab", "text", "table"] {
            assert_eq!(Format::parse(name), Some(Format::Tsv));
        }
        assert_eq!(Format::parse("JSON"), Some(Format::Json));
        assert_eq!(Format::parse("xml"), None);
    }
}
