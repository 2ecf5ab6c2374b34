//! SQLite backed row store.
//!
//! Every entity table is stored flat; list and JSON columns hold JSON text
//! and are searched with `json_each`. Queries run on a dedicated cursor thread
//! with its own connection, which hands decoded rows to the consumer through a
//! bounded channel, so at most one chunk of rows is buffered at any time.

// used for persistence
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{OmnipathError, Result};
use crate::query::{Literal, Query};
use crate::schema::{create_table_sql, ColumnKind, EntityType, LICENSES, LICENSES_TABLE};

/// A result row, one value per selected column.
pub type Row = Vec<Value>;

/// A row of the license reference table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub resource: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub attrib: Option<String>,
    #[serde(default)]
    pub sharing: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Debug)]
enum Target {
    File(PathBuf),
    /// Shared-cache in-memory database, alive while the keeper connection is open.
    Memory(String),
}

impl Target {
    fn connect(&self) -> Result<Connection> {
        let connection = match self {
            Self::File(path) => Connection::open(path)?,
            Self::Memory(name) => Connection::open_with_flags(
                format!("file:{name}?mode=memory&cache=shared"),
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
        };
        Ok(connection)
    }
}

pub struct Store {
    target: Target,
    chunk_size: usize,
    _keeper: Option<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: impl Into<PathBuf>, chunk_size: usize) -> Result<Self> {
        let target = Target::File(path.into());
        // Fail early on an unusable path.
        target.connect()?;
        Ok(Self { target, chunk_size: chunk_size.max(1), _keeper: None })
    }

    /// Named in-memory database shared by all connections of this store.
    pub fn in_memory(name: &str, chunk_size: usize) -> Result<Self> {
        let target = Target::Memory(name.to_string());
        let keeper = target.connect()?;
        Ok(Self { target, chunk_size: chunk_size.max(1), _keeper: Some(Mutex::new(keeper)) })
    }

    pub fn connect(&self) -> Result<Connection> {
        self.target.connect()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Creates all tables, leaving existing ones untouched.
    pub fn create_schema(&self) -> Result<()> {
        let mut script = String::new();
        for entity in EntityType::ALL {
            script.push_str(&create_table_sql(entity.table(), entity.columns()));
            script.push('\n');
        }
        script.push_str(&create_table_sql(LICENSES_TABLE, LICENSES));
        self.connect()?.execute_batch(&script)?;
        debug!("schema in place");
        Ok(())
    }

    /// Inserts JSON objects into an entity table; unknown keys are ignored.
    pub fn insert_records(&self, entity: EntityType, records: &[Value]) -> Result<usize> {
        let columns = entity.columns();
        let names: Vec<String> = columns.iter().map(|c| format!("\"{}\"", c.name)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "insert into {} ({}) values ({placeholders})",
            entity.table(),
            names.join(", ")
        );
        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        {
            let mut statement = transaction.prepare(&sql)?;
            for record in records {
                let object = record.as_object().ok_or_else(|| {
                    OmnipathError::Serialization(format!("{entity} record is not an object"))
                })?;
                let values = columns
                    .iter()
                    .map(|c| to_sql_value(c.kind, object.get(c.name).unwrap_or(&Value::Null)))
                    .collect::<Result<Vec<_>>>()?;
                statement.execute(params_from_iter(values))?;
            }
        }
        transaction.commit()?;
        debug!(table = entity.table(), rows = records.len(), "records inserted");
        Ok(records.len())
    }

    pub fn insert_licenses(&self, licenses: &[LicenseRecord]) -> Result<usize> {
        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        {
            let mut statement = transaction.prepare(
                "
                insert into licenses (
                    resource, name, full_name, purpose, attrib, sharing, url
                ) values (?, ?, ?, ?, ?, ?, ?)
            ",
            )?;
            for l in licenses {
                statement.execute(rusqlite::params![
                    l.resource, l.name, l.full_name, l.purpose, l.attrib, l.sharing, l.url
                ])?;
            }
        }
        transaction.commit()?;
        Ok(licenses.len())
    }

    pub fn licenses(&self) -> Result<Vec<LicenseRecord>> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "
            select resource, name, full_name, purpose, attrib, sharing, url
                from licenses
                where resource is not null
        ",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(LicenseRecord {
                resource: row.get(0)?,
                name: row.get(1)?,
                full_name: row.get(2)?,
                purpose: row.get(3)?,
                attrib: row.get(4)?,
                sharing: row.get(5)?,
                url: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct values of a column, unnesting list columns, optionally only
    /// where a boolean flag column is set.
    pub fn distinct_values(
        &self,
        entity: EntityType,
        column: &str,
        flag: Option<&str>,
    ) -> Result<Vec<String>> {
        let table = entity.table();
        let kind = entity.require_column(column)?.kind;
        let condition = match flag {
            Some(flag) => {
                entity.require_column(flag)?;
                format!(" and {table}.\"{flag}\" = 1")
            }
            None => String::new(),
        };
        let sql = if kind.is_array() {
            format!(
                "select distinct j.value from {table}, json_each({table}.\"{column}\") as j
                    where j.value is not null{condition}
                    order by 1"
            )
        } else {
            format!(
                "select distinct {table}.\"{column}\" from {table}
                    where {table}.\"{column}\" is not null{condition}
                    order by 1"
            )
        };
        let connection = self.connect()?;
        let mut statement = connection.prepare(&sql)?;
        let values = statement.query_map([], |row| row.get::<_, String>(0))?;
        Ok(values.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct non-null `(key, value)` pairs where `column = literal`.
    pub fn distinct_pairs(
        &self,
        entity: EntityType,
        key: &str,
        value: &str,
        (column, literal): (&str, &str),
    ) -> Result<Vec<(String, String)>> {
        let table = entity.table();
        for name in [key, value, column] {
            entity.require_column(name)?;
        }
        let sql = format!(
            "select distinct \"{key}\", \"{value}\" from {table}
                where \"{column}\" = ? and \"{key}\" is not null and \"{value}\" is not null
                order by 1, 2"
        );
        let connection = self.connect()?;
        let mut statement = connection.prepare(&sql)?;
        let pairs = statement.query_map([literal], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(pairs.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Starts the query on a cursor thread and returns the row stream.
    pub fn stream(&self, query: &Query) -> Result<RowStream> {
        let (sql, params) = query.to_sql();
        let kinds = query
            .columns
            .iter()
            .map(|c| query.entity.require_column(c).map(|c| c.kind))
            .collect::<Result<Vec<_>>>()?;
        trace!(%sql, "opening cursor");
        let (sender, receiver) = mpsc::sync_channel(self.chunk_size);
        let target = self.target.clone();
        let worker = thread::Builder::new()
            .name("omnipath-cursor".to_string())
            .spawn(move || {
                if let Err(e) = run_cursor(&target, &sql, &params, &kinds, &sender) {
                    let _ = sender.send(Err(e));
                }
            })
            .map_err(|e| OmnipathError::Persistence(format!("cannot start cursor thread: {e}")))?;
        Ok(RowStream { receiver, worker: Some(worker) })
    }
}

fn run_cursor(
    target: &Target,
    sql: &str,
    params: &[Literal],
    kinds: &[ColumnKind],
    sender: &SyncSender<Result<Row>>,
) -> Result<()> {
    let connection = target.connect()?;
    let mut statement = connection.prepare(sql)?;
    let mut rows = statement.query(params_from_iter(params.iter()))?;
    let mut count = 0usize;
    while let Some(row) = rows.next()? {
        let decoded = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| decode(row.get_ref(i)?, *kind))
            .collect::<Result<Row>>()?;
        if sender.send(Ok(decoded)).is_err() {
            debug!(rows = count, "consumer went away, closing cursor");
            return Ok(());
        }
        count += 1;
    }
    debug!(rows = count, "cursor exhausted");
    Ok(())
}

fn decode(value: ValueRef<'_>, kind: ColumnKind) -> Result<Value> {
    Ok(match (value, kind) {
        (ValueRef::Null, _) => Value::Null,
        (ValueRef::Integer(i), ColumnKind::Boolean) => Value::Bool(i != 0),
        (ValueRef::Integer(i), ColumnKind::Text) => Value::String(i.to_string()),
        (ValueRef::Integer(i), _) => Value::from(i),
        (ValueRef::Real(f), _) => Value::from(f),
        (ValueRef::Text(bytes), ColumnKind::Array | ColumnKind::PrefixedArray | ColumnKind::Json) => {
            serde_json::from_slice(bytes)?
        }
        (ValueRef::Text(bytes), _) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        (ValueRef::Blob(_), _) => {
            return Err(OmnipathError::Serialization("unexpected blob value".to_string()));
        }
    })
}

/// Converts a JSON value to the stored representation of a column kind.
fn to_sql_value(kind: ColumnKind, value: &Value) -> Result<SqlValue> {
    let invalid = || OmnipathError::Serialization(format!("cannot store {value} as {kind:?}"));
    Ok(match (kind, value) {
        (_, Value::Null) => SqlValue::Null,
        (ColumnKind::Boolean, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        (ColumnKind::Boolean, Value::Number(n)) => SqlValue::Integer(i64::from(n.as_i64() != Some(0))),
        (ColumnKind::Boolean, Value::String(s)) => {
            SqlValue::Integer(i64::from(crate::args::parse_bool(s).ok_or_else(invalid)?))
        }
        (ColumnKind::Integer, Value::Number(n)) => SqlValue::Integer(n.as_i64().ok_or_else(invalid)?),
        (ColumnKind::Integer, Value::String(s)) => {
            SqlValue::Integer(crate::args::parse_integer(s).ok_or_else(invalid)?)
        }
        (ColumnKind::Array | ColumnKind::PrefixedArray, Value::Array(_)) => SqlValue::Text(value.to_string()),
        // `a;b;c` as exported by the tab separated dumps
        (ColumnKind::Array | ColumnKind::PrefixedArray, Value::String(s)) => {
            let items: Vec<&str> = s.split(';').filter(|i| !i.is_empty()).collect();
            SqlValue::Text(serde_json::to_string(&items)?)
        }
        (ColumnKind::Json, _) => SqlValue::Text(value.to_string()),
        (ColumnKind::Text, Value::String(s)) => SqlValue::Text(s.clone()),
        (ColumnKind::Text, Value::Number(n)) => SqlValue::Text(n.to_string()),
        (ColumnKind::Text, Value::Bool(b)) => SqlValue::Text(b.to_string()),
        _ => return Err(invalid()),
    })
}

/// Rows produced by a cursor thread.
pub struct RowStream {
    receiver: Receiver<Result<Row>>,
    worker: Option<JoinHandle<()>>,
}

impl Iterator for RowStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.receiver.recv() {
            Ok(row) => Some(row),
            Err(_) => {
                // The sender is gone, so the worker has finished.
                let worker = self.worker.take()?;
                match worker.join() {
                    Ok(()) => None,
                    Err(_) => Some(Err(OmnipathError::Invariant("cursor thread panicked".to_string()))),
                }
            }
        }
    }
}
