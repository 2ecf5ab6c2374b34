//! Row level license filtering.
//!
//! A [`LicenseFilter`] knows where the resource attributions of a result row
//! live and which resources the requested tier enables. Rows attributed to a
//! single resource are kept or dropped whole; list attributions are pruned to
//! the enabled entries and the row is dropped once nothing is left.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::params::QueryParams;
use crate::registry::{LicenseTier, Registry, ResourceSet};
use crate::schema::ColumnKind;
use crate::store::Row;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attribution {
    Scalar(usize),
    Array(usize),
}

#[derive(Clone, Debug)]
pub struct LicenseFilter {
    enabled: Arc<ResourceSet>,
    resource: Option<Attribution>,
    /// Positions of `resource:identifier` lists.
    prefixed: Vec<usize>,
}

impl LicenseFilter {
    /// Filter for rows with the given columns; `None` when the tier does not filter.
    pub fn new(
        registry: &Registry,
        tier: LicenseTier,
        params: &QueryParams,
        columns: &[String],
    ) -> Option<Self> {
        let enabled = registry.enabled(tier)?;
        let entity = params.entity;
        let position = |name: &str| columns.iter().position(|c| c == name);
        let resource = position(params.license.resource).map(|i| {
            match entity.column(params.license.resource).map(|c| c.kind) {
                Some(kind) if kind.is_array() => Attribution::Array(i),
                _ => Attribution::Scalar(i),
            }
        });
        let prefixed = params
            .license
            .prefixed
            .iter()
            .filter(|c| entity.column(c).is_some_and(|c| c.kind == ColumnKind::PrefixedArray))
            .filter_map(|c| position(c))
            .collect();
        Some(Self { enabled, resource, prefixed })
    }

    fn enabled_prefix(&self, item: &Value) -> bool {
        item.as_str()
            .map(|s| s.split_once(':').map_or(s, |(prefix, _)| prefix))
            .is_some_and(|prefix| self.enabled.contains(prefix))
    }

    /// The row with disallowed attributions removed, or `None` if it must be dropped.
    pub fn apply(&self, mut row: Row) -> Option<Row> {
        match self.resource {
            Some(Attribution::Scalar(i)) => {
                let allowed = row.get(i).and_then(Value::as_str).is_some_and(|r| self.enabled.contains(r));
                if !allowed {
                    return None;
                }
            }
            Some(Attribution::Array(i)) => {
                let Some(Value::Array(items)) = row.get_mut(i) else {
                    return None;
                };
                items.retain(|item| item.as_str().is_some_and(|r| self.enabled.contains(r)));
                if items.is_empty() {
                    return None;
                }
            }
            None => {}
        }
        for &i in &self.prefixed {
            if let Some(Value::Array(items)) = row.get_mut(i) {
                let kept: Vec<Value> = items.drain(..).filter(|item| self.enabled_prefix(item)).collect();
                *items = kept;
            }
        }
        Some(row)
    }
}

/// Iterator adapter applying an optional [`LicenseFilter`] to a row stream.
pub struct Licensed<I> {
    rows: I,
    filter: Option<LicenseFilter>,
}

impl<I> Iterator for Licensed<I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };
            match &self.filter {
                None => return Some(Ok(row)),
                Some(filter) => {
                    if let Some(row) = filter.apply(row) {
                        return Some(Ok(row));
                    }
                }
            }
        }
    }
}

pub fn licensed<I>(rows: I, filter: Option<LicenseFilter>) -> Licensed<I>
where
    I: Iterator<Item = Result<Row>>,
{
    Licensed { rows, filter }
}
