//! Summary operations over the annotation and intercell tables.
//!
//! Both summaries are distinct, ordered queries compiled from their own
//! parameter maps. The annotation summary additionally folds the value column
//! of each `(source, label)` group into one `#`-joined cell, with numeric
//! values collapsed into a single `<numeric>` marker.

use std::collections::BTreeSet;
use std::iter::Peekable;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::{OmnipathError, Result};
use crate::query::{Literal, Predicate};
use crate::store::Row;

lazy_static! {
    static ref NUMERIC: Regex = Regex::new(r"^[-\d.]+").unwrap();
}

pub const NUMERIC_MARKER: &str = "<numeric>";

/// Labels shown as node attributes in Cytoscape, per annotation resource.
pub const CYTOSCAPE_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("Zhong2015", &["type"]),
    ("MatrixDB", &["mainclass"]),
    ("Matrisome", &["mainclass", "subclass", "subsubclass"]),
    ("Locate", &["location", "cls"]),
    ("Phosphatome", &["family", "subfamily"]),
    ("CancerSEA", &["state"]),
    ("GO_Intercell", &["mainclass"]),
    ("Adhesome", &["mainclass"]),
    ("SignaLink3", &["pathway"]),
    ("HPA_secretome", &["mainclass"]),
    ("OPM", &["membrane", "family"]),
    ("KEGG", &["pathway"]),
    ("kinase.com", &["group", "family", "subfamily"]),
    ("Membranome", &["membrane"]),
    ("HGNC", &["mainclass"]),
    ("CPAD", &["pathway", "effect_on_cancer", "cancer"]),
    ("Signor", &["pathway"]),
    ("Ramilowski2015", &["mainclass"]),
    ("HPA_subcellular", &["location"]),
    ("Surfaceome", &["mainclass", "subclasses"]),
    ("IntOGen", &["role"]),
    ("HPMR", &["role", "mainclass", "subclass", "subsubclass"]),
    ("ComPPI", &["location"]),
    ("Exocarta", &["vesicle"]),
    ("Vesiclepedia", &["vesicle"]),
    ("Ramilowski_location", &["location"]),
    ("LRdb", &["role", "cell_type"]),
];

/// Restricts annotation summary rows to the Cytoscape attribute labels.
pub fn cytoscape_predicate() -> Predicate {
    let terms = CYTOSCAPE_ATTRIBUTES
        .iter()
        .map(|(source, labels)| {
            Predicate::And(vec![
                Predicate::Eq { column: "source".to_string(), value: Literal::Text(source.to_string()) },
                Predicate::In {
                    column: "label".to_string(),
                    values: labels.iter().map(|l| Literal::Text(l.to_string())).collect(),
                },
            ])
        })
        .collect();
    Predicate::or(terms)
}

fn value_label(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(_) => NUMERIC_MARKER.to_string(),
        Value::String(s) if NUMERIC.is_match(s) => NUMERIC_MARKER.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Joins the distinct value labels of one group.
fn joined(mut labels: BTreeSet<String>) -> String {
    if labels.len() > 1 {
        labels.remove(NUMERIC_MARKER);
    }
    labels.remove("");
    labels.remove("nan");
    labels.into_iter().collect::<Vec<_>>().join("#")
}

/// Folds consecutive `[source, label, value]` rows sharing source and label into one row.
pub struct Collapsed<I: Iterator> {
    rows: Peekable<I>,
}

pub fn collapse_values<I>(rows: I) -> Collapsed<I>
where
    I: Iterator<Item = Result<Row>>,
{
    Collapsed { rows: rows.peekable() }
}

impl<I> Iterator for Collapsed<I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        let mut cells = row.into_iter();
        let (Some(source), Some(label), Some(value)) = (cells.next(), cells.next(), cells.next()) else {
            return Some(Err(OmnipathError::Invariant(
                "summary rows carry source, label and value".to_string(),
            )));
        };
        let mut labels = BTreeSet::from([value_label(&value)]);
        let same_group = |next: &Result<Row>| {
            matches!(next, Ok(r) if r.first() == Some(&source) && r.get(1) == Some(&label))
        };
        while let Some(Ok(next)) = self.rows.next_if(same_group) {
            labels.insert(next.get(2).map(value_label).unwrap_or_default());
        }
        Some(Ok(vec![source, label, Value::String(joined(labels))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(source: &str, label: &str, value: Value) -> Result<Row> {
        Ok(vec![json!(source), json!(label), value])
    }

    #[test]
    fn groups_fold_and_numbers_collapse() {
        let rows = vec![
            row("HPA", "level", json!("1.5")),
            row("HPA", "level", json!("2")),
            row("HPA", "tissue", json!("liver")),
            row("HPA", "tissue", json!("12 weeks")),
            row("HPA", "tissue", json!("nan")),
            row("Locate", "location", json!("3")),
        ];
        let folded: Vec<Row> = collapse_values(rows.into_iter()).map(|r| r.unwrap()).collect();
        assert_eq!(
            folded,
            vec![
                vec![json!("HPA"), json!("level"), json!("<numeric>")],
                vec![json!("HPA"), json!("tissue"), json!("liver")],
                vec![json!("Locate"), json!("location"), json!("<numeric>")],
            ]
        );
    }

    #[test]
    fn errors_pass_through() {
        let rows = vec![row("HPA", "x", json!("a")), Err(OmnipathError::Persistence("gone".into()))];
        let mut folded = collapse_values(rows.into_iter());
        assert!(folded.next().unwrap().is_ok());
        assert!(folded.next().unwrap().is_err());
        assert!(folded.next().is_none());
    }
}
