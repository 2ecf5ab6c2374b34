//! Request argument normalization.
//!
//! Arguments arrive as loosely typed key/value pairs. [`normalize`] resolves
//! synonyms, splits comma-separated lists, checks values against the
//! vocabulary of the entity's [`QueryParams`] and produces [`Args`], the only
//! input the query compiler accepts. All problems of a request are collected
//! and reported together.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{OmnipathError, Result};
use crate::format::Format;
use crate::params::{ArgSpec, Combine, QueryParams, Vocabulary};
use crate::registry::LicenseTier;

lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"^\d+$").unwrap();
}

/// A request value before normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Scalar(String),
    List(Vec<String>),
    Bool(bool),
    Int(i64),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<&str>> for RawValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(String::from).collect())
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Request arguments in arrival order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawArgs {
    pairs: Vec<(String, RawValue)>,
}

impl RawArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from query-string pairs; a repeated key collects into a list.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut args = Self::new();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            match args.pairs.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => {
                    let merged = match std::mem::replace(existing, RawValue::List(Vec::new())) {
                        RawValue::List(mut values) => {
                            values.push(value);
                            values
                        }
                        RawValue::Scalar(s) => vec![s, value],
                        RawValue::Bool(b) => vec![b.to_string(), value],
                        RawValue::Int(i) => vec![i.to_string(), value],
                    };
                    *existing = RawValue::List(merged);
                }
                None => args.pairs.push((key, RawValue::Scalar(value))),
            }
        }
        args
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A normalized argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Text(String),
    List(Vec<String>),
    Bool(bool),
    Integer(i64),
}

impl ArgValue {
    /// String tokens of the value, in order.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::Text(s) => vec![s.clone()],
            Self::List(values) => values.clone(),
            Self::Bool(b) => vec![b.to_string()],
            Self::Integer(i) => vec![i.to_string()],
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

/// Normalized arguments keyed by their canonical names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    values: BTreeMap<&'static str, ArgValue>,
}

impl Args {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: &'static str, value: ArgValue) {
        self.values.insert(name, value);
    }

    pub fn remove(&mut self, name: &str) -> Option<ArgValue> {
        self.values.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// True only for an explicit boolean `true`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(ArgValue::Bool(true)))
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        self.values.get(name).map(ArgValue::tokens).unwrap_or_default()
    }

    pub fn limit(&self) -> Option<u64> {
        match self.values.get("limit") {
            Some(ArgValue::Integer(i)) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn format(&self) -> Option<Format> {
        match self.values.get("format") {
            Some(ArgValue::Text(f)) => Format::parse(f),
            _ => None,
        }
    }

    pub fn header(&self) -> Option<bool> {
        match self.values.get("header") {
            Some(ArgValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn license(&self) -> Option<LicenseTier> {
        match self.values.get("license") {
            Some(ArgValue::Text(l)) => LicenseTier::parse(l),
            _ => None,
        }
    }

    pub fn operator(&self, name: &str) -> Option<Combine> {
        match self.values.get(name) {
            Some(ArgValue::Text(op)) => Combine::parse(op),
            _ => None,
        }
    }
}

/// Parses `0/1`, `true/false` and `yes/no`, ignoring case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

pub fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    if DIGITS.is_match(value) {
        value.parse().ok()
    } else {
        None
    }
}

impl RawValue {
    /// Comma separated tokens, trimmed, empty ones dropped.
    pub fn tokens(&self) -> Vec<String> {
        let split = |s: &str| -> Vec<String> {
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        };
        match self {
            Self::Scalar(s) => split(s),
            Self::List(values) => values.iter().flat_map(|s| split(s)).collect(),
            Self::Bool(b) => vec![b.to_string()],
            Self::Int(i) => vec![i.to_string()],
        }
    }
}

/// Vocabularies that depend on the running catalog.
#[derive(Clone, Copy, Debug, Default)]
pub struct Context<'a> {
    pub resources: Option<&'a BTreeSet<String>>,
}

/// Turns raw request arguments into [`Args`] for one entity.
pub fn normalize(raw: &RawArgs, params: &QueryParams, context: Context<'_>) -> Result<Args> {
    let mut problems = Vec::new();
    let mut args = Args::default();

    // Direct names win over synonyms naming the same argument.
    let direct: BTreeSet<&str> = raw.iter().map(|(k, _)| k).filter(|k| params.argument(k).is_some()).collect();
    for (name, value) in raw.iter() {
        let canonical = params.canonical(name);
        let Some(spec) = params.argument(canonical) else {
            problems.push(format!(" ==> Unknown argument: `{name}`"));
            continue;
        };
        if canonical != name && direct.contains(canonical) {
            continue;
        }
        match normalize_value(spec, value, params, context) {
            Ok(Some(v)) => args.insert(spec.name, v),
            Ok(None) => {}
            Err(message) => problems.push(message),
        }
    }

    if problems.is_empty() {
        Ok(args)
    } else {
        Err(OmnipathError::InvalidArguments(problems))
    }
}

fn normalize_value(
    spec: &ArgSpec,
    value: &RawValue,
    params: &QueryParams,
    context: Context<'_>,
) -> std::result::Result<Option<ArgValue>, String> {
    let name = spec.name;
    let mut tokens = value.tokens();
    for rewrite in params.value_rewrites.iter().filter(|r| r.args.contains(&name)) {
        for token in tokens.iter_mut().filter(|t| t.as_str() == rewrite.from) {
            *token = rewrite.to.to_string();
        }
    }
    if tokens.is_empty() {
        return Ok(None);
    }

    let single = |tokens: &[String]| -> std::result::Result<String, String> {
        match tokens {
            [one] => Ok(one.clone()),
            _ => Err(format!(" ==> Argument `{name}` takes a single value")),
        }
    };

    let unknown = |bad: Vec<&String>| -> String {
        let bad: Vec<&str> = bad.into_iter().map(String::as_str).collect();
        format!(" ==> Unknown values for argument `{name}`: `{}`", bad.join(", "))
    };

    match spec.vocabulary {
        Vocabulary::Bool => {
            if let RawValue::Bool(b) = value {
                return Ok(Some(ArgValue::Bool(*b)));
            }
            let token = single(&tokens)?;
            parse_bool(&token)
                .map(|b| Some(ArgValue::Bool(b)))
                .ok_or_else(|| format!(" ==> Argument `{name}` expects a boolean, got `{token}`"))
        }
        Vocabulary::Integer => {
            if let RawValue::Int(i) = value {
                return Ok(Some(ArgValue::Integer(*i)));
            }
            let token = single(&tokens)?;
            parse_integer(&token)
                .map(|i| Some(ArgValue::Integer(i)))
                .ok_or_else(|| format!(" ==> Argument `{name}` expects an integer, got `{token}`"))
        }
        Vocabulary::Operator => {
            let token = single(&tokens)?;
            match Combine::parse(&token) {
                Some(Combine::And) => Ok(Some(ArgValue::Text("AND".to_string()))),
                Some(Combine::Or) => Ok(Some(ArgValue::Text("OR".to_string()))),
                None => Err(unknown(vec![&token])),
            }
        }
        vocabulary => {
            if !spec.array {
                single(&tokens)?;
            }
            let bad: Vec<&String> = match vocabulary {
                Vocabulary::Closed(allowed) => {
                    tokens.iter().filter(|t| !allowed.contains(&t.as_str())).collect()
                }
                Vocabulary::Fields => {
                    let names = params.field_names();
                    tokens.iter().filter(|t| !names.contains(t.as_str())).collect()
                }
                Vocabulary::Resources => match context.resources {
                    Some(known) if !known.is_empty() => {
                        tokens.iter().filter(|t| !known.contains(t.as_str())).collect()
                    }
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            };
            if !bad.is_empty() {
                return Err(unknown(bad));
            }
            Ok(Some(shape(spec, tokens)))
        }
    }
}

fn shape(spec: &ArgSpec, mut tokens: Vec<String>) -> ArgValue {
    if !spec.array && tokens.len() == 1 {
        ArgValue::Text(tokens.remove(0))
    } else {
        ArgValue::List(tokens)
    }
}
