//! Query compilation.
//!
//! [`compile`] turns normalized [`Args`] into a [`Query`]: an ordered select
//! list, a predicate tree and an optional limit. The predicate tree is
//! independent of the storage engine; [`Query::to_sql`] renders it for SQLite
//! with positional parameters, and `Display` renders the human readable form
//! returned by the `query` output format.

// used for the human readable notation
use std::fmt;

// used to bind literals as statement parameters
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};

use crate::args::{parse_bool, parse_integer, ArgValue, Args};
use crate::error::{OmnipathError, Result};
use crate::params::{Combine, DefaultValue, FlagGroup, FlagValues, QueryParams};
use crate::schema::{Column, ColumnKind, EntityType};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl Literal {
    /// Coerces a request token to the type of the column it is compared with.
    pub fn for_column(column: &Column, token: &str) -> Result<Literal> {
        match column.kind {
            ColumnKind::Integer => parse_integer(token).map(Literal::Integer).ok_or_else(|| {
                OmnipathError::invalid(format!(
                    " ==> Column `{}` holds integers, got `{token}`",
                    column.name
                ))
            }),
            ColumnKind::Boolean => parse_bool(token).map(Literal::Bool).ok_or_else(|| {
                OmnipathError::invalid(format!(
                    " ==> Column `{}` holds booleans, got `{token}`",
                    column.name
                ))
            }),
            _ => Ok(Literal::Text(token.to_string())),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl ToSql for Literal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Bool(b) => ToSqlOutput::from(i64::from(*b)),
            Self::Integer(i) => ToSqlOutput::from(*i),
            Self::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    In,
    Contains,
    Overlap,
    Is,
}

/// Comparison operator for a column kind and the shape of the requested value.
pub fn infer_operator(kind: ColumnKind, value: &ArgValue) -> Operator {
    match (kind, value) {
        (k, ArgValue::List(_)) if k.is_array() => Operator::Overlap,
        (k, _) if k.is_array() => Operator::Contains,
        (ColumnKind::Boolean, ArgValue::Bool(_)) => Operator::Is,
        (_, ArgValue::List(_)) => Operator::In,
        _ => Operator::Eq,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Eq { column: String, value: Literal },
    In { column: String, values: Vec<Literal> },
    /// Array column holds the value.
    Contains { column: String, value: Literal },
    /// Array column shares at least one element with the values.
    Overlap { column: String, values: Vec<Literal> },
    Is { column: String, value: bool },
    /// The two columns differ.
    Distinct { left: String, right: String },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction, flattening nested conjunctions and unwrapping a single term.
    pub fn and(terms: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(terms.len());
        for term in terms {
            match term {
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 { flat.remove(0) } else { Predicate::And(flat) }
    }

    /// Disjunction, flattening nested disjunctions and unwrapping a single term.
    pub fn or(terms: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(terms.len());
        for term in terms {
            match term {
                Predicate::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 { flat.remove(0) } else { Predicate::Or(flat) }
    }

    fn render(&self, table: &str, sql: &mut String, params: &mut Vec<Literal>) {
        let placeholders = |n: usize| vec!["?"; n].join(", ");
        match self {
            Self::Eq { column, value } => {
                sql.push_str(&format!("{table}.\"{column}\" = ?"));
                params.push(value.clone());
            }
            Self::In { column, values } => {
                sql.push_str(&format!("{table}.\"{column}\" in ({})", placeholders(values.len())));
                params.extend(values.iter().cloned());
            }
            Self::Contains { column, value } => {
                sql.push_str(&format!(
                    "exists (select 1 from json_each({table}.\"{column}\") where json_each.value = ?)"
                ));
                params.push(value.clone());
            }
            Self::Overlap { column, values } => {
                sql.push_str(&format!(
                    "exists (select 1 from json_each({table}.\"{column}\") where json_each.value in ({}))",
                    placeholders(values.len())
                ));
                params.extend(values.iter().cloned());
            }
            Self::Is { column, value } => {
                sql.push_str(&format!("{table}.\"{column}\" is ?"));
                params.push(Literal::Bool(*value));
            }
            Self::Distinct { left, right } => {
                sql.push_str(&format!("{table}.\"{left}\" is not {table}.\"{right}\""));
            }
            Self::And(terms) | Self::Or(terms) => {
                if terms.is_empty() {
                    sql.push_str(if matches!(self, Self::And(_)) { "1" } else { "0" });
                    return;
                }
                let joiner = if matches!(self, Self::And(_)) { " and " } else { " or " };
                sql.push('(');
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(joiner);
                    }
                    term.render(table, sql, params);
                }
                sql.push(')');
            }
        }
    }
}

fn write_set(f: &mut fmt::Formatter<'_>, values: &[Literal]) -> fmt::Result {
    let joined: Vec<String> = values.iter().map(Literal::to_string).collect();
    write!(f, "{{{}}}", joined.join(", "))
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq { column, value } => write!(f, "{column} = {value}"),
            Self::In { column, values } => {
                write!(f, "{column} IN ")?;
                write_set(f, values)
            }
            Self::Contains { column, value } => write!(f, "{column} CONTAINS {value}"),
            Self::Overlap { column, values } => {
                write!(f, "{column} && ")?;
                write_set(f, values)
            }
            Self::Is { column, value } => write!(f, "{column} IS {value}"),
            Self::Distinct { left, right } => write!(f, "{left} != {right}"),
            Self::And(terms) | Self::Or(terms) => {
                let and = matches!(self, Self::And(_));
                let joiner = if and { " AND " } else { " OR " };
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    let nested = matches!(
                        (and, term),
                        (true, Self::Or(_)) | (false, Self::And(_))
                    );
                    if nested {
                        write!(f, "({term})")?;
                    } else {
                        write!(f, "{term}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// A compiled, engine independent query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub entity: EntityType,
    pub columns: Vec<String>,
    pub predicate: Option<Predicate>,
    pub limit: Option<u64>,
    /// Distinct rows, ordered by every selected column.
    #[serde(default)]
    pub distinct: bool,
}

impl Query {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// SQLite statement text and its positional parameters.
    pub fn to_sql(&self) -> (String, Vec<Literal>) {
        let table = self.entity.table();
        let select: Vec<String> = self.columns.iter().map(|c| format!("{table}.\"{c}\"")).collect();
        let distinct = if self.distinct { "distinct " } else { "" };
        let mut sql = format!("select {distinct}{} from {table}", select.join(", "));
        let mut params = Vec::new();
        if let Some(predicate) = &self.predicate {
            sql.push_str(" where ");
            predicate.render(table, &mut sql, &mut params);
        }
        if self.distinct {
            sql.push_str(&format!(" order by {}", select.join(", ")));
        }
        if let Some(limit) = self.limit {
            sql.push_str(" limit ?");
            params.push(Literal::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }
        (sql, params)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        write!(f, "SELECT {distinct}{} FROM {}", self.columns.join(", "), self.entity.table())?;
        if let Some(predicate) = &self.predicate {
            write!(f, " WHERE {predicate}")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}

/// Predicate for one column and a requested value.
pub fn column_predicate(column: &Column, value: &ArgValue) -> Result<Predicate> {
    let name = column.name.to_string();
    let literals = |tokens: Vec<String>| -> Result<Vec<Literal>> {
        tokens.iter().map(|t| Literal::for_column(column, t)).collect()
    };
    Ok(match infer_operator(column.kind, value) {
        Operator::Is => Predicate::Is { column: name, value: matches!(value, ArgValue::Bool(true)) },
        Operator::Contains => {
            Predicate::Contains { column: name, value: Literal::Text(value.tokens().concat()) }
        }
        Operator::Overlap => Predicate::Overlap {
            column: name,
            values: value.tokens().into_iter().map(Literal::Text).collect(),
        },
        Operator::In => Predicate::In { column: name, values: literals(value.tokens())? },
        Operator::Eq => match value {
            ArgValue::Integer(i) if column.kind == ColumnKind::Integer => {
                Predicate::Eq { column: name, value: Literal::Integer(*i) }
            }
            ArgValue::Bool(b) => Predicate::Eq { column: name, value: Literal::Bool(*b) },
            _ => Predicate::Eq { column: name, value: Literal::for_column(column, &value.tokens().concat())? },
        },
    })
}

fn column_terms(entity: EntityType, columns: &[&str], value: &ArgValue) -> Result<Vec<Predicate>> {
    columns
        .iter()
        .map(|c| column_predicate(entity.require_column(c)?, value))
        .collect()
}

/// Disjunction of the same value over several columns.
fn any_column(entity: EntityType, columns: &[&str], value: &ArgValue) -> Result<Predicate> {
    Ok(Predicate::or(column_terms(entity, columns, value)?))
}

/// Conjunction of the same value over several columns.
fn all_columns(entity: EntityType, columns: &[&str], value: &ArgValue) -> Result<Predicate> {
    Ok(Predicate::and(column_terms(entity, columns, value)?))
}

fn default_value(value: DefaultValue) -> ArgValue {
    match value {
        DefaultValue::List(values) => ArgValue::List(values.iter().map(|v| v.to_string()).collect()),
        DefaultValue::Bool(b) => ArgValue::Bool(b),
    }
}

/// Fills in domain and argument defaults, including default override triggers.
pub fn apply_defaults(params: &QueryParams, args: &mut Args) {
    if let Some(domain) = &params.domain_default {
        if !domain.unless_any.iter().any(|a| args.contains(a)) {
            args.insert(domain.arg, default_value(domain.value));
        }
    }
    for (name, value) in params.defaults {
        if !args.contains(name) {
            args.insert(*name, default_value(*value));
        }
    }
    for group in &params.flags {
        let requested = args.list(group.arg);
        for (flag_value, spec) in &group.overrides {
            let selected = requested.iter().any(|r| r == flag_value);
            if selected && !args.contains(spec.trigger) && !spec.default_values.is_empty() {
                args.insert(
                    spec.trigger,
                    ArgValue::List(spec.default_values.iter().map(|v| v.to_string()).collect()),
                );
            }
        }
    }
}

/// Ordered select list for the arguments.
pub fn select_columns(params: &QueryParams, args: &Args) -> Vec<String> {
    let entity = params.entity;
    let mut columns: Vec<&'static str> = params.select.to_vec();
    for field in args.list("fields") {
        match params.flag_field(&field) {
            Some(group) => columns.extend(group.columns_for(&args.list(group.arg))),
            None => columns.extend(params.expand_field(&field)),
        }
    }
    for (switch, extra) in params.switch_select {
        if args.flag(switch) {
            columns.extend(extra.iter().copied());
        }
    }
    columns.sort_by_key(|c| entity.position(c).unwrap_or(usize::MAX));
    columns.dedup();
    columns.into_iter().map(String::from).collect()
}

fn is_true(columns: &[&str]) -> Vec<Predicate> {
    columns.iter().map(|c| Predicate::Is { column: c.to_string(), value: true }).collect()
}

fn push_unique(terms: &mut Vec<Predicate>, new: Vec<Predicate>) {
    for term in new {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
}

/// Disjunction of the boolean columns a flag group selects, if it selects any.
fn flag_terms(group: &FlagGroup, value: &ArgValue) -> Option<Predicate> {
    let mut terms = Vec::new();
    match group.values {
        FlagValues::Switch(columns) => {
            if matches!(value, ArgValue::Bool(true)) {
                terms = is_true(columns);
            }
        }
        FlagValues::Named(_) => {
            for requested in value.tokens() {
                push_unique(&mut terms, is_true(&group.columns_for(&[requested])));
            }
        }
    }
    if terms.is_empty() { None } else { Some(Predicate::or(terms)) }
}

/// Predicates of the flag groups and the trigger arguments they consumed.
fn flag_clauses(params: &QueryParams, args: &Args) -> Result<(Vec<Predicate>, Vec<&'static str>)> {
    let entity = params.entity;
    let mut clauses = Vec::new();
    let mut consumed = Vec::new();
    for group in &params.flags {
        if params.refines(group.arg) {
            continue;
        }
        let Some(value) = args.get(group.arg) else { continue };
        if group.overrides.is_empty() {
            clauses.extend(flag_terms(group, value));
            continue;
        }
        let mut terms: Vec<Predicate> = Vec::new();
        for requested in value.tokens() {
            let Some(spec) = group.overrides.get(requested.as_str()) else {
                push_unique(&mut terms, is_true(&group.columns_for(&[requested])));
                continue;
            };
            let mut term = match args.get(spec.trigger) {
                Some(trigger) => {
                    consumed.push(spec.trigger);
                    let column = entity.require_column(spec.column)?;
                    column_predicate(column, &ArgValue::List(trigger.tokens()))?
                }
                None => Predicate::or(is_true(&group.columns_for(&[requested]))),
            };
            let narrowing: Vec<Predicate> = spec
                .refine
                .iter()
                .filter_map(|arg| Some(flag_terms(params.flag(arg)?, args.get(arg)?)?))
                .collect();
            if !narrowing.is_empty() {
                term = Predicate::and(std::iter::once(term).chain(narrowing).collect());
            }
            push_unique(&mut terms, vec![term]);
        }
        if !terms.is_empty() {
            clauses.push(Predicate::or(terms));
        }
    }
    Ok((clauses, consumed))
}

fn partner_clauses(params: &QueryParams, args: &Args) -> Result<Vec<Predicate>> {
    let Some(spec) = &params.partners else {
        return Ok(Vec::new());
    };
    let entity = params.entity;
    let mut clauses = Vec::new();

    let explicit = spec.sides.iter().any(|s| args.contains(s.arg));
    let both = if explicit { None } else { args.get(spec.both) };
    let mut sides = Vec::new();
    for side in &spec.sides {
        if let Some(value) = args.get(side.arg).or(both) {
            sides.push(any_column(entity, side.columns, value)?);
        }
    }
    match sides.len() {
        0 => {}
        1 => clauses.extend(sides),
        _ => {
            let operator = args.operator(spec.operator_arg).unwrap_or(spec.default_operator);
            clauses.push(match operator {
                Combine::And => Predicate::And(sides),
                Combine::Or => Predicate::or(sides),
            });
        }
    }
    Ok(clauses)
}

/// Excludes self-loops unless they were asked for.
fn loop_clause(params: &QueryParams, args: &Args) -> Option<Predicate> {
    let spec = params.partners.as_ref()?;
    if args.flag(spec.loops_arg) {
        return None;
    }
    let (left, right) = spec.loop_columns;
    Some(Predicate::Distinct { left: left.to_string(), right: right.to_string() })
}

/// Compiles normalized arguments for one entity into a [`Query`].
pub fn compile(params: &QueryParams, mut args: Args) -> Result<Query> {
    let entity = params.entity;
    if !params.required_any.is_empty() && !params.required_any.iter().any(|a| args.contains(a)) {
        return Err(OmnipathError::invalid(format!(
            " ==> Querying `{}` requires at least one of: {}",
            entity.table(),
            params.required_any.join(", ")
        )));
    }
    apply_defaults(params, &mut args);

    let columns = select_columns(params, &args);
    let (flags, consumed) = flag_clauses(params, &args)?;

    let mut clauses = Vec::new();
    for (arg, columns) in params.filters {
        if consumed.contains(arg) || params.flag(arg).is_some() {
            continue;
        }
        if let Some(value) = args.get(arg) {
            clauses.push(if params.is_strict(arg, &value.tokens()) {
                all_columns(entity, columns, value)?
            } else {
                any_column(entity, columns, value)?
            });
        }
    }
    clauses.extend(partner_clauses(params, &args)?);
    clauses.extend(flags);
    clauses.extend(loop_clause(params, &args));

    let predicate = if clauses.is_empty() { None } else { Some(Predicate::and(clauses)) };
    Ok(Query { entity, columns, predicate, limit: args.limit(), distinct: params.distinct })
}
