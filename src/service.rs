//! Operation dispatch.
//!
//! The [`Service`] owns the store and the active [`Catalog`] (parameter maps
//! plus registry). Requests read the catalog through an `Arc` snapshot, so a
//! reload swaps in a complete new catalog without disturbing requests that
//! are already streaming.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{info, info_span, warn, Span};

use crate::args::{normalize, Args, Context, RawArgs};
use crate::error::{OmnipathError, Result};
use crate::format::{json, records, tsv, Chunks, Format};
use crate::license::{licensed, LicenseFilter};
use crate::params::{ParamMap, QueryParams, Vocabulary};
use crate::query::{compile, Predicate, Query};
use crate::registry::{LicenseCatalog, LicenseTier, Registry};
use crate::schema::EntityType;
use crate::settings::ServiceSettings;
use crate::store::{Row, Store};
use crate::summary::{collapse_values, cytoscape_predicate};

static QUERY_IDS: AtomicU64 = AtomicU64::new(0);

/// What a request asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Data(EntityType),
    /// Distinct overview of an entity table (annotations and intercell).
    Summary(EntityType),
    /// Valid arguments and their values.
    Queries { entity: Option<EntityType>, argument: Option<String> },
    Datasets,
    Resources,
}

impl Operation {
    /// Resolves URL path segments; `None` for unknown operations.
    pub fn parse(segments: &[&str]) -> Option<Self> {
        match segments {
            ["queries"] => Some(Self::Queries { entity: None, argument: None }),
            ["queries", entity] => {
                Some(Self::Queries { entity: Some(EntityType::from_name(entity)?), argument: None })
            }
            ["queries", entity, argument] => Some(Self::Queries {
                entity: Some(EntityType::from_name(entity)?),
                argument: Some(argument.to_string()),
            }),
            ["datasets"] => Some(Self::Datasets),
            ["resources" | "databases"] => Some(Self::Resources),
            ["annotations_summary"] => Some(Self::Summary(EntityType::Annotations)),
            ["intercell_summary"] => Some(Self::Summary(EntityType::Intercell)),
            [name] => EntityType::from_name(name).map(Self::Data),
            _ => None,
        }
    }
}

pub type RecordStream = Box<dyn Iterator<Item = Result<Map<String, Value>>> + Send>;

type RowIter = Box<dyn Iterator<Item = Result<Row>> + Send>;

pub enum Response {
    /// Structured rows for in-process callers.
    Records { columns: Arc<[String]>, records: RecordStream },
    /// Encoded output, one chunk at a time.
    Chunks { format: Format, chunks: Chunks },
    /// The compiled query instead of its results.
    Query(Query),
    /// Human readable explanation of a client error.
    Invalid(String),
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Records { columns, .. } => f.debug_struct("Records").field("columns", columns).finish(),
            Self::Chunks { format, .. } => f.debug_struct("Chunks").field("format", format).finish(),
            Self::Query(query) => f.debug_tuple("Query").field(query).finish(),
            Self::Invalid(message) => f.debug_tuple("Invalid").field(message).finish(),
        }
    }
}

impl Response {
    /// Drains a chunk response into one string; other responses are rendered as text.
    pub fn into_text(self) -> Result<String> {
        match self {
            Self::Chunks { chunks, .. } => chunks.collect(),
            Self::Query(query) => Ok(query.to_string()),
            Self::Invalid(message) => Ok(message),
            Self::Records { records, .. } => {
                let mut text = String::new();
                for record in records {
                    text.push_str(&serde_json::to_string(&record?)?);
                    text.push('\n');
                }
                Ok(text)
            }
        }
    }
}

/// Everything a request needs besides the store.
#[derive(Debug)]
pub struct Catalog {
    pub params: ParamMap,
    pub registry: Registry,
}

impl Catalog {
    pub fn build(store: &Store) -> Result<Self> {
        let params = ParamMap::standard();
        params.validate()?;
        let licenses = LicenseCatalog::from_records(store.licenses()?);
        if licenses.is_empty() {
            warn!("license table is empty, only `license=ignore` returns rows");
        }
        let datasets = params
            .get(EntityType::Interactions)
            .flag("datasets")
            .map(|g| g.value_names())
            .unwrap_or_default();
        let registry = Registry::build(store, &licenses, &datasets)?;
        info!(resources = registry.len(), licenses = licenses.len(), "registry built");
        Ok(Self { params, registry })
    }
}

pub struct Service {
    store: Store,
    default_license: LicenseTier,
    default_format: Format,
    catalog: RwLock<Arc<Catalog>>,
    reloading: Mutex<()>,
}

impl Service {
    pub fn new(store: Store, settings: &ServiceSettings) -> Result<Self> {
        let catalog = Catalog::build(&store)?;
        Ok(Self {
            store,
            default_license: settings.license()?,
            default_format: settings.format()?,
            catalog: RwLock::new(Arc::new(catalog)),
            reloading: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Snapshot of the active catalog.
    pub fn catalog(&self) -> Result<Arc<Catalog>> {
        Ok(Arc::clone(&*self.catalog.read()?))
    }

    /// Rebuilds the catalog from the store and makes it active.
    pub fn reload(&self) -> Result<()> {
        let _reloading = self.reloading.lock()?;
        let started = Instant::now();
        let catalog = Arc::new(Catalog::build(&self.store)?);
        *self.catalog.write()? = catalog;
        info!(ms = started.elapsed().as_secs_f64() * 1000.0, "catalog reloaded");
        Ok(())
    }

    /// Runs an operation; client errors come back as [`Response::Invalid`].
    pub fn handle(&self, operation: Operation, args: &RawArgs) -> Result<Response> {
        let outcome = match operation {
            Operation::Data(entity) => self.data(entity, args),
            Operation::Summary(entity) => self.summary(entity, args),
            Operation::Queries { entity, argument } => self.queries(entity, argument.as_deref(), args),
            Operation::Datasets => self.datasets(args),
            Operation::Resources => self.resources(args),
        };
        match outcome {
            Err(OmnipathError::InvalidArguments(problems)) => Ok(Response::Invalid(invalid_message(&problems))),
            other => other,
        }
    }

    /// Normalizes and compiles a data request without running it.
    pub fn compile(&self, entity: EntityType, raw: &RawArgs) -> Result<Query> {
        let catalog = self.catalog()?;
        let params = catalog.params.get(entity);
        let context = Context { resources: catalog.registry.resources_of(entity) };
        compile(params, normalize(raw, params, context)?)
    }

    fn data(&self, entity: EntityType, raw: &RawArgs) -> Result<Response> {
        let catalog = self.catalog()?;
        self.run(&catalog, catalog.params.get(entity), raw, |query, _| Ok(query), false)
    }

    fn summary(&self, entity: EntityType, raw: &RawArgs) -> Result<Response> {
        let catalog = self.catalog()?;
        let Some(params) = catalog.params.summary(entity) else {
            return Err(OmnipathError::invalid(format!(" ==> No summary for `{entity}`")));
        };
        let annotations = entity == EntityType::Annotations;
        let narrow = |mut query: Query, args: &Args| {
            if annotations && args.flag("cytoscape") {
                let terms = query.predicate.take().into_iter().chain([cytoscape_predicate()]).collect();
                query.predicate = Some(Predicate::and(terms));
            }
            Ok(query)
        };
        self.run(&catalog, params, raw, narrow, annotations)
    }

    /// Normalizes, compiles and streams one request through the license filter.
    fn run(
        &self,
        catalog: &Catalog,
        params: &QueryParams,
        raw: &RawArgs,
        narrow: impl FnOnce(Query, &Args) -> Result<Query>,
        collapse: bool,
    ) -> Result<Response> {
        let id = QUERY_IDS.fetch_add(1, Ordering::Relaxed) + 1;
        let span = info_span!("query", id);
        let _entered = span.enter();

        let entity = params.entity;
        let context = Context { resources: catalog.registry.resources_of(entity) };
        let args = normalize(raw, params, context)?;
        let format = args.format().unwrap_or(self.default_format);
        let tier = args.license().unwrap_or(self.default_license);
        let header = args.header().unwrap_or(true);
        let mut query = narrow(compile(params, args.clone())?, &args)?;
        info!(%entity, ?format, license = %tier, "query compiled");
        if format == Format::Query {
            return Ok(Response::Query(query));
        }

        let columns: Arc<[String]> = query.columns.clone().into();
        let filter = LicenseFilter::new(&catalog.registry, tier, params, &columns);
        // Rows dropped or folded after the cursor would not count, so the limit moves behind them.
        let limit = query.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        if filter.is_some() || collapse {
            query.limit = None;
        }
        let rows = licensed(self.store.stream(&query)?, filter);
        let rows: RowIter = if collapse {
            Box::new(collapse_values(rows).take(limit))
        } else {
            Box::new(rows.take(limit))
        };
        Ok(match format {
            Format::Raw => Response::Records {
                columns: Arc::clone(&columns),
                records: Box::new(Logged::new(records(rows, columns), span.clone())),
            },
            Format::Json => Response::Chunks {
                format,
                chunks: Box::new(Logged::new(json(rows, columns), span.clone())),
            },
            Format::Tsv | Format::Query => Response::Chunks {
                format: Format::Tsv,
                chunks: Box::new(Logged::new(tsv(rows, columns, header), span.clone())),
            },
        })
    }

    fn queries(&self, entity: Option<EntityType>, argument: Option<&str>, raw: &RawArgs) -> Result<Response> {
        let format = meta_format(raw)?;
        let catalog = self.catalog()?;
        let vocabularies = |params: &QueryParams| -> BTreeMap<&'static str, Vec<String>> {
            params
                .arguments
                .iter()
                .map(|a| (a.name, allowed_values(params, &catalog.registry, a.vocabulary)))
                .collect()
        };

        let text = match (entity, argument) {
            (Some(entity), Some(argument)) => {
                let params = catalog.params.get(entity);
                let Some(spec) = params.argument(params.canonical(argument)) else {
                    return Err(OmnipathError::invalid(format!(
                        " ==> No argument `{argument}` for `{}`",
                        entity.table()
                    )));
                };
                let values = allowed_values(params, &catalog.registry, spec.vocabulary);
                match format {
                    Format::Json => serde_json::to_string(&values)?,
                    _ => lines(values.iter().map(String::as_str)),
                }
            }
            (Some(entity), None) => {
                let map = vocabularies(catalog.params.get(entity));
                match format {
                    Format::Json => serde_json::to_string(&map)?,
                    _ => lines(map.iter().map(|(arg, values)| format!("{arg}\t{}", values.join(";")))),
                }
            }
            (None, _) => {
                let map: BTreeMap<String, BTreeMap<&'static str, Vec<String>>> = catalog
                    .params
                    .iter()
                    .map(|p| (p.entity.table().to_string(), vocabularies(p)))
                    .collect();
                match format {
                    Format::Json => serde_json::to_string(&map)?,
                    _ => lines(map.keys().map(String::as_str)),
                }
            }
        };
        Ok(single_chunk(format, text))
    }

    fn datasets(&self, raw: &RawArgs) -> Result<Response> {
        let format = meta_format(raw)?;
        let datasets: Vec<String> = self.catalog()?.registry.datasets().into_iter().collect();
        let text = match format {
            Format::Json => serde_json::to_string(&datasets)?,
            _ => format!("{}\n", datasets.join(";")),
        };
        Ok(single_chunk(format, text))
    }

    fn resources(&self, raw: &RawArgs) -> Result<Response> {
        let tier = match raw.get("license") {
            Some(value) => {
                let token = value.tokens().concat();
                LicenseTier::parse(&token)
                    .ok_or_else(|| OmnipathError::invalid(format!(" ==> Unknown license: `{token}`")))?
            }
            None => self.default_license,
        };
        let entities = match raw.get("datasets") {
            Some(value) => value
                .tokens()
                .iter()
                .map(|t| {
                    EntityType::from_name(t)
                        .ok_or_else(|| OmnipathError::invalid(format!(" ==> Unknown query type: `{t}`")))
                })
                .collect::<Result<Vec<_>>>()?,
            None => EntityType::ALL.to_vec(),
        };
        let catalog = self.catalog()?;
        let selected: BTreeMap<&String, _> = catalog
            .registry
            .iter()
            .filter(|(name, _)| catalog.registry.enables(name, tier))
            .filter(|(_, entry)| entities.iter().any(|e| entry.queries.contains_key(e)))
            .collect();
        Ok(single_chunk(Format::Json, serde_json::to_string(&selected)?))
    }
}

fn invalid_message(problems: &[String]) -> String {
    format!(
        "Something is not entirely good:\n{}\n\nPlease check the valid arguments and values, e.g. at /queries/interactions\n",
        problems.join("\n")
    )
}

fn meta_format(raw: &RawArgs) -> Result<Format> {
    match raw.get("format") {
        None => Ok(Format::Tsv),
        Some(value) => {
            let token = value.tokens().concat();
            match Format::parse(&token) {
                Some(Format::Json) => Ok(Format::Json),
                Some(Format::Tsv) => Ok(Format::Tsv),
                _ => Err(OmnipathError::invalid(format!(" ==> Unsupported format: `{token}`"))),
            }
        }
    }
}

fn lines<S: AsRef<str>>(items: impl Iterator<Item = S>) -> String {
    let mut text = String::new();
    for item in items {
        text.push_str(item.as_ref());
        text.push('\n');
    }
    text
}

fn single_chunk(format: Format, text: String) -> Response {
    Response::Chunks { format, chunks: Box::new(std::iter::once(Ok(text))) }
}

fn allowed_values(params: &QueryParams, registry: &Registry, vocabulary: Vocabulary) -> Vec<String> {
    let mut values: Vec<String> = match vocabulary {
        Vocabulary::Any | Vocabulary::Integer => Vec::new(),
        Vocabulary::Bool => ["0", "1", "no", "yes", "false", "true"].map(String::from).to_vec(),
        Vocabulary::Operator => vec!["AND".to_string(), "OR".to_string()],
        Vocabulary::Closed(allowed) => allowed.iter().map(|v| v.to_string()).collect(),
        Vocabulary::Fields => params.field_names().into_iter().map(String::from).collect(),
        Vocabulary::Resources => registry
            .resources_of(params.entity)
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default(),
    };
    values.sort();
    values
}

/// Logs the end of a streamed response inside its query span.
struct Logged<I> {
    inner: I,
    span: Span,
    started: Instant,
    items: usize,
    finished: bool,
}

impl<I> Logged<I> {
    fn new(inner: I, span: Span) -> Self {
        Self { inner, span, started: Instant::now(), items: 0, finished: false }
    }
}

impl<I, T> Iterator for Logged<I>
where
    I: Iterator<Item = Result<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let _entered = self.span.enter();
        let item = self.inner.next();
        let ms = self.started.elapsed().as_secs_f64() * 1000.0;
        match &item {
            Some(Ok(_)) => self.items += 1,
            Some(Err(e)) => {
                self.finished = true;
                warn!(error = %e, chunks = self.items, ms, "query failed while streaming");
            }
            None => {
                self.finished = true;
                info!(ms, chunks = self.items, "query complete");
            }
        }
        item
    }
}
