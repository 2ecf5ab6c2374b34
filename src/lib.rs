//! OmniPath server – a license-aware query compiler and result streamer for
//! molecular interaction, enzyme-substrate, complex, annotation and
//! intercellular communication tables.
//!
//! A request names an *operation* (one of the entity tables or a
//! meta-operation) and a flat multi-valued argument map. It flows through a
//! single lazy pipeline:
//! * [`args`] normalizes the raw arguments against the entity's
//!   [`params::QueryParams`] (synonyms, list splitting, vocabulary checks).
//! * [`query`] compiles them into a [`query::Query`]: ordered select list,
//!   predicate tree and limit, with operators inferred from the column kinds
//!   in the [`schema`] catalog.
//! * [`store`] runs the query on a cursor thread and streams decoded rows.
//! * [`license`] drops or prunes rows by the resources the requested license
//!   tier enables, as resolved by the [`registry`].
//! * [`format`] encodes the rows as TSV or JSON text chunks, using the
//!   one-row lookahead of [`stream::WithLast`] to close JSON output.
//!
//! ## Modules
//! * [`schema`] – Column catalog of the served tables.
//! * [`params`] – Per-entity argument declarations and their column mapping.
//! * [`args`] – Request argument normalization.
//! * [`query`] – Predicate tree, compiler, SQL and text rendering.
//! * [`registry`] – Resources, licenses and the enabled set per tier.
//! * [`license`] – Row level license filter.
//! * [`stream`] – Lookahead iterator adapter.
//! * [`format`] – TSV, JSON and raw record output.
//! * [`store`] – SQLite storage and row streaming.
//! * [`summary`] – Annotation and intercell summaries.
//! * [`service`] – Operation dispatch, meta-operations and reload.
//! * [`server`] – HTTP adapter.
//! * [`settings`] – Layered configuration.
//! * [`error`] – Crate error type.
//!
//! ## Quick Start
//! ```
//! use omnipath_server::{args::RawArgs, service::{Operation, Service}};
//! use omnipath_server::{settings::ServiceSettings, store::Store};
//! let store = Store::in_memory("quick-start", 100).unwrap();
//! store.create_schema().unwrap();
//! let service = Service::new(store, &ServiceSettings::default()).unwrap();
//! let args = RawArgs::new().with("enzymes", "P06239").with("format", "query");
//! let text = service.handle(Operation::Data("enzsub".parse().unwrap()), &args)
//!     .unwrap()
//!     .into_text()
//!     .unwrap();
//! assert!(text.starts_with("SELECT enzyme, substrate"));
//! ```

pub mod args;
pub mod error;
pub mod format;
pub mod license;
pub mod params;
pub mod query;
pub mod registry;
pub mod schema;
pub mod server;
pub mod service;
pub mod settings;
pub mod store;
pub mod stream;
pub mod summary;

pub use error::{OmnipathError, Result};
pub use schema::EntityType;
