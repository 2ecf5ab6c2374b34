//! Runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional `omnipath.toml`
//! (or the file named by `OMNIPATH_CONFIG`), then `OMNIPATH_*` environment
//! variables with `__` between nested keys, e.g. `OMNIPATH_SERVER__LISTEN`.

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{OmnipathError, Result};
use crate::format::Format;
use crate::registry::LicenseTier;

pub const DEFAULT_CONFIG_FILE: &str = "omnipath.toml";

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    /// Rows buffered between the cursor thread and the consumer.
    pub chunk_size: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerSettings {
    pub listen: String,
    /// Allow `format=query` and `format=raw` over HTTP.
    pub expose_query_format: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServiceSettings {
    pub default_license: String,
    pub default_format: String,
}

impl ServiceSettings {
    pub fn license(&self) -> Result<LicenseTier> {
        LicenseTier::parse(&self.default_license).ok_or_else(|| {
            OmnipathError::Config(format!("unknown default license `{}`", self.default_license))
        })
    }

    pub fn format(&self) -> Result<Format> {
        Format::parse(&self.default_format).ok_or_else(|| {
            OmnipathError::Config(format!("unknown default format `{}`", self.default_format))
        })
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self { default_license: "academic".to_string(), default_format: "tsv".to_string() }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogSettings {
    pub filter: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub service: ServiceSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Loads from the default file location and the environment.
    pub fn load() -> Result<Self> {
        let file = std::env::var("OMNIPATH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_file(&file, false)
    }

    pub fn from_file(path: &str, required: bool) -> Result<Self> {
        let settings = Config::builder()
            .set_default("database.path", "omnipath.sqlite")?
            .set_default("database.chunk_size", 1000)?
            .set_default("server.listen", "127.0.0.1:44444")?
            .set_default("server.expose_query_format", false)?
            .set_default("service.default_license", "academic")?
            .set_default("service.default_format", "tsv")?
            .set_default("log.filter", "info")?
            .add_source(File::with_name(path).required(required))
            .add_source(
                Environment::with_prefix("OMNIPATH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let settings: Settings = settings.try_deserialize()?;
        settings.service.license()?;
        settings.service.format()?;
        Ok(settings)
    }
}
