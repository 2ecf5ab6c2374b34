//! Column catalog of the served tables.
//!
//! Each entity table is a flat row set with a fixed, ordered column list. The
//! query compiler only ever looks at the [`ColumnKind`] of a column to decide
//! which operator a filter turns into, so this module is the single source of
//! typing information for everything downstream. The surrogate `id` key is
//! part of the stored table but deliberately absent from the catalog, which
//! keeps it out of every select list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OmnipathError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Interactions,
    Enzsub,
    Complexes,
    Annotations,
    Intercell,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Interactions,
        EntityType::Enzsub,
        EntityType::Complexes,
        EntityType::Annotations,
        EntityType::Intercell,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Interactions => "interactions",
            Self::Enzsub => "enzsub",
            Self::Complexes => "complexes",
            Self::Annotations => "annotations",
            Self::Intercell => "intercell",
        }
    }

    /// Resolves an operation name, accepting the historical synonyms.
    pub fn from_name(name: &str) -> Option<Self> {
        let entity = match name {
            "interactions" | "interaction" | "network" => Self::Interactions,
            "enzsub" | "enz_sub" | "enz-sub" | "ptms" | "ptm" | "enzyme-substrate"
            | "enzyme_substrate" => Self::Enzsub,
            "annotations" | "annotation" | "annot" => Self::Annotations,
            "intercell" | "intercellular" | "inter_cell" | "inter-cell" => Self::Intercell,
            "complexes" | "complex" => Self::Complexes,
            _ => return None,
        };
        Some(entity)
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            Self::Interactions => INTERACTIONS,
            Self::Enzsub => ENZSUB,
            Self::Complexes => COMPLEXES,
            Self::Annotations => ANNOTATIONS,
            Self::Intercell => INTERCELL,
        }
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// Like [`EntityType::column`], for callers holding names that were validated at startup.
    pub fn require_column(&self, name: &str) -> Result<&'static Column> {
        self.column(name).ok_or_else(|| {
            OmnipathError::Schema(format!("table `{}` has no column `{}`", self.table(), name))
        })
    }

    /// Position of a column in the catalog order, used to keep select lists stable.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns().iter().position(|c| c.name == name)
    }
}

impl FromStr for EntityType {
    type Err = OmnipathError;

    fn from_str(name: &str) -> Result<Self> {
        Self::from_name(name).ok_or_else(|| OmnipathError::invalid(format!(" ==> Unknown query type: `{name}`")))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Integer,
    Boolean,
    /// Ordered list of strings.
    Array,
    /// Ordered list of `resource:identifier` strings.
    PrefixedArray,
    /// Free-form JSON object.
    Json,
}

impl ColumnKind {
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array | Self::PrefixedArray)
    }

    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Integer | Self::Boolean => "integer",
            Self::Text | Self::Array | Self::PrefixedArray | Self::Json => "text",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

use ColumnKind::{Array, Boolean, Integer, Json, PrefixedArray, Text};

static INTERACTIONS: &[Column] = &[
    col("source", Text),
    col("target", Text),
    col("source_genesymbol", Text),
    col("target_genesymbol", Text),
    col("is_directed", Boolean),
    col("is_stimulation", Boolean),
    col("is_inhibition", Boolean),
    col("consensus_direction", Boolean),
    col("consensus_stimulation", Boolean),
    col("consensus_inhibition", Boolean),
    col("sources", Array),
    col("references", PrefixedArray),
    col("omnipath", Boolean),
    col("kinaseextra", Boolean),
    col("ligrecextra", Boolean),
    col("pathwayextra", Boolean),
    col("mirnatarget", Boolean),
    col("dorothea", Boolean),
    col("collectri", Boolean),
    col("tf_target", Boolean),
    col("lncrna_mrna", Boolean),
    col("tf_mirna", Boolean),
    col("small_molecule", Boolean),
    col("dorothea_curated", Boolean),
    col("dorothea_chipseq", Boolean),
    col("dorothea_tfbs", Boolean),
    col("dorothea_coexp", Boolean),
    col("dorothea_level", Array),
    col("type", Text),
    col("curation_effort", Integer),
    col("extra_attrs", Json),
    col("evidences", Json),
    col("ncbi_tax_id_source", Integer),
    col("entity_type_source", Text),
    col("ncbi_tax_id_target", Integer),
    col("entity_type_target", Text),
];

static ENZSUB: &[Column] = &[
    col("enzyme", Text),
    col("enzyme_genesymbol", Text),
    col("substrate", Text),
    col("substrate_genesymbol", Text),
    col("isoforms", Array),
    col("residue_type", Text),
    col("residue_offset", Integer),
    col("modification", Text),
    col("sources", Array),
    col("references", PrefixedArray),
    col("curation_effort", Integer),
    col("ncbi_tax_id", Integer),
];

static COMPLEXES: &[Column] = &[
    col("name", Text),
    col("components", Array),
    col("components_genesymbols", Array),
    col("stoichiometry", Text),
    col("sources", Array),
    col("references", Array),
    col("identifiers", PrefixedArray),
];

static ANNOTATIONS: &[Column] = &[
    col("uniprot", Text),
    col("genesymbol", Text),
    col("entity_type", Text),
    col("source", Text),
    col("label", Text),
    col("value", Text),
    col("record_id", Integer),
];

static INTERCELL: &[Column] = &[
    col("category", Text),
    col("parent", Text),
    col("database", Text),
    col("scope", Text),
    col("aspect", Text),
    col("source", Text),
    col("uniprot", Text),
    col("genesymbol", Text),
    col("entity_type", Text),
    col("consensus_score", Integer),
    col("transmitter", Boolean),
    col("receiver", Boolean),
    col("secreted", Boolean),
    col("plasma_membrane_transmembrane", Boolean),
    col("plasma_membrane_peripheral", Boolean),
];

/// Columns of the license reference table, consumed only by the registry.
pub static LICENSES: &[Column] = &[
    col("resource", Text),
    col("name", Text),
    col("full_name", Text),
    col("purpose", Text),
    col("attrib", Text),
    col("sharing", Text),
    col("url", Text),
];

pub const LICENSES_TABLE: &str = "licenses";

/// `create table` statement for a column list, always prefixed by the surrogate key.
pub fn create_table_sql(table: &str, columns: &[Column]) -> String {
    let body = columns
        .iter()
        .map(|c| format!("    \"{}\" {}", c.name, c.kind.sql_type()))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "create table if not exists {table} (\n    id integer primary key,\n{body}\n);"
    )
}
