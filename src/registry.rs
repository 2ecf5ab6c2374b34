//! Resource and license registry.
//!
//! Resources are discovered from the stored tables, licenses come from the
//! license reference table. Composite resources (a resource assembled from
//! others, named `<component>_<composite>`) are enabled whenever one of their
//! components is. The enabled sets are computed once per license tier when the
//! registry is built, so the per-row license filter only does set lookups.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

// resource names are looked up once per row and attribution
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::schema::EntityType;
use crate::store::{LicenseRecord, Store};

pub type ResourceHasher = BuildHasherDefault<SeaHasher>;
pub type ResourceSet = HashSet<String, ResourceHasher>;

/// Column holding resource attributions, by priority.
const RESOURCE_COLUMNS: &[&str] = &["database", "sources", "source", "category"];

/// Resource attribution column of an entity table.
pub fn resource_column(entity: EntityType) -> Option<&'static str> {
    RESOURCE_COLUMNS.iter().copied().find(|c| entity.column(c).is_some())
}

/// Intended use permitted by a resource license.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicensePurpose {
    Commercial,
    Academic,
    /// License is derived from the component resources.
    Composite,
    /// Never enabled.
    Unlicensed,
}

impl LicensePurpose {
    pub fn parse(purpose: Option<&str>) -> Self {
        match purpose.map(|p| p.trim().to_ascii_lowercase()).as_deref() {
            Some("commercial" | "for_profit" | "forprofit") => Self::Commercial,
            Some("academic" | "non_profit" | "nonprofit") => Self::Academic,
            Some("ignore" | "composite") => Self::Composite,
            _ => Self::Unlicensed,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Self::Commercial => 1,
            Self::Academic => 2,
            Self::Composite => 3,
            Self::Unlicensed => u8::MAX,
        }
    }
}

/// License level of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseTier {
    Commercial,
    Academic,
    /// No filtering at all.
    Ignore,
}

impl LicenseTier {
    pub fn parse(tier: &str) -> Option<Self> {
        match tier.trim().to_ascii_lowercase().as_str() {
            "commercial" | "for_profit" | "forprofit" => Some(Self::Commercial),
            "academic" | "non_profit" | "nonprofit" => Some(Self::Academic),
            "ignore" => Some(Self::Ignore),
            _ => None,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Self::Commercial => 1,
            Self::Academic => 2,
            Self::Ignore => u8::MAX,
        }
    }

    /// A purpose is admitted if it is at most as restrictive as the tier.
    pub fn admits(&self, purpose: LicensePurpose) -> bool {
        purpose != LicensePurpose::Composite && purpose.rank() <= self.rank()
    }
}

impl fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Commercial => "commercial",
            Self::Academic => "academic",
            Self::Ignore => "ignore",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    pub full_name: Option<String>,
    pub purpose: LicensePurpose,
    pub url: Option<String>,
}

impl License {
    fn unlicensed() -> Self {
        Self {
            name: "unknown".to_string(),
            full_name: None,
            purpose: LicensePurpose::Unlicensed,
            url: None,
        }
    }
}

/// Licenses by resource name, as read from the license table.
#[derive(Clone, Debug, Default)]
pub struct LicenseCatalog {
    licenses: HashMap<String, License, ResourceHasher>,
}

impl LicenseCatalog {
    pub fn from_records(records: impl IntoIterator<Item = LicenseRecord>) -> Self {
        let licenses = records
            .into_iter()
            .map(|r| {
                let license = License {
                    name: r.name.unwrap_or_else(|| "unknown".to_string()),
                    full_name: r.full_name,
                    purpose: LicensePurpose::parse(r.purpose.as_deref()),
                    url: r.url,
                };
                (r.resource, license)
            })
            .collect();
        Self { licenses }
    }

    pub fn get(&self, resource: &str) -> Option<&License> {
        self.licenses.get(resource)
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    /// License of a resource, inheriting from the name prefix before the first `_`
    /// when the resource itself has no license of its own.
    pub fn resolve(&self, resource: &str) -> Option<License> {
        let own = self.get(resource);
        let needs_prefix = own.is_none_or(|l| {
            matches!(l.purpose, LicensePurpose::Composite | LicensePurpose::Unlicensed)
        });
        if needs_prefix {
            if let Some((prefix, _)) = resource.split_once('_') {
                if let Some(inherited) = self.get(prefix) {
                    if !matches!(inherited.purpose, LicensePurpose::Composite | LicensePurpose::Unlicensed) {
                        return Some(inherited.clone());
                    }
                }
            }
        }
        own.cloned()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInfo {
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub datasets: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub generic_categories: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub license: License,
    pub queries: BTreeMap<EntityType, QueryInfo>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub components: BTreeSet<String>,
}

/// Collects resource observations before licenses are resolved.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    seen: BTreeMap<String, BTreeMap<EntityType, QueryInfo>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, entity: EntityType, resource: &str) -> &mut QueryInfo {
        self.seen
            .entry(resource.to_string())
            .or_default()
            .entry(entity)
            .or_default()
    }

    pub fn dataset(&mut self, resource: &str, dataset: &str) {
        self.observe(EntityType::Interactions, resource)
            .datasets
            .insert(dataset.to_string());
    }

    pub fn generic_category(&mut self, resource: &str, category: &str) {
        self.observe(EntityType::Intercell, resource)
            .generic_categories
            .insert(category.to_string());
    }

    /// Collects the resources of every table in the store.
    pub fn scan(mut self, store: &Store, datasets: &[&str]) -> Result<Self> {
        for entity in EntityType::ALL {
            let Some(column) = resource_column(entity) else { continue };
            for resource in store.distinct_values(entity, column, None)? {
                self.observe(entity, &resource);
            }
        }
        if let Some(column) = resource_column(EntityType::Interactions) {
            for dataset in datasets {
                for resource in store.distinct_values(EntityType::Interactions, column, Some(*dataset))? {
                    self.dataset(&resource, dataset);
                }
            }
        }
        for (resource, category) in
            store.distinct_pairs(EntityType::Intercell, "database", "category", ("scope", "generic"))?
        {
            self.generic_category(&resource, &category);
        }
        Ok(self)
    }

    pub fn finish(self, licenses: &LicenseCatalog) -> Registry {
        let mut resources = BTreeMap::new();
        for (name, queries) in self.seen {
            let license = licenses.resolve(&name).unwrap_or_else(|| {
                warn!(resource = %name, "no license found, resource is never enabled");
                License::unlicensed()
            });
            resources.insert(name, ResourceEntry { license, queries, components: BTreeSet::new() });
        }

        let composites: Vec<String> = resources
            .iter()
            .filter(|(_, e)| e.license.purpose == LicensePurpose::Composite)
            .map(|(n, _)| n.clone())
            .collect();
        for composite in composites {
            let suffix = format!("_{composite}");
            let components: BTreeSet<String> = resources
                .keys()
                .filter(|k| k.ends_with(&suffix))
                .cloned()
                .collect();
            if let Some(entry) = resources.get_mut(&composite) {
                entry.components = components;
            }
        }

        let mut enabled = HashMap::new();
        for tier in [LicenseTier::Academic, LicenseTier::Commercial] {
            let set = enabled_resources(&resources, tier);
            debug!(%tier, enabled = set.len(), total = resources.len(), "license tier resolved");
            enabled.insert(tier, Arc::new(set));
        }

        let mut by_entity: BTreeMap<EntityType, BTreeSet<String>> = BTreeMap::new();
        for (name, entry) in &resources {
            for entity in entry.queries.keys() {
                by_entity.entry(*entity).or_default().insert(name.clone());
            }
        }

        Registry { resources, by_entity, enabled }
    }
}

/// Resources admitted by a tier, including composites enabled by a component.
fn enabled_resources(resources: &BTreeMap<String, ResourceEntry>, tier: LicenseTier) -> ResourceSet {
    let mut set: ResourceSet = resources
        .iter()
        .filter(|(_, e)| tier.admits(e.license.purpose))
        .map(|(n, _)| n.clone())
        .collect();
    // Composites may themselves be components of other composites.
    loop {
        let newly: Vec<String> = resources
            .iter()
            .filter(|(n, e)| {
                e.license.purpose == LicensePurpose::Composite
                    && !set.contains(n.as_str())
                    && e.components.iter().any(|c| set.contains(c))
            })
            .map(|(n, _)| n.clone())
            .collect();
        if newly.is_empty() {
            break;
        }
        set.extend(newly);
    }
    set
}

/// Resources, their licenses and the precomputed enabled sets.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    resources: BTreeMap<String, ResourceEntry>,
    by_entity: BTreeMap<EntityType, BTreeSet<String>>,
    enabled: HashMap<LicenseTier, Arc<ResourceSet>>,
}

impl Registry {
    pub fn build(store: &Store, licenses: &LicenseCatalog, datasets: &[&str]) -> Result<Self> {
        Ok(RegistryBuilder::new().scan(store, datasets)?.finish(licenses))
    }

    pub fn get(&self, resource: &str) -> Option<&ResourceEntry> {
        self.resources.get(resource)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceEntry)> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resource names present in one entity table.
    pub fn resources_of(&self, entity: EntityType) -> Option<&BTreeSet<String>> {
        self.by_entity.get(&entity)
    }

    /// Enabled set of a tier; `None` means the tier does not filter.
    pub fn enabled(&self, tier: LicenseTier) -> Option<Arc<ResourceSet>> {
        match tier {
            LicenseTier::Ignore => None,
            _ => Some(self.enabled.get(&tier).cloned().unwrap_or_default()),
        }
    }

    pub fn enables(&self, resource: &str, tier: LicenseTier) -> bool {
        match self.enabled(tier) {
            None => true,
            Some(set) => set.contains(resource),
        }
    }

    /// Dataset names recorded for interaction resources.
    pub fn datasets(&self) -> BTreeSet<String> {
        self.resources
            .values()
            .filter_map(|e| e.queries.get(&EntityType::Interactions))
            .flat_map(|q| q.datasets.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(resource: &str, purpose: Option<&str>) -> LicenseRecord {
        LicenseRecord {
            resource: resource.to_string(),
            name: Some(format!("{resource}-license")),
            full_name: None,
            purpose: purpose.map(String::from),
            attrib: None,
            sharing: None,
            url: None,
        }
    }

    #[test]
    fn purposes_parse_with_synonyms() {
        assert_eq!(LicensePurpose::parse(Some("for_profit")), LicensePurpose::Commercial);
        assert_eq!(LicensePurpose::parse(Some("Non_Profit")), LicensePurpose::Academic);
        assert_eq!(LicensePurpose::parse(Some("ignore")), LicensePurpose::Composite);
        assert_eq!(LicensePurpose::parse(None), LicensePurpose::Unlicensed);
    }

    #[test]
    fn prefix_inherits_license() {
        let catalog = LicenseCatalog::from_records([record("SIGNOR", Some("academic"))]);
        let license = catalog.resolve("SIGNOR_CollecTRI").unwrap();
        assert_eq!(license.purpose, LicensePurpose::Academic);
        assert!(catalog.resolve("Unknown_Thing").is_none());
    }

    #[test]
    fn tiers_are_monotonic() {
        let catalog = LicenseCatalog::from_records([
            record("A", Some("commercial")),
            record("B", Some("academic")),
            record("C", None),
        ]);
        let mut builder = RegistryBuilder::new();
        for r in ["A", "B", "C"] {
            builder.observe(EntityType::Interactions, r);
        }
        let registry = builder.finish(&catalog);
        let commercial = registry.enabled(LicenseTier::Commercial).unwrap();
        let academic = registry.enabled(LicenseTier::Academic).unwrap();
        assert!(commercial.iter().all(|r| academic.contains(r)));
        assert!(academic.contains("B") && !commercial.contains("B"));
        assert!(!academic.contains("C"));
        assert!(registry.enabled(LicenseTier::Ignore).is_none());
    }
}
