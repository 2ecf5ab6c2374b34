//! Per-entity query parameter maps.
//!
//! A [`QueryParams`] value declares, for one entity table, which request
//! arguments exist and how each of them turns into columns of the select
//! list or predicates of the where clause. The maps are plain data built once
//! by [`ParamMap::standard`] and checked against the schema catalog by
//! [`ParamMap::validate`], so a typo in a column name fails at startup rather
//! than in the middle of a request.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{OmnipathError, Result};
use crate::schema::EntityType;

pub const FORMATS: &[&str] = &["json", "tab", "text", "tsv", "table", "raw", "query"];

pub const LICENSES: &[&str] = &[
    "ignore",
    "academic",
    "non_profit",
    "nonprofit",
    "for_profit",
    "forprofit",
    "commercial",
];

pub const ORGANISMS: &[&str] = &["9606", "10090", "10116"];

pub const ENTITY_TYPES: &[&str] = &[
    "protein",
    "complex",
    "mirna",
    "lncrna",
    "small_molecule",
    "drug",
    "metabolite",
    "lipid",
];

pub const DATASETS: &[&str] = &[
    "omnipath",
    "dorothea",
    "collectri",
    "tf_target",
    "kinaseextra",
    "ligrecextra",
    "pathwayextra",
    "mirnatarget",
    "tf_mirna",
    "lncrna_mrna",
    "small_molecule",
];

pub const INTERACTION_TYPES: &[&str] = &[
    "post_translational",
    "transcriptional",
    "post_transcriptional",
    "mirna_transcriptional",
    "lncrna_post_transcriptional",
    "small_molecule_protein",
];

pub const DOROTHEA_LEVELS: &[&str] = &["A", "B", "C", "D", "E"];

/// Allowed values of an argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vocabulary {
    Any,
    Bool,
    Integer,
    /// `AND` or `OR`, case-insensitive.
    Operator,
    Closed(&'static [&'static str]),
    /// Field names known to the entity's select map.
    Fields,
    /// Resource names discovered by the registry (open until discovery ran).
    Resources,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    /// Array arguments are always delivered to the compiler as lists.
    pub array: bool,
    pub vocabulary: Vocabulary,
}

const fn arg(name: &'static str, array: bool, vocabulary: Vocabulary) -> ArgSpec {
    ArgSpec { name, array, vocabulary }
}

/// Rewrites deprecated argument values, e.g. `tfregulons` into `dorothea`.
#[derive(Clone, Copy, Debug)]
pub struct ValueRewrite {
    pub args: &'static [&'static str],
    pub from: &'static str,
    pub to: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combine {
    And,
    Or,
}

impl Combine {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PartnerSide {
    pub arg: &'static str,
    /// Matching any of these columns satisfies the side.
    pub columns: &'static [&'static str],
}

/// Two symmetric sides (source/target, enzyme/substrate) sharing one filter.
#[derive(Clone, Copy, Debug)]
pub struct PartnerSpec {
    pub sides: [PartnerSide; 2],
    /// Populates both sides when neither is given.
    pub both: &'static str,
    pub operator_arg: &'static str,
    pub default_operator: Combine,
    pub loops_arg: &'static str,
    pub loop_columns: (&'static str, &'static str),
}

#[derive(Clone, Copy, Debug)]
pub enum FlagValues {
    /// Each requested value selects a disjunction of boolean columns.
    Named(&'static [(&'static str, &'static [&'static str])]),
    /// A boolean argument: true requires any of the columns, false adds nothing.
    Switch(&'static [&'static str]),
}

/// Replaces the boolean check of one flag value once its trigger argument is present.
#[derive(Clone, Copy, Debug)]
pub struct FlagOverride {
    pub trigger: &'static str,
    pub column: &'static str,
    /// Trigger values assumed when the flag is requested without them.
    pub default_values: &'static [&'static str],
    /// Flag groups narrowing only the rows of this value; ignored unless it is requested.
    pub refine: &'static [&'static str],
}

#[derive(Clone, Debug)]
pub struct FlagGroup {
    pub arg: &'static str,
    pub values: FlagValues,
    pub overrides: BTreeMap<&'static str, FlagOverride>,
}

impl FlagGroup {
    fn new(arg: &'static str, values: FlagValues) -> Self {
        Self { arg, values, overrides: BTreeMap::new() }
    }

    fn with_override(mut self, value: &'static str, spec: FlagOverride) -> Self {
        self.overrides.insert(value, spec);
        self
    }

    pub fn columns(&self) -> Vec<&'static str> {
        match self.values {
            FlagValues::Named(values) => values.iter().flat_map(|(_, c)| c.iter().copied()).collect(),
            FlagValues::Switch(columns) => columns.to_vec(),
        }
    }

    pub fn value_names(&self) -> Vec<&'static str> {
        match self.values {
            FlagValues::Named(values) => values.iter().map(|(v, _)| *v).collect(),
            FlagValues::Switch(_) => Vec::new(),
        }
    }

    /// Boolean columns of the requested values, in declaration order.
    pub fn columns_for(&self, requested: &[String]) -> Vec<&'static str> {
        match self.values {
            FlagValues::Named(values) => values
                .iter()
                .filter(|(v, _)| requested.iter().any(|r| r == v))
                .flat_map(|(_, c)| c.iter().copied())
                .collect(),
            FlagValues::Switch(columns) => columns.to_vec(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum DefaultValue {
    List(&'static [&'static str]),
    Bool(bool),
}

/// Keeps a query from scanning the whole table when no scoping argument was given.
#[derive(Clone, Copy, Debug)]
pub struct DomainDefault {
    pub unless_any: &'static [&'static str],
    pub arg: &'static str,
    pub value: DefaultValue,
}

/// Where the license filter finds resource attributions.
#[derive(Clone, Copy, Debug)]
pub struct LicenseColumns {
    pub resource: &'static str,
    pub prefixed: &'static [&'static str],
}

#[derive(Clone, Debug)]
pub struct QueryParams {
    pub entity: EntityType,
    pub arguments: Vec<ArgSpec>,
    pub arg_synonyms: &'static [(&'static str, &'static str)],
    pub value_rewrites: &'static [ValueRewrite],
    pub select: &'static [&'static str],
    pub fields: &'static [(&'static str, &'static [&'static str])],
    /// Boolean arguments that add columns to the select list.
    pub switch_select: &'static [(&'static str, &'static [&'static str])],
    /// Where-arguments; more than one column means any of them may match.
    pub filters: &'static [(&'static str, &'static [&'static str])],
    /// A filter asking for nothing but this value must match on all of its columns.
    pub strict_values: &'static [(&'static str, &'static str)],
    /// Fields standing for the columns of the values requested in a flag group.
    pub flag_fields: &'static [(&'static str, &'static str)],
    pub partners: Option<PartnerSpec>,
    pub flags: Vec<FlagGroup>,
    pub defaults: &'static [(&'static str, DefaultValue)],
    pub domain_default: Option<DomainDefault>,
    /// The operation refuses to run unless one of these is given.
    pub required_any: &'static [&'static str],
    pub license: LicenseColumns,
    /// Distinct, ordered rows instead of every matching record.
    pub distinct: bool,
}

impl QueryParams {
    pub fn argument(&self, name: &str) -> Option<&ArgSpec> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Canonical argument name, following the declared synonyms.
    pub fn canonical<'a>(&self, name: &'a str) -> &'a str {
        self.arg_synonyms
            .iter()
            .find(|(from, _)| *from == name)
            .map_or(name, |(_, to)| *to)
    }

    pub fn flag(&self, arg: &str) -> Option<&FlagGroup> {
        self.flags.iter().find(|f| f.arg == arg)
    }

    pub fn filter(&self, arg: &str) -> Option<&'static [&'static str]> {
        self.filters.iter().find(|(a, _)| *a == arg).map(|(_, c)| *c)
    }

    /// Whether `values` is exactly the strict value declared for `arg`.
    pub fn is_strict(&self, arg: &str, values: &[String]) -> bool {
        self.strict_values
            .iter()
            .any(|(a, v)| *a == arg && values.len() == 1 && values[0] == *v)
    }

    /// Whether a flag group only narrows an overridden flag value.
    pub fn refines(&self, arg: &str) -> bool {
        self.flags
            .iter()
            .flat_map(|g| g.overrides.values())
            .any(|o| o.refine.iter().any(|r| *r == arg))
    }

    /// The flag group a field stands for, if any.
    pub fn flag_field(&self, field: &str) -> Option<&FlagGroup> {
        self.flag_fields
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, group)| self.flag(group))
    }

    /// Every name accepted by the `fields` argument.
    pub fn field_names(&self) -> BTreeSet<&'static str> {
        self.fields
            .iter()
            .map(|(f, _)| *f)
            .chain(self.flag_fields.iter().map(|(f, _)| *f))
            .chain(self.entity.columns().iter().map(|c| c.name))
            .collect()
    }

    /// Columns a requested field stands for.
    pub fn expand_field(&self, field: &str) -> Vec<&'static str> {
        if let Some((_, columns)) = self.fields.iter().find(|(f, _)| *f == field) {
            return columns.to_vec();
        }
        self.entity.column(field).map(|c| vec![c.name]).unwrap_or_default()
    }

    fn referenced_columns(&self) -> Vec<(&'static str, &'static str)> {
        let mut columns = Vec::new();
        columns.extend(self.select.iter().map(|c| ("select", *c)));
        for (_, cols) in self.fields.iter().chain(self.switch_select) {
            columns.extend(cols.iter().map(|c| ("fields", *c)));
        }
        for (_, cols) in self.filters {
            columns.extend(cols.iter().map(|c| ("filters", *c)));
        }
        if let Some(p) = &self.partners {
            for side in &p.sides {
                columns.extend(side.columns.iter().map(|c| ("partners", *c)));
            }
            columns.push(("loops", p.loop_columns.0));
            columns.push(("loops", p.loop_columns.1));
        }
        for group in &self.flags {
            columns.extend(group.columns().into_iter().map(|c| ("flags", c)));
            columns.extend(group.overrides.values().map(|o| ("overrides", o.column)));
        }
        columns.push(("license", self.license.resource));
        columns.extend(self.license.prefixed.iter().map(|c| ("license", *c)));
        columns
    }

    fn referenced_arguments(&self) -> Vec<&'static str> {
        let mut args: Vec<&'static str> = Vec::new();
        args.extend(self.arg_synonyms.iter().map(|(_, to)| *to));
        args.extend(self.value_rewrites.iter().flat_map(|r| r.args.iter().copied()));
        args.extend(self.switch_select.iter().map(|(a, _)| *a));
        args.extend(self.filters.iter().map(|(a, _)| *a));
        args.extend(self.strict_values.iter().map(|(a, _)| *a));
        if let Some(p) = &self.partners {
            args.extend([p.sides[0].arg, p.sides[1].arg, p.both, p.operator_arg, p.loops_arg]);
        }
        for group in &self.flags {
            args.push(group.arg);
            args.extend(group.overrides.values().map(|o| o.trigger));
            args.extend(group.overrides.values().flat_map(|o| o.refine.iter().copied()));
        }
        args.extend(self.defaults.iter().map(|(a, _)| *a));
        if let Some(d) = &self.domain_default {
            args.push(d.arg);
            args.extend(d.unless_any.iter().copied());
        }
        args.extend(self.required_any.iter().copied());
        args
    }

    /// Checks every column and argument reference of this map.
    pub fn validate(&self) -> Result<()> {
        let table = self.entity.table();
        let mut problems = Vec::new();
        for (section, column) in self.referenced_columns() {
            if self.entity.column(column).is_none() {
                problems.push(format!("{table}: {section} references unknown column `{column}`"));
            }
        }
        for name in self.referenced_arguments() {
            if self.argument(name).is_none() {
                problems.push(format!("{table}: argument `{name}` is used but not declared"));
            }
        }
        for (arg, _) in self.strict_values {
            if self.filter(arg).is_none() {
                problems.push(format!("{table}: strict value for `{arg}`, which is not a filter"));
            }
        }
        let refining = self
            .flags
            .iter()
            .flat_map(|g| g.overrides.values())
            .flat_map(|o| o.refine.iter().copied());
        for arg in refining.chain(self.flag_fields.iter().map(|(_, g)| *g)) {
            if self.flag(arg).is_none() {
                problems.push(format!("{table}: `{arg}` is not a flag group"));
            }
        }
        if !self.select.contains(&self.license.resource) {
            problems.push(format!(
                "{table}: resource column `{}` must be selected by default",
                self.license.resource
            ));
        }
        // One trigger may drive only one override, otherwise precedence is undefined.
        let mut triggers = BTreeSet::new();
        for group in &self.flags {
            for spec in group.overrides.values() {
                if !triggers.insert(spec.trigger) {
                    problems.push(format!(
                        "{table}: override trigger `{}` is used more than once",
                        spec.trigger
                    ));
                }
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(OmnipathError::Schema(problems.join("; ")))
        }
    }
}

/// The parameter maps of all served entity types.
#[derive(Clone, Debug)]
pub struct ParamMap {
    maps: BTreeMap<EntityType, QueryParams>,
    summaries: BTreeMap<EntityType, QueryParams>,
}

impl ParamMap {
    pub fn standard() -> Self {
        let keyed = |maps: Vec<QueryParams>| -> BTreeMap<EntityType, QueryParams> {
            maps.into_iter().map(|p| (p.entity, p)).collect()
        };
        Self {
            maps: keyed(vec![interactions(), enzsub(), complexes(), annotations(), intercell()]),
            summaries: keyed(vec![annotations_summary(), intercell_summary()]),
        }
    }

    pub fn get(&self, entity: EntityType) -> &QueryParams {
        // `standard` covers every variant of `EntityType`.
        &self.maps[&entity]
    }

    /// Map of the summary operation over an entity table, where one exists.
    pub fn summary(&self, entity: EntityType) -> Option<&QueryParams> {
        self.summaries.get(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryParams> {
        self.maps.values()
    }

    pub fn validate(&self) -> Result<()> {
        let problems: Vec<String> = self
            .maps
            .values()
            .chain(self.summaries.values())
            .filter_map(|p| p.validate().err())
            .map(|e| e.to_string())
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(OmnipathError::Schema(problems.join("\n")))
        }
    }
}

impl Default for ParamMap {
    fn default() -> Self {
        Self::standard()
    }
}

fn common_arguments() -> Vec<ArgSpec> {
    vec![
        arg("format", false, Vocabulary::Closed(FORMATS)),
        arg("header", false, Vocabulary::Bool),
        arg("license", false, Vocabulary::Closed(LICENSES)),
        arg("limit", false, Vocabulary::Integer),
        arg("password", false, Vocabulary::Any),
        arg("fields", true, Vocabulary::Fields),
        arg("resources", true, Vocabulary::Resources),
    ]
}

const DATABASES_ARE_RESOURCES: (&str, &str) = ("databases", "resources");

fn interactions() -> QueryParams {
    static DATASET_FLAGS: &[(&str, &[&str])] = &[
        ("omnipath", &["omnipath"]),
        ("dorothea", &["dorothea"]),
        ("collectri", &["collectri"]),
        ("tf_target", &["tf_target"]),
        ("kinaseextra", &["kinaseextra"]),
        ("ligrecextra", &["ligrecextra"]),
        ("pathwayextra", &["pathwayextra"]),
        ("mirnatarget", &["mirnatarget"]),
        ("tf_mirna", &["tf_mirna"]),
        ("lncrna_mrna", &["lncrna_mrna"]),
        ("small_molecule", &["small_molecule"]),
    ];
    static DOROTHEA_METHODS: &[(&str, &[&str])] = &[
        ("curated", &["dorothea_curated"]),
        ("chipseq", &["dorothea_chipseq"]),
        ("coexp", &["dorothea_coexp"]),
        ("tfbs", &["dorothea_tfbs"]),
        ("dorothea_curated", &["dorothea_curated"]),
        ("dorothea_chipseq", &["dorothea_chipseq"]),
        ("dorothea_coexp", &["dorothea_coexp"]),
        ("dorothea_tfbs", &["dorothea_tfbs"]),
    ];
    let mut arguments = common_arguments();
    arguments.extend([
        arg("datasets", true, Vocabulary::Closed(DATASETS)),
        arg("types", true, Vocabulary::Closed(INTERACTION_TYPES)),
        arg("sources", true, Vocabulary::Any),
        arg("targets", true, Vocabulary::Any),
        arg("partners", true, Vocabulary::Any),
        arg("genesymbols", false, Vocabulary::Bool),
        arg("dorothea_levels", true, Vocabulary::Closed(DOROTHEA_LEVELS)),
        arg("dorothea_methods", true, Vocabulary::Closed(&[
            "curated",
            "chipseq",
            "coexp",
            "tfbs",
            "dorothea_curated",
            "dorothea_chipseq",
            "dorothea_coexp",
            "dorothea_tfbs",
        ])),
        arg("organisms", true, Vocabulary::Closed(ORGANISMS)),
        arg("source_target", false, Vocabulary::Operator),
        arg("directed", false, Vocabulary::Bool),
        arg("signed", false, Vocabulary::Bool),
        arg("loops", false, Vocabulary::Bool),
        arg("entity_types", true, Vocabulary::Closed(ENTITY_TYPES)),
    ]);

    QueryParams {
        entity: EntityType::Interactions,
        arguments,
        arg_synonyms: &[
            DATABASES_ARE_RESOURCES,
            ("tfregulons_levels", "dorothea_levels"),
            ("tfregulons_methods", "dorothea_methods"),
        ],
        value_rewrites: &[ValueRewrite {
            args: &["datasets", "fields"],
            from: "tfregulons",
            to: "dorothea",
        }],
        select: &[
            "source",
            "target",
            "is_directed",
            "is_stimulation",
            "is_inhibition",
            "consensus_direction",
            "consensus_stimulation",
            "consensus_inhibition",
            "sources",
            "references",
            "type",
        ],
        fields: &[
            ("organism", &["ncbi_tax_id_source", "ncbi_tax_id_target"]),
            ("ncbi_tax_id", &["ncbi_tax_id_source", "ncbi_tax_id_target"]),
            ("entity_type", &["entity_type_source", "entity_type_target"]),
            ("resources", &["sources"]),
            ("databases", &["sources"]),
        ],
        switch_select: &[("genesymbols", &["source_genesymbol", "target_genesymbol"])],
        filters: &[
            ("resources", &["sources"]),
            ("types", &["type"]),
            ("organisms", &["ncbi_tax_id_source", "ncbi_tax_id_target"]),
            ("entity_types", &["entity_type_source", "entity_type_target"]),
        ],
        strict_values: &[("entity_types", "protein")],
        flag_fields: &[("datasets", "datasets")],
        partners: Some(PartnerSpec {
            sides: [
                PartnerSide { arg: "sources", columns: &["source", "source_genesymbol"] },
                PartnerSide { arg: "targets", columns: &["target", "target_genesymbol"] },
            ],
            both: "partners",
            operator_arg: "source_target",
            default_operator: Combine::Or,
            loops_arg: "loops",
            loop_columns: ("source", "target"),
        }),
        flags: vec![
            FlagGroup::new("datasets", FlagValues::Named(DATASET_FLAGS)).with_override(
                "dorothea",
                FlagOverride {
                    trigger: "dorothea_levels",
                    column: "dorothea_level",
                    default_values: &["A", "B"],
                    refine: &["dorothea_methods"],
                },
            ),
            FlagGroup::new("dorothea_methods", FlagValues::Named(DOROTHEA_METHODS)),
            FlagGroup::new("directed", FlagValues::Switch(&["is_directed"])),
            FlagGroup::new("signed", FlagValues::Switch(&["is_stimulation", "is_inhibition"])),
        ],
        defaults: &[
            ("organisms", DefaultValue::List(&["9606"])),
            ("directed", DefaultValue::Bool(true)),
        ],
        domain_default: Some(DomainDefault {
            unless_any: &["resources", "datasets", "types"],
            arg: "datasets",
            value: DefaultValue::List(&["omnipath"]),
        }),
        required_any: &[],
        license: LicenseColumns { resource: "sources", prefixed: &["references"] },
        distinct: false,
    }
}

fn enzsub() -> QueryParams {
    let mut arguments = common_arguments();
    arguments.extend([
        arg("enzymes", true, Vocabulary::Any),
        arg("substrates", true, Vocabulary::Any),
        arg("partners", true, Vocabulary::Any),
        arg("genesymbols", false, Vocabulary::Bool),
        arg("organisms", true, Vocabulary::Closed(ORGANISMS)),
        arg("residues", true, Vocabulary::Any),
        arg("modification", true, Vocabulary::Any),
        arg("types", true, Vocabulary::Any),
        arg("enzyme_substrate", false, Vocabulary::Operator),
        arg("loops", false, Vocabulary::Bool),
    ]);

    QueryParams {
        entity: EntityType::Enzsub,
        arguments,
        arg_synonyms: &[DATABASES_ARE_RESOURCES],
        value_rewrites: &[],
        select: &[
            "enzyme",
            "substrate",
            "residue_type",
            "residue_offset",
            "modification",
            "sources",
            "references",
        ],
        fields: &[
            ("organism", &["ncbi_tax_id"]),
            ("resources", &["sources"]),
            ("databases", &["sources"]),
        ],
        switch_select: &[("genesymbols", &["enzyme_genesymbol", "substrate_genesymbol"])],
        filters: &[
            ("resources", &["sources"]),
            ("types", &["modification"]),
            ("modification", &["modification"]),
            ("residues", &["residue_type"]),
            ("organisms", &["ncbi_tax_id"]),
        ],
        strict_values: &[],
        flag_fields: &[],
        partners: Some(PartnerSpec {
            sides: [
                PartnerSide { arg: "enzymes", columns: &["enzyme", "enzyme_genesymbol"] },
                PartnerSide { arg: "substrates", columns: &["substrate", "substrate_genesymbol"] },
            ],
            both: "partners",
            operator_arg: "enzyme_substrate",
            default_operator: Combine::Or,
            loops_arg: "loops",
            loop_columns: ("enzyme", "substrate"),
        }),
        flags: Vec::new(),
        defaults: &[("organisms", DefaultValue::List(&["9606"]))],
        domain_default: None,
        required_any: &[],
        license: LicenseColumns { resource: "sources", prefixed: &["references"] },
        distinct: false,
    }
}

fn complexes() -> QueryParams {
    let mut arguments = common_arguments();
    arguments.push(arg("proteins", true, Vocabulary::Any));

    QueryParams {
        entity: EntityType::Complexes,
        arguments,
        arg_synonyms: &[DATABASES_ARE_RESOURCES],
        value_rewrites: &[],
        select: &[
            "name",
            "components",
            "components_genesymbols",
            "stoichiometry",
            "sources",
            "references",
            "identifiers",
        ],
        fields: &[("resources", &["sources"]), ("databases", &["sources"])],
        switch_select: &[],
        filters: &[
            ("resources", &["sources"]),
            ("proteins", &["components", "components_genesymbols"]),
        ],
        strict_values: &[],
        flag_fields: &[],
        partners: None,
        flags: Vec::new(),
        defaults: &[],
        domain_default: None,
        required_any: &[],
        license: LicenseColumns { resource: "sources", prefixed: &["identifiers"] },
        distinct: false,
    }
}

fn annotations() -> QueryParams {
    let mut arguments = common_arguments();
    arguments.extend([
        arg("proteins", true, Vocabulary::Any),
        arg("genesymbols", false, Vocabulary::Bool),
        arg("entity_types", true, Vocabulary::Closed(ENTITY_TYPES)),
    ]);

    QueryParams {
        entity: EntityType::Annotations,
        arguments,
        arg_synonyms: &[DATABASES_ARE_RESOURCES],
        value_rewrites: &[],
        select: &["uniprot", "genesymbol", "entity_type", "source", "label", "value", "record_id"],
        fields: &[("resources", &["source"]), ("databases", &["source"])],
        switch_select: &[("genesymbols", &["genesymbol"])],
        filters: &[
            ("resources", &["source"]),
            ("proteins", &["uniprot", "genesymbol"]),
            ("entity_types", &["entity_type"]),
        ],
        strict_values: &[],
        flag_fields: &[],
        partners: None,
        flags: Vec::new(),
        defaults: &[],
        domain_default: None,
        required_any: &["resources", "proteins"],
        license: LicenseColumns { resource: "source", prefixed: &[] },
        distinct: false,
    }
}

fn intercell() -> QueryParams {
    static CAUSALITY: &[(&str, &[&str])] = &[
        ("transmitter", &["transmitter"]),
        ("trans", &["transmitter"]),
        ("receiver", &["receiver"]),
        ("rec", &["receiver"]),
        ("both", &["transmitter", "receiver"]),
    ];
    static TOPOLOGY: &[(&str, &[&str])] = &[
        ("secreted", &["secreted"]),
        ("sec", &["secreted"]),
        ("plasma_membrane_peripheral", &["plasma_membrane_peripheral"]),
        ("pmp", &["plasma_membrane_peripheral"]),
        ("plasma_membrane_transmembrane", &["plasma_membrane_transmembrane"]),
        ("pmtm", &["plasma_membrane_transmembrane"]),
    ];

    let mut arguments = common_arguments();
    arguments.extend([
        arg("scope", false, Vocabulary::Closed(&["specific", "generic"])),
        arg("aspect", false, Vocabulary::Closed(&["functional", "locational"])),
        arg("source", false, Vocabulary::Closed(&["resource_specific", "composite"])),
        arg("categories", true, Vocabulary::Any),
        arg("parent", false, Vocabulary::Any),
        arg("proteins", true, Vocabulary::Any),
        arg("entity_types", true, Vocabulary::Closed(ENTITY_TYPES)),
        arg("transmitter", false, Vocabulary::Bool),
        arg("receiver", false, Vocabulary::Bool),
        arg("secreted", false, Vocabulary::Bool),
        arg("plasma_membrane_peripheral", false, Vocabulary::Bool),
        arg("plasma_membrane_transmembrane", false, Vocabulary::Bool),
        arg("causality", true, Vocabulary::Closed(&["transmitter", "trans", "receiver", "rec", "both"])),
        arg("topology", true, Vocabulary::Closed(&[
            "secreted",
            "sec",
            "plasma_membrane_peripheral",
            "pmp",
            "plasma_membrane_transmembrane",
            "pmtm",
        ])),
    ]);

    QueryParams {
        entity: EntityType::Intercell,
        arguments,
        arg_synonyms: &[
            DATABASES_ARE_RESOURCES,
            ("trans", "transmitter"),
            ("rec", "receiver"),
            ("sec", "secreted"),
            ("pmp", "plasma_membrane_peripheral"),
            ("pmtm", "plasma_membrane_transmembrane"),
        ],
        value_rewrites: &[],
        select: &[
            "category",
            "parent",
            "database",
            "scope",
            "aspect",
            "source",
            "uniprot",
            "genesymbol",
            "entity_type",
            "consensus_score",
            "transmitter",
            "receiver",
            "secreted",
            "plasma_membrane_transmembrane",
            "plasma_membrane_peripheral",
        ],
        fields: &[("resources", &["database"]), ("databases", &["database"])],
        switch_select: &[],
        filters: &[
            ("resources", &["database"]),
            ("proteins", &["uniprot", "genesymbol"]),
            ("entity_types", &["entity_type"]),
            ("aspect", &["aspect"]),
            ("scope", &["scope"]),
            ("source", &["source"]),
            ("categories", &["category"]),
            ("parent", &["parent"]),
            ("transmitter", &["transmitter"]),
            ("receiver", &["receiver"]),
            ("secreted", &["secreted"]),
            ("plasma_membrane_peripheral", &["plasma_membrane_peripheral"]),
            ("plasma_membrane_transmembrane", &["plasma_membrane_transmembrane"]),
        ],
        strict_values: &[],
        flag_fields: &[],
        partners: None,
        flags: vec![
            FlagGroup::new("causality", FlagValues::Named(CAUSALITY)),
            FlagGroup::new("topology", FlagValues::Named(TOPOLOGY)),
        ],
        defaults: &[],
        domain_default: None,
        required_any: &[],
        license: LicenseColumns { resource: "database", prefixed: &[] },
        distinct: false,
    }
}

fn summary_arguments() -> Vec<ArgSpec> {
    vec![
        arg("format", false, Vocabulary::Closed(FORMATS)),
        arg("header", false, Vocabulary::Bool),
        arg("license", false, Vocabulary::Closed(LICENSES)),
        arg("limit", false, Vocabulary::Integer),
        arg("password", false, Vocabulary::Any),
        arg("resources", true, Vocabulary::Resources),
    ]
}

/// Labels and values per annotation resource.
fn annotations_summary() -> QueryParams {
    let mut arguments = summary_arguments();
    arguments.push(arg("cytoscape", false, Vocabulary::Bool));

    QueryParams {
        entity: EntityType::Annotations,
        arguments,
        arg_synonyms: &[DATABASES_ARE_RESOURCES],
        value_rewrites: &[],
        select: &["source", "label", "value"],
        fields: &[],
        switch_select: &[],
        filters: &[("resources", &["source"])],
        strict_values: &[],
        flag_fields: &[],
        partners: None,
        flags: Vec::new(),
        defaults: &[],
        domain_default: None,
        required_any: &[],
        license: LicenseColumns { resource: "source", prefixed: &[] },
        distinct: true,
    }
}

/// Categories, their parents and the resources defining them.
fn intercell_summary() -> QueryParams {
    let mut arguments = summary_arguments();
    arguments.extend([
        arg("scope", false, Vocabulary::Closed(&["specific", "generic"])),
        arg("aspect", false, Vocabulary::Closed(&["functional", "locational"])),
        arg("source", false, Vocabulary::Closed(&["resource_specific", "composite"])),
        arg("categories", true, Vocabulary::Any),
        arg("parent", true, Vocabulary::Any),
        arg("transmitter", false, Vocabulary::Bool),
        arg("receiver", false, Vocabulary::Bool),
    ]);

    QueryParams {
        entity: EntityType::Intercell,
        arguments,
        arg_synonyms: &[DATABASES_ARE_RESOURCES, ("trans", "transmitter"), ("rec", "receiver")],
        value_rewrites: &[],
        select: &["category", "parent", "database"],
        fields: &[],
        switch_select: &[],
        filters: &[
            ("resources", &["database"]),
            ("aspect", &["aspect"]),
            ("scope", &["scope"]),
            ("source", &["source"]),
            ("categories", &["category"]),
            ("parent", &["parent"]),
            ("transmitter", &["transmitter"]),
            ("receiver", &["receiver"]),
        ],
        strict_values: &[],
        flag_fields: &[],
        partners: None,
        flags: Vec::new(),
        defaults: &[],
        domain_default: None,
        required_any: &[],
        license: LicenseColumns { resource: "database", prefixed: &[] },
        distinct: true,
    }
}
