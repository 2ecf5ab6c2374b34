#![allow(dead_code)]

use omnipath_server::args::RawArgs;
use omnipath_server::service::{Operation, Service};
use omnipath_server::settings::ServiceSettings;
use omnipath_server::store::{LicenseRecord, Store};
use omnipath_server::EntityType;
use serde_json::{json, Value};

pub fn license(resource: &str, purpose: Option<&str>) -> LicenseRecord {
    LicenseRecord {
        resource: resource.to_string(),
        name: Some(format!("{resource} license")),
        purpose: purpose.map(String::from),
        ..LicenseRecord::default()
    }
}

pub fn licenses() -> Vec<LicenseRecord> {
    vec![
        license("SIGNOR", Some("academic")),
        license("PhosphoSite", Some("non_profit")),
        license("DoRothEA", Some("academic")),
        license("HPA", Some("academic")),
        license("SignaLink3", Some("commercial")),
        license("HPRD", Some("for_profit")),
        license("CellPhoneDB", Some("commercial")),
        license("UniProt", Some("commercial")),
        license("CollecTRI", Some("composite")),
        license("Secret", None),
    ]
}

#[allow(clippy::too_many_arguments)]
fn interaction(
    source: &str,
    target: &str,
    sources: &[&str],
    references: &[&str],
    dataset: &str,
    directed: bool,
    tax: i64,
    extra: Value,
) -> Value {
    let mut record = json!({
        "source": source,
        "target": target,
        "source_genesymbol": format!("{source}_HUMAN"),
        "target_genesymbol": format!("{target}_HUMAN"),
        "is_directed": directed,
        "is_stimulation": false,
        "is_inhibition": false,
        "consensus_direction": directed,
        "consensus_stimulation": false,
        "consensus_inhibition": false,
        "sources": sources,
        "references": references,
        "type": "post_translational",
        "curation_effort": references.len(),
        "ncbi_tax_id_source": tax,
        "entity_type_source": "protein",
        "ncbi_tax_id_target": tax,
        "entity_type_target": "protein",
    });
    let object = record.as_object_mut().expect("object literal");
    object.insert(dataset.to_string(), json!(true));
    if let Value::Object(extra) = extra {
        object.extend(extra);
    }
    record
}

pub fn interactions() -> Vec<Value> {
    vec![
        interaction("P1", "P2", &["SIGNOR", "SignaLink3"], &["SIGNOR:111", "SignaLink3:222"], "omnipath", true, 9606,
            json!({"is_stimulation": true, "consensus_stimulation": true})),
        interaction("P2", "P3", &["SIGNOR"], &["SIGNOR:333"], "omnipath", true, 9606,
            json!({"is_inhibition": true})),
        interaction("P3", "P3", &["SignaLink3"], &[], "omnipath", true, 9606, json!({})),
        interaction("T1", "P1", &["DoRothEA"], &[], "dorothea", true, 9606,
            json!({"dorothea_level": ["A"], "dorothea_curated": true, "type": "transcriptional"})),
        interaction("T1", "P2", &["DoRothEA"], &[], "dorothea", true, 9606,
            json!({"dorothea_level": ["C"], "dorothea_chipseq": true, "type": "transcriptional"})),
        interaction("T2", "P3", &["CollecTRI", "SIGNOR_CollecTRI", "Lambert_CollecTRI"], &[], "collectri", true, 9606,
            json!({"type": "transcriptional"})),
        interaction("P4", "P5", &["HPRD"], &["HPRD:444"], "omnipath", false, 9606, json!({})),
        interaction("M1", "M2", &["SIGNOR"], &[], "omnipath", true, 10090, json!({})),
        interaction("X1", "X2", &["Secret"], &[], "omnipath", true, 9606, json!({})),
        interaction("R1", "R2", &["SIGNOR"], &["SIGNOR:555"], "omnipath", true, 10116, json!({})),
        interaction("S1", "R2", &["SIGNOR"], &[], "omnipath", true, 10116,
            json!({"entity_type_source": "small_molecule", "type": "small_molecule_protein"})),
    ]
}

pub fn enzsub() -> Vec<Value> {
    let row = |enzyme: &str, substrate: &str, residue: &str, offset: i64, modification: &str, sources: &[&str], references: &[&str]| {
        json!({
            "enzyme": enzyme,
            "enzyme_genesymbol": format!("{enzyme}_HUMAN"),
            "substrate": substrate,
            "substrate_genesymbol": format!("{substrate}_HUMAN"),
            "residue_type": residue,
            "residue_offset": offset,
            "modification": modification,
            "sources": sources,
            "references": references,
            "curation_effort": references.len(),
            "ncbi_tax_id": 9606,
        })
    };
    vec![
        row("P06239", "O14543", "Y", 123, "phosphorylation", &["SIGNOR", "PhosphoSite"], &["SIGNOR:1", "PhosphoSite:2"]),
        row("P06239", "P12345", "S", 10, "phosphorylation", &["PhosphoSite"], &["PhosphoSite:3"]),
        row("Q00001", "O14543", "T", 5, "acetylation", &["HPRD"], &["HPRD:4"]),
        row("P06239", "P06239", "Y", 394, "phosphorylation", &["PhosphoSite"], &[]),
    ]
}

pub fn complexes() -> Vec<Value> {
    vec![
        json!({
            "name": "A_B",
            "components": ["P1", "P2"],
            "components_genesymbols": ["P1_HUMAN", "P2_HUMAN"],
            "stoichiometry": "1:1",
            "sources": ["CellPhoneDB", "SIGNOR"],
            "references": ["1234"],
            "identifiers": ["CellPhoneDB:c1", "SIGNOR:s1"],
        }),
        json!({
            "name": "C_D",
            "components": ["P3", "P4"],
            "components_genesymbols": ["P3_HUMAN", "P4_HUMAN"],
            "stoichiometry": "1:1",
            "sources": ["Secret"],
            "references": [],
            "identifiers": [],
        }),
    ]
}

pub fn annotations() -> Vec<Value> {
    vec![
        json!({"uniprot": "P1", "genesymbol": "P1_HUMAN", "entity_type": "protein", "source": "HPA",
               "label": "tissue", "value": "liver", "record_id": 1}),
        json!({"uniprot": "P1", "genesymbol": "P1_HUMAN", "entity_type": "protein", "source": "UniProt",
               "label": "location", "value": "membrane", "record_id": 2}),
        json!({"uniprot": "P2", "genesymbol": "P2_HUMAN", "entity_type": "protein", "source": "Secret",
               "label": "x", "value": "y", "record_id": 3}),
        json!({"uniprot": "P9", "genesymbol": "P9_HUMAN", "entity_type": "protein", "source": "UniProt",
               "label": "location", "value": "nucleus", "record_id": 4}),
        json!({"uniprot": "P9", "genesymbol": "P9_HUMAN", "entity_type": "protein", "source": "UniProt",
               "label": "length", "value": "120", "record_id": 5}),
        json!({"uniprot": "P9", "genesymbol": "P9_HUMAN", "entity_type": "protein", "source": "UniProt",
               "label": "length", "value": "57", "record_id": 6}),
        json!({"uniprot": "P9", "genesymbol": "P9_HUMAN", "entity_type": "protein", "source": "SignaLink3",
               "label": "pathway", "value": "MAPK", "record_id": 7}),
    ]
}

pub fn intercell() -> Vec<Value> {
    vec![
        json!({"category": "ligand", "parent": "ligand", "database": "CellPhoneDB", "scope": "generic",
               "aspect": "functional", "source": "resource_specific", "uniprot": "P1", "genesymbol": "P1_HUMAN",
               "entity_type": "protein", "consensus_score": 3, "transmitter": true, "receiver": false,
               "secreted": true, "plasma_membrane_transmembrane": false, "plasma_membrane_peripheral": false}),
        json!({"category": "receptor", "parent": "receptor", "database": "HPA", "scope": "specific",
               "aspect": "locational", "source": "resource_specific", "uniprot": "P2", "genesymbol": "P2_HUMAN",
               "entity_type": "protein", "consensus_score": 1, "transmitter": false, "receiver": true,
               "secreted": false, "plasma_membrane_transmembrane": true, "plasma_membrane_peripheral": false}),
        json!({"category": "ligand", "parent": "ligand", "database": "Secret", "scope": "specific",
               "aspect": "functional", "source": "resource_specific", "uniprot": "P3", "genesymbol": "P3_HUMAN",
               "entity_type": "protein", "consensus_score": 1, "transmitter": true, "receiver": false,
               "secreted": true, "plasma_membrane_transmembrane": false, "plasma_membrane_peripheral": false}),
    ]
}

/// A seeded in-memory store; `name` must be unique per test.
pub fn store(name: &str) -> Store {
    let store = Store::in_memory(name, 4).expect("in-memory store");
    store.create_schema().expect("schema");
    store.insert_licenses(&licenses()).expect("licenses");
    store.insert_records(EntityType::Interactions, &interactions()).expect("interactions");
    store.insert_records(EntityType::Enzsub, &enzsub()).expect("enzsub");
    store.insert_records(EntityType::Complexes, &complexes()).expect("complexes");
    store.insert_records(EntityType::Annotations, &annotations()).expect("annotations");
    store.insert_records(EntityType::Intercell, &intercell()).expect("intercell");
    store
}

pub fn service(name: &str) -> Service {
    Service::new(store(name), &ServiceSettings::default()).expect("service")
}

pub fn raw(pairs: &[(&str, &str)]) -> RawArgs {
    RawArgs::from_pairs(pairs.iter().copied())
}

/// Text output of a request.
pub fn request(service: &Service, operation: &str, pairs: &[(&str, &str)]) -> String {
    let segments: Vec<&str> = operation.split('/').collect();
    let operation = Operation::parse(&segments).expect("known operation");
    service
        .handle(operation, &raw(pairs))
        .expect("request succeeds")
        .into_text()
        .expect("output")
}

/// Rows of a data request in JSON format.
pub fn rows(service: &Service, operation: &str, pairs: &[(&str, &str)]) -> Vec<Value> {
    let mut pairs = pairs.to_vec();
    pairs.push(("format", "json"));
    let text = request(service, operation, &pairs);
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("not JSON ({e}): {text}"))
}

/// Human readable compiled query.
pub fn compiled(service: &Service, entity: EntityType, pairs: &[(&str, &str)]) -> String {
    service.compile(entity, &raw(pairs)).expect("compiles").to_string()
}

/// Values of one field across rows, sorted.
pub fn column(rows: &[Value], name: &str) -> Vec<String> {
    let mut values: Vec<String> = rows
        .iter()
        .map(|r| match &r[name] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    values.sort();
    values
}
