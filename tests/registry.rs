mod common;

use omnipath_server::registry::{LicensePurpose, LicenseTier};
use omnipath_server::EntityType;
use serde_json::{json, Value};

#[test]
fn resources_are_discovered_per_table() {
    let service = common::service("registry-discovery");
    let catalog = service.catalog().expect("catalog");
    let registry = &catalog.registry;

    let enzsub: Vec<&str> = registry
        .resources_of(EntityType::Enzsub)
        .expect("enzsub resources")
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(enzsub, vec!["HPRD", "PhosphoSite", "SIGNOR"]);

    let signor = registry.get("SIGNOR").expect("SIGNOR entry");
    for entity in [EntityType::Interactions, EntityType::Enzsub, EntityType::Complexes] {
        assert!(signor.queries.contains_key(&entity), "{entity}");
    }
    assert!(!signor.queries.contains_key(&EntityType::Intercell));
}

#[test]
fn interaction_datasets_are_recorded() {
    let service = common::service("registry-datasets");
    let catalog = service.catalog().expect("catalog");
    let datasets: Vec<String> = catalog.registry.datasets().into_iter().collect();
    assert_eq!(datasets, vec!["collectri", "dorothea", "omnipath"]);

    let entry = catalog.registry.get("DoRothEA").expect("DoRothEA entry");
    let info = &entry.queries[&EntityType::Interactions];
    assert_eq!(info.datasets.iter().collect::<Vec<_>>(), vec!["dorothea"]);
}

#[test]
fn generic_intercell_categories_are_recorded() {
    let service = common::service("registry-categories");
    let catalog = service.catalog().expect("catalog");
    let entry = catalog.registry.get("CellPhoneDB").expect("CellPhoneDB entry");
    let info = &entry.queries[&EntityType::Intercell];
    assert_eq!(info.generic_categories.iter().collect::<Vec<_>>(), vec!["ligand"]);
    assert!(catalog.registry.get("HPA").expect("HPA entry").queries[&EntityType::Intercell]
        .generic_categories
        .is_empty());
}

#[test]
fn licenses_resolve_with_prefix_inheritance() {
    let service = common::service("registry-licenses");
    let catalog = service.catalog().expect("catalog");
    let registry = &catalog.registry;

    let purpose = |name: &str| registry.get(name).expect(name).license.purpose;
    assert_eq!(purpose("SIGNOR_CollecTRI"), LicensePurpose::Academic);
    assert_eq!(purpose("CollecTRI"), LicensePurpose::Composite);
    assert_eq!(purpose("Lambert_CollecTRI"), LicensePurpose::Unlicensed);
    assert_eq!(purpose("Secret"), LicensePurpose::Unlicensed);

    let components: Vec<&str> = registry
        .get("CollecTRI")
        .expect("CollecTRI entry")
        .components
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(components, vec!["Lambert_CollecTRI", "SIGNOR_CollecTRI"]);
}

#[test]
fn enabled_sets_per_tier() {
    let service = common::service("registry-tiers");
    let catalog = service.catalog().expect("catalog");
    let registry = &catalog.registry;

    let academic = registry.enabled(LicenseTier::Academic).expect("academic set");
    let commercial = registry.enabled(LicenseTier::Commercial).expect("commercial set");
    assert!(registry.enabled(LicenseTier::Ignore).is_none());

    let mut names: Vec<&String> = commercial.iter().collect();
    names.sort();
    assert_eq!(names, vec!["CellPhoneDB", "HPRD", "SignaLink3", "UniProt"]);
    assert!(commercial.iter().all(|r| academic.contains(r)));
    for name in ["SIGNOR", "PhosphoSite", "CollecTRI", "SIGNOR_CollecTRI"] {
        assert!(academic.contains(name), "{name}");
    }
    for name in ["Secret", "Lambert_CollecTRI"] {
        assert!(!registry.enables(name, LicenseTier::Academic), "{name}");
        assert!(registry.enables(name, LicenseTier::Ignore), "{name}");
    }
}

#[test]
fn resources_operation_filters_by_license_and_table() {
    let service = common::service("registry-operation");
    let text = common::request(&service, "resources", &[("license", "commercial"), ("datasets", "intercell")]);
    let resources: Value = serde_json::from_str(&text).expect("JSON object");
    let names: Vec<&String> = resources.as_object().expect("object").keys().collect();
    assert_eq!(names, vec!["CellPhoneDB"]);
    assert_eq!(resources["CellPhoneDB"]["license"]["purpose"], json!("commercial"));
    assert_eq!(
        resources["CellPhoneDB"]["queries"]["intercell"]["generic_categories"],
        json!(["ligand"])
    );
}

#[test]
fn reload_picks_up_new_resources() {
    let service = common::service("registry-reload");
    let before = common::rows(&service, "enzsub", &[("enzymes", "Q99999")]);
    assert!(before.is_empty());

    let store = service.store();
    store
        .insert_licenses(&[common::license("NewKinases", Some("academic"))])
        .expect("license row");
    store
        .insert_records(
            EntityType::Enzsub,
            &[json!({
                "enzyme": "Q99999",
                "substrate": "P12345",
                "residue_type": "S",
                "residue_offset": 42,
                "modification": "phosphorylation",
                "sources": ["NewKinases"],
                "references": ["NewKinases:9"],
                "ncbi_tax_id": 9606,
            })],
        )
        .expect("enzsub row");

    // Not yet known: the row is filtered and the name is not a valid resource.
    assert!(common::rows(&service, "enzsub", &[("enzymes", "Q99999")]).is_empty());
    let text = common::request(&service, "enzsub", &[("resources", "NewKinases")]);
    assert!(text.contains("Unknown values for argument `resources`"), "{text}");

    service.reload().expect("reload");
    let after = common::rows(&service, "enzsub", &[("enzymes", "Q99999")]);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0]["sources"], json!(["NewKinases"]));
    assert_eq!(common::rows(&service, "enzsub", &[("resources", "NewKinases")]).len(), 1);
}
