mod common;

use omnipath_server::args::{normalize, ArgValue, Context, RawArgs};
use omnipath_server::params::ParamMap;
use omnipath_server::EntityType;

fn problems(raw: &RawArgs, entity: EntityType) -> Vec<String> {
    let params = ParamMap::standard();
    match normalize(raw, params.get(entity), Context::default()) {
        Err(omnipath_server::OmnipathError::InvalidArguments(problems)) => problems,
        other => panic!("expected invalid arguments, got {other:?}"),
    }
}

#[test]
fn comma_lists_and_repeated_keys_are_merged() {
    let params = ParamMap::standard();
    let raw = RawArgs::from_pairs([("enzymes", "P1, P2,"), ("enzymes", "P3")]);
    let args = normalize(&raw, params.get(EntityType::Enzsub), Context::default()).expect("valid");
    assert_eq!(
        args.get("enzymes"),
        Some(&ArgValue::List(vec!["P1".into(), "P2".into(), "P3".into()]))
    );
}

#[test]
fn array_arguments_stay_lists_even_with_one_value() {
    let params = ParamMap::standard();
    let raw = RawArgs::new().with("enzymes", "P1").with("format", "json");
    let args = normalize(&raw, params.get(EntityType::Enzsub), Context::default()).expect("valid");
    assert!(args.get("enzymes").expect("present").is_list());
    assert_eq!(args.get("format"), Some(&ArgValue::Text("json".into())));
}

#[test]
fn typed_values_bypass_parsing() {
    let params = ParamMap::standard();
    let raw = RawArgs::new().with("loops", true).with("limit", 7i64);
    let args = normalize(&raw, params.get(EntityType::Enzsub), Context::default()).expect("valid");
    assert!(args.flag("loops"));
    assert_eq!(args.limit(), Some(7));
}

#[test]
fn synonyms_resolve_and_direct_names_win() {
    let params = ParamMap::standard();
    let raw = RawArgs::new().with("databases", "SIGNOR");
    let args = normalize(&raw, params.get(EntityType::Enzsub), Context::default()).expect("valid");
    assert_eq!(args.list("resources"), vec!["SIGNOR"]);

    let raw = RawArgs::new().with("databases", "SIGNOR").with("resources", "HPRD");
    let args = normalize(&raw, params.get(EntityType::Enzsub), Context::default()).expect("valid");
    assert_eq!(args.list("resources"), vec!["HPRD"]);
}

#[test]
fn operators_are_case_insensitive() {
    let params = ParamMap::standard();
    let raw = RawArgs::new().with("enzyme_substrate", "and");
    let args = normalize(&raw, params.get(EntityType::Enzsub), Context::default()).expect("valid");
    assert_eq!(args.get("enzyme_substrate"), Some(&ArgValue::Text("AND".into())));
}

#[test]
fn every_problem_is_reported() {
    let raw = RawArgs::new()
        .with("colour", "red")
        .with("loops", "perhaps")
        .with("limit", "ten")
        .with("format", "json,tsv")
        .with("enzyme_substrate", "XOR");
    let found = problems(&raw, EntityType::Enzsub);
    assert_eq!(
        found,
        vec![
            " ==> Unknown argument: `colour`",
            " ==> Argument `loops` expects a boolean, got `perhaps`",
            " ==> Argument `limit` expects an integer, got `ten`",
            " ==> Argument `format` takes a single value",
            " ==> Unknown values for argument `enzyme_substrate`: `XOR`",
        ]
    );
}

#[test]
fn closed_vocabularies_list_the_offending_values() {
    let raw = RawArgs::new().with("datasets", "omnipath,nonsense,junk");
    let found = problems(&raw, EntityType::Interactions);
    assert_eq!(found, vec![" ==> Unknown values for argument `datasets`: `nonsense, junk`"]);
}

#[test]
fn resources_are_checked_once_discovered() {
    let service = common::service("arguments-resources");
    let text = common::request(&service, "enzsub", &[("resources", "SIGNOR,Nowhere")]);
    assert!(text.starts_with("Something is not entirely good:\n"), "{text}");
    assert!(text.contains(" ==> Unknown values for argument `resources`: `Nowhere`"), "{text}");

    // Before discovery every resource name passes.
    let params = ParamMap::standard();
    let raw = RawArgs::new().with("resources", "Nowhere");
    assert!(normalize(&raw, params.get(EntityType::Enzsub), Context::default()).is_ok());
}

#[test]
fn empty_values_are_ignored() {
    let params = ParamMap::standard();
    let raw = RawArgs::new().with("enzymes", " , ");
    let args = normalize(&raw, params.get(EntityType::Enzsub), Context::default()).expect("valid");
    assert!(!args.contains("enzymes"));
}
