mod common;

use omnipath_server::EntityType;

#[test]
fn dorothea_without_levels_assumes_confident_levels() {
    let service = common::service("flags-dorothea-default");
    let text = common::compiled(&service, EntityType::Interactions, &[("datasets", "dorothea")]);
    assert!(text.contains("dorothea_level && {A, B}"), "{text}");
    assert!(!text.contains("dorothea IS true"), "{text}");

    let rows = common::rows(&service, "interactions", &[("datasets", "dorothea")]);
    assert_eq!(common::column(&rows, "target"), vec!["P1"]);
}

#[test]
fn explicit_levels_replace_the_dataset_flag() {
    let service = common::service("flags-dorothea-levels");
    let text = common::compiled(
        &service,
        EntityType::Interactions,
        &[("datasets", "omnipath,dorothea"), ("dorothea_levels", "A,C")],
    );
    assert!(text.contains("(omnipath IS true OR dorothea_level && {A, C})"), "{text}");
    // The trigger is consumed by the override, not applied a second time.
    assert_eq!(text.matches("dorothea_level").count(), 1, "{text}");

    let rows = common::rows(&service, "interactions", &[("datasets", "dorothea"), ("dorothea_levels", "C")]);
    assert_eq!(common::column(&rows, "target"), vec!["P2"]);
}

#[test]
fn dorothea_arguments_are_ignored_without_the_dataset() {
    let service = common::service("flags-dorothea-unselected");
    let plain = common::rows(&service, "interactions", &[("datasets", "omnipath")]);
    assert_eq!(plain.len(), 2);
    for extra in [("dorothea_levels", "A"), ("dorothea_methods", "curated")] {
        let rows = common::rows(&service, "interactions", &[("datasets", "omnipath"), extra]);
        assert_eq!(rows, plain, "{extra:?}");
    }
    let text = common::compiled(&service, EntityType::Interactions, &[("dorothea_levels", "C")]);
    assert!(!text.contains("dorothea"), "{text}");
}

#[test]
fn dorothea_methods_narrow_only_dorothea_rows() {
    let service = common::service("flags-methods-scope");
    let datasets = ("datasets", "omnipath,dorothea");
    let rows = common::rows(&service, "interactions", &[datasets]);
    assert_eq!(common::column(&rows, "source"), vec!["P1", "P2", "T1"]);

    let rows = common::rows(&service, "interactions", &[datasets, ("dorothea_methods", "curated")]);
    assert_eq!(common::column(&rows, "source"), vec!["P1", "P2", "T1"]);
    let rows = common::rows(&service, "interactions", &[datasets, ("dorothea_methods", "chipseq")]);
    assert_eq!(common::column(&rows, "source"), vec!["P1", "P2"]);

    let pairs = [datasets, ("dorothea_levels", "A,C"), ("dorothea_methods", "chipseq")];
    let rows = common::rows(&service, "interactions", &pairs);
    assert_eq!(common::column(&rows, "target"), vec!["P2", "P2", "P3"]);

    let text = common::compiled(&service, EntityType::Interactions, &[datasets, ("dorothea_methods", "curated")]);
    assert!(
        text.contains("(omnipath IS true OR (dorothea_level && {A, B} AND dorothea_curated IS true))"),
        "{text}"
    );
}

#[test]
fn legacy_dataset_name_is_rewritten() {
    let service = common::service("flags-tfregulons");
    let legacy = common::compiled(&service, EntityType::Interactions, &[("datasets", "tfregulons"), ("tfregulons_levels", "B")]);
    let current = common::compiled(&service, EntityType::Interactions, &[("datasets", "dorothea"), ("dorothea_levels", "B")]);
    assert_eq!(legacy, current);
}

#[test]
fn dorothea_methods_accept_both_spellings() {
    let service = common::service("flags-methods");
    let short = common::compiled(
        &service,
        EntityType::Interactions,
        &[("datasets", "dorothea"), ("dorothea_methods", "curated,chipseq")],
    );
    let long = common::compiled(
        &service,
        EntityType::Interactions,
        &[("datasets", "dorothea"), ("dorothea_methods", "dorothea_curated,dorothea_chipseq")],
    );
    assert_eq!(short, long);
    assert!(short.contains("(dorothea_curated IS true OR dorothea_chipseq IS true)"), "{short}");
}

#[test]
fn signed_and_directed_switches() {
    let service = common::service("flags-switches");
    let text = common::compiled(&service, EntityType::Interactions, &[("signed", "1"), ("directed", "0")]);
    assert!(text.contains("(is_stimulation IS true OR is_inhibition IS true)"), "{text}");
    assert!(!text.contains("is_directed IS"), "{text}");

    let rows = common::rows(&service, "interactions", &[("directed", "no")]);
    assert_eq!(common::column(&rows, "source"), vec!["P1", "P2", "P4"]);
}

#[test]
fn intercell_causality_and_topology() {
    let service = common::service("flags-intercell");
    let text = common::compiled(&service, EntityType::Intercell, &[("causality", "both")]);
    assert!(text.ends_with("WHERE transmitter IS true OR receiver IS true"), "{text}");

    let text = common::compiled(&service, EntityType::Intercell, &[("causality", "rec"), ("topology", "sec,pmtm")]);
    assert!(
        text.ends_with("WHERE receiver IS true AND (secreted IS true OR plasma_membrane_transmembrane IS true)"),
        "{text}"
    );
    let rows = common::rows(&service, "intercell", &[("causality", "rec"), ("topology", "sec,pmtm")]);
    assert_eq!(common::column(&rows, "uniprot"), vec!["P2"]);
}
