mod common;

use omnipath_server::query::{Literal, Predicate, Query};
use omnipath_server::EntityType;
use serde_json::json;

#[test]
fn compiled_queries_serialize_and_restore() {
    let service = common::service("roundtrip-serde");
    let query = service
        .compile(
            EntityType::Interactions,
            &common::raw(&[("sources", "P1"), ("targets", "P2"), ("source_target", "and"), ("limit", "3")]),
        )
        .expect("compiles");
    let text = serde_json::to_string(&query).expect("serializes");
    let restored: Query = serde_json::from_str(&text).expect("deserializes");
    assert_eq!(restored, query);
    assert_eq!(restored.to_sql(), query.to_sql());
}

#[test]
fn predicates_have_a_readable_json_shape() {
    let predicate = Predicate::and(vec![
        Predicate::In { column: "ncbi_tax_id".into(), values: vec![Literal::Integer(9606)] },
        Predicate::Is { column: "omnipath".into(), value: true },
    ]);
    assert_eq!(
        serde_json::to_value(&predicate).expect("serializes"),
        json!({"and": [
            {"in": {"column": "ncbi_tax_id", "values": [9606]}},
            {"is": {"column": "omnipath", "value": true}},
        ]})
    );
}

#[test]
fn sql_binds_every_literal_in_order() {
    let service = common::service("roundtrip-sql");
    let query = service
        .compile(
            EntityType::Enzsub,
            &common::raw(&[("enzymes", "P06239,Q00001"), ("residues", "Y"), ("limit", "2")]),
        )
        .expect("compiles");
    let (sql, params) = query.to_sql();
    assert_eq!(
        sql,
        "select enzsub.\"enzyme\", enzsub.\"substrate\", enzsub.\"residue_type\", enzsub.\"residue_offset\", \
         enzsub.\"modification\", enzsub.\"sources\", enzsub.\"references\" from enzsub \
         where (enzsub.\"residue_type\" in (?) and enzsub.\"ncbi_tax_id\" in (?) \
         and (enzsub.\"enzyme\" in (?, ?) or enzsub.\"enzyme_genesymbol\" in (?, ?)) \
         and enzsub.\"enzyme\" is not enzsub.\"substrate\") limit ?"
    );
    assert_eq!(
        params,
        vec![
            Literal::Text("Y".into()),
            Literal::Integer(9606),
            Literal::Text("P06239".into()),
            Literal::Text("Q00001".into()),
            Literal::Text("P06239".into()),
            Literal::Text("Q00001".into()),
            Literal::Integer(2),
        ]
    );
}

#[test]
fn array_predicates_use_json_each() {
    let query = Query {
        entity: EntityType::Complexes,
        columns: vec!["name".into()],
        predicate: Some(Predicate::or(vec![
            Predicate::Contains { column: "components".into(), value: Literal::Text("P1".into()) },
            Predicate::Overlap {
                column: "sources".into(),
                values: vec![Literal::Text("A".into()), Literal::Text("B".into())],
            },
        ])),
        limit: None,
        distinct: false,
    };
    let (sql, params) = query.to_sql();
    assert_eq!(
        sql,
        "select complexes.\"name\" from complexes where \
         (exists (select 1 from json_each(complexes.\"components\") where json_each.value = ?) \
         or exists (select 1 from json_each(complexes.\"sources\") where json_each.value in (?, ?)))"
    );
    assert_eq!(params.len(), 3);
    assert_eq!(query.to_string(), "SELECT name FROM complexes WHERE components CONTAINS P1 OR sources && {A, B}");
}
