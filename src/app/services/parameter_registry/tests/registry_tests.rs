//! Tests for registry lookups and alias resolution

use crate::Error;
use crate::app::services::parameter_registry::{
    FormatKind, Parameter, ParameterRegistry, StandardRegistry, ValueFormat,
};

#[test]
fn test_builtin_lookup() {
    let registry = StandardRegistry::builtin();

    let ctdsal = registry.lookup("CTDSAL").unwrap();
    assert_eq!(ctdsal.units.as_deref(), Some("PSS-78"));
    assert_eq!(ctdsal.precision(), 4);
    assert_eq!(ctdsal.bounds, Some((0.0, 42.0)));
    assert_eq!(ctdsal.netcdf_name(), "salinity");

    let expocode = registry.lookup("EXPOCODE").unwrap();
    assert_eq!(expocode.format.kind, FormatKind::Text);
    assert_eq!(expocode.display_order, 1);
}

#[test]
fn test_alias_resolves_to_canonical() {
    let registry = StandardRegistry::builtin();
    let number = registry.lookup("NUMBER").unwrap();
    assert_eq!(number.name, "CTDNOBS");
}

#[test]
fn test_unknown_parameter() {
    let registry = StandardRegistry::builtin();
    match registry.lookup("NOT_A_PARAM") {
        Err(Error::UnknownParameter { name }) => assert_eq!(name, "NOT_A_PARAM"),
        other => panic!("expected UnknownParameter, got {:?}", other),
    }
}

#[test]
fn test_builtin_display_order_is_unique() {
    let registry = StandardRegistry::builtin();
    let parameters = registry.parameters();
    let mut orders: Vec<i32> = parameters.iter().map(|p| p.display_order).collect();
    let count = orders.len();
    orders.dedup();
    assert_eq!(orders.len(), count);
    assert_eq!(parameters[0].name, "EXPOCODE");
}

#[test]
fn test_insert_rejects_collisions() {
    let mut registry = StandardRegistry::new();
    registry
        .insert(Parameter::new("A", 1, ValueFormat::integer(4)).with_alias("B"))
        .unwrap();

    assert!(registry.insert(Parameter::new("A", 2, ValueFormat::integer(4))).is_err());
    assert!(registry.insert(Parameter::new("B", 3, ValueFormat::integer(4))).is_err());
    assert!(
        registry
            .insert(Parameter::new("C", 4, ValueFormat::integer(4)).with_alias("A"))
            .is_err()
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_from_parameters() {
    let registry = StandardRegistry::from_parameters(vec![
        Parameter::new("X", 2, ValueFormat::float(8, 3)),
        Parameter::new("Y", 1, ValueFormat::text(4)),
    ])
    .unwrap();

    let names: Vec<String> = registry.parameters().iter().map(|p| p.name.clone()).collect();
    assert_eq!(names, vec!["Y", "X"]);
    assert!(!registry.is_empty());
}
