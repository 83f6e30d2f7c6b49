use super::vector;
use matrixcompare::assert_matrix_eq;
use nalgebra::DVector;
use rupture::field::check_size;
use rupture::{FaultError, FieldStore, VertexField};

#[test]
fn vertex_field_set_and_add() {
    let mut field = VertexField::zeros("slip", 3, 2);
    assert_eq!(field.num_vertices(), 3);
    assert_eq!(field.width(), 2);

    field.set(1, &vector(&[1.0, 2.0]));
    field.add(1, &vector(&[0.5, -1.0]));
    field.add(2, &vector(&[3.0, 0.0]));

    assert_matrix_eq!(field.values().clone(), vector(&[0.0, 0.0, 1.5, 1.0, 3.0, 0.0]));
    assert_matrix_eq!(field.get(1, 2), vector(&[1.5, 1.0]));

    field.fill_zero();
    assert_eq!(field.values(), &DVector::zeros(6));
}

#[test]
fn vertex_field_from_vertex_values() {
    let values = vec![vector(&[1.0, 2.0, 3.0]), vector(&[4.0, 5.0, 6.0])];
    let field = VertexField::from_vertex_values("traction", 3, &values);
    assert_eq!(field.label(), "traction");
    assert_eq!(field.num_vertices(), 2);
    assert_matrix_eq!(field.vertex(1), values[1].clone());
}

#[test]
#[should_panic]
fn vertex_field_access_with_wrong_width_panics() {
    let field = VertexField::<f64>::zeros("area", 2, 1);
    field.get(0, 2);
}

#[test]
#[should_panic]
fn vertex_field_values_must_divide_width() {
    VertexField::from_values("bad", 2, DVector::<f64>::zeros(3));
}

#[test]
fn field_store_lookup() {
    let mut store = FieldStore::<f64>::new();
    store.add("disp(t)", 4, 2);
    assert!(store.contains("disp(t)"));
    assert!(!store.contains("velocity(t)"));

    store.get_mut("disp(t)").unwrap().set(3, &vector(&[1.0, 1.0]));
    assert_eq!(store.get("disp(t)").unwrap().vertex(3)[1], 1.0);

    assert!(matches!(store.get("velocity(t)"), Err(FaultError::Configuration { .. })));
    assert!(matches!(store.get_mut("velocity(t)"), Err(FaultError::Configuration { .. })));
}

#[test]
fn field_store_insert_replaces_field() {
    let mut store = FieldStore::<f64>::new();
    store.add("area", 2, 1);
    store.insert(VertexField::from_values("area", 1, vector(&[0.5, 0.25, 0.25])));
    assert_eq!(store.get("area").unwrap().num_vertices(), 3);
    assert_eq!(store.names().count(), 1);

    let removed = store.remove("area").unwrap();
    assert_eq!(removed.values()[0], 0.5);
    assert!(!store.contains("area"));
}

#[test]
fn sized_lookup_checks_width_and_vertex_count() {
    let mut store = FieldStore::<f64>::new();
    store.add("disp(t)", 4, 2);

    assert!(store.get_sized("disp(t)", 4, 2).is_ok());
    assert!(store.get_sized("disp(t)", 3, 2).is_ok());
    assert!(matches!(store.get_sized("disp(t)", 5, 2), Err(FaultError::Configuration { .. })));
    assert!(matches!(store.get_sized("disp(t)", 4, 3), Err(FaultError::Configuration { .. })));
    assert!(matches!(store.get_sized_mut("disp(t)", 4, 1), Err(FaultError::Configuration { .. })));
    assert!(matches!(store.get_sized("velocity(t)", 4, 2), Err(FaultError::Configuration { .. })));

    let jacobian = VertexField::from_values("jacobian", 3, DVector::from_element(6, 1.0));
    assert!(check_size(&jacobian, 2, 3).is_ok());
    assert!(check_size(&jacobian, 3, 3).is_err());
}
