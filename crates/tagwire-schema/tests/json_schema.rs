//! Integration tests for loading schemas from JSON documents.

use tagwire_schema::{
    Access, Cardinality, DefaultValue, EnclosingDescriptor, EnumDescriptor, FieldDescriptor,
    FieldType, MessageDescriptor, Schema, SchemaError, TypeDescriptor, TypeRef,
};
use tagwire_wire::{ScalarType, ScalarValue, WireType};

// =========================================================================
// Scoping
// =========================================================================

const SCOPED: &str = r#"
{
  "types": [
    { "kind": "enum", "name": "Status", "constants": [ { "name": "OUTER", "value": 0 } ] },
    {
      "kind": "enclosing",
      "name": "Billing",
      "nested": [
        { "kind": "enum", "name": "Status", "constants": [ { "name": "PAID", "value": 1 }, { "name": "DUE", "value": 2 } ] },
        {
          "kind": "message",
          "name": "Invoice",
          "fields": [
            { "name": "status", "tag": 1, "type": { "enum": "Status" }, "default_value": "DUE" },
            { "name": "legacy", "tag": 2, "type": { "enum": ".Status" } },
            { "name": "lines", "tag": 3, "label": "repeated", "type": { "message": "Line" } },
            { "name": "total", "tag": 4, "type": { "scalar": "sfixed64" }, "default_value": "-1" }
          ],
          "nested": [
            { "kind": "message", "name": "Line", "fields": [ { "name": "cents", "tag": 1, "type": { "scalar": "uint64" } } ] }
          ]
        }
      ]
    }
  ]
}
"#;

#[test]
fn test_nearest_scope_wins() {
    let schema = Schema::from_json(SCOPED).unwrap();
    let invoice = schema.message(schema.message_id("Billing.Invoice").unwrap());

    let status = &invoice.fields()[0];
    let inner = schema.enum_id("Billing.Status").unwrap();
    assert_eq!(status.access, Access::Enum(inner));
    assert_eq!(status.default, Some(DefaultValue::Enum(2)));

    let legacy = &invoice.fields()[1];
    let outer = schema.enum_id("Status").unwrap();
    assert_eq!(legacy.access, Access::Enum(outer));
}

#[test]
fn test_nested_message_reference_and_plans() {
    let schema = Schema::from_json(SCOPED).unwrap();
    let invoice = schema.message(schema.message_id(".Billing.Invoice").unwrap());
    let line = schema.message_id("Billing.Invoice.Line").unwrap();

    let lines = &invoice.fields()[2];
    assert_eq!(lines.access, Access::Message(line));
    assert_eq!(lines.cardinality, Cardinality::Repeated);
    assert_eq!(lines.wire_type, WireType::LengthDelimited);
    assert!(!lines.accepts_packed());

    let total = &invoice.fields()[3];
    assert_eq!(total.wire_type, WireType::Fixed64);
    assert_eq!(total.default, Some(DefaultValue::Scalar(ScalarValue::Sfixed64(-1))));
}

#[test]
fn test_enclosing_type_is_only_a_namespace() {
    let schema = Schema::from_json(SCOPED).unwrap();
    assert_eq!(schema.lookup("Billing"), Some(TypeRef::Enclosing));
    assert_eq!(schema.message_id("Billing"), None);
    assert_eq!(schema.messages().count(), 2);
    assert_eq!(schema.enums().count(), 2);
}

#[test]
fn test_enclosing_type_cannot_be_a_field_type() {
    let json = r#"
    {
      "types": [
        { "kind": "enclosing", "name": "Ns" },
        { "kind": "message", "name": "M", "fields": [ { "name": "x", "tag": 1, "type": { "message": "Ns" } } ] }
      ]
    }"#;
    let err = Schema::from_json(json).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::TypeKindMismatch { expected: "message", .. }
    ));
}

// =========================================================================
// Document errors
// =========================================================================

#[test]
fn test_malformed_document() {
    let err = Schema::from_json(r#"{ "types": [ { "kind": "table" } ] }"#).unwrap_err();
    assert!(matches!(err, SchemaError::Json(_)));
}

#[test]
fn test_unknown_scalar_name() {
    let json = r#"
    {
      "types": [
        { "kind": "message", "name": "M", "fields": [ { "name": "x", "tag": 1, "type": { "scalar": "int128" } } ] }
      ]
    }"#;
    assert!(matches!(Schema::from_json(json), Err(SchemaError::Json(_))));
}

#[test]
fn test_label_defaults_to_optional() {
    let json = r#"
    {
      "types": [
        { "kind": "message", "name": "M", "fields": [ { "name": "x", "tag": 7, "type": { "scalar": "bool" } } ] }
      ]
    }"#;
    let schema = Schema::from_json(json).unwrap();
    let m = schema.message(schema.message_id("M").unwrap());
    assert_eq!(m.fields()[0].cardinality, Cardinality::Optional);
    assert_eq!(m.index_of_tag(7), Some(0));
}

// =========================================================================
// Descriptor documents round-trip through serde
// =========================================================================

#[test]
fn test_descriptors_serialize_to_loadable_json() {
    let types: Vec<TypeDescriptor> = vec![
        EnclosingDescriptor::new("Ns")
            .nested(EnumDescriptor::new("Kind").constant("A", 0).constant("B", 1))
            .into(),
        MessageDescriptor::new("Item")
            .field(FieldDescriptor::required("id", 1, ScalarType::Uint64))
            .field(
                FieldDescriptor::optional("kind", 2, FieldType::Enum("Ns.Kind".into()))
                    .with_default("B"),
            )
            .into(),
    ];

    let json = serde_json::json!({ "types": types }).to_string();
    let schema = Schema::from_json(&json).unwrap();
    let item = schema.message(schema.message_id("Item").unwrap());
    assert_eq!(item.fields()[1].default, Some(DefaultValue::Enum(1)));
}
