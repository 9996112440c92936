#![allow(missing_docs)]

mod common;

use common::*;
use userial::builder::Initializer;
use userial::fields::{self, FieldDescriptor};
use userial::{
    Codec, Composite, Field, InstanceBuilder, Reflect, Resolved, TypeDescriptor, TypeKind,
    TypeRegistry, UserialError, Value,
};

fn registry_for<T: Reflect>() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register::<T>().expect("registration succeeds");
    registry
}

#[derive(Reflect, Debug, Clone, PartialEq)]
#[userial(default)]
struct Settings {
    retries: i32,
    label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retries: 3,
            label: "default".into(),
        }
    }
}

#[derive(Reflect, Debug, Clone, PartialEq)]
struct Meter {
    reading: Option<i64>,
    serial: i64,
}

#[derive(Reflect, Debug, Clone, PartialEq, Default)]
struct Cached {
    value: i32,
    #[userial(skip)]
    hits: u64,
}

// --- Instance builder ---

#[test]
fn memberwise_placeholder_uses_zero_values() -> userial::Result<()> {
    let registry = registry_for::<House>();
    let descriptor = registry.named(&House::type_identifier())?;
    let house = InstanceBuilder::new(&registry).build(descriptor)?;

    assert_eq!(house.get("address"), Some(&Value::Null));
    assert_eq!(house.get("number_of_floors"), Some(&Value::Int(0)));
    assert_eq!(house.get("stone"), Some(&Value::Boolean(false)));
    Ok(())
}

#[test]
fn optional_primitive_fields_start_out_null() -> userial::Result<()> {
    let registry = registry_for::<Meter>();
    let descriptor = registry.named(&Meter::type_identifier())?;
    let declared = fields::declared_fields(descriptor);
    assert!(declared[0].nullable);
    assert_eq!(declared[0].declared_type, "long");
    assert!(!declared[1].nullable);

    let meter = InstanceBuilder::new(&registry).build(descriptor)?;
    assert_eq!(meter.get("reading"), Some(&Value::Null));
    assert_eq!(meter.get("serial"), Some(&Value::Long(0)));
    Ok(())
}

#[test]
fn nullary_initializer_wins() -> userial::Result<()> {
    let registry = registry_for::<Settings>();
    let descriptor = registry.named(&Settings::type_identifier())?;
    let placeholder = InstanceBuilder::new(&registry).build(descriptor)?;
    assert_eq!(placeholder.get("retries"), Some(&Value::Int(3)));

    // The placeholder is fully overwritten by the decoded fields.
    let codec = Codec::new(registry.clone());
    let value = Settings {
        retries: 0,
        label: "custom".into(),
    };
    let bytes = codec.encode(&value)?;
    assert_eq!(codec.decode_as::<Settings>(&bytes)?, value);
    Ok(())
}

fn pair_from_one(args: Vec<Value>) -> userial::Result<Value> {
    let first = args.into_iter().next().unwrap_or(Value::Null);
    Ok(Value::Composite(Composite::new(
        "test.Pair",
        vec![
            Field::new("test.Pair", "a", first),
            Field::new("test.Pair", "b", Value::Text("from custom".into())),
        ],
    )))
}

fn pair_descriptor(initializers: Vec<Initializer>) -> TypeDescriptor {
    let mut descriptor = TypeDescriptor::composite("test.Pair")
        .with_field(FieldDescriptor::new("test.Pair", "a", "int"))
        .with_field(FieldDescriptor::new("test.Pair", "b", "String"));
    for initializer in initializers {
        descriptor = descriptor.with_initializer(initializer);
    }
    descriptor
}

#[test]
fn fewest_parameters_wins_without_a_nullary_initializer() -> userial::Result<()> {
    let mut registry = TypeRegistry::new();
    registry.insert(pair_descriptor(vec![
        Initializer::Memberwise,
        Initializer::Custom {
            params: vec!["int".into()],
            construct: pair_from_one,
        },
    ]))?;
    let descriptor = registry.named("test.Pair")?;
    let pair = InstanceBuilder::new(&registry).build(descriptor)?;
    assert_eq!(pair.get("a"), Some(&Value::Int(0)));
    assert_eq!(pair.get("b"), Some(&Value::Text("from custom".into())));

    // The decoded fields replace whatever the initializer stored.
    let codec = Codec::new(registry);
    let encoded = Value::Composite(Composite::new(
        "test.Pair",
        vec![
            Field::new("test.Pair", "a", Value::Int(9)),
            Field::new("test.Pair", "b", Value::Text("decoded".into())),
        ],
    ));
    let bytes = codec.encode_value(&encoded)?;
    assert_eq!(codec.decode(&bytes)?, encoded);
    Ok(())
}

#[test]
fn missing_initializer_fails_decoding() -> userial::Result<()> {
    let mut registry = TypeRegistry::new();
    registry.insert(pair_descriptor(Vec::new()))?;
    let descriptor = registry.named("test.Pair")?;
    assert!(matches!(
        InstanceBuilder::new(&registry).build(descriptor),
        Err(UserialError::NoUsableInitializer(name)) if name == "test.Pair"
    ));

    // Encoding needs no initializer; decoding does.
    let codec = Codec::new(registry);
    let bytes = codec.encode_value(&Value::Composite(Composite::new(
        "test.Pair",
        vec![
            Field::new("test.Pair", "a", Value::Int(1)),
            Field::new("test.Pair", "b", Value::Null),
        ],
    )))?;
    assert!(matches!(
        codec.decode(&bytes),
        Err(UserialError::NoUsableInitializer(_))
    ));
    Ok(())
}

#[test]
fn zero_values_per_declared_type() {
    let registry = TypeRegistry::new();
    let builder = InstanceBuilder::new(&registry);
    assert_eq!(builder.zero_value("long"), Value::Long(0));
    assert_eq!(builder.zero_value("boolean"), Value::Boolean(false));
    assert_eq!(builder.zero_value("char"), Value::Char(0));
    assert_eq!(builder.zero_value("String"), Value::Null);
    assert_eq!(builder.zero_value("[int"), Value::Null);

    let sizes: Vec<usize> = userial::PrimitiveKind::ALL.iter().map(|k| k.size()).collect();
    assert_eq!(sizes, [1, 2, 4, 8, 4, 8, 2, 1]);
}

// --- Field enumerator ---

#[test]
fn inherited_field_order() -> userial::Result<()> {
    let registry = registry_for::<Student>();
    let descriptor = registry.named(&Student::type_identifier())?;

    let names: Vec<&str> = fields::instance_fields(&registry, descriptor)?
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(
        names,
        ["faculty_name", "university", "name", "surname", "age", "gender"]
    );

    let declared: Vec<&str> = fields::declared_fields(descriptor)
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(declared, ["faculty_name", "university"]);
    Ok(())
}

#[test]
fn skipped_fields_are_described_but_not_encoded() -> userial::Result<()> {
    let registry = registry_for::<Cached>();
    let descriptor = registry.named(&Cached::type_identifier())?;

    let all = fields::all_fields(&registry, descriptor)?;
    assert_eq!(all.len(), 2);
    assert!(all[1].skipped);
    assert_eq!(all[1].declared_type, "u64");
    assert_eq!(fields::instance_fields(&registry, descriptor)?.len(), 1);

    let codec = Codec::new(registry.clone());
    let bytes = codec.encode(&Cached { value: 5, hits: 99 })?;
    assert_eq!(
        codec.decode_as::<Cached>(&bytes)?,
        Cached { value: 5, hits: 0 }
    );
    Ok(())
}

#[test]
fn enum_constant_fields() -> userial::Result<()> {
    let registry = registry_for::<TestEnum>();
    let descriptor = registry.named(&TestEnum::type_identifier())?;
    let TypeKind::Enum(constants) = &descriptor.kind else {
        panic!("TestEnum registers as an enum");
    };
    let names: Vec<&str> = constants.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["ONE", "TWO", "THREE"]);

    let one = descriptor.constant("ONE").expect("ONE is declared");
    let declared: Vec<&str> = fields::declared_constant_fields(one)
        .iter()
        .map(|f| f.declared_type.as_str())
        .collect();
    assert_eq!(declared, ["String", "int", &*University::type_identifier()]);
    Ok(())
}

#[test]
fn broken_parent_chains_are_reported() -> userial::Result<()> {
    let mut registry = TypeRegistry::new();
    registry.insert(TypeDescriptor::composite("test.Orphan").with_parent("test.Missing"))?;
    let orphan = registry.named("test.Orphan")?;
    assert!(matches!(
        fields::instance_fields(&registry, orphan),
        Err(UserialError::UnresolvableType(name)) if name == "test.Missing"
    ));

    registry.insert(TypeDescriptor::composite("test.Odd").with_parent("Vec"))?;
    let odd = registry.named("test.Odd")?;
    assert!(matches!(
        fields::instance_fields(&registry, odd),
        Err(UserialError::Format(_))
    ));

    registry.insert(TypeDescriptor::composite("test.A").with_parent("test.B"))?;
    registry.insert(TypeDescriptor::composite("test.B").with_parent("test.A"))?;
    let a = registry.named("test.A")?;
    assert!(matches!(
        fields::instance_fields(&registry, a),
        Err(UserialError::Format(_))
    ));
    Ok(())
}

// --- Type resolver ---

#[test]
fn closed_identifiers_resolve_without_registration() -> userial::Result<()> {
    let registry = TypeRegistry::new();
    assert!(matches!(registry.resolve("int")?, Resolved::Primitive(_)));
    assert!(matches!(registry.resolve("String")?, Resolved::Text));
    assert!(matches!(registry.resolve("object")?, Resolved::Any));
    assert!(matches!(
        registry.resolve("[[int")?,
        Resolved::Array { element: "[int" }
    ));
    assert!(matches!(registry.resolve("Vec")?, Resolved::Named(_)));
    assert!(matches!(
        registry.resolve("null"),
        Err(UserialError::UnresolvableType(_))
    ));
    Ok(())
}

#[test]
fn identifier_of_inverts_resolve() -> userial::Result<()> {
    let registry = registry_for::<Vec<Student>>();
    let samples = [
        Value::Short(3),
        Value::Text("text".into()),
        Value::Array {
            element_type: "[double".into(),
            items: Vec::new(),
        },
        Student::to_value(&student())?,
        Gender::Female.to_value()?,
        vec![bsu()].to_value()?,
    ];
    for value in &samples {
        let identifier = registry.identifier_of(value);
        let resolved = registry.resolve(&identifier)?;
        let kind_matches = match (value, resolved) {
            (Value::Short(_), Resolved::Primitive(kind)) => kind.keyword() == "short",
            (Value::Text(_), Resolved::Text) => true,
            (Value::Array { element_type, .. }, Resolved::Array { element }) => {
                element == element_type
            }
            (Value::Composite(c), Resolved::Named(d)) => d.name == c.type_name(),
            (Value::Enum(e), Resolved::Named(d)) => d.name == e.type_name,
            (Value::Sequence { type_name, .. }, Resolved::Named(d)) => d.name == *type_name,
            _ => false,
        };
        assert!(kind_matches, "`{identifier}` resolves back to its own type");
    }

    assert_eq!(registry.identifier_of(&Value::Null), "null");
    assert!(registry.resolve("null").is_err());
    Ok(())
}

#[test]
fn reserved_and_conflicting_registrations_are_rejected() -> userial::Result<()> {
    let mut registry = TypeRegistry::new();
    for reserved in ["int", "null", "String", "object", "[Thing", ""] {
        assert!(
            matches!(
                registry.insert(TypeDescriptor::composite(reserved)),
                Err(UserialError::Format(_))
            ),
            "`{reserved}` must be rejected"
        );
    }

    let point = TypeDescriptor::composite("test.Point")
        .with_field(FieldDescriptor::new("test.Point", "x", "int"));
    registry.insert(point.clone())?;
    registry.insert(point)?;
    assert!(matches!(
        registry.insert(TypeDescriptor::composite("test.Point")),
        Err(UserialError::Format(_))
    ));
    Ok(())
}

#[test]
fn registration_is_transitive() {
    let registry = registry_for::<Vec<Student>>();
    for id in [
        Student::type_identifier(),
        Human::type_identifier(),
        University::type_identifier(),
        Gender::type_identifier(),
    ] {
        assert!(registry.contains(&id), "{id} is registered");
    }
    let student = registry
        .get(&Student::type_identifier())
        .expect("student registered");
    assert_eq!(student.parent.as_deref(), Some(&*Human::type_identifier()));
}
