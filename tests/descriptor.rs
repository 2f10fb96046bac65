//! Integration tests for the descriptor facade.
//!
//! A small `Shape` / `Circle` hierarchy is described once and then accessed through
//! descriptors bound to instances and to types, with private caches so that the build
//! statistics of one test do not leak into another.

use std::sync::{Arc, OnceLock};

use memberscope::prelude::*;

#[derive(Debug, Default)]
struct Shape {
    name: String,
    sides: i32,
}

#[derive(Debug, Default)]
struct Circle {
    shape: Shape,
    radius: f64,
}

fn shape_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeBuilder::<Shape>::class("geometry", "Shape")
            .field(
                "name",
                types::string(),
                |s| Value::from(s.name.as_str()),
                |s, v| {
                    s.name = v.try_into()?;
                    Ok(())
                },
            )
            .field("sides", types::int(), |s| Value::from(s.sides), |s, v| {
                s.sides = v.try_into()?;
                Ok(())
            })
            .method("area", &[], types::double(), |_, _| Ok(Value::R8(0.0)))
            .method("describe", &[], types::string(), |s, _| {
                Ok(Value::from(format!("{} with {} sides", s.name, s.sides)))
            })
            .constructor(&[], |_| Ok(Shape::default()))
            .build()
            .unwrap()
    })
    .clone()
}

fn circle_shape(circle: &Circle) -> &Shape {
    &circle.shape
}

fn circle_shape_mut(circle: &mut Circle) -> &mut Shape {
    &mut circle.shape
}

fn circle_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeBuilder::<Circle>::class("geometry", "Circle")
            .extends(shape_type(), circle_shape, circle_shape_mut)
            .field("radius", types::double(), |c| Value::from(c.radius), |c, v| {
                c.radius = v.try_into()?;
                Ok(())
            })
            .method("area", &[], types::double(), |c, _| {
                Ok(Value::from(std::f64::consts::PI * c.radius * c.radius))
            })
            .method_mut("grow", &[types::double()], types::void(), |c, args| {
                c.radius += f64::try_from(args[0].clone())?;
                Ok(Value::Null)
            })
            .static_method("unit", &[], types::double(), |_| Ok(Value::R8(1.0)))
            .constructor(&[], |_| Ok(Circle::default()))
            .constructor(&[types::double()], |args| {
                Ok(Circle {
                    shape: Shape {
                        name: "circle".to_string(),
                        sides: 0,
                    },
                    radius: args[0].clone().try_into()?,
                })
            })
            .build()
            .unwrap()
    })
    .clone()
}

fn hierarchy() -> DescriptorConfig {
    DescriptorConfig {
        fields: IndexPolicy::hierarchy(),
        methods: IndexPolicy::hierarchy(),
    }
}

fn circle(radius: f64) -> Result<Object> {
    let factory = Descriptor::with_cache(
        circle_type(),
        Arc::new(MetadataCache::new()),
        DescriptorConfig::default(),
    )?;
    factory.new_instance(&values![radius])
}

#[test]
fn test_construct_and_read_fields() -> Result<()> {
    let object = circle(2.0)?;
    let descriptor =
        Descriptor::with_cache(object, Arc::new(MetadataCache::new()), hierarchy())?;

    assert_eq!(descriptor.get_by_name_as::<f64>("radius")?, 2.0);
    assert_eq!(descriptor.get_by_name("name")?, Value::from("circle"));
    assert_eq!(descriptor.field_names(), vec!["radius", "name", "sides"]);
    Ok(())
}

#[test]
fn test_declared_only_hides_inherited_fields() -> Result<()> {
    let descriptor = Descriptor::with_cache(
        circle(1.0)?,
        Arc::new(MetadataCache::new()),
        DescriptorConfig::default(),
    )?;

    assert_eq!(descriptor.field_names(), vec!["radius"]);
    match descriptor.get_by_name("name") {
        Err(Error::MemberNotFound { kind, name, .. }) => {
            assert_eq!(kind, MemberKind::Field);
            assert_eq!(name.as_deref(), Some("name"));
        }
        other => panic!("expected MemberNotFound, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_inherited_field_writes_reach_the_embedded_state() -> Result<()> {
    let object = circle(1.0)?;
    let descriptor =
        Descriptor::with_cache(object.clone(), Arc::new(MetadataCache::new()), hierarchy())?;

    descriptor.set_by_name("name", "disc")?;
    descriptor.set_by_type(7)?;

    let (name, sides) = object.with(|c: &Circle| (c.shape.name.clone(), c.shape.sides))?;
    assert_eq!(name, "disc");
    assert_eq!(sides, 7);
    Ok(())
}

#[test]
fn test_override_and_inherited_methods() -> Result<()> {
    let descriptor =
        Descriptor::with_cache(circle(1.0)?, Arc::new(MetadataCache::new()), hierarchy())?;

    let area = descriptor.invoke_method("area", &[])?;
    assert_eq!(area, Value::R8(std::f64::consts::PI));

    descriptor.set_by_name("sides", 0)?;
    assert_eq!(
        descriptor.invoke_method("describe", &[])?,
        Value::from("circle with 0 sides")
    );

    descriptor.invoke_method("grow", &values![1.0])?;
    assert_eq!(descriptor.get_by_name_as::<f64>("radius")?, 2.0);
    Ok(())
}

#[test]
fn test_missing_overload_names_the_attempt() -> Result<()> {
    let descriptor =
        Descriptor::with_cache(circle(1.0)?, Arc::new(MetadataCache::new()), hierarchy())?;

    let err = descriptor.invoke_method("area", &values![5]).unwrap_err();
    assert!(err.is_resolution_failure());
    assert_eq!(err.to_string(), "can not find method area(Int32) in geometry.Circle");
    Ok(())
}

#[test]
fn test_type_target_sees_only_statics() -> Result<()> {
    let descriptor = Descriptor::with_cache(
        circle_type(),
        Arc::new(MetadataCache::new()),
        DescriptorConfig::default(),
    )?;

    assert_eq!(descriptor.invoke_method("unit", &[])?, Value::R8(1.0));
    assert!(matches!(
        descriptor.invoke_method("area", &[]),
        Err(Error::MemberNotFound { .. })
    ));
    assert!(descriptor.field_names().is_empty());
    assert!(descriptor.has_method(&Signature::encode(Some("unit"), &[]))?);
    assert!(!descriptor.has_method(&Signature::encode(Some("area"), &[]))?);
    Ok(())
}

#[test]
fn test_constructor_resolution() -> Result<()> {
    let factory = Descriptor::with_cache(
        circle_type(),
        Arc::new(MetadataCache::new()),
        DescriptorConfig::default(),
    )?;

    let blank = factory.new_instance(&[])?;
    assert_eq!(blank.with(|c: &Circle| c.radius)?, 0.0);

    let err = factory.new_instance(&values!["big"]).unwrap_err();
    match err {
        Error::MemberNotFound { kind, request, .. } => {
            assert_eq!(kind, MemberKind::Constructor);
            assert_eq!(request, "(String)");
        }
        other => panic!("expected MemberNotFound, got {other:?}"),
    }

    // the descriptor stays bound to the type
    assert!(factory.target().instance().is_none());
    Ok(())
}

#[test]
fn test_failing_member_is_wrapped() -> Result<()> {
    let descriptor =
        Descriptor::with_cache(circle(1.0)?, Arc::new(MetadataCache::new()), hierarchy())?;

    let err = descriptor.set_by_name("radius", "wide").unwrap_err();
    match &err {
        Error::InvocationFailure { member, source } => {
            assert_eq!(member, "geometry.Circle::radius");
            assert!(source.to_string().contains("wide"));
        }
        other => panic!("expected InvocationFailure, got {other:?}"),
    }
    assert!(!err.is_resolution_failure());
    Ok(())
}

#[test]
fn test_global_cache_is_shared() -> Result<()> {
    let first = Descriptor::for_type(shape_type())?;
    let second = Descriptor::for_type(shape_type())?;
    assert!(Arc::ptr_eq(first.field_index(), second.field_index()));
    Ok(())
}

#[test]
fn test_redeclared_identity_can_not_reach_a_cached_index() -> Result<()> {
    #[derive(Default)]
    struct Original {
        width: i32,
    }
    #[derive(Default)]
    struct Impostor {
        height: f64,
    }

    let original = TypeBuilder::<Original>::class("geometry", "Twin")
        .field("width", types::int(), |o| Value::from(o.width), |o, v| {
            o.width = v.try_into()?;
            Ok(())
        })
        .constructor(&[], |_| Ok(Original::default()))
        .build()?;
    let cache = Arc::new(MetadataCache::new());
    let first = Descriptor::with_cache(original.clone(), cache.clone(), hierarchy())?;

    let impostor = TypeBuilder::<Impostor>::class("geometry", "Twin")
        .field("height", types::double(), |i| Value::from(i.height), |i, v| {
            i.height = v.try_into()?;
            Ok(())
        })
        .constructor(&[], |_| Ok(Impostor::default()))
        .build();
    assert!(matches!(impostor, Err(Error::Malformed { .. })));

    // the identity still resolves to the first declaration and its index
    let registered = TypeRegistry::global().get(original.identity()).unwrap();
    let descriptor = Descriptor::with_cache(registered, cache, hierarchy())?;
    assert!(Arc::ptr_eq(first.field_index(), descriptor.field_index()));
    assert_eq!(descriptor.field_index().field_names(), vec!["width"]);
    let object = descriptor.new_instance(&[])?;
    assert_eq!(object.with(|o: &Original| o.width)?, 0);
    Ok(())
}
