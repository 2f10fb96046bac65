use std::sync::OnceLock;

pub use accounts::*;

use crate::{
    metadata::typesystem::{types, PrimitiveKind, TypeBuilder, TypeRef, Value},
    Error, Result,
};

// Fixture types are built once per test binary; a second build would collide in the registry
fn shared(cell: &'static OnceLock<TypeRef>, build: fn() -> Result<TypeRef>) -> TypeRef {
    cell.get_or_init(|| build().expect("fixture type must build"))
        .clone()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

fn build_point() -> Result<TypeRef> {
    TypeBuilder::<Point>::class("demo", "Point")
        .field("x", types::int(), |p| Value::from(p.x), |p, v| {
            p.x = v.try_into()?;
            Ok(())
        })
        .attribute("column", "pos_x")
        .field("y", types::int(), |p| Value::from(p.y), |p, v| {
            p.y = v.try_into()?;
            Ok(())
        })
        .attribute("column", "pos_y")
        .method("sum", &[], types::int(), |p, _| Ok(Value::from(p.x + p.y)))
        .method("scale", &[types::int()], types::int(), |p, args| {
            let factor: i32 = args[0].clone().try_into()?;
            Ok(Value::from((p.x + p.y) * factor))
        })
        .method_mut(
            "translate",
            &[types::int(), types::int()],
            types::void(),
            |p, args| {
                p.x += i32::try_from(args[0].clone())?;
                p.y += i32::try_from(args[1].clone())?;
                Ok(Value::Null)
            },
        )
        .method("ratio", &[], types::double(), |p, _| {
            if p.y == 0 {
                return Err(Error::TypeConversionInvalid {
                    expected: "non-zero y".to_string(),
                    found: p.y.to_string(),
                });
            }
            Ok(Value::from(f64::from(p.x) / f64::from(p.y)))
        })
        .constructor(&[], |_| Ok(Point::default()))
        .constructor(&[types::int(), types::int()], |args| {
            Ok(Point {
                x: args[0].clone().try_into()?,
                y: args[1].clone().try_into()?,
            })
        })
        .build()
}

/// `demo.Point { x: i32, y: i32 }` with a no-arg and an `(i32, i32)` constructor
pub fn point_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    shared(&TYPE, build_point)
}

#[derive(Debug, Default)]
pub struct Person {
    pub name: String,
    pub age: i32,
}

fn build_person() -> Result<TypeRef> {
    TypeBuilder::<Person>::class("demo", "Person")
        .field(
            "name",
            types::string(),
            |p| Value::from(p.name.as_str()),
            |p, v| {
                p.name = v.try_into()?;
                Ok(())
            },
        )
        .field("age", types::int(), |p| Value::from(p.age), |p, v| {
            p.age = v.try_into()?;
            Ok(())
        })
        .constructor(&[], |_| Ok(Person::default()))
        .build()
}

/// `demo.Person { name: String, age: i32 }`
pub fn person_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    shared(&TYPE, build_person)
}

#[derive(Debug, Default)]
pub struct TwoNames {
    pub first: String,
    pub last: String,
}

fn build_two_names() -> Result<TypeRef> {
    TypeBuilder::<TwoNames>::class("demo", "TwoNames")
        .field(
            "first",
            types::string(),
            |n| Value::from(n.first.as_str()),
            |n, v| {
                n.first = v.try_into()?;
                Ok(())
            },
        )
        .field(
            "last",
            types::string(),
            |n| Value::from(n.last.as_str()),
            |n, v| {
                n.last = v.try_into()?;
                Ok(())
            },
        )
        .constructor(&[], |_| Ok(TwoNames::default()))
        .build()
}

/// `demo.TwoNames { first: String, last: String }`
pub fn two_names_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    shared(&TYPE, build_two_names)
}

#[derive(Debug, Default)]
pub struct Base {
    pub x: i32,
    pub label: String,
}

#[derive(Debug, Default)]
pub struct Derived {
    pub base: Base,
    pub x: i32,
}

fn derived_base(derived: &Derived) -> &Base {
    &derived.base
}

fn derived_base_mut(derived: &mut Derived) -> &mut Base {
    &mut derived.base
}

fn build_base() -> Result<TypeRef> {
    TypeBuilder::<Base>::class("demo", "Base")
        .field("x", types::int(), |b| Value::from(b.x), |b, v| {
            b.x = v.try_into()?;
            Ok(())
        })
        .field(
            "label",
            types::string(),
            |b| Value::from(b.label.as_str()),
            |b, v| {
                b.label = v.try_into()?;
                Ok(())
            },
        )
        .method("describe", &[], types::string(), |b, _| {
            Ok(Value::from(format!("Base({})", b.label)))
        })
        .method("label", &[], types::string(), |b, _| {
            Ok(Value::from(b.label.as_str()))
        })
        .constructor(&[], |_| Ok(Base::default()))
        .build()
}

fn build_derived() -> Result<TypeRef> {
    TypeBuilder::<Derived>::class("demo", "Derived")
        .extends(base_type(), derived_base, derived_base_mut)
        .field("x", types::int(), |d| Value::from(d.x), |d, v| {
            d.x = v.try_into()?;
            Ok(())
        })
        .method("describe", &[], types::string(), |d, _| {
            Ok(Value::from(format!("Derived({})", d.x)))
        })
        .constructor(&[], |_| Ok(Derived::default()))
        .build()
}

/// `demo.Base { x: i32, label: String }`
pub fn base_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    shared(&TYPE, build_base)
}

/// `demo.Derived extends demo.Base { x: i32 }`, shadowing `x` and `describe()`
pub fn derived_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    shared(&TYPE, build_derived)
}

#[derive(Debug, Default)]
pub struct Counter {
    pub count: i32,
}

/// A counter type with its own static slots, for tests that write statics
pub fn counter_type_named(name: &str) -> TypeRef {
    TypeBuilder::<Counter>::class("demo", name)
        .field("count", types::int(), |c| Value::from(c.count), |c, v| {
            c.count = v.try_into()?;
            Ok(())
        })
        .static_field("created", types::long(), 0_i64)
        .constant("LIMIT", types::int(), 10)
        .method_mut("increment", &[], types::int(), |c, _| {
            c.count += 1;
            Ok(Value::from(c.count))
        })
        .static_method("limit", &[], types::int(), |_| Ok(Value::I4(10)))
        .constructor(&[], |_| Ok(Counter::default()))
        .build()
        .expect("counter fixture must build")
}

/// `demo.Counter`: instance field `count`, static `created`, constant `LIMIT`
pub fn counter_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    shared(&TYPE, || Ok(counter_type_named("Counter")))
}

pub struct Overloads;

fn build_overloads() -> Result<TypeRef> {
    TypeBuilder::<Overloads>::class("demo", "Overloads")
        .method("pick", &[types::int()], types::string(), |_, _| {
            Ok(Value::from("primitive"))
        })
        .method(
            "pick",
            &[types::boxed(PrimitiveKind::I4)],
            types::string(),
            |_, _| Ok(Value::from("boxed")),
        )
        .method("pick", &[types::string()], types::string(), |_, _| {
            Ok(Value::from("text"))
        })
        .constructor(&[], |_| Ok(Overloads))
        .build()
}

/// `demo.Overloads` with `pick(i32)`, `pick(core.Int32)` and `pick(String)`
pub fn overloads_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    shared(&TYPE, build_overloads)
}
