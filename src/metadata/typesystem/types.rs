//! Well-known types.
//!
//! The universal base (`core.Object`), the string type (`core.String`), `void`, and for every
//! [`PrimitiveKind`] a bare primitive type (`i32`) plus its boxed counterpart (`core.Int32`).
//! The descriptors are created once per process, shared, and registered in the
//! [`TypeRegistry`] so that no declared type can take their identities.
//!
//! # Examples
//!
//! ```rust
//! use memberscope::metadata::typesystem::{types, PrimitiveKind};
//!
//! let int = types::int();
//! let boxed = types::dual(&int).expect("every primitive has a boxed counterpart");
//! assert_eq!(boxed.identity().fullname(), "core.Int32");
//! assert!(types::same(&types::boxed(PrimitiveKind::I4), &boxed));
//! ```

use std::sync::{Arc, OnceLock};

use strum::IntoEnumIterator;

use crate::metadata::typesystem::{
    PrimitiveKind, ReflectType, Reflectable, TypeFlavor, TypeIdentity, TypeRef, TypeRegistry,
};

/// Namespace of the boxed, string and object types
pub const CORE_NAMESPACE: &str = "core";

struct WellKnown {
    object: TypeRef,
    string: TypeRef,
    void: TypeRef,
    /// Indexed by `PrimitiveKind as usize`
    primitives: Vec<TypeRef>,
    /// Indexed by `PrimitiveKind as usize`
    boxed: Vec<TypeRef>,
}

static WELL_KNOWN: OnceLock<WellKnown> = OnceLock::new();

fn table() -> &'static WellKnown {
    WELL_KNOWN.get_or_init(|| {
        let object: TypeRef = Arc::new(ReflectType::memberless(
            TypeIdentity::new(CORE_NAMESPACE, "Object"),
            TypeFlavor::Object,
            None,
        ));
        let string: TypeRef = Arc::new(ReflectType::memberless(
            TypeIdentity::new(CORE_NAMESPACE, "String"),
            TypeFlavor::String,
            Some(object.clone()),
        ));
        let void: TypeRef = Arc::new(ReflectType::memberless(
            TypeIdentity::new("", "void"),
            TypeFlavor::Void,
            None,
        ));

        let mut primitives = Vec::new();
        let mut boxed = Vec::new();
        for kind in PrimitiveKind::iter() {
            primitives.push(Arc::new(ReflectType::memberless(
                TypeIdentity::new("", kind.primitive_name()),
                TypeFlavor::Primitive(kind),
                None,
            )) as TypeRef);
            boxed.push(Arc::new(ReflectType::memberless(
                TypeIdentity::new(CORE_NAMESPACE, kind.boxed_name()),
                TypeFlavor::Boxed(kind),
                Some(object.clone()),
            )) as TypeRef);
        }

        let registry = TypeRegistry::global();
        for ty in [&object, &string, &void].into_iter().chain(&primitives).chain(&boxed) {
            registry.seed(ty);
        }

        WellKnown {
            object,
            string,
            void,
            primitives,
            boxed,
        }
    })
}

/// The universal base type every class derives from
#[must_use]
pub fn object() -> TypeRef {
    table().object.clone()
}

/// The string type
#[must_use]
pub fn string() -> TypeRef {
    table().string.clone()
}

/// The `void` type, used as return type of procedures
#[must_use]
pub fn void() -> TypeRef {
    table().void.clone()
}

/// The bare primitive type of `kind`
#[must_use]
pub fn primitive(kind: PrimitiveKind) -> TypeRef {
    table().primitives[kind as usize].clone()
}

/// The boxed counterpart of `kind`
#[must_use]
pub fn boxed(kind: PrimitiveKind) -> TypeRef {
    table().boxed[kind as usize].clone()
}

/// `bool`
#[must_use]
pub fn boolean() -> TypeRef {
    primitive(PrimitiveKind::Boolean)
}

/// `char`
#[must_use]
pub fn character() -> TypeRef {
    primitive(PrimitiveKind::Char)
}

/// `i8`
#[must_use]
pub fn byte() -> TypeRef {
    primitive(PrimitiveKind::I1)
}

/// `i16`
#[must_use]
pub fn short() -> TypeRef {
    primitive(PrimitiveKind::I2)
}

/// `i32`
#[must_use]
pub fn int() -> TypeRef {
    primitive(PrimitiveKind::I4)
}

/// `i64`
#[must_use]
pub fn long() -> TypeRef {
    primitive(PrimitiveKind::I8)
}

/// `f32`
#[must_use]
pub fn float() -> TypeRef {
    primitive(PrimitiveKind::R4)
}

/// `f64`
#[must_use]
pub fn double() -> TypeRef {
    primitive(PrimitiveKind::R8)
}

/// The other spelling of a primitive-like type: boxed for a primitive, primitive for a boxed
/// type, `None` for everything else.
#[must_use]
pub fn dual(ty: &TypeRef) -> Option<TypeRef> {
    match ty.flavor() {
        TypeFlavor::Primitive(kind) => Some(boxed(kind)),
        TypeFlavor::Boxed(kind) => Some(primitive(kind)),
        _ => None,
    }
}

/// Returns `true` if `ty` is the universal base type
#[must_use]
pub fn is_universal_base(ty: &dyn Reflectable) -> bool {
    ty.flavor() == TypeFlavor::Object
}

/// Returns `true` if both references denote the same declared type
#[must_use]
pub fn same(a: &TypeRef, b: &TypeRef) -> bool {
    a.identity() == b.identity()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_identities() {
        assert_eq!(object().identity().fullname(), "core.Object");
        assert_eq!(string().identity().fullname(), "core.String");
        assert_eq!(void().identity().fullname(), "void");
        assert_eq!(int().identity().fullname(), "i32");
        assert_eq!(boxed(PrimitiveKind::Char).identity().fullname(), "core.Char");
    }

    #[test]
    fn test_shared_instances() {
        assert!(Arc::ptr_eq(&object(), &object()));
        assert!(Arc::ptr_eq(&int(), &primitive(PrimitiveKind::I4)));
    }

    #[test]
    fn test_hierarchy() {
        assert!(object().base().is_none());
        assert!(int().base().is_none());
        let string_base = string().base().expect("string derives from object");
        assert!(same(&string_base, &object()));
        let boxed_base = boxed(PrimitiveKind::I8).base().expect("boxed derives from object");
        assert!(is_universal_base(boxed_base.as_ref()));
    }

    #[test]
    fn test_dual_round_trips_every_kind() {
        for kind in PrimitiveKind::iter() {
            let there = dual(&primitive(kind)).unwrap();
            assert!(same(&there, &boxed(kind)));
            let back = dual(&there).unwrap();
            assert!(same(&back, &primitive(kind)));
        }
        assert!(dual(&string()).is_none());
        assert!(dual(&object()).is_none());
    }
}
