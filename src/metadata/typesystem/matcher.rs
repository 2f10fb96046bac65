//! Type compatibility rules.
//!
//! Two notions of compatibility are used by the engine:
//!
//! - **Matching** ([`matches`]) is equality with a primitive/boxed twist. A boxed source matches
//!   its own bare primitive destination, a primitive source only ever matches the identical
//!   primitive.
//! - **Assignability** ([`is_assignable`]) is the is-a relation along the ancestor chain.
//!
//! By-type field lookup accepts a field when either relation holds ([`field_accepts`]);
//! signature encoding erases the primitive/boxed distinction altogether ([`canonicalize`]).

use crate::metadata::typesystem::{
    types, Ancestry, PrimitiveKind, Reflectable, TypeFlavor, TypeRef, Value,
};

/// Returns `true` if `src` matches `dest`.
///
/// For ordinary types this is identity equality. If `src` is primitive, `dest` must be the
/// identical primitive. If only `dest` is primitive, it is replaced by its boxed counterpart
/// before comparing.
///
/// # Examples
///
/// ```rust
/// use memberscope::metadata::typesystem::{matcher, types, PrimitiveKind};
///
/// let int = types::int();
/// let boxed = types::boxed(PrimitiveKind::I4);
/// assert!(matcher::matches(boxed.as_ref(), int.as_ref()));
/// assert!(!matcher::matches(int.as_ref(), boxed.as_ref()));
/// ```
#[must_use]
pub fn matches(src: &dyn Reflectable, dest: &dyn Reflectable) -> bool {
    match (src.flavor(), dest.flavor()) {
        (TypeFlavor::Primitive(_), TypeFlavor::Primitive(_)) => src.identity() == dest.identity(),
        (TypeFlavor::Primitive(_), _) => false,
        (TypeFlavor::Boxed(src_kind), TypeFlavor::Primitive(dest_kind)) => src_kind == dest_kind,
        (_, TypeFlavor::Primitive(_)) => false,
        _ => src.identity() == dest.identity(),
    }
}

/// Map a primitive type onto its boxed counterpart, every other type onto itself.
///
/// Used for signature keys: after canonicalization `i32` and `core.Int32` are the same element.
#[must_use]
pub fn canonicalize(ty: &TypeRef) -> TypeRef {
    match ty.flavor() {
        TypeFlavor::Primitive(kind) => types::boxed(kind),
        _ => ty.clone(),
    }
}

/// The other spelling of a primitive-like type, see [`types::dual`]
#[must_use]
pub fn dual(ty: &TypeRef) -> Option<TypeRef> {
    types::dual(ty)
}

/// Returns `true` if `src` is `dest` or derives from it.
#[must_use]
pub fn is_assignable(dest: &dyn Reflectable, src: &TypeRef) -> bool {
    Ancestry::new(src.clone(), true, None).any(|ty| ty.identity() == dest.identity())
}

/// Returns `true` if a field declared as `field` satisfies a by-type lookup for `requested`.
///
/// Fields declared as the universal base type never match, they would accept every request.
#[must_use]
pub fn field_accepts(field: &TypeRef, requested: &TypeRef) -> bool {
    !types::is_universal_base(field.as_ref())
        && (matches(field.as_ref(), requested.as_ref()) || is_assignable(field.as_ref(), requested))
}

/// Returns `true` if `value` can be stored in a slot declared as `ty`.
///
/// Integer and floating point values are accepted where they widen losslessly.
#[must_use]
pub fn accepts_value(ty: &dyn Reflectable, value: &Value) -> bool {
    coerce(ty, value).is_some()
}

/// Convert `value` into the representation of a slot declared as `ty`.
///
/// Returns `None` if the value is not acceptable for the slot.
#[must_use]
pub fn coerce(ty: &dyn Reflectable, value: &Value) -> Option<Value> {
    match (ty.flavor(), value) {
        (TypeFlavor::Void, _) => None,
        (TypeFlavor::Primitive(_), Value::Null) => None,
        (_, Value::Null) => Some(Value::Null),
        (TypeFlavor::Object, _) => Some(value.clone()),
        (TypeFlavor::Primitive(kind) | TypeFlavor::Boxed(kind), _) => widen(kind, value),
        (TypeFlavor::String, Value::String(_)) => Some(value.clone()),
        (TypeFlavor::Class, Value::Object(object)) => {
            is_assignable(ty, object.type_ref()).then(|| value.clone())
        }
        _ => None,
    }
}

fn widen(kind: PrimitiveKind, value: &Value) -> Option<Value> {
    match kind {
        PrimitiveKind::Boolean => value.as_boolean().map(Value::Boolean),
        PrimitiveKind::Char => value.as_char().map(Value::Char),
        PrimitiveKind::I1 => value.as_i8().map(Value::I1),
        PrimitiveKind::I2 => value.as_i16().map(Value::I2),
        PrimitiveKind::I4 => value.as_i32().map(Value::I4),
        PrimitiveKind::I8 => value.as_i64().map(Value::I8),
        PrimitiveKind::R4 => value.as_f32().map(Value::R4),
        PrimitiveKind::R8 => value.as_f64().map(Value::R8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{base_type, derived_type};
    use strum::IntoEnumIterator;

    #[test]
    fn test_primitive_source_needs_identical_primitive() {
        for kind in PrimitiveKind::iter() {
            let primitive = types::primitive(kind);
            let boxed = types::boxed(kind);
            assert!(matches(primitive.as_ref(), primitive.as_ref()));
            assert!(!matches(primitive.as_ref(), boxed.as_ref()));
            assert!(matches(boxed.as_ref(), primitive.as_ref()));
            assert!(matches(boxed.as_ref(), boxed.as_ref()));
        }
        assert!(!matches(types::int().as_ref(), types::long().as_ref()));
        assert!(!matches(
            types::boxed(PrimitiveKind::I8).as_ref(),
            types::int().as_ref()
        ));
    }

    #[test]
    fn test_reference_types_use_identity() {
        assert!(matches(types::string().as_ref(), types::string().as_ref()));
        assert!(!matches(derived_type().as_ref(), base_type().as_ref()));
        assert!(!matches(types::string().as_ref(), types::int().as_ref()));
    }

    #[test]
    fn test_canonicalize() {
        let canonical = canonicalize(&types::double());
        assert!(types::same(&canonical, &types::boxed(PrimitiveKind::R8)));
        assert!(types::same(&canonicalize(&types::string()), &types::string()));
        assert!(types::same(&canonicalize(&derived_type()), &derived_type()));
    }

    #[test]
    fn test_assignability_walks_ancestors() {
        let base = base_type();
        let derived = derived_type();
        assert!(is_assignable(base.as_ref(), &derived));
        assert!(is_assignable(types::object().as_ref(), &derived));
        assert!(!is_assignable(derived.as_ref(), &base));
        assert!(is_assignable(base.as_ref(), &base));
    }

    #[test]
    fn test_field_accepts() {
        // primitive field, boxed request: no match until the request is swapped for its dual
        let int = types::int();
        let boxed_int = types::boxed(PrimitiveKind::I4);
        assert!(!field_accepts(&int, &boxed_int));
        assert!(field_accepts(&int, &int));
        assert!(field_accepts(&boxed_int, &int));

        // base-typed field accepts derived requests
        assert!(field_accepts(&base_type(), &derived_type()));
        assert!(!field_accepts(&derived_type(), &base_type()));

        // universal-base fields never match
        assert!(!field_accepts(&types::object(), &types::object()));
        assert!(!field_accepts(&types::object(), &types::string()));
    }

    #[test]
    fn test_accepts_and_coerces_values() {
        assert!(accepts_value(types::int().as_ref(), &Value::I4(1)));
        assert!(accepts_value(types::long().as_ref(), &Value::I4(1)));
        assert!(!accepts_value(types::int().as_ref(), &Value::I8(1)));
        assert!(!accepts_value(types::int().as_ref(), &Value::Null));
        assert!(accepts_value(
            types::boxed(PrimitiveKind::I4).as_ref(),
            &Value::Null
        ));
        assert!(accepts_value(types::string().as_ref(), &Value::from("s")));
        assert!(!accepts_value(types::string().as_ref(), &Value::I4(1)));
        assert!(accepts_value(types::object().as_ref(), &Value::R8(1.0)));
        assert!(!accepts_value(types::void().as_ref(), &Value::Null));

        assert_eq!(
            coerce(types::long().as_ref(), &Value::I2(7)),
            Some(Value::I8(7))
        );
        assert_eq!(
            coerce(types::double().as_ref(), &Value::R4(0.5)),
            Some(Value::R8(0.5))
        );
    }
}
