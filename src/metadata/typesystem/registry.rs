//! Process-wide registry of declared types.
//!
//! Member indices and bean properties are cached by [`TypeIdentity`], so an identity must denote
//! exactly one descriptor for the lifetime of the process. The [`TypeRegistry`] enforces that:
//! every descriptor produced by [`crate::metadata::typesystem::TypeBuilder::build`] and every
//! well-known type is registered under its identity, and a second, different descriptor
//! claiming a taken identity is rejected.
//!
//! # Thread Safety
//!
//! Registration goes through the entry API of a sharded map, so two threads racing to register
//! the same identity can never both succeed.

use std::sync::{Arc, OnceLock};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::typesystem::{TypeIdentity, TypeRef},
    Result,
};

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

/// Identity to descriptor map guaranteeing one descriptor per identity.
///
/// # Examples
///
/// ```rust
/// use memberscope::metadata::typesystem::{types, TypeBuilder, TypeRegistry};
///
/// struct Marker;
///
/// let marker = TypeBuilder::<Marker>::class("demo", "Marker").build()?;
/// let found = TypeRegistry::global().get(marker.identity()).unwrap();
/// assert!(types::same(&marker, &found));
///
/// // the identity is taken now
/// assert!(TypeBuilder::<Marker>::class("demo", "Marker").build().is_err());
/// # Ok::<(), memberscope::Error>(())
/// ```
pub struct TypeRegistry {
    types: DashMap<TypeIdentity, TypeRef>,
}

impl TypeRegistry {
    fn new() -> Self {
        TypeRegistry {
            types: DashMap::new(),
        }
    }

    /// The registry every descriptor of this process is registered in
    #[must_use]
    pub fn global() -> &'static TypeRegistry {
        GLOBAL.get_or_init(TypeRegistry::new)
    }

    /// Register `ty` under its identity.
    ///
    /// Registering the very same descriptor again is a no-op.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a different descriptor already holds the identity.
    pub(crate) fn insert(&self, ty: &TypeRef) -> Result<()> {
        match self.types.entry(ty.identity().clone()) {
            Entry::Occupied(existing) if Arc::ptr_eq(existing.get(), ty) => Ok(()),
            Entry::Occupied(existing) => Err(malformed_error!(
                "type {} is already declared",
                existing.key()
            )),
            Entry::Vacant(slot) => {
                tracing::trace!(identity = %ty.identity(), "registered type");
                slot.insert(ty.clone());
                Ok(())
            }
        }
    }

    /// Register a well-known type; those are created once, before any declared type
    pub(crate) fn seed(&self, ty: &TypeRef) {
        self.types.insert(ty.identity().clone(), ty.clone());
    }

    /// The descriptor registered under `identity`
    #[must_use]
    pub fn get(&self, identity: &TypeIdentity) -> Option<TypeRef> {
        self.types.get(identity).map(|entry| entry.value().clone())
    }

    /// Returns `true` if `identity` is taken
    #[must_use]
    pub fn contains(&self, identity: &TypeIdentity) -> bool {
        self.types.contains_key(identity)
    }

    /// Number of registered types, well-known types included
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing has been registered yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::typesystem::{types, PrimitiveKind, TypeBuilder, Value},
        test::point_type,
        Error,
    };

    #[test]
    fn test_well_known_types_are_registered() {
        let registry = TypeRegistry::global();
        let string = types::string();
        let found = registry.get(string.identity()).unwrap();
        assert!(types::same(&string, &found));
        assert!(registry.contains(types::boxed(PrimitiveKind::I4).identity()));
        assert!(registry.contains(types::void().identity()));
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_reinserting_the_same_descriptor_is_accepted() {
        let point = point_type();
        TypeRegistry::global().insert(&point).unwrap();
        assert!(types::same(
            &TypeRegistry::global().get(point.identity()).unwrap(),
            &point
        ));
    }

    #[test]
    fn test_second_declaration_of_an_identity_is_rejected() {
        struct First {
            a: i32,
        }
        struct Second {
            b: i32,
        }

        let first = TypeBuilder::<First>::class("registry", "Dup")
            .field("a", types::int(), |s| Value::from(s.a), |s, v| {
                s.a = v.try_into()?;
                Ok(())
            })
            .build()
            .unwrap();

        let second = TypeBuilder::<Second>::class("registry", "Dup")
            .field("b", types::int(), |s| Value::from(s.b), |s, v| {
                s.b = v.try_into()?;
                Ok(())
            })
            .build();
        match second {
            Err(Error::Malformed { message, .. }) => {
                assert_eq!(message, "type registry.Dup is already declared");
            }
            other => panic!("unexpected {other:?}"),
        }

        // the first declaration keeps the identity
        let kept = TypeRegistry::global().get(first.identity()).unwrap();
        assert_eq!(kept.declared_fields()[0].name(), "a");
    }

    #[test]
    fn test_well_known_identity_can_not_be_redeclared() {
        let result = TypeBuilder::<String>::class("core", "String").build();
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }
}
