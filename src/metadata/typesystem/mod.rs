//! Type system for member resolution.
//!
//! This module defines what the engine knows about a type: its [`TypeIdentity`], its
//! [`TypeFlavor`] (primitive, boxed, string, universal base or ordinary class), its immediate
//! ancestor and the members it declares directly. Everything the indexing, signature and caching
//! algorithms need is reached through the [`Reflectable`] capability trait, so they are
//! independent of how member metadata is obtained.
//!
//! # Key Components
//!
//! - [`Reflectable`]: Capability interface over a type's declared members and state projection
//! - [`ReflectType`]: Descriptor table implementation, produced by [`TypeBuilder`]
//! - [`TypeBuilder`]: Fluent API declaring fields, methods and constructors of a Rust type
//! - [`types`]: Well-known primitive, boxed, string, object and void types
//! - [`TypeRegistry`]: Process-wide identity to descriptor map, one descriptor per identity
//! - [`Value`]: Dynamically typed values passed to and returned from members
//! - [`matcher`]: Primitive/boxed aware type compatibility rules
//! - [`Ancestry`]: Iterator over a type and its ancestor chain up to a stop type
//!
//! # Examples
//!
//! ```rust
//! use memberscope::metadata::typesystem::{types, TypeBuilder, Value};
//!
//! #[derive(Default)]
//! struct Counter {
//!     hits: i64,
//! }
//!
//! let counter = TypeBuilder::<Counter>::class("demo", "Counter")
//!     .field("hits", types::long(), |c| Value::from(c.hits), |c, v| {
//!         c.hits = v.try_into()?;
//!         Ok(())
//!     })
//!     .constructor(&[], |_| Ok(Counter::default()))
//!     .build()?;
//!
//! assert_eq!(counter.identity().fullname(), "demo.Counter");
//! assert_eq!(counter.declared_fields().len(), 1);
//! # Ok::<(), memberscope::Error>(())
//! ```

mod ancestry;
mod builder;
mod identity;
pub mod matcher;
mod primitives;
mod registry;
pub mod types;

use std::{any::Any, fmt, sync::Arc};

pub use ancestry::Ancestry;
pub use builder::TypeBuilder;
pub use identity::TypeIdentity;
pub use primitives::{PrimitiveKind, Value};
pub use registry::TypeRegistry;

use crate::metadata::members::{ConstructorRecord, FieldRecord, MethodRecord};

/// Type-erased state of an object, as stored behind a [`crate::Object`]
pub type ObjectState = dyn Any + Send + Sync;

/// Shared reference to a type descriptor
pub type TypeRef = Arc<dyn Reflectable>;

/// The fundamental category of a type.
///
/// The primitive/boxed split drives the equivalence rules in [`matcher`]: a primitive-like type
/// and its boxed counterpart share a [`PrimitiveKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFlavor {
    /// The absence of a value, used as return type of procedures
    Void,
    /// A bare value type such as `i32`
    Primitive(PrimitiveKind),
    /// The reference counterpart of a primitive, such as `core.Int32`
    Boxed(PrimitiveKind),
    /// The string type
    String,
    /// The universal base type every class derives from
    Object,
    /// Any other declared type
    Class,
}

impl TypeFlavor {
    /// Returns `true` for bare primitive-like types
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeFlavor::Primitive(_))
    }

    /// Returns `true` for boxed counterparts of primitive-like types
    #[must_use]
    pub fn is_boxed(&self) -> bool {
        matches!(self, TypeFlavor::Boxed(_))
    }

    /// The primitive kind shared by a primitive type and its boxed counterpart
    #[must_use]
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            TypeFlavor::Primitive(kind) | TypeFlavor::Boxed(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Capability interface over a type's metadata.
///
/// Implementors expose the members a type declares directly (never inherited ones), its
/// immediate ancestor and a projection from the state of an instance to the state of that
/// ancestor. The member index builder, the metadata cache and the descriptor facade only ever
/// talk to types through this trait.
///
/// The crate ships one implementation, [`ReflectType`], built with [`TypeBuilder`].
pub trait Reflectable: Send + Sync {
    /// Stable identity of this type
    fn identity(&self) -> &TypeIdentity;

    /// Category of this type
    fn flavor(&self) -> TypeFlavor;

    /// The immediate ancestor, `None` for roots and primitive types
    fn base(&self) -> Option<TypeRef>;

    /// Fields declared directly on this type, in declaration order
    fn declared_fields(&self) -> &[FieldRecord];

    /// Methods declared directly on this type, in declaration order
    fn declared_methods(&self) -> &[MethodRecord];

    /// Constructors declared on this type, in declaration order
    fn declared_constructors(&self) -> &[ConstructorRecord];

    /// Project the state of an instance of this type onto the state of [`Reflectable::base`].
    ///
    /// Returns `None` if `state` is not state of this type or the type has no ancestor state.
    fn upcast<'a>(&self, state: &'a ObjectState) -> Option<&'a ObjectState>;

    /// Mutable counterpart of [`Reflectable::upcast`]
    fn upcast_mut<'a>(&self, state: &'a mut ObjectState) -> Option<&'a mut ObjectState>;

    /// Returns `true` for bare primitive-like types
    fn is_primitive(&self) -> bool {
        self.flavor().is_primitive()
    }

    /// The simple name of this type
    fn simple_name(&self) -> &str {
        self.identity().name()
    }
}

impl fmt::Debug for dyn Reflectable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.identity())
    }
}

/// Projection from a derived state onto its embedded ancestor state
pub(crate) trait Upcast: Send + Sync {
    fn view<'a>(&self, state: &'a ObjectState) -> Option<&'a ObjectState>;
    fn view_mut<'a>(&self, state: &'a mut ObjectState) -> Option<&'a mut ObjectState>;
}

/// [`Upcast`] implementation backed by a pair of field projections
pub(crate) struct Projection<T, B> {
    pub(crate) view: fn(&T) -> &B,
    pub(crate) view_mut: fn(&mut T) -> &mut B,
}

impl<T, B> Upcast for Projection<T, B>
where
    T: Any + Send + Sync,
    B: Any + Send + Sync,
{
    fn view<'a>(&self, state: &'a ObjectState) -> Option<&'a ObjectState> {
        let derived = state.downcast_ref::<T>()?;
        Some((self.view)(derived) as &ObjectState)
    }

    fn view_mut<'a>(&self, state: &'a mut ObjectState) -> Option<&'a mut ObjectState> {
        let derived = state.downcast_mut::<T>()?;
        Some((self.view_mut)(derived) as &mut ObjectState)
    }
}

/// Descriptor table for one type.
///
/// Holds the identity, flavor, ancestor and the directly declared members of a type. Instances
/// are immutable once built; they are produced by [`TypeBuilder`] for user types and by
/// [`types`] for the well-known types.
pub struct ReflectType {
    pub(crate) identity: TypeIdentity,
    pub(crate) flavor: TypeFlavor,
    pub(crate) base: Option<TypeRef>,
    pub(crate) upcast: Option<Arc<dyn Upcast>>,
    pub(crate) fields: Vec<FieldRecord>,
    pub(crate) methods: Vec<MethodRecord>,
    pub(crate) constructors: Vec<ConstructorRecord>,
}

impl ReflectType {
    /// Create a memberless descriptor, used for the well-known types
    pub(crate) fn memberless(
        identity: TypeIdentity,
        flavor: TypeFlavor,
        base: Option<TypeRef>,
    ) -> Self {
        ReflectType {
            identity,
            flavor,
            base,
            upcast: None,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }
}

impl Reflectable for ReflectType {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn flavor(&self) -> TypeFlavor {
        self.flavor
    }

    fn base(&self) -> Option<TypeRef> {
        self.base.clone()
    }

    fn declared_fields(&self) -> &[FieldRecord] {
        &self.fields
    }

    fn declared_methods(&self) -> &[MethodRecord] {
        &self.methods
    }

    fn declared_constructors(&self) -> &[ConstructorRecord] {
        &self.constructors
    }

    fn upcast<'a>(&self, state: &'a ObjectState) -> Option<&'a ObjectState> {
        self.upcast.as_ref()?.view(state)
    }

    fn upcast_mut<'a>(&self, state: &'a mut ObjectState) -> Option<&'a mut ObjectState> {
        self.upcast.as_ref()?.view_mut(state)
    }
}

impl fmt::Debug for ReflectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectType")
            .field("identity", &self.identity)
            .field("flavor", &self.flavor)
            .field("base", &self.base.as_ref().map(|base| base.identity().clone()))
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}
