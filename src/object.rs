//! Shared handles to typed object state.
//!
//! An [`Object`] pairs a type descriptor with the state of one instance, kept behind a lock so
//! that field writes and mutating method calls through any clone of the handle are visible to
//! all of them. Members declared on an ancestor reach their part of the state through the
//! ancestor projections of the object's type.

use std::{
    any::Any,
    fmt,
    sync::{Arc, RwLock},
};

use crate::{
    metadata::typesystem::{ObjectState, TypeIdentity, TypeRef},
    Error, Result,
};

struct ObjectInner {
    type_ref: TypeRef,
    state: RwLock<Box<ObjectState>>,
}

/// Reference-counted handle to an instance of a described type.
///
/// Cloning the handle does not copy the state; [`Object::ptr_eq`] tells whether two handles
/// denote the same instance.
///
/// # Examples
///
/// ```rust
/// use memberscope::{metadata::typesystem::TypeBuilder, Object};
///
/// struct Flag(bool);
///
/// let flag_type = TypeBuilder::<Flag>::class("demo", "Flag").build()?;
/// let flag = Object::new(flag_type, Flag(false));
/// let alias = flag.clone();
///
/// alias.with_mut(|f: &mut Flag| f.0 = true)?;
/// assert!(flag.with(|f: &Flag| f.0)?);
/// assert!(flag.ptr_eq(&alias));
/// # Ok::<(), memberscope::Error>(())
/// ```
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

impl Object {
    /// Wrap `value` as an instance of `type_ref`
    ///
    /// ## Arguments
    /// * `type_ref` - The descriptor of the instance's type
    /// * `value`    - The state; its Rust type must be the one the descriptor was built for
    pub fn new<T: Any + Send + Sync>(type_ref: TypeRef, value: T) -> Self {
        Self::from_state(type_ref, Box::new(value))
    }

    pub(crate) fn from_state(type_ref: TypeRef, state: Box<ObjectState>) -> Self {
        Object(Arc::new(ObjectInner {
            type_ref,
            state: RwLock::new(state),
        }))
    }

    /// The descriptor of this instance's type
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        &self.0.type_ref
    }

    /// The identity of this instance's type
    #[must_use]
    pub fn identity(&self) -> &TypeIdentity {
        self.0.type_ref.identity()
    }

    /// Returns `true` if both handles denote the same instance
    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the state as `T`, which may also be the state type of an ancestor.
    ///
    /// # Errors
    /// Returns [`Error::TargetMismatch`] if neither the state nor any ancestor state is a `T`,
    /// or [`Error::LockError`] if the state lock was poisoned.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        let guard = read_lock!(self.0.state);
        let mut ty = self.0.type_ref.clone();
        let mut state: &ObjectState = &**guard;
        loop {
            if let Some(value) = state.downcast_ref::<T>() {
                return Ok(f(value));
            }
            let base = ty.base().ok_or_else(|| self.mismatch(std::any::type_name::<T>()))?;
            state = ty
                .upcast(state)
                .ok_or_else(|| self.mismatch(std::any::type_name::<T>()))?;
            ty = base;
        }
    }

    /// Mutably borrow the state as `T`, which may also be the state type of an ancestor.
    ///
    /// # Errors
    /// Returns [`Error::TargetMismatch`] if neither the state nor any ancestor state is a `T`,
    /// or [`Error::LockError`] if the state lock was poisoned.
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let mut guard = write_lock!(self.0.state);
        let mut ty = self.0.type_ref.clone();
        let mut state: &mut ObjectState = &mut **guard;
        loop {
            if state.is::<T>() {
                return state
                    .downcast_mut::<T>()
                    .map(f)
                    .ok_or_else(|| self.mismatch(std::any::type_name::<T>()));
            }
            let base = ty.base().ok_or_else(|| self.mismatch(std::any::type_name::<T>()))?;
            state = ty
                .upcast_mut(state)
                .ok_or_else(|| self.mismatch(std::any::type_name::<T>()))?;
            ty = base;
        }
    }

    /// Run `f` on the part of the state declared by `declaring`
    pub(crate) fn read_as<R>(
        &self,
        declaring: &TypeIdentity,
        f: impl FnOnce(&ObjectState) -> Result<R>,
    ) -> Result<R> {
        let guard = read_lock!(self.0.state);
        let mut ty = self.0.type_ref.clone();
        let mut state: &ObjectState = &**guard;
        while ty.identity() != declaring {
            let base = ty.base().ok_or_else(|| self.mismatch(declaring))?;
            state = ty.upcast(state).ok_or_else(|| self.mismatch(declaring))?;
            ty = base;
        }
        f(state)
    }

    /// Mutable counterpart of [`Object::read_as`]
    pub(crate) fn write_as<R>(
        &self,
        declaring: &TypeIdentity,
        f: impl FnOnce(&mut ObjectState) -> Result<R>,
    ) -> Result<R> {
        let mut guard = write_lock!(self.0.state);
        let mut ty = self.0.type_ref.clone();
        let mut state: &mut ObjectState = &mut **guard;
        while ty.identity() != declaring {
            let base = ty.base().ok_or_else(|| self.mismatch(declaring))?;
            state = ty
                .upcast_mut(state)
                .ok_or_else(|| self.mismatch(declaring))?;
            ty = base;
        }
        f(state)
    }

    fn mismatch(&self, expected: impl fmt::Display) -> Error {
        Error::TargetMismatch {
            expected: expected.to_string(),
            found: self.identity().fullname(),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.identity(), Arc::as_ptr(&self.0))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.identity())
    }
}
