//! Member records, per-type member indices and the metadata cache.
//!
//! A type declares its members as records: [`FieldRecord`], [`MethodRecord`] and
//! [`ConstructorRecord`]. Each record carries its metadata (name, types, declaring type,
//! [`MemberFlags`]) together with the accessor that reads, writes, invokes or constructs through
//! it. Records are cheap to clone, the accessors are shared.
//!
//! # Key Components
//!
//! - [`FieldRecord`]: Instance or static field with typed accessors and attributes
//! - [`MethodRecord`]: Method with a precomputed [`Signature`] and an invoker
//! - [`ConstructorRecord`]: Factory producing the state of a new object
//! - [`MemberIndex`]: Name and signature keyed index over a type (and its ancestors)
//! - [`IndexPolicy`]: What an index includes and how far it walks the hierarchy
//! - [`MetadataCache`]: Process-wide store of built indices, one build per key

mod cache;
pub(crate) mod index;

use std::{fmt, sync::Arc, sync::RwLock};

use bitflags::bitflags;

pub use cache::MetadataCache;
pub use index::{IndexPolicy, MemberIndex};

use crate::{
    metadata::{
        signatures::Signature,
        typesystem::{matcher, ObjectState, TypeIdentity, TypeRef, Value},
    },
    Error, Object, Result,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Modifiers of a declared member
    pub struct MemberFlags: u32 {
        /// Member belongs to the type, not to instances
        const STATIC = 0x0001;
        /// Member is not part of the public surface of its type
        const PRIVATE = 0x0002;
        /// Member can not be written after initialization
        const FINAL = 0x0004;
    }
}

/// Reads a field from the state of its declaring type
pub type FieldGetter = Arc<dyn Fn(&ObjectState) -> Result<Value> + Send + Sync>;
/// Writes a field into the state of its declaring type
pub type FieldSetter = Arc<dyn Fn(&mut ObjectState, Value) -> Result<()> + Send + Sync>;
/// Creates the state of a new object from constructor arguments
pub type Factory = Arc<dyn Fn(&[Value]) -> Result<Box<ObjectState>> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum FieldStorage {
    Instance { get: FieldGetter, set: FieldSetter },
    Static(Arc<RwLock<Value>>),
}

/// A declared field.
///
/// Instance fields access the state of a bound [`Object`], static fields own a shared slot
/// that is initialized when the type is built.
#[derive(Clone)]
pub struct FieldRecord {
    pub(crate) name: Arc<str>,
    pub(crate) field_type: TypeRef,
    pub(crate) declaring: TypeIdentity,
    pub(crate) flags: MemberFlags,
    pub(crate) attributes: Vec<(Arc<str>, Arc<str>)>,
    pub(crate) storage: FieldStorage,
}

impl FieldRecord {
    /// Name of the field
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type of the field
    #[must_use]
    pub fn field_type(&self) -> &TypeRef {
        &self.field_type
    }

    /// Identity of the type that declares this field
    #[must_use]
    pub fn declaring(&self) -> &TypeIdentity {
        &self.declaring
    }

    /// Modifiers of this field
    #[must_use]
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    /// Returns `true` for class-level fields
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    /// Value of the attribute `key`, if the field carries it
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| &**v)
    }

    /// All attributes, in declaration order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (&**k, &**v))
    }

    /// `Namespace.Type::field`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.declaring, self.name)
    }

    /// Read the field.
    ///
    /// ## Arguments
    /// * `target` - The object to read from; ignored for static fields
    ///
    /// # Errors
    /// Returns [`Error::InvocationFailure`] if the read fails, wrapping the cause: a missing
    /// receiver, an object that does not carry the declaring state or a failing accessor.
    pub fn read(&self, target: Option<&Object>) -> Result<Value> {
        self.read_inner(target)
            .map_err(|cause| Error::invocation(self.qualified_name(), cause))
    }

    fn read_inner(&self, target: Option<&Object>) -> Result<Value> {
        match &self.storage {
            FieldStorage::Static(slot) => Ok(read_lock!(slot).clone()),
            FieldStorage::Instance { get, .. } => {
                let object =
                    target.ok_or_else(|| Error::MissingReceiver(self.qualified_name()))?;
                object.read_as(&self.declaring, |state| get(state))
            }
        }
    }

    /// Write the field.
    ///
    /// ## Arguments
    /// * `target` - The object to write to; ignored for static fields
    /// * `value`  - The new value; static slots accept values that widen losslessly
    ///
    /// # Errors
    /// Returns [`Error::InvocationFailure`] if the write fails, wrapping the cause.
    pub fn write(&self, target: Option<&Object>, value: Value) -> Result<()> {
        self.write_inner(target, value)
            .map_err(|cause| Error::invocation(self.qualified_name(), cause))
    }

    fn write_inner(&self, target: Option<&Object>, value: Value) -> Result<()> {
        if self.flags.contains(MemberFlags::FINAL) {
            return Err(Error::ReadOnly(self.qualified_name()));
        }

        match &self.storage {
            FieldStorage::Static(slot) => {
                let coerced = matcher::coerce(self.field_type.as_ref(), &value).ok_or_else(|| {
                    Error::TypeConversionInvalid {
                        expected: self.field_type.identity().fullname(),
                        found: value.to_string(),
                    }
                })?;
                *write_lock!(slot) = coerced;
                Ok(())
            }
            FieldStorage::Instance { set, .. } => {
                let object =
                    target.ok_or_else(|| Error::MissingReceiver(self.qualified_name()))?;
                object.write_as(&self.declaring, |state| set(state, value))
            }
        }
    }
}

impl fmt::Debug for FieldRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRecord")
            .field("name", &self.name)
            .field("field_type", &self.field_type.identity())
            .field("declaring", &self.declaring)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub(crate) enum Invoker {
    Ref(Arc<dyn Fn(&ObjectState, &[Value]) -> Result<Value> + Send + Sync>),
    Mut(Arc<dyn Fn(&mut ObjectState, &[Value]) -> Result<Value> + Send + Sync>),
    Static(Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>),
}

/// A declared method.
#[derive(Clone)]
pub struct MethodRecord {
    pub(crate) name: Arc<str>,
    pub(crate) params: Vec<TypeRef>,
    pub(crate) return_type: TypeRef,
    pub(crate) declaring: TypeIdentity,
    pub(crate) flags: MemberFlags,
    pub(crate) signature: Signature,
    pub(crate) invoker: Invoker,
}

impl MethodRecord {
    /// Name of the method
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types, in order
    #[must_use]
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Declared return type, [`crate::metadata::typesystem::types::void`] for procedures
    #[must_use]
    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    /// Identity of the type that declares this method
    #[must_use]
    pub fn declaring(&self) -> &TypeIdentity {
        &self.declaring
    }

    /// Modifiers of this method
    #[must_use]
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    /// Returns `true` for class-level methods
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    /// The overload key of this method
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// `Namespace.Type::name(Params)`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.declaring, self.signature)
    }

    /// Invoke the method.
    ///
    /// ## Arguments
    /// * `target` - The receiver; ignored for static methods
    /// * `args`   - The arguments, one per declared parameter
    ///
    /// # Errors
    /// Returns [`Error::InvocationFailure`] wrapping the cause if the call fails.
    pub fn invoke(&self, target: Option<&Object>, args: &[Value]) -> Result<Value> {
        self.invoke_inner(target, args)
            .map_err(|cause| Error::invocation(self.qualified_name(), cause))
    }

    fn invoke_inner(&self, target: Option<&Object>, args: &[Value]) -> Result<Value> {
        if args.len() != self.params.len() {
            return Err(Error::ArgumentCount {
                expected: self.params.len(),
                found: args.len(),
            });
        }

        match &self.invoker {
            Invoker::Static(call) => call(args),
            Invoker::Ref(call) => {
                let object =
                    target.ok_or_else(|| Error::MissingReceiver(self.qualified_name()))?;
                object.read_as(&self.declaring, |state| call(state, args))
            }
            Invoker::Mut(call) => {
                let object =
                    target.ok_or_else(|| Error::MissingReceiver(self.qualified_name()))?;
                object.write_as(&self.declaring, |state| call(state, args))
            }
        }
    }
}

impl fmt::Debug for MethodRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRecord")
            .field("signature", &self.signature)
            .field("return_type", &self.return_type.identity())
            .field("declaring", &self.declaring)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A declared constructor.
#[derive(Clone)]
pub struct ConstructorRecord {
    pub(crate) params: Vec<TypeRef>,
    pub(crate) declaring: TypeIdentity,
    pub(crate) signature: Signature,
    pub(crate) factory: Factory,
}

impl ConstructorRecord {
    /// Declared parameter types, in order
    #[must_use]
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Identity of the type that declares this constructor
    #[must_use]
    pub fn declaring(&self) -> &TypeIdentity {
        &self.declaring
    }

    /// The overload key of this constructor
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Create a new object of type `owner`.
    ///
    /// ## Arguments
    /// * `owner` - The type the constructor belongs to; becomes the type of the new object
    /// * `args`  - The arguments, one per declared parameter
    ///
    /// # Errors
    /// Returns [`Error::InvocationFailure`] wrapping the cause if construction fails.
    pub fn construct(&self, owner: &TypeRef, args: &[Value]) -> Result<Object> {
        if args.len() != self.params.len() {
            return Err(Error::invocation(
                self.qualified_name(),
                Error::ArgumentCount {
                    expected: self.params.len(),
                    found: args.len(),
                },
            ));
        }

        let state = (self.factory)(args)
            .map_err(|cause| Error::invocation(self.qualified_name(), cause))?;
        Ok(Object::from_state(owner.clone(), state))
    }

    /// `Namespace.Type::(Params)`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.declaring, self.signature)
    }
}

impl fmt::Debug for ConstructorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorRecord")
            .field("signature", &self.signature)
            .field("declaring", &self.declaring)
            .finish_non_exhaustive()
    }
}

/// Any member of an index, as returned by [`MemberIndex::members`]
#[derive(Debug, Clone, Copy)]
pub enum MemberRecord<'a> {
    /// A field
    Field(&'a FieldRecord),
    /// A method
    Method(&'a MethodRecord),
    /// A constructor
    Constructor(&'a ConstructorRecord),
}

impl MemberRecord<'_> {
    /// Name of the member, `None` for constructors
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            MemberRecord::Field(field) => Some(field.name()),
            MemberRecord::Method(method) => Some(method.name()),
            MemberRecord::Constructor(_) => None,
        }
    }

    /// Identity of the declaring type
    #[must_use]
    pub fn declaring(&self) -> &TypeIdentity {
        match self {
            MemberRecord::Field(field) => field.declaring(),
            MemberRecord::Method(method) => method.declaring(),
            MemberRecord::Constructor(constructor) => constructor.declaring(),
        }
    }
}
