//! The descriptor facade.
//!
//! A [`Descriptor`] binds a [`Target`] (an instance or a type) to the cached member indices of
//! its type and offers name- and type-based field access, signature-based method invocation
//! and signature-based construction. Creating a descriptor is cheap once the type has been
//! indexed: the indices come from a shared [`MetadataCache`].
//!
//! # Resolution rules
//!
//! - Fields resolve by name, or by declared type where exactly one field must match
//! - Methods and constructors resolve by the [`Signature`] of the runtime types of the
//!   arguments; primitive and boxed spellings are the same signature element
//! - A type target only sees static members; instance members report `MemberNotFound`
//!
//! # Examples
//!
//! ```rust
//! use memberscope::metadata::typesystem::{types, TypeBuilder, Value};
//! use memberscope::{values, Descriptor, Object};
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! let person = TypeBuilder::<Person>::class("demo", "Person")
//!     .field("name", types::string(), |p| Value::from(p.name.as_str()), |p, v| {
//!         p.name = v.try_into()?;
//!         Ok(())
//!     })
//!     .field("age", types::int(), |p| Value::from(p.age), |p, v| {
//!         p.age = v.try_into()?;
//!         Ok(())
//!     })
//!     .constructor(&[], |_| Ok(Person::default()))
//!     .build()?;
//!
//! let bob = Descriptor::for_type(person)?.new_instance(&values![])?;
//! let descriptor = Descriptor::for_instance(bob)?;
//! descriptor.set_by_type("Bob")?;
//! descriptor.set_by_type(30)?;
//! assert_eq!(descriptor.get_by_name("name")?, Value::from("Bob"));
//! assert_eq!(descriptor.get_by_name_as::<i32>("age")?, 30);
//! # Ok::<(), memberscope::Error>(())
//! ```

use std::sync::{Arc, OnceLock};

use crate::{
    metadata::{
        members::{
            index::{field_not_found, invocable_not_found},
            FieldRecord, IndexPolicy, MemberIndex, MetadataCache,
        },
        signatures::Signature,
        typesystem::{matcher, TypeRef, Value},
    },
    Error, MemberKind, Object, Result,
};

/// What a [`Descriptor`] operates on
#[derive(Debug, Clone)]
pub enum Target {
    /// A concrete instance; instance and static members are accessible
    Instance(Object),
    /// A type marker; only static members are accessible
    Type(TypeRef),
}

impl Target {
    /// The type of the target
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        match self {
            Target::Instance(object) => object.type_ref(),
            Target::Type(ty) => ty,
        }
    }

    /// The bound instance, `None` for type targets
    #[must_use]
    pub fn instance(&self) -> Option<&Object> {
        match self {
            Target::Instance(object) => Some(object),
            Target::Type(_) => None,
        }
    }
}

impl From<Object> for Target {
    fn from(object: Object) -> Self {
        Target::Instance(object)
    }
}

impl From<TypeRef> for Target {
    fn from(ty: TypeRef) -> Self {
        Target::Type(ty)
    }
}

/// Index policies a [`Descriptor`] resolves its members under.
///
/// # Examples
///
/// ```rust
/// use memberscope::{descriptor::DescriptorConfig, metadata::members::IndexPolicy};
///
/// let config = DescriptorConfig::bean();
/// assert_eq!(config.fields, IndexPolicy::bean());
/// assert!(config.methods.stop_at.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescriptorConfig {
    /// Policy of the field index
    pub fields: IndexPolicy,
    /// Policy of the method index; constructors are indexed alongside and never inherited
    pub methods: IndexPolicy,
}

impl DescriptorConfig {
    /// Bean-style access: fields of the whole hierarchy including statics, methods of the whole
    /// hierarchy including the universal base
    #[must_use]
    pub fn bean() -> Self {
        DescriptorConfig {
            fields: IndexPolicy::bean(),
            methods: IndexPolicy::hierarchy().stop_at(None),
        }
    }
}

/// A target bound to the member indices of its type.
///
/// The field index is resolved on creation, the method index on first use.
pub struct Descriptor {
    target: Target,
    cache: Arc<MetadataCache>,
    config: DescriptorConfig,
    fields: Arc<MemberIndex>,
    methods: OnceLock<Arc<MemberIndex>>,
}

impl Descriptor {
    /// Bind an instance, using the global cache and the default configuration
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the cache build lock was poisoned.
    pub fn for_instance(object: Object) -> Result<Self> {
        Self::with_cache(
            Target::Instance(object),
            MetadataCache::global(),
            DescriptorConfig::default(),
        )
    }

    /// Bind a type, using the global cache and the default configuration
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the cache build lock was poisoned.
    pub fn for_type(ty: TypeRef) -> Result<Self> {
        Self::with_cache(
            Target::Type(ty),
            MetadataCache::global(),
            DescriptorConfig::default(),
        )
    }

    /// Bind `target` using an explicit cache and configuration.
    ///
    /// Type targets always index static fields, whatever `config.fields` says.
    ///
    /// ## Arguments
    /// * `target` - The instance or type to operate on
    /// * `cache`  - The cache to take indices from
    /// * `config` - The index policies
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the cache build lock was poisoned.
    pub fn with_cache(
        target: impl Into<Target>,
        cache: Arc<MetadataCache>,
        mut config: DescriptorConfig,
    ) -> Result<Self> {
        let target = target.into();
        if let Target::Type(_) = target {
            config.fields.include_static_fields = true;
        }

        let fields = cache.get_or_build(target.type_ref(), &config.fields)?;
        Ok(Descriptor {
            target,
            cache,
            config,
            fields,
            methods: OnceLock::new(),
        })
    }

    /// The bound target
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The type of the bound target
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        self.target.type_ref()
    }

    /// The effective configuration
    #[must_use]
    pub fn config(&self) -> &DescriptorConfig {
        &self.config
    }

    /// The field index this descriptor resolves against
    #[must_use]
    pub fn field_index(&self) -> &Arc<MemberIndex> {
        &self.fields
    }

    /// The method index this descriptor resolves against, built on first use
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the cache build lock was poisoned.
    pub fn method_index(&self) -> Result<&Arc<MemberIndex>> {
        if let Some(index) = self.methods.get() {
            return Ok(index);
        }
        let index = self
            .cache
            .get_or_build(self.target.type_ref(), &self.config.methods)?;
        Ok(self.methods.get_or_init(|| index))
    }

    fn visible(&self, is_static: bool) -> bool {
        is_static || matches!(self.target, Target::Instance(_))
    }

    fn field_by_name(&self, name: &str) -> Result<&FieldRecord> {
        match self.fields.field(name) {
            Some(field) if self.visible(field.is_static()) => Ok(field),
            _ => Err(field_not_found(self.fields.owner(), name)),
        }
    }

    fn field_by_type(&self, requested: &TypeRef) -> Result<&FieldRecord> {
        self.fields
            .select_field_by_type(requested, |field| self.visible(field.is_static()))
    }

    /// Read the field named `name`
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if no visible field has that name and
    /// [`Error::InvocationFailure`] if the read fails.
    pub fn get_by_name(&self, name: &str) -> Result<Value> {
        self.field_by_name(name)?.read(self.target.instance())
    }

    /// Read the single field whose declared type matches `ty`
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if no field matches, [`Error::AmbiguousMember`] if
    /// several do and [`Error::InvocationFailure`] if the read fails.
    pub fn get_by_type(&self, ty: &TypeRef) -> Result<Value> {
        self.field_by_type(ty)?.read(self.target.instance())
    }

    /// [`Descriptor::get_by_name`], converted into `T`
    ///
    /// # Errors
    /// As [`Descriptor::get_by_name`], plus [`Error::TypeConversionInvalid`] if the value does
    /// not convert.
    pub fn get_by_name_as<T>(&self, name: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = Error>,
    {
        T::try_from(self.get_by_name(name)?)
    }

    /// [`Descriptor::get_by_type`], converted into `T`
    ///
    /// # Errors
    /// As [`Descriptor::get_by_type`], plus [`Error::TypeConversionInvalid`] if the value does
    /// not convert.
    pub fn get_by_type_as<T>(&self, ty: &TypeRef) -> Result<T>
    where
        T: TryFrom<Value, Error = Error>,
    {
        T::try_from(self.get_by_type(ty)?)
    }

    /// Write the field named `name`
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if no visible field has that name and
    /// [`Error::InvocationFailure`] if the write fails.
    pub fn set_by_name(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.field_by_name(name)?
            .write(self.target.instance(), value.into())
    }

    /// Write the single field whose declared type matches the runtime type of `value`.
    ///
    /// If nothing matches, resolution is retried with the primitive/boxed dual of the runtime
    /// type before the original failure is reported.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if no field matches either spelling,
    /// [`Error::AmbiguousMember`] if several fields match and [`Error::InvocationFailure`] if
    /// the write fails.
    pub fn set_by_type(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let requested = value.runtime_type();

        let field = match self.field_by_type(&requested) {
            Ok(field) => field,
            Err(original @ Error::MemberNotFound { .. }) => {
                let retry = matcher::dual(&requested).map(|dual| self.field_by_type(&dual));
                match retry {
                    Some(Ok(field)) => field,
                    Some(Err(Error::MemberNotFound { .. })) | None => return Err(original),
                    Some(Err(other)) => return Err(other),
                }
            }
            Err(other) => return Err(other),
        };
        field.write(self.target.instance(), value)
    }

    /// Invoke the method `name` with `args`, resolved by the runtime types of the arguments
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] naming the attempted signature if no visible method
    /// matches and [`Error::InvocationFailure`] if the call fails.
    pub fn invoke_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        let index = self.method_index()?;
        let method = index.resolve_method(name, args)?;
        if !self.visible(method.is_static()) {
            return Err(invocable_not_found(
                MemberKind::Method,
                index.owner(),
                Some(name),
                method.signature(),
                args,
            ));
        }
        method.invoke(self.target.instance(), args)
    }

    /// Create a new instance of the target's type with the constructor matching `args`.
    ///
    /// The descriptor stays bound to its current target.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] naming the attempted signature if no constructor
    /// matches and [`Error::InvocationFailure`] if construction fails.
    pub fn new_instance(&self, args: &[Value]) -> Result<Object> {
        self.method_index()?
            .resolve_constructor(args)?
            .construct(self.target.type_ref(), args)
    }

    /// Names of the fields this descriptor can access, in index order
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.fields
            .fields()
            .filter(|field| self.visible(field.is_static()))
            .map(|field| field.name().to_string())
            .collect()
    }

    /// Accessible fields carrying the attribute `key`
    #[must_use]
    pub fn fields_with_attribute(&self, key: &str) -> Vec<&FieldRecord> {
        self.fields
            .fields()
            .filter(|field| self.visible(field.is_static()) && field.attribute(key).is_some())
            .collect()
    }

    /// Returns `true` if a method with signature `signature` is accessible
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the cache build lock was poisoned.
    pub fn has_method(&self, signature: &Signature) -> Result<bool> {
        Ok(self
            .method_index()?
            .method(signature)
            .is_some_and(|method| self.visible(method.is_static())))
    }
}

impl std::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("target", &self.target)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
