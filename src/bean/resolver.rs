use dashmap::DashMap;
use indexmap::IndexMap;
use std::sync::{Arc, OnceLock};

use crate::{
    descriptor::DescriptorConfig,
    metadata::{
        members::{MemberIndex, MetadataCache, MethodRecord},
        typesystem::{matcher, PrimitiveKind, TypeFlavor, TypeIdentity, TypeRef, Value},
    },
    Error, MemberKind, Object, Result,
};

/// Properties of a type by name, in declaration order
pub type PropertySet = IndexMap<String, PropertyDescriptor>;

static GLOBAL: OnceLock<Arc<PropertyResolver>> = OnceLock::new();

/// A property derived from accessor naming conventions.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: String,
    property_type: TypeRef,
    reader: Option<MethodRecord>,
    writer: Option<MethodRecord>,
}

impl PropertyDescriptor {
    /// Name of the property, e.g. `balance` for `getBalance`
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the property
    #[must_use]
    pub fn property_type(&self) -> &TypeRef {
        &self.property_type
    }

    /// The `getX` / `isX` accessor
    #[must_use]
    pub fn reader(&self) -> Option<&MethodRecord> {
        self.reader.as_ref()
    }

    /// The `setX` mutator
    #[must_use]
    pub fn writer(&self) -> Option<&MethodRecord> {
        self.writer.as_ref()
    }
}

/// Derives and caches the [`PropertySet`] of types.
///
/// Accessors are non-static methods named `getX` (no parameters, non-void), `isX` (no
/// parameters, boolean) and `setX` (one parameter). A setter whose parameter type differs from
/// the getter's return type does not belong to the property.
pub struct PropertyResolver {
    metadata: Arc<MetadataCache>,
    properties: DashMap<TypeIdentity, Arc<PropertySet>>,
}

impl PropertyResolver {
    /// Create a resolver taking method indices from `metadata`
    #[must_use]
    pub fn new(metadata: Arc<MetadataCache>) -> Self {
        PropertyResolver {
            metadata,
            properties: DashMap::new(),
        }
    }

    /// The process-wide resolver, backed by [`MetadataCache::global`]
    #[must_use]
    pub fn global() -> Arc<PropertyResolver> {
        GLOBAL
            .get_or_init(|| Arc::new(PropertyResolver::new(MetadataCache::global())))
            .clone()
    }

    /// The metadata cache method indices are taken from
    #[must_use]
    pub fn metadata(&self) -> &Arc<MetadataCache> {
        &self.metadata
    }

    /// The properties of `ty`
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the metadata cache build lock was poisoned.
    pub fn properties(&self, ty: &TypeRef) -> Result<Arc<PropertySet>> {
        if let Some(set) = self.properties.get(ty.identity()) {
            return Ok(set.value().clone());
        }

        let index = self
            .metadata
            .get_or_build(ty, &DescriptorConfig::bean().methods)?;
        let set = Arc::new(introspect(&index));
        tracing::debug!(owner = %ty.identity(), properties = set.len(), "derived bean properties");
        Ok(self
            .properties
            .entry(ty.identity().clone())
            .or_insert(set)
            .value()
            .clone())
    }
}

fn introspect(index: &MemberIndex) -> PropertySet {
    let mut accessors: IndexMap<String, (Option<MethodRecord>, Option<MethodRecord>)> =
        IndexMap::new();

    for method in index.methods().filter(|method| !method.is_static()) {
        let name = method.name();
        let returns_value = method.return_type().flavor() != TypeFlavor::Void;
        let returns_bool = method.return_type().flavor().primitive_kind()
            == Some(PrimitiveKind::Boolean);

        match method.params().len() {
            0 if returns_value => {
                let property = accessor_suffix(name, "get")
                    .or_else(|| accessor_suffix(name, "is").filter(|_| returns_bool));
                if let Some(property) = property {
                    let slot = accessors.entry(decapitalize(property)).or_default();
                    if slot.0.is_none() {
                        slot.0 = Some(method.clone());
                    }
                }
            }
            1 => {
                if let Some(property) = accessor_suffix(name, "set") {
                    let slot = accessors.entry(decapitalize(property)).or_default();
                    if slot.1.is_none() {
                        slot.1 = Some(method.clone());
                    }
                }
            }
            _ => {}
        }
    }

    accessors
        .into_iter()
        .filter_map(|(name, (reader, writer))| {
            let writer = match (&reader, writer) {
                (Some(reader), Some(writer))
                    if !same_type(reader.return_type(), &writer.params()[0]) =>
                {
                    tracing::trace!(
                        property = %name,
                        setter = %writer.qualified_name(),
                        "setter type does not match getter"
                    );
                    None
                }
                (_, writer) => writer,
            };

            let property_type = match (&reader, &writer) {
                (Some(reader), _) => reader.return_type().clone(),
                (None, Some(writer)) => writer.params()[0].clone(),
                (None, None) => return None,
            };

            Some((
                name.clone(),
                PropertyDescriptor {
                    name,
                    property_type,
                    reader,
                    writer,
                },
            ))
        })
        .collect()
}

fn accessor_suffix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}

fn same_type(a: &TypeRef, b: &TypeRef) -> bool {
    matcher::canonicalize(a).identity() == matcher::canonicalize(b).identity()
}

/// `Balance` → `balance`, `URL` → `URL`
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => first.to_lowercase().chain(name[first.len_utf8()..].chars()).collect(),
        (None, _) => String::new(),
    }
}

/// Bean-convention access to the properties of one object.
///
/// # Examples
///
/// ```rust,ignore
/// let account = BeanIntrospector::new(object)?;
/// account.invoke_setter("balance", 250_i64)?;
/// assert_eq!(account.invoke_getter("balance")?, Value::I8(250));
/// ```
pub struct BeanIntrospector {
    target: Object,
    properties: Arc<PropertySet>,
}

impl BeanIntrospector {
    /// Introspect `target` with the global resolver
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the metadata cache build lock was poisoned.
    pub fn new(target: Object) -> Result<Self> {
        Self::with_resolver(target, &PropertyResolver::global())
    }

    /// Introspect `target` with an explicit resolver
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the metadata cache build lock was poisoned.
    pub fn with_resolver(target: Object, resolver: &PropertyResolver) -> Result<Self> {
        let properties = resolver.properties(target.type_ref())?;
        Ok(BeanIntrospector { target, properties })
    }

    /// The introspected object
    #[must_use]
    pub fn target(&self) -> &Object {
        &self.target
    }

    /// All properties of the object's type
    #[must_use]
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// Call the reader of property `name`
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if there is no readable property `name` and
    /// [`Error::InvocationFailure`] if the reader fails.
    pub fn invoke_getter(&self, name: &str) -> Result<Value> {
        let reader = self
            .properties
            .get(name)
            .and_then(PropertyDescriptor::reader)
            .ok_or_else(|| self.not_found(name))?;
        reader.invoke(Some(&self.target), &[])
    }

    /// Call the writer of property `name`
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if there is no writable property `name` and
    /// [`Error::InvocationFailure`] if the writer fails.
    pub fn invoke_setter(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let writer = self
            .properties
            .get(name)
            .and_then(PropertyDescriptor::writer)
            .ok_or_else(|| self.not_found(name))?;
        writer.invoke(Some(&self.target), &[value.into()]).map(|_| ())
    }

    fn not_found(&self, name: &str) -> Error {
        Error::MemberNotFound {
            kind: MemberKind::Property,
            owner: self.target.identity().clone(),
            name: Some(name.to_string()),
            params: Vec::new(),
            request: name.to_string(),
        }
    }
}
