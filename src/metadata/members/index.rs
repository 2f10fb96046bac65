//! Per-type member indices.
//!
//! [`MemberIndex::build`] scans a type, and optionally its ancestors up to a stop type, and
//! collects fields by name and methods and constructors by [`Signature`]. Traversal starts at the
//! most-derived type, so the first occurrence of a key wins and derived members shadow ancestor
//! members with the same name or signature. What is collected is governed by an [`IndexPolicy`].

use indexmap::{map::Entry, IndexMap};
use std::sync::Arc;

use crate::{
    metadata::{
        members::{ConstructorRecord, FieldRecord, MemberRecord, MethodRecord},
        signatures::{describe, Signature},
        typesystem::{matcher, types, Ancestry, TypeIdentity, TypeRef, Value},
    },
    Error, MemberKind, Result,
};

/// Configuration of a member index build.
///
/// The policy is part of the cache key, so indices built under different policies for the same
/// type coexist.
///
/// # Examples
///
/// ```rust
/// use memberscope::metadata::members::IndexPolicy;
///
/// let policy = IndexPolicy::hierarchy().with_static_fields(true);
/// assert!(policy.traverse_ancestors);
/// assert!(policy.include_static_fields);
/// assert_eq!(IndexPolicy::default(), IndexPolicy::declared_only());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexPolicy {
    /// Collect static fields; static methods are always collected
    pub include_static_fields: bool,

    /// Walk the ancestor chain after the type itself
    pub traverse_ancestors: bool,

    /// Ancestor at which the walk ends, excluded from the scan (default: the universal base)
    pub stop_at: Option<TypeIdentity>,
}

impl Default for IndexPolicy {
    fn default() -> Self {
        Self {
            include_static_fields: false,
            traverse_ancestors: false,
            stop_at: Some(types::object().identity().clone()),
        }
    }
}

impl IndexPolicy {
    /// Members declared directly on the type, without static fields
    #[must_use]
    pub fn declared_only() -> Self {
        Self::default()
    }

    /// Members of the type and its ancestors, up to the universal base
    #[must_use]
    pub fn hierarchy() -> Self {
        Self {
            traverse_ancestors: true,
            ..Self::default()
        }
    }

    /// The field policy of bean-style access: the whole hierarchy including static fields
    #[must_use]
    pub fn bean() -> Self {
        Self {
            include_static_fields: true,
            traverse_ancestors: true,
            ..Self::default()
        }
    }

    /// Set whether static fields are collected
    #[must_use]
    pub fn with_static_fields(mut self, include: bool) -> Self {
        self.include_static_fields = include;
        self
    }

    /// Set whether ancestors are scanned
    #[must_use]
    pub fn with_ancestors(mut self, traverse: bool) -> Self {
        self.traverse_ancestors = traverse;
        self
    }

    /// Set the ancestor at which the walk ends; `None` walks to the root
    #[must_use]
    pub fn stop_at(mut self, stop: Option<TypeIdentity>) -> Self {
        self.stop_at = stop;
        self
    }
}

/// The resolved members of one type under one [`IndexPolicy`].
///
/// Immutable once built. Iteration follows declaration order, most-derived type first.
pub struct MemberIndex {
    owner: TypeIdentity,
    policy: IndexPolicy,
    fields: IndexMap<Arc<str>, FieldRecord>,
    methods: IndexMap<Signature, MethodRecord>,
    constructors: IndexMap<Signature, ConstructorRecord>,
}

impl MemberIndex {
    /// Build the index of `ty` under `policy`.
    ///
    /// Constructors are never inherited; only those declared on `ty` itself are collected.
    ///
    /// ## Arguments
    /// * `ty`     - The type to index
    /// * `policy` - What to collect and how far to walk
    #[must_use]
    pub fn build(ty: &TypeRef, policy: &IndexPolicy) -> Self {
        let mut fields: IndexMap<Arc<str>, FieldRecord> = IndexMap::new();
        let mut methods: IndexMap<Signature, MethodRecord> = IndexMap::new();

        for current in Ancestry::new(
            ty.clone(),
            policy.traverse_ancestors,
            policy.stop_at.clone(),
        ) {
            for field in current.declared_fields() {
                if field.is_static() && !policy.include_static_fields {
                    continue;
                }
                match fields.entry(field.name.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(field.clone());
                    }
                    Entry::Occupied(existing) => {
                        tracing::trace!(
                            owner = %ty.identity(),
                            field = %field.qualified_name(),
                            kept = %existing.get().qualified_name(),
                            "field shadowed"
                        );
                    }
                }
            }

            for method in current.declared_methods() {
                match methods.entry(method.signature.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(method.clone());
                    }
                    Entry::Occupied(existing) => {
                        tracing::trace!(
                            owner = %ty.identity(),
                            method = %method.qualified_name(),
                            kept = %existing.get().qualified_name(),
                            "signature collapsed"
                        );
                    }
                }
            }
        }

        let mut constructors: IndexMap<Signature, ConstructorRecord> = IndexMap::new();
        for constructor in ty.declared_constructors() {
            match constructors.entry(constructor.signature.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(constructor.clone());
                }
                Entry::Occupied(_) => {
                    tracing::trace!(
                        constructor = %constructor.qualified_name(),
                        "signature collapsed"
                    );
                }
            }
        }

        MemberIndex {
            owner: ty.identity().clone(),
            policy: policy.clone(),
            fields,
            methods,
            constructors,
        }
    }

    /// Identity of the indexed type
    #[must_use]
    pub fn owner(&self) -> &TypeIdentity {
        &self.owner
    }

    /// The policy this index was built under
    #[must_use]
    pub fn policy(&self) -> &IndexPolicy {
        &self.policy
    }

    /// The field named `name`
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldRecord> {
        self.fields.get(name)
    }

    /// All indexed fields
    pub fn fields(&self) -> impl Iterator<Item = &FieldRecord> {
        self.fields.values()
    }

    /// Names of all indexed fields
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|name| &**name).collect()
    }

    /// All fields whose declared type accepts `requested`, see [`matcher::field_accepts`]
    #[must_use]
    pub fn fields_of_type(&self, requested: &TypeRef) -> Vec<&FieldRecord> {
        self.fields
            .values()
            .filter(|field| matcher::field_accepts(field.field_type(), requested))
            .collect()
    }

    /// Resolve a field by name.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if the index holds no such field.
    pub fn resolve_field(&self, name: &str) -> Result<&FieldRecord> {
        self.field(name)
            .ok_or_else(|| field_not_found(&self.owner, name))
    }

    /// Resolve the single field whose declared type accepts `requested`.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if no field matches and [`Error::AmbiguousMember`],
    /// listing every candidate in declaration order, if more than one does.
    pub fn resolve_field_by_type(&self, requested: &TypeRef) -> Result<&FieldRecord> {
        self.select_field_by_type(requested, |_| true)
    }

    /// [`MemberIndex::resolve_field_by_type`] restricted to the fields `visible` admits
    pub(crate) fn select_field_by_type(
        &self,
        requested: &TypeRef,
        visible: impl Fn(&FieldRecord) -> bool,
    ) -> Result<&FieldRecord> {
        let mut candidates = self
            .fields_of_type(requested)
            .into_iter()
            .filter(|field| visible(field));

        match (candidates.next(), candidates.next()) {
            (Some(field), None) => Ok(field),
            (None, _) => {
                tracing::trace!(owner = %self.owner, requested = %requested.identity(), "no field of type");
                Err(Error::MemberNotFound {
                    kind: MemberKind::FieldOfType,
                    owner: self.owner.clone(),
                    name: None,
                    params: vec![requested.identity().clone()],
                    request: requested.identity().fullname(),
                })
            }
            (Some(first), Some(second)) => {
                let candidates = [first, second]
                    .into_iter()
                    .chain(candidates)
                    .map(|field| field.name().to_string())
                    .collect();
                Err(Error::AmbiguousMember {
                    owner: self.owner.clone(),
                    requested: requested.identity().clone(),
                    candidates,
                })
            }
        }
    }

    /// The method with signature `signature`
    #[must_use]
    pub fn method(&self, signature: &Signature) -> Option<&MethodRecord> {
        self.methods.get(signature)
    }

    /// All indexed methods
    pub fn methods(&self) -> impl Iterator<Item = &MethodRecord> {
        self.methods.values()
    }

    /// Resolve the method `name` for the runtime types of `args`.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] naming the attempted signature if no method matches.
    pub fn resolve_method(&self, name: &str, args: &[Value]) -> Result<&MethodRecord> {
        let signature = Signature::of_values(Some(name), args);
        self.method(&signature).ok_or_else(|| {
            invocable_not_found(MemberKind::Method, &self.owner, Some(name), &signature, args)
        })
    }

    /// The constructor with signature `signature`
    #[must_use]
    pub fn constructor(&self, signature: &Signature) -> Option<&ConstructorRecord> {
        self.constructors.get(signature)
    }

    /// All indexed constructors
    pub fn constructors(&self) -> impl Iterator<Item = &ConstructorRecord> {
        self.constructors.values()
    }

    /// Resolve the constructor for the runtime types of `args`.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] naming the attempted signature if no constructor
    /// matches.
    pub fn resolve_constructor(&self, args: &[Value]) -> Result<&ConstructorRecord> {
        let signature = Signature::of_values(None, args);
        self.constructor(&signature).ok_or_else(|| {
            invocable_not_found(MemberKind::Constructor, &self.owner, None, &signature, args)
        })
    }

    /// Every indexed member: fields, then methods, then constructors
    #[must_use]
    pub fn members(&self) -> Vec<MemberRecord<'_>> {
        self.fields
            .values()
            .map(MemberRecord::Field)
            .chain(self.methods.values().map(MemberRecord::Method))
            .chain(self.constructors.values().map(MemberRecord::Constructor))
            .collect()
    }

    /// Number of indexed fields
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of indexed methods
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Number of indexed constructors
    #[must_use]
    pub fn constructor_count(&self) -> usize {
        self.constructors.len()
    }
}

impl std::fmt::Debug for MemberIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberIndex")
            .field("owner", &self.owner)
            .field("policy", &self.policy)
            .field("fields", &self.field_names())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub(crate) fn field_not_found(owner: &TypeIdentity, name: &str) -> Error {
    tracing::trace!(owner = %owner, field = name, "no such field");
    Error::MemberNotFound {
        kind: MemberKind::Field,
        owner: owner.clone(),
        name: Some(name.to_string()),
        params: Vec::new(),
        request: name.to_string(),
    }
}

pub(crate) fn invocable_not_found(
    kind: MemberKind,
    owner: &TypeIdentity,
    name: Option<&str>,
    signature: &Signature,
    args: &[Value],
) -> Error {
    let arg_types: Vec<TypeRef> = args.iter().map(Value::runtime_type).collect();
    let request = describe(name, &arg_types);
    tracing::trace!(owner = %owner, request = %request, "no such {}", kind);
    Error::MemberNotFound {
        kind,
        owner: owner.clone(),
        name: name.map(str::to_string),
        params: signature.params().to_vec(),
        request,
    }
}
