//! Builder for type descriptor tables.
//!
//! This module provides the [`TypeBuilder`] struct, which offers a fluent API for describing a
//! Rust type `T` as a [`ReflectType`]: its identity, its base type, and the fields, methods and
//! constructors it declares. Accessors are plain closures over `T`; the builder wraps them into
//! type-erased records that check the state they are handed.
//!
//! # Example
//!
//! ```rust
//! use memberscope::metadata::typesystem::{types, TypeBuilder, Value};
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let point = TypeBuilder::<Point>::class("demo", "Point")
//!     .field("x", types::int(), |p| Value::from(p.x), |p, v| {
//!         p.x = v.try_into()?;
//!         Ok(())
//!     })
//!     .attribute("column", "pos_x")
//!     .field("y", types::int(), |p| Value::from(p.y), |p, v| {
//!         p.y = v.try_into()?;
//!         Ok(())
//!     })
//!     .method("sum", &[], types::int(), |p, _| Ok(Value::from(p.x + p.y)))
//!     .constructor(&[], |_| Ok(Point::default()))
//!     .constructor(&[types::int(), types::int()], |args| {
//!         Ok(Point {
//!             x: args[0].clone().try_into()?,
//!             y: args[1].clone().try_into()?,
//!         })
//!     })
//!     .build()?;
//!
//! assert_eq!(point.declared_fields()[0].attribute("column"), Some("pos_x"));
//! assert_eq!(point.declared_constructors().len(), 2);
//! # Ok::<(), memberscope::Error>(())
//! ```

use std::{
    any::{type_name, Any},
    collections::HashSet,
    marker::PhantomData,
    sync::{Arc, RwLock},
};

use crate::{
    metadata::{
        members::{ConstructorRecord, FieldRecord, FieldStorage, Invoker, MemberFlags, MethodRecord},
        signatures::Signature,
        typesystem::{
            matcher, types, ObjectState, Projection, ReflectType, TypeFlavor, TypeIdentity,
            TypeRef, TypeRegistry, Upcast, Value,
        },
    },
    Error, Result,
};

/// Provides a fluent API for describing a Rust type as a [`ReflectType`].
///
/// Members are declared in order; the order is kept by the descriptor and by every index built
/// from it. Declaration mistakes (an attribute before any field, a duplicate field name, a static
/// initial value that does not fit its type) are reported by [`TypeBuilder::build`].
///
/// Member types must already exist when they are declared, so a type can not declare members of
/// its own type.
pub struct TypeBuilder<T> {
    identity: TypeIdentity,
    base: TypeRef,
    upcast: Option<Arc<dyn Upcast>>,
    fields: Vec<FieldRecord>,
    statics: Vec<(usize, Value)>,
    methods: Vec<MethodRecord>,
    constructors: Vec<ConstructorRecord>,
    errors: Vec<Error>,
    _state: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypeBuilder<T> {
    /// Start describing a class deriving from the universal base type
    ///
    /// ## Arguments
    /// * `namespace` - Namespace of the class, may be empty
    /// * `name`      - Name of the class
    #[must_use]
    pub fn class(namespace: &str, name: &str) -> Self {
        TypeBuilder {
            identity: TypeIdentity::new(namespace, name),
            base: types::object(),
            upcast: None,
            fields: Vec::new(),
            statics: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            errors: Vec::new(),
            _state: PhantomData,
        }
    }

    /// Set the number of generic parameters
    #[must_use]
    pub fn with_arity(mut self, arity: u16) -> Self {
        self.identity = self.identity.with_arity(arity);
        self
    }

    /// Derive from `base`, whose state `B` is embedded in `T`.
    ///
    /// ## Arguments
    /// * `base`     - The descriptor of the ancestor
    /// * `view`     - Projects `T` onto the embedded ancestor state
    /// * `view_mut` - Mutable counterpart of `view`
    #[must_use]
    pub fn extends<B: Any + Send + Sync>(
        mut self,
        base: TypeRef,
        view: fn(&T) -> &B,
        view_mut: fn(&mut T) -> &mut B,
    ) -> Self {
        self.base = base;
        self.upcast = Some(Arc::new(Projection { view, view_mut }));
        self
    }

    /// Declare an instance field
    ///
    /// ## Arguments
    /// * `name` - Name of the field
    /// * `ty`   - Declared type of the field
    /// * `get`  - Reads the field from `T`
    /// * `set`  - Writes the field into `T`, converting the offered [`Value`]
    #[must_use]
    pub fn field<G, S>(self, name: &str, ty: TypeRef, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.instance_field(name, ty, MemberFlags::empty(), get, set)
    }

    /// Declare a private instance field; it is accessible through descriptors like any other
    #[must_use]
    pub fn private_field<G, S>(self, name: &str, ty: TypeRef, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.instance_field(name, ty, MemberFlags::PRIVATE, get, set)
    }

    fn instance_field<G, S>(
        mut self,
        name: &str,
        ty: TypeRef,
        flags: MemberFlags,
        get: G,
        set: S,
    ) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    {
        let storage = FieldStorage::Instance {
            get: Arc::new(move |state: &ObjectState| -> Result<Value> {
                Ok(get(state_of::<T>(state)?))
            }),
            set: Arc::new(move |state: &mut ObjectState, value: Value| -> Result<()> {
                set(state_of_mut::<T>(state)?, value)
            }),
        };
        self.push_field(name, ty, flags, storage);
        self
    }

    /// Declare a static field with its own storage slot
    ///
    /// ## Arguments
    /// * `name`    - Name of the field
    /// * `ty`      - Declared type of the field
    /// * `initial` - Initial content of the slot, must fit `ty`
    #[must_use]
    pub fn static_field(self, name: &str, ty: TypeRef, initial: impl Into<Value>) -> Self {
        self.static_slot(name, ty, MemberFlags::STATIC, initial.into())
    }

    /// Declare a static field that can not be written
    #[must_use]
    pub fn constant(self, name: &str, ty: TypeRef, value: impl Into<Value>) -> Self {
        self.static_slot(name, ty, MemberFlags::STATIC | MemberFlags::FINAL, value.into())
    }

    fn static_slot(mut self, name: &str, ty: TypeRef, flags: MemberFlags, initial: Value) -> Self {
        self.statics.push((self.fields.len(), initial));
        let storage = FieldStorage::Static(Arc::new(RwLock::new(Value::Null)));
        self.push_field(name, ty, flags, storage);
        self
    }

    fn push_field(&mut self, name: &str, ty: TypeRef, flags: MemberFlags, storage: FieldStorage) {
        self.fields.push(FieldRecord {
            name: Arc::from(name),
            field_type: ty,
            declaring: self.identity.clone(),
            flags,
            attributes: Vec::new(),
            storage,
        });
    }

    /// Attach the attribute `key = value` to the most recently declared field
    #[must_use]
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        match self.fields.last_mut() {
            Some(field) => field.attributes.push((Arc::from(key), Arc::from(value))),
            None => self.errors.push(malformed_error!(
                "attribute {} of {} precedes every field",
                key,
                self.identity
            )),
        }
        self
    }

    /// Declare a method reading the receiver
    ///
    /// ## Arguments
    /// * `name`        - Name of the method
    /// * `params`      - Declared parameter types
    /// * `return_type` - Declared return type
    /// * `body`        - The implementation
    #[must_use]
    pub fn method<F>(self, name: &str, params: &[TypeRef], return_type: TypeRef, body: F) -> Self
    where
        F: Fn(&T, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let invoker = Invoker::Ref(Arc::new(move |state: &ObjectState, args: &[Value]| {
            body(state_of::<T>(state)?, args)
        }));
        self.push_method(name, params, return_type, MemberFlags::empty(), invoker)
    }

    /// Declare a method mutating the receiver
    #[must_use]
    pub fn method_mut<F>(
        self,
        name: &str,
        params: &[TypeRef],
        return_type: TypeRef,
        body: F,
    ) -> Self
    where
        F: Fn(&mut T, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let invoker = Invoker::Mut(Arc::new(move |state: &mut ObjectState, args: &[Value]| {
            body(state_of_mut::<T>(state)?, args)
        }));
        self.push_method(name, params, return_type, MemberFlags::empty(), invoker)
    }

    /// Declare a class-level method
    #[must_use]
    pub fn static_method<F>(
        self,
        name: &str,
        params: &[TypeRef],
        return_type: TypeRef,
        body: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let invoker = Invoker::Static(Arc::new(body));
        self.push_method(name, params, return_type, MemberFlags::STATIC, invoker)
    }

    fn push_method(
        mut self,
        name: &str,
        params: &[TypeRef],
        return_type: TypeRef,
        flags: MemberFlags,
        invoker: Invoker,
    ) -> Self {
        self.methods.push(MethodRecord {
            name: Arc::from(name),
            params: params.to_vec(),
            return_type,
            declaring: self.identity.clone(),
            flags,
            signature: Signature::encode(Some(name), params),
            invoker,
        });
        self
    }

    /// Declare a constructor
    ///
    /// ## Arguments
    /// * `params`  - Declared parameter types
    /// * `factory` - Creates the state of the new object from the arguments
    #[must_use]
    pub fn constructor<F>(mut self, params: &[TypeRef], factory: F) -> Self
    where
        F: Fn(&[Value]) -> Result<T> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorRecord {
            params: params.to_vec(),
            declaring: self.identity.clone(),
            signature: Signature::encode(None, params),
            factory: Arc::new(move |args: &[Value]| {
                factory(args).map(|state| Box::new(state) as Box<ObjectState>)
            }),
        });
        self
    }

    /// Finish the descriptor.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the declaration is inconsistent: an attribute declared
    /// before any field, two fields with the same name, a static initial value that does not
    /// fit the declared field type, or an identity already taken by another type in the
    /// [`TypeRegistry`].
    pub fn build(mut self) -> Result<TypeRef> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.clone()) {
                return Err(malformed_error!(
                    "field {} declared twice on {}",
                    field.name,
                    self.identity
                ));
            }
        }

        for (position, initial) in self.statics {
            let field = &self.fields[position];
            let Some(value) = matcher::coerce(field.field_type.as_ref(), &initial) else {
                return Err(malformed_error!(
                    "initial value {} does not fit {} of type {}",
                    initial,
                    field.name,
                    field.field_type.identity()
                ));
            };
            if let FieldStorage::Static(slot) = &field.storage {
                *write_lock!(slot) = value;
            }
        }

        // `with_arity` may have changed the identity after members were declared
        for field in &mut self.fields {
            field.declaring = self.identity.clone();
        }
        for method in &mut self.methods {
            method.declaring = self.identity.clone();
        }
        for constructor in &mut self.constructors {
            constructor.declaring = self.identity.clone();
        }

        let ty: TypeRef = Arc::new(ReflectType {
            identity: self.identity,
            flavor: TypeFlavor::Class,
            base: Some(self.base),
            upcast: self.upcast,
            fields: self.fields,
            methods: self.methods,
            constructors: self.constructors,
        });
        TypeRegistry::global().insert(&ty)?;
        Ok(ty)
    }
}

fn state_of<T: Any>(state: &ObjectState) -> Result<&T> {
    state.downcast_ref::<T>().ok_or_else(|| Error::TargetMismatch {
        expected: type_name::<T>().to_string(),
        found: "foreign state".to_string(),
    })
}

fn state_of_mut<T: Any>(state: &mut ObjectState) -> Result<&mut T> {
    state.downcast_mut::<T>().ok_or_else(|| Error::TargetMismatch {
        expected: type_name::<T>().to_string(),
        found: "foreign state".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test::{base_type, derived_type, point_type},
    };

    #[test]
    fn test_class_defaults() {
        let ty = TypeBuilder::<()>::class("demo", "Empty").build().unwrap();
        assert_eq!(ty.identity().fullname(), "demo.Empty");
        assert_eq!(ty.flavor(), TypeFlavor::Class);
        let base = ty.base().unwrap();
        assert!(types::is_universal_base(base.as_ref()));
        assert!(ty.declared_fields().is_empty());
    }

    #[test]
    fn test_arity_applies_to_members() {
        let ty = TypeBuilder::<i32>::class("demo", "Box")
            .field("value", types::int(), |v| Value::from(*v), |v, x| {
                *v = x.try_into()?;
                Ok(())
            })
            .with_arity(1)
            .build()
            .unwrap();
        assert_eq!(ty.identity().fullname(), "demo.Box`1");
        assert_eq!(ty.declared_fields()[0].declaring().fullname(), "demo.Box`1");
    }

    #[test]
    fn test_extends_sets_base() {
        let derived = derived_type();
        assert_eq!(
            derived.base().unwrap().identity(),
            base_type().identity()
        );
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let point = point_type();
        let names: Vec<_> = point.declared_fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_attribute_without_field_is_malformed() {
        let result = TypeBuilder::<()>::class("demo", "Bad")
            .attribute("column", "id")
            .build();
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_duplicate_field_is_malformed() {
        let result = TypeBuilder::<()>::class("demo", "Twice")
            .static_field("a", types::int(), 1)
            .static_field("a", types::int(), 2)
            .build();
        match result {
            Err(Error::Malformed { message, .. }) => {
                assert_eq!(message, "field a declared twice on demo.Twice");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_static_initial_value_must_fit() {
        let result = TypeBuilder::<()>::class("demo", "Slots")
            .static_field("count", types::int(), "zero")
            .build();
        assert!(matches!(result, Err(Error::Malformed { .. })));
        // a failed declaration does not claim the identity
        assert!(!TypeRegistry::global().contains(&TypeIdentity::new("demo", "Slots")));

        let widened = TypeBuilder::<()>::class("demo", "Slots")
            .static_field("count", types::long(), 3)
            .build()
            .unwrap();
        assert_eq!(
            widened.declared_fields()[0].read(None).unwrap(),
            Value::I8(3)
        );
    }

    #[test]
    fn test_foreign_state_is_rejected_by_accessors() {
        let point = point_type();
        let FieldStorage::Instance { get, .. } = &point.declared_fields()[0].storage else {
            panic!("x is an instance field");
        };
        let foreign: Box<ObjectState> = Box::new("not a point".to_string());
        assert!(matches!(get(&*foreign), Err(Error::TargetMismatch { .. })));
    }
}
