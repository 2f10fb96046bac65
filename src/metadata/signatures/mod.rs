//! Overload keys for methods and constructors.
//!
//! A [`Signature`] is built from an optional member name plus the ordered parameter types, each
//! canonicalized so that a primitive and its boxed counterpart become the same element. The
//! result is the key of the method and constructor maps in a
//! [`crate::metadata::members::MemberIndex`].
//!
//! # Key properties
//!
//! - **Deterministic**: the same name and the same canonical type list always encode equal keys
//! - **Order and arity sensitive**: `f(Int32, String)`, `f(String, Int32)` and `f(Int32)` differ
//! - **Constructor key**: no name and no arguments encode [`Signature::empty`]
//!
//! Overloads that only differ in primitive-vs-boxed parameter types therefore collapse onto one
//! key; the index keeps the first declared one.
//!
//! # Examples
//!
//! ```rust
//! use memberscope::metadata::signatures::Signature;
//! use memberscope::metadata::typesystem::{types, PrimitiveKind, Value};
//!
//! let declared = Signature::encode(Some("scale"), &[types::int(), types::string()]);
//! let requested = Signature::of_values(Some("scale"), &[Value::I4(2), Value::from("x")]);
//! assert_eq!(declared, requested);
//!
//! let boxed = Signature::encode(Some("scale"), &[types::boxed(PrimitiveKind::I4), types::string()]);
//! assert_eq!(declared, boxed);
//! assert_eq!(declared.to_string(), "scale(Int32, String)");
//! ```

pub mod hash;

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::metadata::{
    signatures::hash::SignatureHash,
    typesystem::{matcher, TypeIdentity, TypeRef, Value},
};

/// Canonical overload key: optional name plus ordered, canonicalized parameter identities.
///
/// Equality compares name and parameters; hashing uses a value precomputed at construction.
#[derive(Clone)]
pub struct Signature {
    name: Option<Arc<str>>,
    params: Vec<TypeIdentity>,
    hash: u64,
}

impl Signature {
    /// Encode a signature from declared or requested parameter types
    ///
    /// ## Arguments
    /// * `name`      - Member name, `None` for constructors
    /// * `arg_types` - Ordered parameter types; primitives are canonicalized to their boxed form
    #[must_use]
    pub fn encode(name: Option<&str>, arg_types: &[TypeRef]) -> Self {
        let params = arg_types
            .iter()
            .map(|ty| matcher::canonicalize(ty).identity().clone())
            .collect();
        Self::from_parts(name, params)
    }

    /// Encode a signature from the runtime types of a list of arguments
    #[must_use]
    pub fn of_values(name: Option<&str>, args: &[Value]) -> Self {
        let arg_types: Vec<TypeRef> = args.iter().map(Value::runtime_type).collect();
        Self::encode(name, &arg_types)
    }

    /// The key of the no-argument constructor
    #[must_use]
    pub fn empty() -> Self {
        Self::from_parts(None, Vec::new())
    }

    fn from_parts(name: Option<&str>, params: Vec<TypeIdentity>) -> Self {
        let hash = params
            .iter()
            .fold(
                SignatureHash::new().add_name(name).add_arity(params.len()),
                |hash, param| hash.add_param(param),
            )
            .finalize();

        Signature {
            name: name.map(Arc::from),
            params,
            hash,
        }
    }

    /// The member name, `None` for constructors
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The canonicalized parameter identities, in order
    #[must_use]
    pub fn params(&self) -> &[TypeIdentity] {
        &self.params
    }

    /// Number of parameters
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` for the no-name, no-argument key
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.params.is_empty()
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.name == other.name && self.params == other.params
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_call(f, self.name(), self.params.iter().map(TypeIdentity::name))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

/// Render a human readable `name(T1, T2)` form of a request, used in diagnostics.
///
/// Unlike the [`Signature`] display, the types are rendered as given, without canonicalization.
#[must_use]
pub fn describe(name: Option<&str>, arg_types: &[TypeRef]) -> String {
    let mut rendered = String::new();
    // Writing into a String can not fail
    let _ = write_call(
        &mut rendered,
        name,
        arg_types.iter().map(|ty| ty.simple_name()),
    );
    rendered
}

fn write_call<'a>(
    out: &mut impl fmt::Write,
    name: Option<&str>,
    params: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    if let Some(name) = name {
        out.write_str(name)?;
    }
    out.write_char('(')?;
    for (position, param) in params.enumerate() {
        if position > 0 {
            out.write_str(", ")?;
        }
        out.write_str(param)?;
    }
    out.write_char(')')
}
