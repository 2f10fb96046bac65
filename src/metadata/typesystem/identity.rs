//! Stable identities for declared types.
//!
//! A [`TypeIdentity`] is the comparable handle the engine uses wherever it needs to talk about a
//! type without holding on to its descriptor: as the metadata cache key, inside signatures and
//! in diagnostics. Two identities are equal iff they denote the same declared type, which is
//! decided by namespace, name and generic arity.

use std::{fmt, sync::Arc};

/// Comparable handle for a declared type: namespace, name and generic arity.
///
/// Cloning is cheap, the string parts are shared.
///
/// # Examples
///
/// ```rust
/// use memberscope::metadata::typesystem::TypeIdentity;
///
/// let list = TypeIdentity::new("demo.collections", "List").with_arity(1);
/// assert_eq!(list.fullname(), "demo.collections.List`1");
/// assert_eq!(list.name(), "List");
/// assert_ne!(list, TypeIdentity::new("demo.collections", "List"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentity {
    namespace: Arc<str>,
    name: Arc<str>,
    arity: u16,
}

impl TypeIdentity {
    /// Create an identity for a non-generic type
    ///
    /// ## Arguments
    /// * `namespace` - Namespace of the type, may be empty
    /// * `name`      - Simple name of the type
    pub fn new(namespace: &str, name: &str) -> Self {
        TypeIdentity {
            namespace: Arc::from(namespace),
            name: Arc::from(name),
            arity: 0,
        }
    }

    /// Set the number of generic parameters of the identified type
    #[must_use]
    pub fn with_arity(mut self, arity: u16) -> Self {
        self.arity = arity;
        self
    }

    /// The namespace part (may be empty)
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The simple name, without namespace or arity marker
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of generic parameters
    #[must_use]
    pub fn arity(&self) -> u16 {
        self.arity
    }

    /// Returns the full name (Namespace.Name, with a `` `N`` suffix for generic types)
    #[must_use]
    pub fn fullname(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.namespace.is_empty() {
            write!(f, "{}.", self.namespace)?;
        }
        write!(f, "{}", self.name)?;
        if self.arity > 0 {
            write!(f, "`{}", self.arity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_equality() {
        let a = TypeIdentity::new("demo", "Point");
        let b = TypeIdentity::new("demo", "Point");
        let c = TypeIdentity::new("other", "Point");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, a.clone().with_arity(2));

        let set: HashSet<_> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(TypeIdentity::new("", "i32").to_string(), "i32");
        assert_eq!(TypeIdentity::new("core", "Int32").fullname(), "core.Int32");
        assert_eq!(
            TypeIdentity::new("demo", "Pair").with_arity(2).fullname(),
            "demo.Pair`2"
        );
    }
}
