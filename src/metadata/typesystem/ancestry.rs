//! Walks a type and its ancestor chain.
//!
//! [`Ancestry`] yields the starting type first, then (if traversal is enabled) each ancestor in
//! turn until it reaches the stop type, which is excluded, or a type without ancestor.

use crate::metadata::typesystem::{TypeIdentity, TypeRef};

/// Iterator over "type plus ancestor chain up to but excluding the stop type".
///
/// The starting type is always yielded, even when it is the stop type itself.
///
/// # Examples
///
/// ```rust
/// use memberscope::metadata::typesystem::{types, Ancestry, TypeBuilder};
///
/// let base = TypeBuilder::<()>::class("demo", "Base").build()?;
/// let chain: Vec<String> = Ancestry::new(base, true, Some(types::object().identity().clone()))
///     .map(|ty| ty.identity().fullname())
///     .collect();
/// assert_eq!(chain, vec!["demo.Base"]);
/// # Ok::<(), memberscope::Error>(())
/// ```
pub struct Ancestry {
    next: Option<TypeRef>,
    traverse: bool,
    stop: Option<TypeIdentity>,
}

impl Ancestry {
    /// Start a walk at `start`
    ///
    /// ## Arguments
    /// * `start`    - The first type to yield
    /// * `traverse` - Whether to continue into ancestors at all
    /// * `stop`     - The ancestor at which the walk ends, excluded from the output
    pub fn new(start: TypeRef, traverse: bool, stop: Option<TypeIdentity>) -> Self {
        Ancestry {
            next: Some(start),
            traverse,
            stop,
        }
    }

    /// The single termination predicate: whether `ancestor` is still part of the walk
    fn continues_into(&self, ancestor: &TypeRef) -> bool {
        self.traverse
            && self
                .stop
                .as_ref()
                .map_or(true, |stop| ancestor.identity() != stop)
    }
}

impl Iterator for Ancestry {
    type Item = TypeRef;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current
            .base()
            .filter(|ancestor| self.continues_into(ancestor));
        Some(current)
    }
}
