//! Process-wide store of built member indices.
//!
//! The [`MetadataCache`] maps `(type identity, policy)` to a shared [`MemberIndex`]. Lookups of
//! published entries only touch the sharded map. A miss takes the build lock, checks again and
//! builds at most once per key, so concurrent first requests for the same type observe one and
//! the same index. Entries are never evicted.
//!
//! # Thread Safety
//!
//! All methods take `&self`; the cache is `Send + Sync` and meant to be shared through an
//! [`Arc`] or the [`MetadataCache::global`] instance.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, OnceLock,
};

use dashmap::DashMap;
use rayon::prelude::*;

use crate::{
    metadata::{
        members::{IndexPolicy, MemberIndex},
        typesystem::{TypeIdentity, TypeRef},
    },
    Result,
};

type CacheKey = (TypeIdentity, IndexPolicy);

static GLOBAL: OnceLock<Arc<MetadataCache>> = OnceLock::new();

/// Store of member indices, built on first demand and shared afterwards.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use memberscope::metadata::members::{IndexPolicy, MetadataCache};
/// use memberscope::metadata::typesystem::types;
///
/// let cache = MetadataCache::new();
/// let first = cache.get_or_build(&types::string(), &IndexPolicy::default())?;
/// let second = cache.get_or_build(&types::string(), &IndexPolicy::default())?;
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.build_count(), 1);
/// # Ok::<(), memberscope::Error>(())
/// ```
pub struct MetadataCache {
    entries: DashMap<CacheKey, Arc<MemberIndex>>,
    build_lock: Mutex<()>,
    builds: AtomicUsize,
}

impl MetadataCache {
    /// Create an empty, isolated cache
    #[must_use]
    pub fn new() -> Self {
        MetadataCache {
            entries: DashMap::new(),
            build_lock: Mutex::new(()),
            builds: AtomicUsize::new(0),
        }
    }

    /// The process-wide default cache
    #[must_use]
    pub fn global() -> Arc<MetadataCache> {
        GLOBAL.get_or_init(|| Arc::new(MetadataCache::new())).clone()
    }

    /// Return the index of `ty` under `policy`, building it with [`MemberIndex::build`] if absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the build lock was poisoned.
    pub fn get_or_build(&self, ty: &TypeRef, policy: &IndexPolicy) -> Result<Arc<MemberIndex>> {
        self.get_or_build_with(ty, policy, MemberIndex::build)
    }

    /// Return the index of `ty` under `policy`, building it with `builder` if absent.
    ///
    /// `builder` runs at most once per key for the lifetime of the cache, no matter how many
    /// threads request the key concurrently.
    ///
    /// ## Arguments
    /// * `ty`      - The type to index
    /// * `policy`  - The build policy, part of the key
    /// * `builder` - Produces the index on a miss
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the build lock was poisoned.
    pub fn get_or_build_with<F>(
        &self,
        ty: &TypeRef,
        policy: &IndexPolicy,
        builder: F,
    ) -> Result<Arc<MemberIndex>>
    where
        F: FnOnce(&TypeRef, &IndexPolicy) -> MemberIndex,
    {
        let key = (ty.identity().clone(), policy.clone());
        if let Some(index) = self.lookup(&key) {
            tracing::trace!(owner = %key.0, "member index cache hit");
            return Ok(index);
        }

        let _guard = lock!(self.build_lock);
        if let Some(index) = self.lookup(&key) {
            return Ok(index);
        }

        let index = Arc::new(builder(ty, policy));
        let build = self.builds.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(
            owner = %key.0,
            traverse_ancestors = policy.traverse_ancestors,
            include_static_fields = policy.include_static_fields,
            fields = index.field_count(),
            methods = index.method_count(),
            constructors = index.constructor_count(),
            build,
            "built member index"
        );
        self.entries.insert(key, index.clone());
        Ok(index)
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<MemberIndex>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// The published index for `identity` under `policy`, without building
    #[must_use]
    pub fn get(&self, identity: &TypeIdentity, policy: &IndexPolicy) -> Option<Arc<MemberIndex>> {
        self.lookup(&(identity.clone(), policy.clone()))
    }

    /// Build the indices of `types` under `policy` in parallel
    ///
    /// # Errors
    /// Returns the first build error encountered.
    pub fn warm(&self, types: &[TypeRef], policy: &IndexPolicy) -> Result<()> {
        types
            .par_iter()
            .try_for_each(|ty| self.get_or_build(ty, policy).map(|_| ()))
    }

    /// Number of published indices
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no index has been published yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of index builds performed so far
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Acquire)
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}
