//! Member metadata of described types.
//!
//! This module contains everything the engine knows about a type and its members, and the
//! machinery that turns that knowledge into resolvable, cached indices.
//!
//! # Key Components
//!
//! - [`typesystem`] - Type identities, flavors, values, the matcher and the [`typesystem::TypeBuilder`]
//! - [`signatures`] - [`signatures::Signature`] keys and their diagnostic rendering
//! - [`members`] - Field, method and constructor records, [`members::MemberIndex`] and
//!   [`members::MetadataCache`]
//!
//! # Examples
//!
//! ```rust
//! use memberscope::metadata::{
//!     members::{IndexPolicy, MetadataCache},
//!     typesystem::types,
//! };
//!
//! let cache = MetadataCache::new();
//! let index = cache.get_or_build(&types::string(), &IndexPolicy::default())?;
//! assert_eq!(index.field_count(), 0);
//! assert_eq!(cache.build_count(), 1);
//! # Ok::<(), memberscope::Error>(())
//! ```

/// Member records, per-type indices and the index cache
pub mod members;
/// Canonical member signatures
pub mod signatures;
/// Type descriptors, values and compatibility rules
pub mod typesystem;
