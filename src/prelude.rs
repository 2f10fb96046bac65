//! # memberscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the memberscope library. Import this module to describe types and access their
//! members without spelling out module paths.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all memberscope operations
pub use crate::Error;

/// The member kind reported by resolution failures
pub use crate::MemberKind;

/// The result type used throughout memberscope
pub use crate::Result;

/// Argument list helper
pub use crate::values;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Instance/type facade for field access, invocation and construction
pub use crate::{Descriptor, DescriptorConfig, Target};

/// Shared handle to a described object
pub use crate::Object;

// ================================================================================================
// Type System
// ================================================================================================

/// Describing types and the values flowing through their members
pub use crate::metadata::typesystem::{
    types, PrimitiveKind, Reflectable, TypeBuilder, TypeFlavor, TypeIdentity, TypeRef,
    TypeRegistry, Value,
};

// ================================================================================================
// Member Indices and Signatures
// ================================================================================================

/// Per-type member tables and the cache holding them
pub use crate::metadata::members::{
    ConstructorRecord, FieldRecord, IndexPolicy, MemberFlags, MemberIndex, MemberRecord,
    MetadataCache, MethodRecord,
};

/// Canonical overload keys
pub use crate::metadata::signatures::Signature;

// ================================================================================================
// Bean Glue
// ================================================================================================

/// Bean-convention property access
pub use crate::bean::{BeanIntrospector, PropertyResolver};
