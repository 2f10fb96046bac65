//! Signature hashing for overload keys.
//!
//! [`SignatureHash`] computes the precomputed hash stored inside every
//! [`crate::metadata::signatures::Signature`]. Components are mixed sequentially (FNV-1a with an
//! extra avalanche step), so the result is order-sensitive: `f(Int32, String)` and
//! `f(String, Int32)` hash differently, and a component can never cancel out a previous one.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use memberscope::metadata::signatures::hash::SignatureHash;
//!
//! let hash = SignatureHash::new()
//!     .add_name(Some("area"))
//!     .add_arity(1)
//!     .add_param(&int32_identity)
//!     .finalize();
//! ```

use std::hash::{DefaultHasher, Hash, Hasher};

use crate::metadata::typesystem::TypeIdentity;

/// Hash builder for member signatures using FNV-1a inspired mixing
pub struct SignatureHash {
    /// Current hash state
    state: u64,
}

impl SignatureHash {
    /// Create a new signature hash builder, seeded with the FNV-1a offset basis
    #[must_use]
    pub fn new() -> Self {
        SignatureHash {
            state: 0xcbf2_9ce4_8422_2325_u64, // FNV-1a 64-bit offset basis
        }
    }

    fn mix(&mut self, value: u64) {
        self.state ^= value;
        self.state = self.state.wrapping_mul(0x0100_0000_01b3_u64); // FNV-1a 64-bit prime

        self.state ^= self.state >> 33;
        self.state = self.state.wrapping_mul(0xff51_afd7_ed55_8ccd_u64);
        self.state ^= self.state >> 33;
    }

    /// Add any hashable component
    ///
    /// ## Arguments
    /// * `component` - The component to mix into the state
    #[must_use]
    pub fn add_component<T: Hash + ?Sized>(mut self, component: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        component.hash(&mut hasher);
        self.mix(hasher.finish());
        self
    }

    /// Add the member name; an absent name (constructors) hashes differently from `""`
    #[must_use]
    pub fn add_name(self, name: Option<&str>) -> Self {
        self.add_component(&name)
    }

    /// Add the number of parameters
    #[must_use]
    pub fn add_arity(self, arity: usize) -> Self {
        self.add_component(&arity)
    }

    /// Add one parameter type
    #[must_use]
    pub fn add_param(self, param: &TypeIdentity) -> Self {
        self.add_component(param)
    }

    /// Finalize the hash and return the computed value
    #[must_use]
    pub fn finalize(self) -> u64 {
        self.state
    }
}

impl Default for SignatureHash {
    fn default() -> Self {
        Self::new()
    }
}
