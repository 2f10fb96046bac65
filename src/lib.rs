// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # memberscope
//!
//! A runtime member introspection and dynamic access engine. Given a described type or an
//! instance of one, `memberscope` resolves its fields, methods and constructors by name, by
//! declared type or by argument signature, reads and writes fields, invokes methods and creates
//! instances, all against a per-type member index that is built once and cached.
//!
//! ## Features
//!
//! - **Typed descriptors** - Rust types are described once through [`TypeBuilder`], producing a
//!   [`Reflectable`] descriptor table with fields, methods, constructors and a base type
//! - **Signature resolution** - Overloads are keyed by name plus normalized parameter types;
//!   primitive and boxed spellings of the same kind are one signature element
//! - **Hierarchy aware** - Indices walk the ancestor chain up to a configurable stop type, with
//!   subclass members shadowing ancestor members
//! - **Build-once cache** - [`MetadataCache`] builds every (type, policy) index at most once, even
//!   under concurrent first use, and serves lock-free reads afterwards
//! - **Bean glue** - Property access and object/map conversion by `getX`/`isX`/`setX` naming
//!
//! ## Quick Start
//!
//! ```rust
//! use memberscope::prelude::*;
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
//!     .field("y", types::int(), |p| Value::from(p.y), |p, v| {
//!         p.y = v.try_into()?;
//!         Ok(())
//!     })
//!     .method("sum", &[], types::int(), |p, _| Ok(Value::from(p.x + p.y)))
//!     .constructor(&[types::int(), types::int()], |args| {
//!         Ok(Point {
//!             x: args[0].clone().try_into()?,
//!             y: args[1].clone().try_into()?,
//!         })
//!     })
//!     .build()?;
//!
//! let instance = Descriptor::for_type(point)?.new_instance(&values![3, 4])?;
//! let descriptor = Descriptor::for_instance(instance)?;
//! assert_eq!(descriptor.invoke_method("sum", &[])?, Value::I4(7));
//!
//! descriptor.set_by_name("x", 10)?;
//! assert_eq!(descriptor.get_by_name_as::<i32>("x")?, 10);
//! # Ok::<(), memberscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata::typesystem`] - Type identities, flavors, values, well-known types, the matcher
//!   and the descriptor-table builder
//! - [`metadata::signatures`] - Canonical member signatures and their diagnostic rendering
//! - [`metadata::members`] - Member records, per-type indices and the index cache
//! - [`descriptor`] - The facade binding an instance or a type to its cached indices
//! - [`bean`] - Bean-convention properties and object/map conversion
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`] with the crate-wide [`Error`]. Resolution
//! failures ([`Error::MemberNotFound`], [`Error::AmbiguousMember`]) are distinct from failures
//! of the member itself, which are wrapped in [`Error::InvocationFailure`] with the cause kept
//! as its source.
//!
//! ## Logging
//!
//! Index builds are reported through [`tracing`] at `debug` level, cache hits, shadowing and
//! overload collapses at `trace` level. The crate installs no subscriber.
//!
//! [`TypeBuilder`]: metadata::typesystem::TypeBuilder
//! [`Reflectable`]: metadata::typesystem::Reflectable
//! [`MetadataCache`]: metadata::members::MetadataCache

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use memberscope::prelude::*;
///
/// let descriptor = Descriptor::for_type(types::string())?;
/// assert!(descriptor.field_names().is_empty());
/// # Ok::<(), memberscope::Error>(())
/// ```
pub mod prelude;

/// Type system, signatures and member indices.
///
/// # Key Components
///
/// - [`metadata::typesystem`] - What the engine knows about a type
/// - [`metadata::signatures`] - Canonical keys for overload resolution
/// - [`metadata::members`] - Member records, [`metadata::members::MemberIndex`] and
///   [`metadata::members::MetadataCache`]
pub mod metadata;

pub mod bean;
pub mod descriptor;
mod object;

/// `memberscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `memberscope` Error type
///
/// The main error type for all operations in this crate.
pub use error::{Error, MemberKind};

pub use descriptor::{Descriptor, DescriptorConfig, Target};
pub use metadata::typesystem::Value;
pub use object::Object;
