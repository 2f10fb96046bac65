//! Bean-convention glue.
//!
//! Properties are derived from accessor method names rather than from fields: `getX` and `isX`
//! read property `x`, `setX` writes it. The core engine never relies on this convention; it is
//! only used for property access by name and for converting objects to and from
//! [`convert::PropertyMap`]s.
//!
//! # Key Components
//!
//! - [`PropertyResolver`]: Derives and caches the properties of a type
//! - [`BeanIntrospector`]: Calls getters and setters of one object by property name
//! - [`convert::to_map`] / [`convert::from_map`]: Object ⇄ property map conversion, with
//!   `_with` variants taking an explicit [`PropertyResolver`]

pub mod convert;
mod resolver;

pub use resolver::{BeanIntrospector, PropertyDescriptor, PropertyResolver, PropertySet};
