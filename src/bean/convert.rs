//! Conversion between objects and property maps.

use indexmap::IndexMap;

use crate::{
    bean::{BeanIntrospector, PropertyResolver},
    descriptor::{Descriptor, DescriptorConfig},
    metadata::typesystem::{TypeRef, Value},
    Object, Result,
};

/// Property values by name, in property order
pub type PropertyMap = IndexMap<String, Value>;

/// Read every readable property of `object` into a map, using the global resolver.
///
/// # Errors
/// Returns [`crate::Error::InvocationFailure`] if a getter fails.
pub fn to_map(object: &Object) -> Result<PropertyMap> {
    to_map_with(object, &PropertyResolver::global())
}

/// Read every readable property of `object` into a map, with properties derived by `resolver`.
///
/// # Errors
/// Returns [`crate::Error::InvocationFailure`] if a getter fails.
pub fn to_map_with(object: &Object, resolver: &PropertyResolver) -> Result<PropertyMap> {
    let bean = BeanIntrospector::with_resolver(object.clone(), resolver)?;
    bean.properties()
        .values()
        .filter_map(|property| property.reader().map(|reader| (property.name(), reader)))
        .map(|(name, reader)| -> Result<(String, Value)> {
            Ok((name.to_string(), reader.invoke(Some(object), &[])?))
        })
        .collect()
}

/// Create an instance of `ty` with its no-argument constructor, then write every writable
/// property that has an entry in `map`.
///
/// Properties without an entry keep their constructed value; an empty map yields a freshly
/// constructed instance. Entries without a matching writable property are ignored.
///
/// # Errors
/// Returns [`crate::Error::MemberNotFound`] if `ty` has no no-argument constructor and
/// [`crate::Error::InvocationFailure`] if construction or a setter fails.
pub fn from_map(map: &PropertyMap, ty: &TypeRef) -> Result<Object> {
    from_map_with(map, ty, &PropertyResolver::global())
}

/// [`from_map`] against `resolver` and the metadata cache behind it.
///
/// # Errors
/// See [`from_map`].
pub fn from_map_with(
    map: &PropertyMap,
    ty: &TypeRef,
    resolver: &PropertyResolver,
) -> Result<Object> {
    let factory = Descriptor::with_cache(
        ty.clone(),
        resolver.metadata().clone(),
        DescriptorConfig::default(),
    )?;
    let bean = BeanIntrospector::with_resolver(factory.new_instance(&[])?, resolver)?;

    for property in bean.properties().values() {
        if property.writer().is_none() {
            continue;
        }
        if let Some(value) = map.get(property.name()) {
            bean.invoke_setter(property.name(), value.clone())?;
        }
    }

    Ok(bean.target().clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        metadata::members::MetadataCache,
        test::{account_type, point_type},
        Error,
    };

    #[test]
    fn test_to_map_reads_readable_properties_in_order() {
        let account = from_map(&PropertyMap::new(), &account_type()).unwrap();
        let map = to_map(&account).unwrap();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["owner", "balance", "active", "id", "URL"]);
        assert_eq!(map["balance"], Value::I8(0));
    }

    #[test]
    fn test_from_map_writes_present_entries() {
        let mut map = PropertyMap::new();
        map.insert("owner".to_string(), Value::from("zoe"));
        map.insert("balance".to_string(), Value::I8(42));
        map.insert("unknown".to_string(), Value::I4(1));

        let account = from_map(&map, &account_type()).unwrap();
        let back = to_map(&account).unwrap();
        assert_eq!(back["owner"], Value::from("zoe"));
        assert_eq!(back["balance"], Value::I8(42));
        assert_eq!(back["active"], Value::Boolean(false));
    }

    #[test]
    fn test_from_map_surfaces_setter_failures() {
        let mut map = PropertyMap::new();
        map.insert("balance".to_string(), Value::from("lots"));
        assert!(matches!(
            from_map(&map, &account_type()),
            Err(Error::InvocationFailure { .. })
        ));
    }

    #[test]
    fn test_from_map_without_properties() {
        // Point has no accessor methods, only fields
        let point = from_map(&PropertyMap::new(), &point_type()).unwrap();
        assert!(to_map(&point).unwrap().is_empty());
    }

    #[test]
    fn test_conversion_with_an_isolated_resolver() {
        let cache = Arc::new(MetadataCache::new());
        let resolver = PropertyResolver::new(cache.clone());

        let mut map = PropertyMap::new();
        map.insert("owner".to_string(), Value::from("kim"));
        let account = from_map_with(&map, &account_type(), &resolver).unwrap();
        let built = cache.build_count();
        assert!(built > 0);

        let back = to_map_with(&account, &resolver).unwrap();
        assert_eq!(back, to_map(&account).unwrap());
        assert_eq!(back["owner"], Value::from("kim"));
        // properties were derived once and reused
        assert_eq!(cache.build_count(), built);
    }
}
