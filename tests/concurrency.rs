//! Concurrency tests for the metadata cache and for descriptors sharing one object.

use std::{
    sync::{Arc, Barrier},
    thread,
};

use memberscope::prelude::*;

const THREADS: usize = 8;

#[derive(Debug, Default)]
struct Tally {
    hits: i64,
    label: String,
}

fn tally_type(name: &str) -> TypeRef {
    TypeBuilder::<Tally>::class("stress", name)
        .field("hits", types::long(), |t| Value::from(t.hits), |t, v| {
            t.hits = v.try_into()?;
            Ok(())
        })
        .field(
            "label",
            types::string(),
            |t| Value::from(t.label.as_str()),
            |t, v| {
                t.label = v.try_into()?;
                Ok(())
            },
        )
        .method_mut("hit", &[], types::long(), |t, _| {
            t.hits += 1;
            Ok(Value::from(t.hits))
        })
        .constructor(&[], |_| Ok(Tally::default()))
        .build()
        .unwrap()
}

#[test]
fn test_contended_first_use_builds_once() {
    let cache = Arc::new(MetadataCache::new());
    let ty = tally_type("Contended");
    let policy = IndexPolicy::default();
    let barrier = Barrier::new(THREADS);

    let indices: Vec<Arc<MemberIndex>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    cache.get_or_build(&ty, &policy).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.build_count(), 1);
    assert_eq!(cache.len(), 1);
    for index in &indices[1..] {
        assert!(Arc::ptr_eq(&indices[0], index));
    }
    assert_eq!(indices[0].field_names(), vec!["hits", "label"]);
}

#[test]
fn test_distinct_policies_build_separately() {
    let cache = Arc::new(MetadataCache::new());
    let ty = tally_type("Policies");
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for n in 0..THREADS {
            let (cache, ty, barrier) = (&cache, &ty, &barrier);
            scope.spawn(move || {
                let policy = if n % 2 == 0 {
                    IndexPolicy::declared_only()
                } else {
                    IndexPolicy::hierarchy()
                };
                barrier.wait();
                cache.get_or_build(ty, &policy).unwrap();
            });
        }
    });

    assert_eq!(cache.build_count(), 2);
    assert!(cache.get(ty.identity(), &IndexPolicy::hierarchy()).is_some());
}

#[test]
fn test_warm_builds_every_type_once() -> Result<()> {
    let cache = MetadataCache::new();
    let types: Vec<TypeRef> = (0..16).map(|n| tally_type(&format!("Warm{n}"))).collect();

    cache.warm(&types, &IndexPolicy::default())?;
    cache.warm(&types, &IndexPolicy::default())?;

    assert_eq!(cache.len(), 16);
    assert_eq!(cache.build_count(), 16);
    Ok(())
}

#[test]
fn test_parallel_mutation_through_descriptors() -> Result<()> {
    let cache = Arc::new(MetadataCache::new());
    let ty = tally_type("Shared");
    let object = Descriptor::with_cache(ty, cache.clone(), DescriptorConfig::default())?
        .new_instance(&[])?;

    thread::scope(|scope| {
        for _ in 0..THREADS {
            let (cache, object) = (cache.clone(), object.clone());
            scope.spawn(move || {
                let descriptor =
                    Descriptor::with_cache(object, cache, DescriptorConfig::default()).unwrap();
                for _ in 0..100 {
                    descriptor.invoke_method("hit", &[]).unwrap();
                }
            });
        }
    });

    let descriptor = Descriptor::with_cache(object, cache, DescriptorConfig::default())?;
    assert_eq!(descriptor.get_by_name_as::<i64>("hits")?, (THREADS * 100) as i64);
    Ok(())
}
