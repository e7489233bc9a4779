//! Property-based tests for classification, resolution and plugin ordering.

use ferrous_ioc::{
    CandidateType, Lifetime, Plugin, PluginManager, Resolver, ServiceCollection,
};
use proptest::prelude::*;
use std::sync::Arc;

trait Numbered: Send + Sync {
    fn number(&self) -> usize;
}

struct Item(usize);

impl Numbered for Item {
    fn number(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
enum Metadata {
    Bound(Lifetime),
    Unbound(Lifetime),
    Missing,
}

fn lifetime() -> impl Strategy<Value = Lifetime> {
    prop_oneof![
        Just(Lifetime::Singleton),
        Just(Lifetime::Scoped),
        Just(Lifetime::Transient),
    ]
}

fn metadata() -> impl Strategy<Value = Metadata> {
    prop_oneof![
        3 => lifetime().prop_map(Metadata::Bound),
        1 => lifetime().prop_map(Metadata::Unbound),
        1 => Just(Metadata::Missing),
    ]
}

fn candidate(number: usize, metadata: Metadata) -> CandidateType {
    let builder = CandidateType::of(move |_| Ok(Item(number)))
        .implements::<dyn Numbered>(|n| n as Arc<dyn Numbered>);
    match metadata {
        Metadata::Bound(lifetime) => builder.injectable::<dyn Numbered>(lifetime).build(),
        Metadata::Unbound(lifetime) => builder.injectable_unbound(lifetime).build(),
        Metadata::Missing => builder.build(),
    }
}

proptest! {
    #[test]
    fn only_bound_candidates_register_in_order(kinds in prop::collection::vec(metadata(), 0..24)) {
        let candidates: Vec<_> = kinds.iter().enumerate().map(|(i, m)| candidate(i, *m)).collect();
        let mut services = ServiceCollection::new();
        let added = services.add_candidates(&candidates);
        let provider = services.build();

        let expected: Vec<usize> = kinds
            .iter()
            .enumerate()
            .filter(|(_, m)| matches!(m, Metadata::Bound(_)))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(added, expected.len());

        let numbers: Vec<usize> = provider
            .get_all::<dyn Numbered>()
            .unwrap()
            .iter()
            .map(|n| n.number())
            .collect();
        prop_assert_eq!(&numbers, &expected);

        match expected.first() {
            Some(first) => prop_assert_eq!(provider.get::<dyn Numbered>().unwrap().number(), *first),
            None => prop_assert!(provider.get::<dyn Numbered>().is_err()),
        }
    }

    #[test]
    fn lifetimes_govern_identity(lifetimes in prop::collection::vec(lifetime(), 1..12)) {
        let candidates: Vec<_> = lifetimes
            .iter()
            .enumerate()
            .map(|(i, l)| candidate(i, Metadata::Bound(*l)))
            .collect();
        let mut services = ServiceCollection::new();
        services.add_candidates(&candidates);
        let provider = services.build();
        let scope = provider.create_scope();

        let first = provider.get_all::<dyn Numbered>().unwrap();
        let second = provider.get_all::<dyn Numbered>().unwrap();
        let scoped = scope.get_all::<dyn Numbered>().unwrap();

        for (i, lifetime) in lifetimes.iter().enumerate() {
            let same_in_provider = Arc::ptr_eq(&first[i], &second[i]);
            let same_across_scopes = Arc::ptr_eq(&first[i], &scoped[i]);
            match lifetime {
                Lifetime::Singleton => {
                    prop_assert!(same_in_provider);
                    prop_assert!(same_across_scopes);
                }
                Lifetime::Scoped => {
                    prop_assert!(same_in_provider);
                    prop_assert!(!same_across_scopes);
                }
                Lifetime::Transient => {
                    prop_assert!(!same_in_provider);
                    prop_assert!(!same_across_scopes);
                }
            }
        }
    }
}

struct Ranked {
    name: String,
    priority: u32,
    unloadable: bool,
}

impl Plugin for Ranked {
    fn name(&self) -> &str {
        &self.name
    }
    fn priority(&self) -> u32 {
        self.priority
    }
    fn is_unloadable(&self) -> bool {
        self.unloadable
    }
}

proptest! {
    #[test]
    fn plugin_load_order_is_stable_and_grouped(
        specs in prop::collection::vec((0u32..4, any::<bool>()), 0..16)
    ) {
        let mut services = ServiceCollection::new();
        for (index, (priority, unloadable)) in specs.iter().copied().enumerate() {
            services.add_candidate(
                &CandidateType::of(move |_| {
                    Ok(Ranked { name: index.to_string(), priority, unloadable })
                })
                .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
                .injectable::<dyn Plugin>(Lifetime::Singleton)
                .build(),
            );
        }
        let plugins = PluginManager::new(services.build());
        let report = plugins.load_all();

        let mut expected: Vec<usize> = (0..specs.len()).collect();
        expected.sort_by_key(|&i| (specs[i].1, specs[i].0));
        let expected: Vec<String> = expected.iter().map(usize::to_string).collect();

        prop_assert_eq!(report.transitioned_names(), expected);
        prop_assert_eq!(plugins.loaded_count(), specs.len());
    }
}
