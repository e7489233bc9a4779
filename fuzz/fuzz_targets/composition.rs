#![no_main]

use ferrous_ioc::{CandidateType, Lifetime, Plugin, PluginManager, Resolver, ServiceCollection};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

trait Node: Send + Sync {
    fn id(&self) -> u8;
}

struct Leaf(u8);

impl Node for Leaf {
    fn id(&self) -> u8 {
        self.0
    }
}

impl Plugin for Leaf {
    fn priority(&self) -> u32 {
        u32::from(self.0 % 7)
    }
    fn is_unloadable(&self) -> bool {
        self.0 % 2 == 0
    }
}

fn lifetime(byte: u8) -> Lifetime {
    match byte % 3 {
        0 => Lifetime::Singleton,
        1 => Lifetime::Scoped,
        _ => Lifetime::Transient,
    }
}

// Each byte describes one candidate: low bits pick the lifetime, the rest
// decide metadata shape, whether construction fails and whether the
// constructor resolves another node (which may cycle).
fuzz_target!(|data: &[u8]| {
    let mut services = ServiceCollection::new();
    let mut bound = 0usize;

    for (index, byte) in data.iter().copied().take(64).enumerate() {
        let id = index as u8;
        let fails = byte & 0x40 != 0;
        let recurses = byte & 0x80 != 0;
        let builder = CandidateType::of(move |ctx| {
            if fails {
                return Err(ferrous_ioc::DiError::construction::<Leaf>("fuzzed failure"));
            }
            if recurses {
                let _ = ctx.get::<dyn Node>();
            }
            Ok(Leaf(id))
        })
        .implements::<dyn Node>(|n| n as Arc<dyn Node>)
        .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>);

        let candidate = match (byte >> 2) % 4 {
            0 => builder.build(),
            1 => builder.injectable_unbound(lifetime(byte)).requesting::<dyn Node>().build(),
            2 => builder.injectable::<dyn Plugin>(lifetime(byte)).build(),
            _ => builder.injectable::<dyn Node>(lifetime(byte)).build(),
        };
        bound += services.add_candidate(&candidate);
    }

    assert_eq!(services.len(), bound);
    let provider = services.build();

    let results = provider.get_each::<dyn Node>();
    assert_eq!(results.len(), provider.descriptors().iter().filter(|d| d.contract_name().contains("Node")).count());

    let scope = provider.create_scope();
    let _ = scope.get_all::<dyn Node>();

    let plugins = PluginManager::new(provider.clone());
    let loaded = plugins.load_all();
    let unloaded = plugins.unload_all();
    assert_eq!(loaded.transitioned.len(), unloaded.transitioned.len());
    assert_eq!(plugins.loaded_count(), 0);

    scope.dispose();
    provider.dispose();
});
