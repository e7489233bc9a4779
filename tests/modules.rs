use ferrous_ioc::{
    CandidateType, CompositionConfig, CompositionRoot, DiError, DiResult, Lifetime,
    ModuleRegistrar, Resolver, ServiceCollection, ServiceCollectionExt, ServiceModule,
};
use std::sync::Arc;

trait Storage: Send + Sync {
    fn backend(&self) -> &'static str;
}

trait Cache: Send + Sync {
    fn capacity(&self) -> usize;
}

#[derive(Default)]
struct DiskStorage;
impl Storage for DiskStorage {
    fn backend(&self) -> &'static str {
        "disk"
    }
}

#[derive(Default)]
struct MemoryStorage;
impl Storage for MemoryStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }
}

struct LruCache {
    capacity: usize,
}
impl Cache for LruCache {
    fn capacity(&self) -> usize {
        self.capacity
    }
}

struct StorageModule;

impl ServiceModule for StorageModule {
    fn register_services(self, registrar: &mut ModuleRegistrar) -> DiResult<()> {
        registrar
            .add(
                CandidateType::of_default::<DiskStorage>()
                    .implements::<dyn Storage>(|s| s as Arc<dyn Storage>)
                    .injectable::<dyn Storage>(Lifetime::Singleton),
            )
            .add(CandidateType::abstract_type::<dyn Storage>(None));
        Ok(())
    }
}

struct CacheModule {
    capacity: usize,
}

impl ServiceModule for CacheModule {
    fn register_services(self, registrar: &mut ModuleRegistrar) -> DiResult<()> {
        let capacity = self.capacity;
        registrar.add(
            CandidateType::of(move |_| Ok(LruCache { capacity }))
                .implements::<dyn Cache>(|c| c as Arc<dyn Cache>)
                .injectable::<dyn Cache>(Lifetime::Singleton),
        );
        Ok(())
    }
}

/// Wraps other modules into one.
struct AppModule;

impl ServiceModule for AppModule {
    fn register_services(self, registrar: &mut ModuleRegistrar) -> DiResult<()> {
        registrar
            .add_module(StorageModule)?
            .add_module(CacheModule { capacity: 64 })?;
        Ok(())
    }
}

struct BrokenModule;

impl ServiceModule for BrokenModule {
    fn register_services(self, registrar: &mut ModuleRegistrar) -> DiResult<()> {
        registrar.add(
            CandidateType::of_default::<MemoryStorage>()
                .implements::<dyn Storage>(|s| s as Arc<dyn Storage>)
                .injectable::<dyn Storage>(Lifetime::Singleton),
        );
        Err(DiError::Classification {
            candidate: "BrokenModule",
            reason: "configuration missing".into(),
        })
    }
}

#[test]
fn test_module_registration_through_collection() {
    let provider = ServiceCollection::new()
        .add_module(StorageModule)
        .unwrap()
        .build();

    // The abstract candidate is skipped
    assert_eq!(provider.descriptors().len(), 1);
    assert_eq!(provider.get::<dyn Storage>().unwrap().backend(), "disk");
}

#[test]
fn test_nested_modules() {
    let provider = ServiceCollection::new().add_module(AppModule).unwrap().build();

    assert_eq!(provider.get::<dyn Storage>().unwrap().backend(), "disk");
    assert_eq!(provider.get::<dyn Cache>().unwrap().capacity(), 64);
}

#[test]
fn test_failing_module_propagates_through_collection() {
    let result = ServiceCollection::new().add_module(BrokenModule);
    assert!(matches!(result, Err(DiError::Classification { .. })));
}

#[test]
fn test_registrar_collects_in_order() {
    let mut registrar = ModuleRegistrar::new();
    assert!(registrar.is_empty());
    registrar.add_module(StorageModule).unwrap();
    assert_eq!(registrar.len(), 2);

    let candidates = registrar.into_candidates();
    assert!(!candidates[0].is_abstract());
    assert!(candidates[1].is_abstract());
}

#[test]
fn test_root_skips_failing_static_module() {
    let config = CompositionConfig::new()
        .module(BrokenModule)
        .module(CacheModule { capacity: 8 })
        .module(StorageModule);
    let root = CompositionRoot::build(config);

    // BrokenModule's candidate is discarded along with the module
    assert_eq!(root.resolve::<dyn Storage>().unwrap().backend(), "disk");
    assert_eq!(root.resolve_all::<dyn Storage>().unwrap().len(), 1);
    assert_eq!(root.resolve::<dyn Cache>().unwrap().capacity(), 8);
}
