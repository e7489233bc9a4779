use ferrous_ioc::{
    CandidateType, CompositionConfig, CompositionRoot, DiError, DiResult, DynamicLibraryLoader,
    Lifetime, ModuleLoader, ModuleLocation, Plugin, Resolver, Scanner,
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

trait Widget: Send + Sync {
    fn label(&self) -> String;
}

struct Labeled(String);

impl Widget for Labeled {
    fn label(&self) -> String {
        self.0.clone()
    }
}

impl Plugin for Labeled {
    fn name(&self) -> &str {
        &self.0
    }
}

/// Reads module files as text: one widget per line, or `fail` to simulate a broken module.
#[derive(Default)]
struct TextModuleLoader {
    opened: Mutex<Vec<String>>,
}

impl ModuleLoader for TextModuleLoader {
    fn load(&self, path: &Path) -> DiResult<Vec<CandidateType>> {
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.opened.lock().unwrap().push(file_name);

        let contents = fs::read_to_string(path).map_err(|err| DiError::ModuleLoad {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        if contents.trim() == "fail" {
            return Err(DiError::ModuleLoad {
                path: path.to_path_buf(),
                reason: "corrupt module".into(),
            });
        }

        Ok(contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                let label = line.to_string();
                CandidateType::of(move |_| Ok(Labeled(label.clone())))
                    .implements::<dyn Widget>(|w| w as Arc<dyn Widget>)
                    .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
                    .injectable_unbound(Lifetime::Singleton)
                    .build()
            })
            .collect())
    }
}

fn module_dir(modules: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in modules {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

#[test]
fn test_scan_yields_candidates_in_file_order() {
    let dir = module_dir(&[("b.mod", "beta\n"), ("a.mod", "alpha\nalpha-2\n"), ("readme.txt", "x")]);
    let loader = TextModuleLoader::default();

    let location = ModuleLocation::new(dir.path()).with_pattern("*.mod");
    let candidates = Scanner::new(&loader).scan(&[location]);

    assert_eq!(candidates.len(), 3);
    assert_eq!(*loader.opened.lock().unwrap(), vec!["a.mod", "b.mod"]);
    let sources: Vec<_> = candidates
        .iter()
        .map(|candidate| candidate.source().and_then(file_name))
        .collect();
    assert_eq!(sources, vec![Some("a.mod"), Some("a.mod"), Some("b.mod")]);
}

#[test]
fn test_failing_module_is_skipped() {
    let dir = module_dir(&[("a.mod", "alpha\n"), ("b.mod", "fail"), ("c.mod", "gamma\n")]);
    let loader = TextModuleLoader::default();

    let location = ModuleLocation::new(dir.path()).with_pattern("*.mod");
    let candidates = Scanner::new(&loader).scan_location(&location);

    assert_eq!(candidates.len(), 2);
    assert_eq!(loader.opened.lock().unwrap().len(), 3);
}

#[test]
fn test_missing_location_contributes_nothing() {
    let dir = module_dir(&[("a.mod", "alpha\n")]);
    let loader = TextModuleLoader::default();

    let locations = [
        ModuleLocation::new(dir.path().join("missing")).with_pattern("*.mod"),
        ModuleLocation::new(dir.path()).with_pattern("*.mod"),
    ];
    assert_eq!(Scanner::new(&loader).scan(&locations).len(), 1);
}

#[test]
fn test_requested_contracts_are_attached() {
    let dir = module_dir(&[("a.mod", "alpha\n")]);
    let loader = TextModuleLoader::default();

    let location = ModuleLocation::new(dir.path())
        .with_pattern("*.mod")
        .requesting::<dyn Widget>();
    let candidates = Scanner::new(&loader).scan_location(&location);

    assert_eq!(candidates[0].requested(), &[ferrous_ioc::Key::of::<dyn Widget>()]);
}

#[test]
fn test_root_registers_scanned_modules() {
    let dir = module_dir(&[("a.mod", "alpha\nbeta\n"), ("b.mod", "gamma\n")]);
    let loader = TextModuleLoader::default();

    let config = CompositionConfig::new().search(
        ModuleLocation::new(dir.path())
            .with_pattern("*.mod")
            .requesting::<dyn Widget>()
            .requesting::<dyn Plugin>(),
    );
    let root = CompositionRoot::build_with_loader(config, &loader);

    let labels: Vec<_> = root
        .resolve_all::<dyn Widget>()
        .unwrap()
        .iter()
        .map(|w| w.label())
        .collect();
    assert_eq!(labels, vec!["alpha", "beta", "gamma"]);
    assert_eq!(root.resolve::<dyn Widget>().unwrap().label(), "alpha");

    let report = root.load_plugins();
    assert_eq!(report.transitioned_names(), vec!["alpha", "beta", "gamma"]);
    let sources: Vec<_> = report
        .transitioned
        .iter()
        .map(|record| record.source.as_deref().and_then(file_name))
        .collect();
    assert_eq!(sources, vec![Some("a.mod"), Some("a.mod"), Some("b.mod")]);
}

#[test]
fn test_scanned_without_request_register_nothing() {
    let dir = module_dir(&[("a.mod", "alpha\n")]);
    let loader = TextModuleLoader::default();

    let config = CompositionConfig::new()
        .search(ModuleLocation::new(dir.path()).with_pattern("*.mod"));
    let root = CompositionRoot::build_with_loader(config, &loader);

    assert!(root.provider().descriptors().is_empty());
    assert!(matches!(
        root.get::<dyn Widget>(),
        Err(DiError::UnregisteredContract(_))
    ));
}

#[test]
fn test_dynamic_loader_rejects_non_library() {
    let dir = module_dir(&[("fake.so", "not a shared object")]);

    let result = DynamicLibraryLoader::new().load(&dir.path().join("fake.so"));
    match result {
        Err(DiError::ModuleLoad { path, .. }) => assert!(path.ends_with("fake.so")),
        other => panic!("expected module load error, got {other:?}"),
    }
}

#[test]
fn test_dynamic_loader_scan_survives_bad_files() {
    let dir = module_dir(&[("broken.so", "garbage"), ("broken.dll", "garbage"), ("broken.dylib", "garbage")]);

    let location = ModuleLocation::new(dir.path()).with_pattern("broken.*");
    let candidates = Scanner::new(&DynamicLibraryLoader).scan_location(&location);
    assert!(candidates.is_empty());
}
