use ferrous_ioc::{
    classify, CandidateType, DiError, Injectable, Key, Lifetime, RegistrationMode, Resolver,
    ServiceCollection,
};
use std::sync::Arc;

trait Widget: Send + Sync {
    fn id(&self) -> &'static str;
}
trait Command: Send + Sync {
    fn run(&self) -> &'static str;
}

#[derive(Default)]
struct Clock;
impl Widget for Clock {
    fn id(&self) -> &'static str {
        "clock"
    }
}
impl Command for Clock {
    fn run(&self) -> &'static str {
        "tick"
    }
}

#[derive(Default)]
struct Weather;
impl Widget for Weather {
    fn id(&self) -> &'static str {
        "weather"
    }
}

fn clock() -> ferrous_ioc::CandidateBuilder<Clock> {
    CandidateType::of_default::<Clock>()
        .implements::<dyn Widget>(|c| c as Arc<dyn Widget>)
        .implements::<dyn Command>(|c| c as Arc<dyn Command>)
}

fn weather() -> CandidateType {
    CandidateType::of_default::<Weather>()
        .implements::<dyn Widget>(|w| w as Arc<dyn Widget>)
        .build()
}

#[test]
fn test_unbound_metadata_registers_each_requested_contract() {
    let candidate = clock()
        .injectable_unbound(Lifetime::Singleton)
        .requesting::<dyn Widget>()
        .requesting::<dyn Command>()
        .build();

    let mut services = ServiceCollection::new();
    assert_eq!(services.add_candidate(&candidate), 2);

    let provider = services.build();
    assert_eq!(provider.get::<dyn Widget>().unwrap().id(), "clock");
    assert_eq!(provider.get::<dyn Command>().unwrap().run(), "tick");
}

#[test]
fn test_unsatisfied_requested_contracts_are_skipped() {
    let candidate = CandidateType::of_default::<Weather>()
        .implements::<dyn Widget>(|w| w as Arc<dyn Widget>)
        .injectable_unbound(Lifetime::Transient)
        .requesting::<dyn Command>()
        .requesting::<dyn Widget>()
        .build();

    let descriptors = classify(&candidate);
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].contract, Key::of::<dyn Widget>());
}

#[test]
fn test_computed_metadata() {
    let lifetime_text = "transient";
    let candidate = clock()
        .injectable_with(move || Ok(Injectable::of::<dyn Widget>(lifetime_text.parse()?)))
        .build();

    let descriptors = classify(&candidate);
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].lifetime, Lifetime::Transient);
}

#[test]
fn test_registration_modes() {
    let widget = Key::of::<dyn Widget>();
    let clock = clock().build();
    let weather = weather();

    let mut services = ServiceCollection::new();
    assert!(services.add_explicit(widget, &clock, Lifetime::Singleton, RegistrationMode::TryAdd));
    assert!(!services.add_explicit(widget, &weather, Lifetime::Singleton, RegistrationMode::TryAdd));
    assert!(services.add_explicit(
        widget,
        &weather,
        Lifetime::Singleton,
        RegistrationMode::TryAddEnumerable
    ));
    assert!(!services.add_explicit(
        widget,
        &clock,
        Lifetime::Singleton,
        RegistrationMode::TryAddEnumerable
    ));
    assert!(services.add_explicit(widget, &clock, Lifetime::Transient, RegistrationMode::Append));

    let provider = services.build();
    let ids: Vec<_> = provider
        .get_all::<dyn Widget>()
        .unwrap()
        .iter()
        .map(|w| w.id())
        .collect();
    assert_eq!(ids, vec!["clock", "weather", "clock"]);
}

#[test]
fn test_explicit_registration_requires_satisfied_contract() {
    let mut services = ServiceCollection::new();
    assert!(!services.add_explicit(
        Key::of::<dyn Command>(),
        &weather(),
        Lifetime::Singleton,
        RegistrationMode::Append
    ));
    assert!(services.is_empty());
}

#[test]
fn test_factory_lifetime_fallback() {
    let command = Key::of::<dyn Command>();

    // Explicit lifetime wins
    let mut services = ServiceCollection::new();
    services.add_factory(
        command,
        &clock().injectable::<dyn Command>(Lifetime::Singleton).build(),
        Some(Lifetime::Transient),
        RegistrationMode::Append,
    );
    // Metadata lifetime applies when none is given
    services.add_factory(
        command,
        &clock().injectable::<dyn Command>(Lifetime::Singleton).build(),
        None,
        RegistrationMode::Append,
    );
    // Without metadata the lifetime is scoped
    services.add_factory(command, &clock().build(), None, RegistrationMode::Append);

    let lifetimes: Vec<_> = services.descriptors().iter().map(|d| d.lifetime).collect();
    assert_eq!(
        lifetimes,
        vec![Lifetime::Transient, Lifetime::Singleton, Lifetime::Scoped]
    );
    assert!(services.descriptors().iter().all(|d| d.is_factory));
}

#[test]
fn test_get_each_keeps_going_past_failures() {
    let broken = CandidateType::of(|_| -> ferrous_ioc::DiResult<Weather> {
        Err(DiError::construction::<Weather>("sensor offline"))
    })
    .implements::<dyn Widget>(|w| w as Arc<dyn Widget>)
    .injectable::<dyn Widget>(Lifetime::Transient)
    .build();

    let mut services = ServiceCollection::new();
    services.add_candidate(&broken);
    services.add_candidate(&clock().injectable::<dyn Widget>(Lifetime::Singleton).build());
    let provider = services.build();

    let each = provider.get_each::<dyn Widget>();
    assert_eq!(each.len(), 2);
    assert!(each[0].is_err());
    assert_eq!(each[1].as_ref().map(|w| w.id()).unwrap(), "clock");

    // The strict collection form reports the failure
    assert!(provider.get_all::<dyn Widget>().is_err());
}
