//! Handler-tree lifecycle behavior: activation policies, part lookup,
//! round trips, failure containment, disposal, and event publication.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::json;

use assembly_core::constants::events::{COMPONENT_ACTIVATED, COMPONENT_DEACTIVATED};
use assembly_core::controller::Controller;
use assembly_core::error::ComponentError;
use assembly_core::model::{ActivationPolicy, ComponentModel, LifestylePolicy};
use assembly_core::HandlerStatus;

use common::{counting_factory, flaky_factory, lifecycle_graph};

fn singleton_model(name: &str, activation: ActivationPolicy) -> (ComponentModel, common::CountingFactory) {
    let factory = counting_factory(name);
    let model = ComponentModel::builder(name, factory.factory.clone())
        .capability("probe")
        .lifestyle(LifestylePolicy::Singleton)
        .activation(activation)
        .graph(lifecycle_graph())
        .build()
        .unwrap();
    (model, factory)
}

#[test]
fn demand_handler_requires_explicit_activation() {
    let (model, _) = singleton_model("demand", ActivationPolicy::Demand);
    let controller = Controller::new();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();

    let err = handler.get_instance().unwrap_err();
    assert!(matches!(err, ComponentError::NotActive { .. }));

    controller.activate(&handler).unwrap();
    assert!(handler.get_instance().is_ok());
}

#[test]
fn startup_handler_creates_instance_during_activation() {
    let (model, factory) = singleton_model("startup", ActivationPolicy::Startup);
    let controller = Controller::new();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();
    assert_eq!(factory.created.load(Ordering::SeqCst), 0);

    controller.activate(&handler).unwrap();
    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    assert_eq!(handler.size(), 1);

    // demand-style callers reuse the eagerly created singleton
    let instance = handler.get_instance().unwrap();
    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    assert!(instance.is_available());
}

#[test]
fn activation_round_trip_produces_fresh_instance() {
    let (model, _) = singleton_model("roundtrip", ActivationPolicy::Demand);
    let controller = Controller::new();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();

    controller.activate(&handler).unwrap();
    let first = handler.get_instance().unwrap();
    let first_id = first.id();

    controller.deactivate(&handler);
    assert!(!first.is_available());
    assert_eq!(handler.size(), 0);

    controller.activate(&handler).unwrap();
    let second = handler.get_instance().unwrap();
    assert_ne!(second.id(), first_id);
}

#[test]
fn deactivate_twice_matches_deactivate_once() {
    let (model, _) = singleton_model("idempotent", ActivationPolicy::Demand);
    let controller = Controller::new();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();
    controller.activate(&handler).unwrap();
    handler.get_instance().unwrap();

    controller.deactivate(&handler);
    let status_after_one = handler.status();
    let size_after_one = handler.size();

    controller.deactivate(&handler);
    assert_eq!(handler.status(), status_after_one);
    assert_eq!(handler.size(), size_after_one);
    assert_eq!(handler.status(), HandlerStatus::Inactive);
}

#[test]
fn failed_startup_activation_leaves_handler_retryable() {
    let model = ComponentModel::builder("flaky", flaky_factory(1))
        .lifestyle(LifestylePolicy::Singleton)
        .activation(ActivationPolicy::Startup)
        .graph(lifecycle_graph())
        .build()
        .unwrap();
    let controller = Controller::new();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();

    let err = controller.activate(&handler).unwrap_err();
    assert!(matches!(err, ComponentError::Instantiation { .. }));
    assert_eq!(handler.status(), HandlerStatus::Inactive);

    // the factory recovers; a second activation attempt is permitted
    controller.activate(&handler).unwrap();
    assert_eq!(handler.status(), HandlerStatus::Active);
    assert_eq!(handler.size(), 1);
}

#[test]
fn part_handlers_are_distinct_and_keyed() {
    let db = singleton_model("db", ActivationPolicy::Demand).0;
    let web = singleton_model("web", ActivationPolicy::Demand).0;
    let parent_factory = counting_factory("parent");
    let model = ComponentModel::builder("parent", parent_factory.factory)
        .part("db", db)
        .part("web", web)
        .build()
        .unwrap();

    let controller = Controller::new();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();

    let db_handler = handler.get_part_handler("db").unwrap();
    let web_handler = handler.get_part_handler("web").unwrap();
    assert_ne!(db_handler.path(), web_handler.path());
    assert_eq!(db_handler.path().as_str(), "/parent/db");
    assert_eq!(web_handler.path().as_str(), "/parent/web");

    let err = handler.get_part_handler("cache").unwrap_err();
    assert!(matches!(err, ComponentError::UnknownPart { .. }));
}

#[test]
fn startup_parts_activate_with_parent() {
    let eager_part = singleton_model("eager", ActivationPolicy::Startup).0;
    let lazy_part = singleton_model("lazy", ActivationPolicy::Demand).0;
    let model = ComponentModel::builder("parent", counting_factory("parent").factory)
        .activation(ActivationPolicy::Demand)
        .part("eager", eager_part)
        .part("lazy", lazy_part)
        .build()
        .unwrap();

    let controller = Controller::new();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();
    controller.activate(&handler).unwrap();

    assert!(handler.get_part_handler("eager").unwrap().is_active());
    // demand parts wait for their own callers
    assert!(!handler.get_part_handler("lazy").unwrap().is_active());

    controller.deactivate(&handler);
    assert!(!handler.get_part_handler("eager").unwrap().is_active());
}

#[test]
fn dispose_cascades_and_poisons() {
    let part = singleton_model("child", ActivationPolicy::Startup).0;
    let model = ComponentModel::builder("parent", counting_factory("parent").factory)
        .part("child", part)
        .build()
        .unwrap();

    let controller = Controller::new();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();
    controller.activate(&handler).unwrap();
    let child = handler.get_part_handler("child").unwrap();

    controller.dispose(&handler);
    assert_eq!(handler.status(), HandlerStatus::Disposed);
    assert_eq!(child.status(), HandlerStatus::Disposed);
    assert!(matches!(
        handler.get_instance().unwrap_err(),
        ComponentError::Disposed { .. }
    ));
}

#[test]
fn capability_view_round_trip() {
    let (model, _) = singleton_model("viewed", ActivationPolicy::Demand);
    let controller = Controller::new();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();
    controller.activate(&handler).unwrap();

    let instance = handler.get_instance().unwrap();
    let view = instance.view().unwrap();
    let reply = view.invoke("probe", "describe", json!("payload")).unwrap();
    assert_eq!(reply["label"], "viewed");

    let err = view.invoke("undeclared", "describe", json!(null)).unwrap_err();
    assert!(matches!(err, ComponentError::UnknownCapability { .. }));

    controller.deactivate(&handler);
    let err = view.invoke("probe", "describe", json!(null)).unwrap_err();
    assert!(matches!(err, ComponentError::Unavailable { .. }));
}

#[test]
fn lifecycle_events_are_published() {
    let (model, _) = singleton_model("observed", ActivationPolicy::Demand);
    let controller = Controller::new();
    let receiver = controller.publisher().subscribe();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();

    controller.activate(&handler).unwrap();
    controller.deactivate(&handler);

    let names: Vec<String> = receiver.try_iter().map(|e| e.name).collect();
    assert!(names.contains(&COMPONENT_ACTIVATED.to_string()));
    assert!(names.contains(&COMPONENT_DEACTIVATED.to_string()));
}

#[test]
fn activation_events_carry_component_path() {
    let (model, _) = singleton_model("addressed", ActivationPolicy::Demand);
    let controller = Controller::new();
    let receiver = controller.publisher().subscribe();
    let handler = controller.create_handler(&Arc::new(model)).unwrap();
    controller.activate(&handler).unwrap();

    let event = receiver
        .try_iter()
        .find(|e| e.name == COMPONENT_ACTIVATED)
        .expect("activation event published");
    assert_eq!(event.context["path"], "/addressed");
}
