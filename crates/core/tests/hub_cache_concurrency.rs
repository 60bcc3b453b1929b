//! Concurrency tests for per-service client resolution

mod support;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use faultline_core::testing::RecordingBackendFactory;
use support::{configured_context, production_settings, service};

const THREADS: usize = 16;

#[test]
fn test_concurrent_first_use_builds_one_client() {
    let backend = RecordingBackendFactory::new().with_build_delay(Duration::from_millis(20));
    let context = Arc::new(configured_context(production_settings(), &backend));
    let barrier = Arc::new(Barrier::new(THREADS));
    let baseline = backend.clients_created();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let context = Arc::clone(&context);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                context.resolve(Some(&service("billing"))).unwrap().client
            })
        })
        .collect();

    let clients: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(backend.clients_created() - baseline, 1);
    assert!(clients.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[test]
fn test_distinct_services_are_each_built_once() {
    let backend = RecordingBackendFactory::new().with_build_delay(Duration::from_millis(5));
    let context = Arc::new(configured_context(production_settings(), &backend));
    let names = ["billing", "search", "messaging", "Billing", "SEARCH", "messaging "];
    let barrier = Arc::new(Barrier::new(names.len() * 2));

    let handles: Vec<_> = names
        .iter()
        .chain(names.iter())
        .map(|name| {
            let context = Arc::clone(&context);
            let barrier = Arc::clone(&barrier);
            let name = service(name);
            thread::spawn(move || {
                barrier.wait();
                context.resolve(Some(&name)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut built: Vec<String> =
        backend.built_services().iter().map(|s| s.as_str().to_string()).collect();
    built.sort();
    assert_eq!(built, ["billing", "default", "messaging", "search"]);
}

#[test]
fn test_concurrent_capture_through_one_service() {
    let backend = RecordingBackendFactory::new();
    let context = Arc::new(configured_context(production_settings(), &backend));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let context = Arc::clone(&context);
            thread::spawn(move || {
                context.with_rescued_exceptions(Some(&service("billing")), |rec| {
                    rec.capture_message(&format!("message {i}"), None, false)
                })
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_some_and(|outcome| outcome.is_dispatched()));
    }
    assert_eq!(backend.event_count(), THREADS);
    assert_eq!(backend.clients_created(), 2);
}
