//! Integration tests for the reporting context and recorder pipeline
//!
//! Every test configures its own context against the in-memory recording
//! backend and asserts on what reached it.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use faultline_common::testing::LogCapture;
use faultline_core::testing::RecordingBackendFactory;
use faultline_core::{suppressor_fn, transformer_fn, AdapterOptions, ReportingContext};
use faultline_domain::constants::{ALWAYS_REPORTED_ERROR, EXTRA_TEAM};
use faultline_domain::{
    AdapterSettings, CaptureOptions, CaptureOutcome, DeploymentTier, ErrorDescriptor,
    ExecutionMode, HostClass, SkipReason, Team,
};
use serde_json::json;
use support::{
    configure, configured_context, production_settings, service, table_lookup, BILLING_DSN,
    DEFAULT_DSN,
};
use tracing::Level;

fn runtime_error(message: &str) -> ErrorDescriptor {
    ErrorDescriptor::new("RuntimeError", message)
}

fn capture(context: &ReportingContext, exception: ErrorDescriptor) -> Option<CaptureOutcome> {
    context.with_rescued_exceptions(None, |rec| rec.capture_exception(exception, None))
}

// ============================================================================
// Hub resolution
// ============================================================================

#[test]
fn test_default_service_is_configured_and_reuses_main_client() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);

    let resolved = context.resolve(None).unwrap();
    assert!(resolved.configured);
    assert!(Arc::ptr_eq(&resolved.client, &context.main_client().unwrap()));
    assert_eq!(backend.clients_created(), 1);
}

#[test]
fn test_unknown_service_falls_back_to_default_dsn() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);

    let resolved = context.resolve(Some(&service("search"))).unwrap();
    assert!(resolved.configured);
    assert_eq!(resolved.client.configuration().raw_dsn(), Some(DEFAULT_DSN));

    let billing = context.resolve(Some(&service("billing"))).unwrap();
    assert_eq!(billing.client.configuration().raw_dsn(), Some(BILLING_DSN));
}

#[test]
fn test_service_name_spellings_share_one_client() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);

    let a = context.resolve(Some(&service("Billing"))).unwrap();
    let b = context.resolve(Some(&service(" billing "))).unwrap();
    assert!(Arc::ptr_eq(&a.client, &b.client));
    assert_eq!(backend.clients_created(), 2);
}

#[test]
fn test_missing_dsn_everywhere_leaves_clients_unconfigured() {
    let backend = RecordingBackendFactory::new();
    let settings = AdapterSettings { service_dsns: Default::default(), ..production_settings() };
    let context = configured_context(settings, &backend);

    let resolved = context.resolve(Some(&service("billing"))).unwrap();
    assert!(!resolved.configured);
    assert!(resolved.client.configuration().has_dsn_error());

    let outcome = capture(&context, runtime_error("boom")).unwrap();
    assert_eq!(outcome, CaptureOutcome::Skipped(SkipReason::Unconfigured));
    assert_eq!(backend.event_count(), 0);
}

#[test]
fn test_reconfigure_invalidates_cached_clients() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    let before = context.resolve(Some(&service("billing"))).unwrap().client;

    configure(&context, production_settings(), &backend);
    let after = context.resolve(Some(&service("billing"))).unwrap().client;

    assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn test_per_service_clients_carry_global_tags() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);

    context
        .with_rescued_exceptions(Some(&service("billing")), |rec| {
            rec.capture_message("hello", None, false)
        })
        .unwrap();

    let events = backend.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].service.as_str(), "billing");
    assert_eq!(events[0].scope.tag("pagerduty_service_tag"), Some("production-us-01-c07"));
    assert_eq!(events[0].scope.tag("az"), Some("us-east-1b"));
}

// ============================================================================
// Pipeline policy
// ============================================================================

#[test]
fn test_retryable_storage_errors_are_never_dispatched() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);

    let plain = ErrorDescriptor::storage("Mongo::Error::OperationFailure", "Not Master");
    let bulk = ErrorDescriptor::bulk_write(
        "Mongo::Error::BulkWriteError",
        "bulk write failed",
        [r#"{"writeErrors"=>[{"errmsg"=>"Node Is Recovering"}]}"#],
    );

    for exception in [plain, bulk] {
        let outcome = capture(&context, exception).unwrap();
        assert_eq!(outcome, CaptureOutcome::Skipped(SkipReason::RetryableStorageError));
    }
    assert_eq!(backend.event_count(), 0);
}

#[test]
fn test_extras_are_copied_into_tags() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);

    let options =
        CaptureOptions::new().with_extra("app_group_id", "a").with_extra("company_id", "b");
    context
        .with_rescued_exceptions(None, |rec| rec.capture_exception(runtime_error("x"), options))
        .unwrap();

    let event = &backend.events()[0];
    assert_eq!(event.options.tag("app_group_id"), Some("a"));
    assert_eq!(event.options.tag("company_id"), Some("b"));
}

#[test]
fn test_existing_tags_are_not_overwritten() {
    let backend = RecordingBackendFactory::new();
    let settings = AdapterSettings { extras_to_tags: vec!["a".into()], ..production_settings() };
    let context = configured_context(settings, &backend);

    let options = CaptureOptions::new().with_extra("a", 1).with_tag("a", "99");
    context
        .with_rescued_exceptions(None, |rec| rec.capture_message("m", options, false))
        .unwrap();

    assert_eq!(backend.events()[0].options.tag("a"), Some("99"));
}

#[test]
fn test_borrowed_options_are_never_mutated() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    context.register_transformer(transformer_fn(|exception, options, _| {
        Ok((exception, options.with_extra("company_id", "rewritten")))
    }));

    let options = CaptureOptions::new().with_extra("company_id", "original");
    context
        .with_rescued_exceptions(None, |rec| rec.capture_exception(runtime_error("x"), &options))
        .unwrap();

    assert_eq!(options.extra_value("company_id"), Some(&json!("original")));
    assert!(options.tags.is_none());
    assert_eq!(backend.events()[0].options.tag("company_id"), Some("rewritten"));
}

#[test]
fn test_transformers_run_in_registration_order() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    for step in ["first", "second"] {
        context.register_transformer(transformer_fn(move |exception, mut options, _| {
            let trail = options.fields.entry("trail").or_insert_with(|| json!([]));
            if let Some(items) = trail.as_array_mut() {
                items.push(json!(step));
            }
            options = options.with_tag("last", step);
            Ok((exception, options))
        }));
    }

    capture(&context, runtime_error("x")).unwrap();

    let event = &backend.events()[0];
    assert_eq!(event.options.fields["trail"], json!(["first", "second"]));
    assert_eq!(event.options.tag("last"), Some("second"));
}

#[test]
fn test_transformer_can_replace_exception() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    context.register_transformer(transformer_fn(|exception, options, _| {
        let renamed = exception.map(|e| ErrorDescriptor { kind: "Wrapped".into(), ..e });
        Ok((renamed, options))
    }));

    capture(&context, runtime_error("x")).unwrap();
    assert_eq!(backend.events()[0].exception().map(|e| e.kind.as_str()), Some("Wrapped"));
}

#[test]
fn test_suppressors_block_exceptions_but_not_messages() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    context.register_suppressor(suppressor_fn(|_, _| Ok(true)));

    let outcome = capture(&context, runtime_error("x")).unwrap();
    assert_eq!(outcome, CaptureOutcome::Skipped(SkipReason::Suppressed));

    let outcome = context
        .with_rescued_exceptions(None, |rec| rec.capture_message("still sent", None, false))
        .unwrap();
    assert!(outcome.is_dispatched());

    let events = backend.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message(), Some("still sent"));
}

#[test]
fn test_suppressors_see_enriched_tags() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    context.register_suppressor(suppressor_fn(|_, options| {
        Ok(options.tag("company_id") == Some("muted"))
    }));

    let muted = CaptureOptions::new().with_extra("company_id", "muted");
    let outcome = context
        .with_rescued_exceptions(None, |rec| rec.capture_exception(runtime_error("x"), muted))
        .unwrap();
    assert_eq!(outcome, CaptureOutcome::Skipped(SkipReason::Suppressed));
}

#[test]
fn test_message_backtrace_only_when_requested() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);

    context
        .with_rescued_exceptions(None, |rec| {
            rec.capture_message("with", None, true)?;
            rec.capture_message("without", None, false)
        })
        .unwrap();

    let events = backend.events();
    let with = events[0].options.backtrace.as_ref().unwrap();
    assert!(!with.is_empty());
    assert!(with[0].contains("adapter_integration.rs"));
    assert!(events[1].options.backtrace.is_none());
}

#[test]
fn test_interactive_mode_reports_nothing() {
    let backend = RecordingBackendFactory::new();
    let settings =
        AdapterSettings { execution_mode: ExecutionMode::Interactive, ..production_settings() };
    let context = configured_context(settings, &backend);
    let logs = LogCapture::new();

    let outcome = logs.in_scope(|| capture(&context, runtime_error("x")).unwrap());

    assert_eq!(outcome, CaptureOutcome::Skipped(SkipReason::InteractiveSession));
    assert!(logs.contains("interactive session"));
    assert_eq!(backend.event_count(), 0);
}

#[test]
fn test_unconfigured_logging_follows_tier_and_host_class() {
    let cases = [
        (DeploymentTier::Production, ExecutionMode::Normal, HostClass::Standard, true),
        (DeploymentTier::Staging, ExecutionMode::Normal, HostClass::Standard, true),
        (DeploymentTier::Staging, ExecutionMode::Normal, HostClass::PseudoProduction, false),
        (DeploymentTier::Development, ExecutionMode::Normal, HostClass::Standard, false),
        (DeploymentTier::Development, ExecutionMode::Test, HostClass::Standard, true),
    ];

    for (tier, execution_mode, host_class, expect_log) in cases {
        let backend = RecordingBackendFactory::new();
        let settings = AdapterSettings {
            tier,
            execution_mode,
            host_class,
            service_dsns: Default::default(),
            ..production_settings()
        };
        let context = configured_context(settings, &backend);
        let logs = LogCapture::new();

        let outcome = logs.in_scope(|| capture(&context, runtime_error("x")).unwrap());

        assert_eq!(outcome, CaptureOutcome::Skipped(SkipReason::Unconfigured));
        assert_eq!(
            logs.contains("DSN is not defined"),
            expect_log,
            "tier={tier} mode={execution_mode} host={host_class}"
        );
    }
}

#[test]
fn test_excluded_errors_are_dropped_but_csrf_is_reported() {
    let backend = RecordingBackendFactory::new()
        .with_default_exclusions(["ActionController::RoutingError", ALWAYS_REPORTED_ERROR]);
    let settings = AdapterSettings {
        errors_to_exclude: vec!["ActiveRecord::RecordNotFound".into()],
        ..production_settings()
    };
    let context = configured_context(settings, &backend);

    for kind in ["ActionController::RoutingError", "ActiveRecord::RecordNotFound"] {
        let outcome = capture(&context, ErrorDescriptor::new(kind, "x")).unwrap();
        assert_eq!(outcome, CaptureOutcome::Dispatched(None));
    }
    let outcome = capture(&context, ErrorDescriptor::new(ALWAYS_REPORTED_ERROR, "x")).unwrap();
    assert!(outcome.event_id().is_some());
    assert_eq!(backend.event_count(), 1);
}

#[test]
fn test_parameter_filter_redacts_nested_keys() {
    let backend = RecordingBackendFactory::new();
    let settings = AdapterSettings {
        filter_parameters: vec!["password".into(), "/^api_?key$/i".into()],
        ..production_settings()
    };
    let context = configured_context(settings, &backend);

    let options = CaptureOptions::new()
        .with_extra("request", json!({ "params": { "user": { "password": "hunter2" } } }))
        .with_context("client", json!({ "API_KEY": "abc", "name": "web" }));
    context
        .with_rescued_exceptions(None, |rec| rec.capture_exception(runtime_error("x"), options))
        .unwrap();

    let sent = &backend.events()[0].sent;
    assert_eq!(sent["extra"]["request"]["params"]["user"]["password"], json!("[FILTERED]"));
    assert_eq!(sent["contexts"]["client"]["API_KEY"], json!("[FILTERED]"));
    assert_eq!(sent["contexts"]["client"]["name"], json!("web"));
}

#[test]
fn test_last_event_id_passes_through() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);

    let (outcome, last) = context
        .with_rescued_exceptions(None, |rec| {
            let options = CaptureOptions::new().with_extra(EXTRA_TEAM, Team::Channels);
            let outcome = rec.capture_message("hi", options, false)?;
            Ok((outcome, rec.last_event_id()))
        })
        .unwrap();

    assert_eq!(outcome.event_id(), last);
    assert_eq!(backend.events()[0].options.extra_value(EXTRA_TEAM), Some(&json!("channels")));
}

// ============================================================================
// Rescue boundary
// ============================================================================

#[test]
fn test_transformer_errors_are_rescued_and_logged_once() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    context.register_transformer(transformer_fn(|_, _, _| Err(anyhow!("transformer exploded"))));
    let logs = LogCapture::new();

    let result = logs.in_scope(|| capture(&context, runtime_error("x")));

    assert!(result.is_none());
    assert_eq!(logs.count_at(Level::ERROR), 1);
    assert!(logs.contains("transformer exploded"));
    assert_eq!(backend.event_count(), 0);
}

#[test]
fn test_suppressor_errors_are_rescued() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    context.register_suppressor(suppressor_fn(|_, _| Err(anyhow!("suppressor exploded"))));
    let logs = LogCapture::new();

    let result = logs.in_scope(|| capture(&context, runtime_error("x")));

    assert!(result.is_none());
    assert_eq!(logs.count_at(Level::ERROR), 1);
}

#[test]
fn test_panics_in_body_are_rescued() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    let logs = LogCapture::new();
    let calls = AtomicUsize::new(0);

    let result: Option<()> = logs.in_scope(|| {
        context.with_rescued_exceptions(None, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            panic!("caller bug inside reporting block")
        })
    });

    assert!(result.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(logs.contains("caller bug inside reporting block"));
}

#[test]
fn test_unconfigured_context_is_rescued() {
    let context = ReportingContext::new();
    let logs = LogCapture::new();

    let result = logs.in_scope(|| capture(&context, runtime_error("x")));

    assert!(result.is_none());
    assert!(logs.contains("not configured"));
}

#[test]
fn test_reset_clears_filters_and_state() {
    let backend = RecordingBackendFactory::new();
    let context = configured_context(production_settings(), &backend);
    context.register_suppressor(suppressor_fn(|_, _| Ok(true)));

    context.reset();
    assert!(!context.is_configured());
    assert!(context.filters().suppressors().is_empty());

    let settings = production_settings();
    let options = AdapterOptions::new(settings.clone(), table_lookup(&settings)).unwrap();
    context.configure(options, Arc::new(backend.clone())).unwrap();
    assert!(capture(&context, runtime_error("x")).unwrap().is_dispatched());
}
