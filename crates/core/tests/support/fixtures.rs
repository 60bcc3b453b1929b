//! Fixtures for reporting context tests

use std::collections::BTreeMap;
use std::sync::Arc;

use faultline_core::testing::RecordingBackendFactory;
use faultline_core::{AdapterOptions, DsnLookup, ReportingContext};
use faultline_domain::{AdapterSettings, DeploymentTier, ExecutionMode, ServiceName};

pub const DEFAULT_DSN: &str = "https://default-key@ingest.example.com/1";
pub const BILLING_DSN: &str = "https://billing-key@ingest.example.com/2";

pub fn service(name: &str) -> ServiceName {
    ServiceName::new(name).unwrap()
}

/// Production settings with a DSN for `default` and `billing`
pub fn production_settings() -> AdapterSettings {
    AdapterSettings {
        deployment_environment: "production".into(),
        release_version: Some("2024.10.1".into()),
        regional_name: "us-01".into(),
        regional_cluster: "c07".into(),
        zone: Some("us-east-1b".into()),
        cluster_manager: "true".into(),
        extras_to_tags: vec!["app_group_id".into(), "company_id".into()],
        tier: DeploymentTier::Production,
        execution_mode: ExecutionMode::Normal,
        service_dsns: [("default", DEFAULT_DSN), ("billing", BILLING_DSN)]
            .into_iter()
            .map(|(s, d)| (s.to_string(), d.to_string()))
            .collect(),
        ..AdapterSettings::default()
    }
}

/// Lookup over `settings.service_dsns`
pub fn table_lookup(settings: &AdapterSettings) -> Arc<dyn DsnLookup> {
    let table: BTreeMap<String, String> = settings.service_dsns.clone();
    Arc::new(move |service: &ServiceName| table.get(service.as_str()).cloned())
}

/// Context configured with `settings` against `backend`
pub fn configured_context(
    settings: AdapterSettings,
    backend: &RecordingBackendFactory,
) -> ReportingContext {
    let context = ReportingContext::new();
    configure(&context, settings, backend);
    context
}

pub fn configure(
    context: &ReportingContext,
    settings: AdapterSettings,
    backend: &RecordingBackendFactory,
) {
    let lookup = table_lookup(&settings);
    let options = AdapterOptions::new(settings, lookup).unwrap();
    context.configure(options, Arc::new(backend.clone())).unwrap();
}
