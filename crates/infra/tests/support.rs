//! Shared helpers for `faultline-infra` integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use faultline_core::ReportingContext;
use faultline_domain::{AdapterSettings, DeploymentTier};
use faultline_infra::{configure_with_backend, SentryBackendFactory};
use sentry::test::TestTransport;
use tempfile::TempDir;

pub const DEFAULT_DSN: &str = "https://default-key@sentry.invalid/1";
pub const BILLING_DSN: &str = "https://billing-key@sentry.invalid/2";

/// Production settings with DSNs for `default` and `billing`
pub fn production_settings() -> AdapterSettings {
    AdapterSettings {
        deployment_environment: "production".into(),
        release_version: Some("2024.10.1".into()),
        regional_name: "us-01".into(),
        regional_cluster: "c07".into(),
        zone: Some("us-east-1b".into()),
        tier: DeploymentTier::Production,
        extras_to_tags: vec!["company_id".into()],
        filter_parameters: vec!["password".into()],
        service_dsns: [("default", DEFAULT_DSN), ("billing", BILLING_DSN)]
            .into_iter()
            .map(|(service, dsn)| (service.to_string(), dsn.to_string()))
            .collect(),
        ..AdapterSettings::default()
    }
}

/// Context wired to Sentry clients that hand events to `transport`
pub fn sentry_context(
    settings: AdapterSettings,
    transport: &Arc<TestTransport>,
) -> ReportingContext {
    let factory = SentryBackendFactory::new().with_transport(Arc::new(Arc::clone(transport)));
    let context = ReportingContext::new();
    configure_with_backend(&context, settings, Arc::new(factory)).unwrap();
    context
}

/// Config file kept alive for the duration of a test
pub struct ConfigFile {
    pub path: PathBuf,
    _dir: TempDir,
}

impl ConfigFile {
    pub fn new(file_name: &str, contents: &str) -> Self {
        let dir = TempDir::new().expect("temp dir should be created");
        let path = dir.path().join(file_name);
        let mut file = std::fs::File::create(&path).expect("config file should be created");
        file.write_all(contents.as_bytes()).expect("config file should be written");
        Self { path, _dir: dir }
    }
}
