//! Adapter settings
//!
//! Plain-data configuration, loadable from TOML or JSON. Collaborators that
//! are functions (DSN lookup, PII filter, backend factory) are injected
//! separately when the reporting context is configured.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_JOB_MAX_RETRIES, PAGING_TAG_SEPARATOR, TAG_CLUSTER, TAG_CLUSTER_MANAGER, TAG_PAGING,
    TAG_REGION, TAG_ZONE,
};
use crate::errors::{FaultlineError, Result};
use crate::types::{DeploymentTier, ExecutionMode, HostClass, ServiceName};

/// Process-wide adapter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterSettings {
    /// Environment name sent with every event (e.g. `production`)
    pub deployment_environment: String,
    #[serde(default)]
    pub default_service_name: ServiceName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_version: Option<String>,

    pub regional_name: String,
    pub regional_cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Value of the `kubernetes` tag
    #[serde(default = "default_cluster_manager")]
    pub cluster_manager: String,

    /// Error kinds never reported
    #[serde(default)]
    pub errors_to_exclude: Vec<String>,
    /// Extra keys copied into tags when the tag is not already set
    #[serde(default)]
    pub extras_to_tags: Vec<String>,
    /// Parameter filter rules applied to every outgoing event
    #[serde(default)]
    pub filter_parameters: Vec<String>,

    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub tier: DeploymentTier,
    #[serde(default)]
    pub host_class: HostClass,

    /// Static DSN table keyed by service name
    #[serde(default)]
    pub service_dsns: BTreeMap<String, String>,

    #[serde(default)]
    pub jobs: JobSettings,
}

/// Background job reporting settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSettings {
    /// Only report a failing job once its retries are exhausted
    #[serde(default)]
    pub report_after_job_retries: bool,
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,
}

fn default_cluster_manager() -> String {
    "false".to_string()
}

const fn default_max_retries() -> u32 {
    DEFAULT_JOB_MAX_RETRIES
}

impl Default for JobSettings {
    fn default() -> Self {
        Self { report_after_job_retries: false, default_max_retries: DEFAULT_JOB_MAX_RETRIES }
    }
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            deployment_environment: "development".to_string(),
            default_service_name: ServiceName::default(),
            release_version: None,
            regional_name: "local".to_string(),
            regional_cluster: "local".to_string(),
            zone: None,
            cluster_manager: default_cluster_manager(),
            errors_to_exclude: Vec::new(),
            extras_to_tags: Vec::new(),
            filter_parameters: Vec::new(),
            execution_mode: ExecutionMode::default(),
            tier: DeploymentTier::default(),
            host_class: HostClass::default(),
            service_dsns: BTreeMap::new(),
            jobs: JobSettings::default(),
        }
    }
}

impl AdapterSettings {
    /// `<environment>-<region>-<cluster>`
    pub fn paging_tag(&self) -> String {
        [
            self.deployment_environment.as_str(),
            self.regional_name.as_str(),
            self.regional_cluster.as_str(),
        ]
        .join(PAGING_TAG_SEPARATOR)
    }

    /// Tags installed on the global scope; `az` is omitted without a zone.
    pub fn global_tags(&self) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert(TAG_REGION.to_string(), self.regional_name.clone());
        tags.insert(TAG_CLUSTER.to_string(), self.regional_cluster.clone());
        if let Some(zone) = self.zone.as_ref().filter(|z| !z.is_empty()) {
            tags.insert(TAG_ZONE.to_string(), zone.clone());
        }
        tags.insert(TAG_CLUSTER_MANAGER.to_string(), self.cluster_manager.clone());
        tags.insert(TAG_PAGING.to_string(), self.paging_tag());
        tags
    }

    /// # Errors
    /// Returns `FaultlineError::Config` for blank required fields or blank
    /// entries in the key lists.
    pub fn validate(&self) -> Result<()> {
        require_non_blank("deployment_environment", &self.deployment_environment)?;
        require_non_blank("regional_name", &self.regional_name)?;
        require_non_blank("regional_cluster", &self.regional_cluster)?;

        if self.extras_to_tags.iter().any(|key| key.trim().is_empty()) {
            return Err(FaultlineError::Config("extras_to_tags contains a blank key".into()));
        }
        if self.errors_to_exclude.iter().any(|kind| kind.trim().is_empty()) {
            return Err(FaultlineError::Config("errors_to_exclude contains a blank kind".into()));
        }
        Ok(())
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FaultlineError::Config(format!("{field} must not be blank")));
    }
    Ok(())
}
