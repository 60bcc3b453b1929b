//! Runtime gating flags decided once at startup

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// How the current process is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Normal,
    /// Operator console or REPL; nothing is reported
    Interactive,
    Test,
}

impl_domain_status_conversions!(ExecutionMode {
    Normal => "normal",
    Interactive => "interactive",
    Test => "test",
});

/// Deployment tier the process runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentTier {
    Production,
    Staging,
    #[default]
    Development,
}

impl_domain_status_conversions!(DeploymentTier {
    Production => "production",
    Staging => "staging",
    Development => "development",
});

/// Whether a staging host should be treated like production
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostClass {
    #[default]
    Standard,
    PseudoProduction,
}

impl_domain_status_conversions!(HostClass {
    Standard => "standard",
    PseudoProduction => "pseudo_production",
});
