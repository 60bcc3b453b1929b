//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! adapter.

// Client configuration
pub const DEFAULT_SERVICE_NAME: &str = "default";
pub const ENABLED_ENVIRONMENTS: [&str; 3] = ["staging", "production", "development"];
pub const DSN_INVALID_ERROR: &str = "DSN not set or not valid";
pub const ENVIRONMENT_DISABLED_ERROR_PREFIX: &str = "Not configured to send/capture in environment";

/// Always reported, even when a lower layer excludes it by default
pub const ALWAYS_REPORTED_ERROR: &str = "ActionController::InvalidAuthenticityToken";

// Global scope tags
pub const TAG_REGION: &str = "region";
pub const TAG_CLUSTER: &str = "cluster";
pub const TAG_ZONE: &str = "az";
pub const TAG_CLUSTER_MANAGER: &str = "kubernetes";
pub const TAG_PAGING: &str = "pagerduty_service_tag";
pub const PAGING_TAG_SEPARATOR: &str = "-";

// Background jobs
pub const JOB_TRANSACTION_PREFIX: &str = "Sidekiq/";
pub const JOB_CORRUPTION_TRANSACTION: &str = "Sidekiq/JobCorruption";
pub const JOB_CONTEXT_KEY: &str = "sidekiq";
pub const JOB_RESERVED_KEY_PREFIX: &str = "_aj_";
pub const DEFAULT_JOB_MAX_RETRIES: u32 = 25;
pub const UNKNOWN_CODE_OWNER: &str = "UNKNOWN";
pub const EXTRA_SHARD: &str = "shard";
pub const EXTRA_CODE_OWNER: &str = "code_owner";
pub const EXTRA_TEAM: &str = "team";
