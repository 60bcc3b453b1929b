//! Domain types and models

pub mod capture;
pub mod descriptor;
pub mod dsn;
pub mod job;
pub mod mode;
pub mod scope;
pub mod service;
pub mod team;

pub use capture::{CaptureOptions, CaptureOutcome, EventId, IntoCaptureOptions, SkipReason};
pub use descriptor::{ErrorDescriptor, ErrorOrigin, StorageOperation};
pub use dsn::Dsn;
pub use job::{JobClass, JobContext, RetrySetting};
pub use mode::{DeploymentTier, ExecutionMode, HostClass};
pub use scope::Scope;
pub use service::ServiceName;
pub use team::Team;
