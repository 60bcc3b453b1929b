//! Hub cache - one backend client per service

pub mod cache;

pub use cache::{HubCache, ResolvedClient};
