//! Backend client ports, per-service configuration and the client factory

pub mod config;
pub mod factory;
pub mod ports;

pub use config::{ClientConfig, ClientConfigParams};
pub use factory::ClientFactory;
pub use ports::{BackendClient, BackendFactory, DsnLookup, EventFilter};
