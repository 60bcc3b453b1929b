//! Extension points of the recorder pipeline

use std::sync::Arc;

use faultline_domain::{CaptureOptions, ErrorDescriptor};

use crate::client::BackendClient;

/// Exception slot and options threaded through the transformer chain
pub type Transformed = (Option<ErrorDescriptor>, CaptureOptions);

/// Rewrites the exception and/or options before suppression checks.
///
/// Transformers see `None` in the exception slot when a plain message is
/// captured. Returning `None` for an exception drops it.
pub trait Transformer: Send + Sync {
    fn transform(
        &self,
        exception: Option<ErrorDescriptor>,
        options: CaptureOptions,
        client: &dyn BackendClient,
    ) -> anyhow::Result<Transformed>;
}

impl<F> Transformer for F
where
    F: Fn(Option<ErrorDescriptor>, CaptureOptions, &dyn BackendClient)
            -> anyhow::Result<Transformed>
        + Send
        + Sync,
{
    fn transform(
        &self,
        exception: Option<ErrorDescriptor>,
        options: CaptureOptions,
        client: &dyn BackendClient,
    ) -> anyhow::Result<Transformed> {
        self(exception, options, client)
    }
}

/// Vetoes dispatch of an exception. Never consulted for plain messages.
pub trait ExceptionSuppressor: Send + Sync {
    fn suppress(&self, exception: &ErrorDescriptor, options: &CaptureOptions)
        -> anyhow::Result<bool>;
}

impl<F> ExceptionSuppressor for F
where
    F: Fn(&ErrorDescriptor, &CaptureOptions) -> anyhow::Result<bool> + Send + Sync,
{
    fn suppress(
        &self,
        exception: &ErrorDescriptor,
        options: &CaptureOptions,
    ) -> anyhow::Result<bool> {
        self(exception, options)
    }
}

/// Box a closure as a shareable transformer
pub fn transformer_fn<F>(f: F) -> Arc<dyn Transformer>
where
    F: Fn(Option<ErrorDescriptor>, CaptureOptions, &dyn BackendClient)
            -> anyhow::Result<Transformed>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Box a closure as a shareable suppressor
pub fn suppressor_fn<F>(f: F) -> Arc<dyn ExceptionSuppressor>
where
    F: Fn(&ErrorDescriptor, &CaptureOptions) -> anyhow::Result<bool> + Send + Sync + 'static,
{
    Arc::new(f)
}
