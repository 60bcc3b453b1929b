//! Capture pipeline: filter chain, retry classification, enrichment and the
//! recorder that runs them

pub mod enrichment;
pub mod ports;
pub mod recorder;
pub mod registry;
pub mod retry;

pub use enrichment::enrich_extras_to_tags;
pub use ports::{suppressor_fn, transformer_fn, ExceptionSuppressor, Transformed, Transformer};
pub use recorder::{Gating, Recorder};
pub use registry::{FilterChain, SuppressorList, TransformerList};
pub use retry::{is_retryable_storage_error, RETRYABLE_MESSAGES};
