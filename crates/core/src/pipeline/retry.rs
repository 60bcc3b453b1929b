//! Retry classifier for transient storage errors
//!
//! The storage driver retries operations that fail with these messages on its
//! own, so they are never worth a report.

use faultline_domain::ErrorDescriptor;

/// Lower-cased phrases from the storage driver's read and write retry lists
pub const RETRYABLE_MESSAGES: [&str; 12] = [
    "transport error",
    "socket exception",
    "can't connect",
    "connect failed",
    "error querying",
    "could not get last error",
    "connection attempt failed",
    "interrupted at shutdown",
    "unknown replica set",
    "dbclient error communicating with server",
    "not master",
    "node is recovering",
];

/// True when `exception` is a storage error whose text contains a retryable
/// phrase. Bulk writes also scan their per-item results.
pub fn is_retryable_storage_error(exception: &ErrorDescriptor) -> bool {
    if !exception.is_storage() {
        return false;
    }

    let mut text = exception.inspect();
    if exception.is_bulk_write() {
        for nested in &exception.nested_messages {
            text.push(' ');
            text.push_str(nested);
        }
    }
    let text = text.to_lowercase();

    RETRYABLE_MESSAGES.iter().any(|phrase| text.contains(phrase))
}
