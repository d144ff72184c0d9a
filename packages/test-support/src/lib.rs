//! Test support for the bootstrap workspace: logging, unique names and an
//! in-memory provisioning target.

use ulid::Ulid;

pub mod logging;
pub mod recording;

pub use recording::{Call, RecordingTarget};

/// Generate a unique string with the given prefix, `{prefix}-{ulid}`.
///
/// ```
/// use test_support::unique_str;
///
/// let id1 = unique_str("user");
/// let id2 = unique_str("user");
/// assert_ne!(id1, id2);
/// assert!(id1.starts_with("user-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Database-safe variant of [`unique_str`]: `{prefix}_{ulid}`, lowercase.
pub fn unique_db_name(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new().to_string().to_lowercase())
}
