//! Well-known constants
//!
//! Centralizes the values that end up in persisted data, so changing one is
//! a visible, deliberate act.

/// Namespace prepended to every cache key unless configured otherwise
pub const DEFAULT_NAMESPACE: &str = "events-cache";

/// Version of the on-disk store format
///
/// Bump when the persisted shape of keys, intervals or events changes; files
/// with another version are ignored rather than misread.
pub const STORE_FORMAT_VERSION: u32 = 1;
