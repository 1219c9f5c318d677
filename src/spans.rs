//! Span creation helpers for events cache operations.
//!
//! Telemetry is kept apart from business logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a span helper here.
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, param: Type) -> Result<T> {
//!     let span = spans::my_operation(param_value);
//!     async move { /* business logic */ }.instrument(span).await
//! }
//! ```

use alloy_chains::Chain;
use alloy_primitives::BlockNumber;
use tracing::{Level, Span};

use crate::config::ClearScope;
use crate::key::CacheKey;

/// Create span for a coverage + events query.
///
/// Parent: caller
/// Children: store reads
#[inline]
pub(crate) fn query(key: &CacheKey, from_block: BlockNumber, to_block: BlockNumber) -> Span {
    tracing::debug_span!(
        "semiocache.query",
        key = %key,
        from_block = from_block,
        to_block = to_block,
    )
}

/// Create span for saving a fetched block range.
///
/// Parent: caller
/// Children: store commit
#[inline]
pub(crate) fn save(
    key: &CacheKey,
    from_block: BlockNumber,
    to_block: BlockNumber,
    events: usize,
) -> Span {
    tracing::span!(
        Level::INFO,
        "semiocache.save",
        key = %key,
        from_block = from_block,
        to_block = to_block,
        events = events,
    )
}

/// Create span for clearing cached state.
#[inline]
pub(crate) fn clear(chain: Chain, scope: ClearScope) -> Span {
    tracing::span!(
        Level::INFO,
        "semiocache.clear",
        chain_id = chain.id(),
        scope = ?scope,
    )
}
