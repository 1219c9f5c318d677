// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for cache operations.

use alloy_primitives::BlockNumber;

use super::StoreError;

/// Errors that can occur while querying, saving to or clearing the events cache.
///
/// Validation errors (`InvalidRange`, `RangeViolation`) are raised before the
/// store is touched, so they never leave partial writes behind.
///
/// # Examples
///
/// ```rust,ignore
/// use semiocache::{EventsCache, EventsCacheError};
///
/// match cache.save(&filter, 10, 20, events).await {
///     Ok(()) => {}
///     Err(EventsCacheError::RangeViolation { block_number, .. }) => {
///         eprintln!("fetched log from block {block_number} outside the requested window");
///     }
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EventsCacheError {
    /// The requested block range is empty (`from_block > to_block`).
    #[error("Invalid block range: from block {from_block} is after to block {to_block}")]
    InvalidRange {
        /// Start of the requested range
        from_block: BlockNumber,
        /// End of the requested range
        to_block: BlockNumber,
    },

    /// An event handed to `save` lies outside the declared block range.
    #[error("Block number {block_number} is outside the specified range [{from_block}, {to_block}]")]
    RangeViolation {
        /// Block number of the offending event
        block_number: BlockNumber,
        /// Declared start of the saved range
        from_block: BlockNumber,
        /// Declared end of the saved range
        to_block: BlockNumber,
    },

    /// An RPC filter cannot be expressed as a cacheable event filter.
    #[error("Unsupported filter: {details}")]
    UnsupportedFilter {
        /// Why the filter was rejected
        details: String,
    },

    /// An RPC log is missing the fields that identify it (usually a pending log).
    #[error("Log is missing {field}; only mined logs can be cached")]
    IncompleteLog {
        /// Name of the missing field
        field: &'static str,
    },

    /// Failure from the underlying store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EventsCacheError {
    /// Create an `UnsupportedFilter` error with details.
    pub fn unsupported_filter(details: impl Into<String>) -> Self {
        EventsCacheError::UnsupportedFilter {
            details: details.into(),
        }
    }

    /// Reject empty ranges.
    pub(crate) fn check_range(
        from_block: BlockNumber,
        to_block: BlockNumber,
    ) -> Result<(), EventsCacheError> {
        if from_block > to_block {
            return Err(EventsCacheError::InvalidRange {
                from_block,
                to_block,
            });
        }
        Ok(())
    }
}
