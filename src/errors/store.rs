// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for cache store backends.

/// Errors raised by a [`CacheStore`](crate::store::CacheStore) backend.
///
/// These are never interpreted or retried by the cache itself; they surface
/// to the caller wrapped in [`EventsCacheError::Store`](crate::EventsCacheError::Store).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure while reading, writing or locking the store.
    #[error("Store I/O error at {path}: {details}")]
    Io {
        /// Path of the file involved
        path: String,
        /// Details about the I/O error
        details: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failure encoding or decoding persisted records.
    #[error("Store serialization error: {details}")]
    Serialization {
        /// Details about the serialization error
        details: String,
        /// The underlying serialization error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Persisted records violate an invariant the store relies on.
    ///
    /// This can occur when a store file was edited by hand or written by an
    /// incompatible tool, e.g. an interval whose `from` exceeds its `to`.
    #[error("Store data corrupted: {details}")]
    Corrupted {
        /// Description of the broken invariant
        details: String,
    },
}

impl StoreError {
    /// Create an `Io` error for a path.
    pub fn io(
        path: impl Into<String>,
        details: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        StoreError::Io {
            path: path.into(),
            details: details.into(),
            source,
        }
    }

    /// Create a `Serialization` error from any serialization error.
    pub fn serialization(
        details: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Serialization {
            details: details.into(),
            source: Box::new(source),
        }
    }

    /// Create a `Corrupted` error with details.
    pub fn corrupted(details: impl Into<String>) -> Self {
        StoreError::Corrupted {
            details: details.into(),
        }
    }
}
