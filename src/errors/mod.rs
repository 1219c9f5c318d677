// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the semiocache library.
//!
//! - [`EventsCacheError`] - Errors from the public cache operations
//!   (`query`, `save`, `clear`)
//! - [`StoreError`] - Errors from a store backend, wrapped by
//!   [`EventsCacheError::Store`] so `?` propagates them unchanged
//!
//! The cache never retries: every call makes at most one attempt against the
//! store and reports whatever failed.

mod cache;
mod store;

pub use cache::EventsCacheError;
pub use store::StoreError;
