// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types shared by the cache, its stores and its callers

mod event;
mod interval;
mod query;

pub use event::{CachedEvent, EventId};
pub use interval::{BlockInterval, QueryIntervals};
pub use query::QueryResult;
