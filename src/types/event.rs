// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cached event records

use std::fmt;

use alloy_primitives::BlockNumber;
use alloy_rpc_types::Log;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{EventsCacheError, StoreError};

/// Field names reserved for the identity triple in the persisted record
const IDENTITY_FIELDS: [&str; 3] = ["blockNumber", "transactionIndex", "logIndex"];

/// Identity of an event: `(block_number, transaction_index, log_index)`
///
/// Orders events the way they appear on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId {
    pub block_number: BlockNumber,
    pub transaction_index: u64,
    pub log_index: u64,
}

impl EventId {
    pub const fn new(block_number: BlockNumber, transaction_index: u64, log_index: u64) -> Self {
        Self {
            block_number,
            transaction_index,
            log_index,
        }
    }

    /// Smallest identity within `block`
    pub(crate) const fn first_in(block: BlockNumber) -> Self {
        Self::new(block, 0, 0)
    }

    /// Largest identity within `block`
    pub(crate) const fn last_in(block: BlockNumber) -> Self {
        Self::new(block, u64::MAX, u64::MAX)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.block_number, self.transaction_index, self.log_index
        )
    }
}

/// An event stored in the cache
///
/// The identity triple is the only part the cache understands. Any other
/// field is payload: stored as-is and replaced wholesale when an event with
/// the same identity is saved again.
///
/// Serialized flat, so a record looks like
/// `{"blockNumber":16,"transactionIndex":1,"logIndex":2,"data":"0x.."}`.
///
/// # Examples
///
/// ```
/// use semiocache::CachedEvent;
/// use serde_json::json;
///
/// let event = CachedEvent::new(16, 1, 2).with_field("amount", json!("1000"));
/// assert_eq!(event.block_number, 16);
/// assert_eq!(event.field("amount"), Some(&json!("1000")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEvent {
    pub block_number: BlockNumber,
    pub transaction_index: u64,
    pub log_index: u64,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl CachedEvent {
    /// Creates an event with an empty payload
    pub fn new(block_number: BlockNumber, transaction_index: u64, log_index: u64) -> Self {
        Self {
            block_number,
            transaction_index,
            log_index,
            payload: Map::new(),
        }
    }

    /// Creates an event carrying `payload`
    ///
    /// Payload entries named like the identity fields are dropped.
    pub fn with_payload(
        block_number: BlockNumber,
        transaction_index: u64,
        log_index: u64,
        mut payload: Map<String, Value>,
    ) -> Self {
        for field in IDENTITY_FIELDS {
            payload.remove(field);
        }
        Self {
            block_number,
            transaction_index,
            log_index,
            payload,
        }
    }

    /// Adds one payload field; identity field names are ignored
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if !IDENTITY_FIELDS.contains(&name.as_str()) {
            self.payload.insert(name, value);
        }
        self
    }

    /// Builds a record from a mined RPC log
    ///
    /// The whole log is kept as payload (address, topics, data, hashes...).
    ///
    /// # Errors
    ///
    /// Returns [`EventsCacheError::IncompleteLog`] when the log lacks a block
    /// number, transaction index or log index, as pending logs do.
    pub fn from_log(log: &Log) -> Result<Self, EventsCacheError> {
        let block_number = log.block_number.ok_or(EventsCacheError::IncompleteLog {
            field: "block number",
        })?;
        let transaction_index = log
            .transaction_index
            .ok_or(EventsCacheError::IncompleteLog {
                field: "transaction index",
            })?;
        let log_index = log.log_index.ok_or(EventsCacheError::IncompleteLog {
            field: "log index",
        })?;

        let payload = match serde_json::to_value(log)
            .map_err(|e| StoreError::serialization("Failed to encode log", e))?
        {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::corrupted(format!(
                    "log encoded as {other} instead of an object"
                ))
                .into())
            }
        };

        Ok(Self::with_payload(
            block_number,
            transaction_index,
            log_index,
            payload,
        ))
    }

    pub fn id(&self) -> EventId {
        EventId::new(self.block_number, self.transaction_index, self.log_index)
    }

    /// Payload field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}
