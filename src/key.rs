// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Event filters and the cache keys derived from them
//!
//! A cache key identifies one `(network, filter)` pair. Two filters share a
//! key exactly when they select the same logs on the same chain, so coverage
//! recorded for one filter is never reported for another.
//!
//! # Key format
//!
//! `{namespace}:{chain_id}:{address}:{topics}`
//!
//! - `namespace` is written with `%` and `:` percent-escaped, so the first `:`
//!   of a key always ends its namespace and one namespace's prefix never
//!   matches another namespace's keys
//! - `address` is the checksummed contract address, or `*` for any address
//! - `topics` joins the topic slots with `.`; a wildcard slot is an empty
//!   segment and alternatives inside one slot are sorted, deduplicated and
//!   joined with `|`
//! - a slot with a single alternative is written like a plain topic, and an
//!   empty alternative set like a wildcard
//! - trailing wildcard slots are dropped since they match every log anyway
//!
//! ```
//! use alloy_chains::NamedChain;
//! use alloy_primitives::{Address, B256};
//! use semiocache::{derive_key, EventFilter};
//!
//! let filter = EventFilter::at(Address::ZERO).topic(B256::ZERO).wildcard();
//! let key = derive_key("events-cache", NamedChain::Mainnet.into(), &filter);
//! assert!(key.as_str().starts_with("events-cache:1:0x0000"));
//! ```

use std::fmt;

use alloy_chains::Chain;
use alloy_primitives::{Address, B256};
use alloy_rpc_types::Filter;
use serde::{Deserialize, Serialize};

use crate::errors::EventsCacheError;

const SLOT_SEPARATOR: &str = ".";
const ALTERNATIVE_SEPARATOR: &str = "|";
const ANY_ADDRESS: &str = "*";

/// One topic position of an event filter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopicSlot {
    /// Matches any topic value
    Wildcard,
    /// Matches exactly this topic
    Single(B256),
    /// Matches any of these topics; order and duplicates are irrelevant
    AnyOf(Vec<B256>),
}

impl TopicSlot {
    /// An empty alternative set constrains nothing, like `Wildcard`
    fn is_wildcard(&self) -> bool {
        match self {
            TopicSlot::Wildcard => true,
            TopicSlot::Single(_) => false,
            TopicSlot::AnyOf(topics) => topics.is_empty(),
        }
    }

    fn write_segment(&self, out: &mut String) {
        match self {
            TopicSlot::Wildcard => {}
            TopicSlot::Single(topic) => out.push_str(&topic.to_string()),
            TopicSlot::AnyOf(topics) => {
                let mut topics = topics.clone();
                topics.sort_unstable();
                topics.dedup();
                let joined = topics
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(ALTERNATIVE_SEPARATOR);
                out.push_str(&joined);
            }
        }
    }
}

/// Filter describing which chain events a cache entry holds
///
/// Mirrors an `eth_getLogs` filter without its block range: the block range
/// is what the cache tracks per filter.
///
/// # Examples
///
/// ```
/// use alloy_primitives::{address, b256};
/// use semiocache::EventFilter;
///
/// let transfer = b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
/// let usdc = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
///
/// // Transfers of USDC to any recipient from anyone
/// let filter = EventFilter::at(usdc).topic(transfer);
/// assert_eq!(filter.topics.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventFilter {
    /// Emitting contract, `None` for any contract
    pub address: Option<Address>,
    /// Topic slots in position order
    pub topics: Vec<TopicSlot>,
}

impl EventFilter {
    /// Filter matching every log on the chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on logs emitted by `address`
    pub fn at(address: Address) -> Self {
        Self::new().with_address(address)
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Appends a slot matching exactly `topic`
    pub fn topic(mut self, topic: B256) -> Self {
        self.topics.push(TopicSlot::Single(topic));
        self
    }

    /// Appends a slot matching any of `topics`
    pub fn any_of(mut self, topics: impl IntoIterator<Item = B256>) -> Self {
        self.topics.push(TopicSlot::AnyOf(topics.into_iter().collect()));
        self
    }

    /// Appends a slot matching any value
    pub fn wildcard(mut self) -> Self {
        self.topics.push(TopicSlot::Wildcard);
        self
    }

    /// Converts an `eth_getLogs` filter, ignoring its block range
    ///
    /// Alternative sets are sorted since the RPC filter does not keep their
    /// order. An empty topic set becomes a wildcard.
    ///
    /// # Errors
    ///
    /// Returns [`EventsCacheError::UnsupportedFilter`] when the filter names
    /// more than one address.
    pub fn from_rpc_filter(filter: &Filter) -> Result<Self, EventsCacheError> {
        let mut addresses = filter.address.iter();
        let address = addresses.next().copied();
        if addresses.next().is_some() {
            return Err(EventsCacheError::unsupported_filter(format!(
                "filter matches {} addresses, only one is cacheable",
                filter.address.len()
            )));
        }

        let topics = filter
            .topics
            .iter()
            .map(|set| {
                let mut values: Vec<B256> = set.iter().copied().collect();
                values.sort_unstable();
                match values.len() {
                    0 => TopicSlot::Wildcard,
                    1 => TopicSlot::Single(values[0]),
                    _ => TopicSlot::AnyOf(values),
                }
            })
            .collect();

        Ok(Self { address, topics })
    }

    /// Topic slots without trailing wildcards
    fn significant_topics(&self) -> &[TopicSlot] {
        let end = self
            .topics
            .iter()
            .rposition(|slot| !slot.is_wildcard())
            .map_or(0, |last| last + 1);
        &self.topics[..end]
    }
}

/// Opaque, deterministic identifier of a `(network, filter)` pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key belongs under `prefix` (see [`namespace_prefix`])
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the cache key of `filter` on `chain`
pub fn derive_key(namespace: &str, chain: Chain, filter: &EventFilter) -> CacheKey {
    let mut key = namespace_prefix(namespace, Some(chain));

    match filter.address {
        Some(address) => key.push_str(&address.to_string()),
        None => key.push_str(ANY_ADDRESS),
    }
    key.push(':');

    for (position, slot) in filter.significant_topics().iter().enumerate() {
        if position > 0 {
            key.push_str(SLOT_SEPARATOR);
        }
        slot.write_segment(&mut key);
    }

    CacheKey(key)
}

/// Prefix shared by every key of `namespace`, optionally narrowed to one chain
///
/// Chain ids are numeric and followed by `:`, so the prefix for chain `1`
/// never matches keys of chain `10`.
pub fn namespace_prefix(namespace: &str, chain: Option<Chain>) -> String {
    let namespace = escape_namespace(namespace);
    match chain {
        Some(chain) => format!("{namespace}:{}:", chain.id()),
        None => format!("{namespace}:"),
    }
}

fn escape_namespace(namespace: &str) -> String {
    namespace.replace('%', "%25").replace(':', "%3A")
}
