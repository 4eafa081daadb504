// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Protocol-agnostic record model exchanged with callers.
//!
//! A [`Record`] carries the owner name relative to its zone, the type
//! mnemonic, a TTL and the zone-file text of its RDATA. `priority`, `weight`
//! and `target` are a convenience view over `value` for types that have those
//! fields; they never hold data that `value` does not.
//!
//! # Example
//!
//! ```rust
//! use rfc2136_provider::record::Record;
//! use std::time::Duration;
//!
//! let mx = Record::new("mx", "MX", Duration::from_secs(150), "10 mail.example.com.")
//!     .with_priority(10);
//! assert_eq!(mx.ttl_secs(), 150);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One DNS record as seen by a record provider host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Record {
    /// Owner name relative to the zone; empty or "@" for the apex
    #[serde(default)]
    pub name: String,

    /// Type mnemonic ("A", "MX", "TYPE65534", ...)
    #[serde(rename = "type", default)]
    pub rtype: String,

    /// Time to live, whole seconds
    #[serde(with = "ttl_secs", default)]
    pub ttl: Duration,

    /// RDATA in zone-file text form (TXT: unquoted concatenated text)
    #[serde(default)]
    pub value: String,

    /// MX preference, SRV priority or SVCB priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,

    /// SRV weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,

    /// Trailing target name for types that expose it separately
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        rtype: impl Into<String>,
        ttl: Duration,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rtype: rtype.into(),
            ttl,
            value: value.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_weight(mut self, weight: u16) -> Self {
        self.weight = Some(weight);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// TTL truncated to whole seconds and clamped to the 32-bit wire field.
    #[must_use]
    pub fn ttl_secs(&self) -> u32 {
        u32::try_from(self.ttl.as_secs()).unwrap_or(u32::MAX)
    }

    /// True when none of the structured field accessors are set.
    #[must_use]
    pub fn has_no_fields(&self) -> bool {
        self.priority.is_none() && self.weight.is_none() && self.target.is_none()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            "@"
        } else {
            &self.name
        };
        write!(
            f,
            "{name} {} {} {}",
            self.ttl.as_secs(),
            self.rtype,
            self.value
        )
    }
}

mod ttl_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
