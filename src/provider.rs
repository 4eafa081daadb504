// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! RFC 2136 record provider.
//!
//! [`Provider`] is plain configuration: key name, algorithm, secret and server
//! address. It holds no connection or other mutable state, so one value can
//! serve concurrent callers. Every operation is one shot:
//!
//! - `get_records`: AXFR the zone and convert every record
//! - `set_records`: remove the affected record sets, then insert
//! - `append_records`: insert only
//! - `delete_records`: remove names, record sets or exact records
//!
//! Writes convert every record before anything is sent; one bad record fails
//! the whole call with no network traffic.
//!
//! # Example
//!
//! ```rust,no_run
//! use rfc2136_provider::provider::Provider;
//! use rfc2136_provider::record::Record;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), rfc2136_provider::dns_errors::ProviderError> {
//! let provider = Provider::new("10.0.0.1:53")
//!     .with_key("update-key", "hmac-sha256", "c2VjcmV0LXNlY3JldC1zZWNyZXQ=");
//!
//! let www = Record::new("www", "A", Duration::from_secs(300), "192.0.2.1");
//! provider.set_records("example.com", &[www]).await?;
//!
//! for record in provider.get_records("example.com").await? {
//!     println!("{record}");
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use hickory_proto::op::Message;
use hickory_proto::rr::dnssec::tsig::TSigner;
use hickory_proto::rr::Name;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec::{self, StructuredRr};
use crate::constants::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_TSIG_ALGORITHM, ENV_KEY, ENV_KEY_ALG, ENV_KEY_NAME, ENV_SERVER,
    ENV_TIMEOUT,
};
use crate::contract::{RecordAppender, RecordDeleter, RecordGetter, RecordSetter};
use crate::convert::{fqdn, Converter, Deletion};
use crate::dns_errors::{ConversionError, ProviderError};
use crate::layout::FieldLayouts;
use crate::message;
use crate::record::Record;
use crate::transport::Transport;
use crate::tsig::create_tsig_signer;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Provider configuration for one authoritative name server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// TSIG key name; empty disables signing
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_name: String,

    /// TSIG algorithm identifier, e.g. "hmac-sha256"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_alg: String,

    /// TSIG secret, base64 or hex
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,

    /// Name server address, `host:port`
    #[serde(default)]
    pub server: String,

    /// Deadline for connect, each write and each read
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(skip)]
    converter: Converter,
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            key_name: String::new(),
            key_alg: String::new(),
            key: String::new(),
            server: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            converter: Converter::default(),
        }
    }
}

impl Provider {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    /// Load configuration from `RFC2136_*` environment variables.
    ///
    /// Unset variables leave the field empty; an unparsable timeout falls back
    /// to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).unwrap_or_default();
        let timeout_secs = match std::env::var(ENV_TIMEOUT) {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(
                    "Ignoring invalid {} value '{}', using {}s",
                    ENV_TIMEOUT, raw, DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            }),
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            key_name: var(ENV_KEY_NAME),
            key_alg: var(ENV_KEY_ALG),
            key: var(ENV_KEY),
            server: var(ENV_SERVER),
            timeout_secs,
            converter: Converter::default(),
        }
    }

    #[must_use]
    pub fn with_key(
        mut self,
        key_name: impl Into<String>,
        key_alg: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.key_name = key_name.into();
        self.key_alg = key_alg.into();
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Replace the field layout table used for conversion.
    #[must_use]
    pub fn with_layouts(mut self, layouts: FieldLayouts) -> Self {
        self.converter = Converter::new(layouts);
        self
    }

    #[must_use]
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// TSIG signer for this configuration, or `None` when no key is set.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Tsig`] for unusable key material.
    pub fn signer(&self) -> Result<Option<TSigner>, ProviderError> {
        if self.key_name.trim().is_empty() {
            return Ok(None);
        }
        let algorithm = if self.key_alg.trim().is_empty() {
            DEFAULT_TSIG_ALGORITHM
        } else {
            &self.key_alg
        };
        Ok(Some(create_tsig_signer(&self.key_name, algorithm, &self.key)?))
    }

    fn transport(&self) -> Result<Transport, ProviderError> {
        Ok(Transport::new(&self.server, self.timeout())?)
    }

    fn convert_all(&self, records: &[Record], zone: &str) -> Result<Vec<StructuredRr>, ProviderError> {
        records
            .iter()
            .map(|record| self.converter.to_rr(record, zone))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                warn!("Rejecting batch for zone {}: {}", zone, e);
                e.into()
            })
    }

    async fn send(&self, message: Message) -> Result<(), ProviderError> {
        let signer = self.signer()?;
        let transport = self.transport()?;
        debug!(
            "Sending update with {} directive(s) to {}",
            message.name_servers().len(),
            transport.server()
        );
        transport.exchange(message, signer).await
    }

    /// Read every record in `zone` by full zone transfer.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails at any point; records received
    /// before the failure are discarded.
    pub async fn get_records(&self, zone: &str) -> Result<Vec<Record>, ProviderError> {
        let zone = fqdn(zone);
        let zone_name = zone_name(&zone)?;
        let signer = self.signer()?;
        let transport = self.transport()?;

        let envelopes = transport.transfer(&zone_name, signer);
        futures::pin_mut!(envelopes);

        let mut records = Vec::new();
        while let Some(envelope) = envelopes.try_next().await? {
            records.extend(envelope.into_iter().map(|record| {
                self.converter
                    .from_rr(&StructuredRr::from_record(record), &zone)
            }));
        }

        info!(
            "Transferred {} record(s) from zone {} on {}",
            records.len(),
            zone,
            transport.server()
        );
        Ok(records)
    }

    /// Make `records` the complete content of their name+type record sets.
    ///
    /// # Errors
    ///
    /// Returns an error if any record is invalid (nothing is sent) or the
    /// server rejects the update.
    pub async fn set_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>, ProviderError> {
        let zone = fqdn(zone);
        let rrs = self.convert_all(records, &zone)?;
        let update = message::replace_set(&zone_name(&zone)?, &rrs);

        self.send(update).await?;
        info!("Set {} record(s) in zone {}", records.len(), zone);
        Ok(records.to_vec())
    }

    /// Add `records` to `zone`, keeping everything already there.
    ///
    /// # Errors
    ///
    /// Returns an error if any record is invalid (nothing is sent) or the
    /// server rejects the update.
    pub async fn append_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>, ProviderError> {
        let zone = fqdn(zone);
        let rrs = self.convert_all(records, &zone)?;
        let update = message::insert_only(&zone_name(&zone)?, &rrs);

        self.send(update).await?;
        info!("Appended {} record(s) to zone {}", records.len(), zone);
        Ok(records.to_vec())
    }

    /// Remove `records` from `zone`.
    ///
    /// A record with no type removes everything at its name; one with a type
    /// but no value removes that record set; otherwise the exact record goes.
    ///
    /// # Errors
    ///
    /// Returns an error if any record is invalid (nothing is sent) or the
    /// server rejects the update.
    pub async fn delete_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>, ProviderError> {
        let zone = fqdn(zone);
        let deletions = records
            .iter()
            .map(|record| self.converter.to_deletion(record, &zone))
            .collect::<Result<Vec<Deletion>, _>>()
            .map_err(|e| {
                warn!("Rejecting delete batch for zone {}: {}", zone, e);
                ProviderError::from(e)
            })?;
        let update = message::remove_only(&zone_name(&zone)?, &deletions);

        self.send(update).await?;
        info!("Deleted {} record(s) from zone {}", records.len(), zone);
        Ok(records.to_vec())
    }
}

fn zone_name(zone: &str) -> Result<Name, ProviderError> {
    codec::absolute_name(zone, ".")
        .map_err(|reason| ConversionError::new(zone, format!("invalid zone: {reason}")).into())
}

#[async_trait]
impl RecordGetter for Provider {
    async fn get_records(&self, zone: &str) -> Result<Vec<Record>, ProviderError> {
        Provider::get_records(self, zone).await
    }
}

#[async_trait]
impl RecordAppender for Provider {
    async fn append_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>, ProviderError> {
        Provider::append_records(self, zone, records).await
    }
}

#[async_trait]
impl RecordSetter for Provider {
    async fn set_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>, ProviderError> {
        Provider::set_records(self, zone, records).await
    }
}

#[async_trait]
impl RecordDeleter for Provider {
    async fn delete_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>, ProviderError> {
        Provider::delete_records(self, zone, records).await
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
