// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record provider contract consumed by hosts.
//!
//! Hosts such as certificate managers and DNS automation tools program against
//! these traits rather than a concrete provider. Zones may be given with or
//! without the trailing dot. Each write returns the records it applied.

use async_trait::async_trait;

use crate::dns_errors::ProviderError;
use crate::record::Record;

/// List every record in a zone.
#[async_trait]
pub trait RecordGetter {
    /// # Errors
    ///
    /// Returns an error if the zone cannot be read.
    async fn get_records(&self, zone: &str) -> Result<Vec<Record>, ProviderError>;
}

/// Add records without touching existing ones.
#[async_trait]
pub trait RecordAppender {
    /// # Errors
    ///
    /// Returns an error if any record is invalid or the server rejects the update.
    async fn append_records(
        &self,
        zone: &str,
        records: &[Record],
    ) -> Result<Vec<Record>, ProviderError>;
}

/// Make the given records the complete content of their name+type sets.
#[async_trait]
pub trait RecordSetter {
    /// # Errors
    ///
    /// Returns an error if any record is invalid or the server rejects the update.
    async fn set_records(&self, zone: &str, records: &[Record])
        -> Result<Vec<Record>, ProviderError>;
}

/// Remove records, record sets or whole names.
#[async_trait]
pub trait RecordDeleter {
    /// # Errors
    ///
    /// Returns an error if any record is invalid or the server rejects the update.
    async fn delete_records(
        &self,
        zone: &str,
        records: &[Record],
    ) -> Result<Vec<Record>, ProviderError>;
}
