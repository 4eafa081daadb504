// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # rfc2136-provider - DNS record provider over AXFR and RFC 2136
//!
//! Reads and writes the records of one zone on any authoritative name server
//! that supports zone transfer and dynamic update (BIND9, Knot, PowerDNS),
//! optionally authenticated with TSIG.
//!
//! ## Overview
//!
//! A host hands the provider a zone and a batch of generic [`record::Record`]s.
//! The provider converts each record into wire-form RRs, builds one update
//! message for the whole batch, signs it and sends it over TCP. Reads use a
//! full zone transfer and convert every RR back.
//!
//! ## Modules
//!
//! - [`record`] - Generic record type exchanged with hosts
//! - [`layout`] - Which structured fields each record type exposes
//! - [`codec`] - Zone-file text form of RRs, including RFC 3597
//! - [`svcb`] - SVCB/HTTPS parameter presentation format
//! - [`convert`] - Record ↔ RR conversion
//! - [`message`] - Update message construction
//! - [`tsig`] - TSIG keys, request signing and response verification
//! - [`transport`] - hickory client exchange and AXFR streaming
//! - [`provider`] - Zone sync driver (get/set/append/delete)
//! - [`contract`] - Traits hosts program against
//! - [`dns_errors`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use rfc2136_provider::contract::RecordAppender;
//! use rfc2136_provider::provider::Provider;
//! use rfc2136_provider::record::Record;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), rfc2136_provider::dns_errors::ProviderError> {
//! let provider = Provider::new("ns1.example.com:53")
//!     .with_key("acme-key", "hmac-sha256", "c2VjcmV0LXNlY3JldC1zZWNyZXQ=");
//!
//! let challenge = Record::new(
//!     "_acme-challenge",
//!     "TXT",
//!     Duration::from_secs(60),
//!     "token-value",
//! );
//! provider.append_records("example.com.", &[challenge]).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod constants;
pub mod contract;
pub mod convert;
pub mod dns_errors;
pub mod layout;
pub mod message;
pub mod provider;
pub mod record;
pub mod svcb;
pub mod transport;
pub mod tsig;
