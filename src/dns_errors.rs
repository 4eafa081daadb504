// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for record conversion, transport and name server responses.
//!
//! This module provides specialized error types for:
//! - Converting records to and from zone-file text (`ConversionError`)
//! - TCP connectivity, timeouts and framing (`TransportError`)
//! - Non-success response codes from the name server (`ProtocolError`)
//! - TSIG key material problems (`TsigError`)
//!
//! [`ProviderError`] is the composite returned by every provider operation.

use thiserror::Error;

/// A record could not be converted to or from its resource record form.
///
/// Conversion errors are raised before any message is built, so they never
/// have network side effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid record '{name}': {reason}")]
pub struct ConversionError {
    /// Name of the offending record, as supplied by the caller
    pub name: String,
    /// Explanation of what is invalid
    pub reason: String,
}

impl ConversionError {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors talking to the name server below the DNS protocol level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The configured server address is not a usable `host:port`
    #[error("Invalid server address '{server}': {reason}")]
    InvalidServer {
        /// The configured address
        server: String,
        /// Why it could not be used
        reason: String,
    },

    /// TCP connection could not be established
    #[error("Failed to connect to {server}: {reason}")]
    ConnectFailed {
        /// The server (host:port) that could not be reached
        server: String,
        /// Reason for the connection failure
        reason: String,
    },

    /// Connecting or waiting for a response exceeded the configured deadline
    #[error("Timed out after {timeout_secs}s while {stage} {server}")]
    Timeout {
        /// The server involved
        server: String,
        /// What was being done ("connecting to", "waiting for a response from")
        stage: &'static str,
        /// Deadline in seconds
        timeout_secs: u64,
    },

    /// Read or write failed on an established connection
    #[error("I/O error while {stage} {server}: {reason}")]
    Io {
        /// The server involved
        server: String,
        /// What was being done
        stage: &'static str,
        /// Underlying I/O error text
        reason: String,
    },

    /// The server closed the stream before a complete response arrived
    #[error("Connection to {server} closed before the response was complete")]
    UnexpectedEof {
        /// The server involved
        server: String,
    },

    /// A message could not be encoded or a response could not be decoded
    #[error("Malformed DNS message exchanged with {server}: {reason}")]
    Malformed {
        /// The server involved
        server: String,
        /// Codec error text
        reason: String,
    },

    /// The request could not be signed
    #[error("Failed to sign request for {server}: {reason}")]
    SigningFailed {
        /// The server the request was meant for
        server: String,
        /// Signer error text
        reason: String,
    },

    /// The TSIG on a response did not verify
    #[error("TSIG verification of response from {server} failed: {reason}")]
    VerificationFailed {
        /// The server whose response failed verification
        server: String,
        /// Verifier error text
        reason: String,
    },
}

/// Extended DNS error (RFC 8914) attached to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedError {
    /// INFO-CODE
    pub info_code: u16,
    /// EXTRA-TEXT, possibly empty
    pub extra_text: String,
}

/// The name server answered with a non-success response code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "dns response error code \"{rcode_name}\" ({rcode}){}",
    extended_suffix(.extended)
)]
pub struct ProtocolError {
    /// Numeric response code
    pub rcode: u16,
    /// Mnemonic, e.g. "REFUSED"
    pub rcode_name: &'static str,
    /// Extended DNS errors carried in the response, in message order
    pub extended: Vec<ExtendedError>,
}

impl ProtocolError {
    pub fn new(rcode: u16) -> Self {
        Self {
            rcode,
            rcode_name: rcode_name(rcode),
            extended: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extended(mut self, info_code: u16, extra_text: impl Into<String>) -> Self {
        self.extended.push(ExtendedError {
            info_code,
            extra_text: extra_text.into(),
        });
        self
    }
}

fn extended_suffix(extended: &[ExtendedError]) -> String {
    extended
        .iter()
        .map(|ede| {
            format!(
                ": {} ({}): {}",
                ede_name(ede.info_code),
                ede.info_code,
                ede.extra_text
            )
        })
        .collect()
}

/// Errors related to the TSIG key configured for the provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TsigError {
    /// Algorithm identifier not recognized
    #[error("Unsupported TSIG algorithm '{algorithm}'. Supported algorithms: hmac-md5, hmac-sha1, hmac-sha224, hmac-sha256, hmac-sha384, hmac-sha512")]
    UnsupportedAlgorithm {
        /// The configured identifier
        algorithm: String,
    },

    /// Key name is not a valid domain name
    #[error("Invalid TSIG key name '{key_name}': {reason}")]
    InvalidKeyName {
        /// The configured key name
        key_name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Secret is not valid base64 or was rejected by the signer
    #[error("Invalid TSIG secret for key '{key_name}': {reason}")]
    InvalidSecret {
        /// The key the secret belongs to
        key_name: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Composite error returned by every provider operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// A caller-supplied record or zone is invalid
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Dial, write, read or timeout failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Name server rejected the request
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// TSIG key configuration is unusable
    #[error(transparent)]
    Tsig(#[from] TsigError),
}

impl ProviderError {
    /// Returns true if retrying the same call could succeed.
    ///
    /// Only transport failures qualify. Conversion and key errors are local and
    /// deterministic; protocol errors reflect server policy.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(
                TransportError::ConnectFailed { .. }
                | TransportError::Timeout { .. }
                | TransportError::Io { .. }
                | TransportError::UnexpectedEof { .. },
            ) => true,

            Self::Transport(
                TransportError::InvalidServer { .. }
                | TransportError::Malformed { .. }
                | TransportError::SigningFailed { .. }
                | TransportError::VerificationFailed { .. },
            )
            | Self::Conversion(_)
            | Self::Protocol(_)
            | Self::Tsig(_) => false,
        }
    }

    /// Short machine-readable reason code for this error.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Conversion(_) => "InvalidRecord",

            Self::Transport(TransportError::InvalidServer { .. }) => "InvalidServer",
            Self::Transport(TransportError::ConnectFailed { .. }) => "ConnectFailed",
            Self::Transport(TransportError::Timeout { .. }) => "Timeout",
            Self::Transport(TransportError::Io { .. }) => "IoError",
            Self::Transport(TransportError::UnexpectedEof { .. }) => "UnexpectedEof",
            Self::Transport(TransportError::Malformed { .. }) => "MalformedMessage",
            Self::Transport(TransportError::SigningFailed { .. }) => "SigningFailed",
            Self::Transport(TransportError::VerificationFailed { .. }) => "TsigVerificationFailed",

            Self::Protocol(_) => "ServerRejected",

            Self::Tsig(TsigError::UnsupportedAlgorithm { .. }) => "UnsupportedTsigAlgorithm",
            Self::Tsig(TsigError::InvalidKeyName { .. }) => "InvalidTsigKeyName",
            Self::Tsig(TsigError::InvalidSecret { .. }) => "InvalidTsigSecret",
        }
    }
}

/// Mnemonic for a DNS response code (RFC 1035, 2136, 2845, 6891, 7873).
#[must_use]
pub fn rcode_name(rcode: u16) -> &'static str {
    match rcode {
        0 => "NOERROR",
        1 => "FORMERR",
        2 => "SERVFAIL",
        3 => "NXDOMAIN",
        4 => "NOTIMP",
        5 => "REFUSED",
        6 => "YXDOMAIN",
        7 => "YXRRSET",
        8 => "NXRRSET",
        9 => "NOTAUTH",
        10 => "NOTZONE",
        11 => "DSOTYPENI",
        16 => "BADSIG",
        17 => "BADKEY",
        18 => "BADTIME",
        19 => "BADMODE",
        20 => "BADNAME",
        21 => "BADALG",
        22 => "BADTRUNC",
        23 => "BADCOOKIE",
        _ => "UNKNOWN",
    }
}

/// Human-readable name for an extended DNS error INFO-CODE (RFC 8914).
#[must_use]
pub fn ede_name(info_code: u16) -> &'static str {
    match info_code {
        0 => "Other Error",
        1 => "Unsupported DNSKEY Algorithm",
        2 => "Unsupported DS Digest Type",
        3 => "Stale Answer",
        4 => "Forged Answer",
        5 => "DNSSEC Indeterminate",
        6 => "DNSSEC Bogus",
        7 => "Signature Expired",
        8 => "Signature Not Yet Valid",
        9 => "DNSKEY Missing",
        10 => "RRSIGs Missing",
        11 => "No Zone Key Bit Set",
        12 => "NSEC Missing",
        13 => "Cached Error",
        14 => "Not Ready",
        15 => "Blocked",
        16 => "Censored",
        17 => "Filtered",
        18 => "Prohibited",
        19 => "Stale NXDOMAIN Answer",
        20 => "Not Authoritative",
        21 => "Not Supported",
        22 => "No Reachable Authority",
        23 => "Network Error",
        24 => "Invalid Data",
        25 => "Signature Expired before Valid",
        26 => "Too Early",
        27 => "Unsupported NSEC3 Iterations Value",
        28 => "Unable to conform to policy",
        29 => "Synthesized",
        30 => "Invalid Query Type",
        _ => "Unknown",
    }
}

#[cfg(test)]
#[path = "dns_errors_tests.rs"]
mod dns_errors_tests;
