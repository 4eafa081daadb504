// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TSIG key material, signer construction and the message finalizer that
//! signs requests and verifies response envelopes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use data_encoding::HEXLOWER_PERMISSIVE;
use hickory_proto::error::ProtoResult;
use hickory_proto::op::{Message, MessageFinalizer, MessageVerifier, ResponseCode};
use hickory_proto::rr::dnssec::rdata::tsig::TsigAlgorithm;
use hickory_proto::rr::dnssec::tsig::TSigner;
use hickory_proto::rr::{Name, Record};
use hickory_proto::xfer::DnsResponse;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::TSIG_FUDGE_TIME_SECS;
use crate::convert::fqdn;
use crate::dns_errors::TsigError;

/// HMAC algorithms accepted for TSIG keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    HmacMd5,
    HmacSha1,
    HmacSha224,
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl KeyAlgorithm {
    /// Parse an algorithm identifier as written in BIND key files.
    ///
    /// Case and a trailing dot are ignored, and the legacy
    /// `hmac-md5.sig-alg.reg.int` name is accepted for MD5.
    ///
    /// # Errors
    ///
    /// Returns [`TsigError::UnsupportedAlgorithm`] for anything else.
    pub fn parse(identifier: &str) -> Result<Self, TsigError> {
        let normalized = identifier.trim().trim_end_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "hmac-md5" | "hmac-md5.sig-alg.reg.int" => Ok(Self::HmacMd5),
            "hmac-sha1" => Ok(Self::HmacSha1),
            "hmac-sha224" => Ok(Self::HmacSha224),
            "hmac-sha256" => Ok(Self::HmacSha256),
            "hmac-sha384" => Ok(Self::HmacSha384),
            "hmac-sha512" => Ok(Self::HmacSha512),
            _ => Err(TsigError::UnsupportedAlgorithm {
                algorithm: identifier.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HmacMd5 => "hmac-md5",
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha224 => "hmac-sha224",
            Self::HmacSha256 => "hmac-sha256",
            Self::HmacSha384 => "hmac-sha384",
            Self::HmacSha512 => "hmac-sha512",
        }
    }

    fn to_hickory(self) -> TsigAlgorithm {
        match self {
            Self::HmacMd5 => TsigAlgorithm::HmacMd5,
            Self::HmacSha1 => TsigAlgorithm::HmacSha1,
            Self::HmacSha224 => TsigAlgorithm::HmacSha224,
            Self::HmacSha256 => TsigAlgorithm::HmacSha256,
            Self::HmacSha384 => TsigAlgorithm::HmacSha384,
            Self::HmacSha512 => TsigAlgorithm::HmacSha512,
        }
    }
}

/// Decode a TSIG secret written as base64 (as in BIND key files) or hex.
///
/// A secret made only of an even number of hex digits is read as hex. Any
/// other secret must be standard base64.
///
/// # Errors
///
/// Returns [`TsigError::InvalidSecret`] if the secret is neither.
pub fn decode_secret(key_name: &str, secret: &str) -> Result<Vec<u8>, TsigError> {
    let secret = secret.trim();
    let invalid = |reason: String| TsigError::InvalidSecret {
        key_name: key_name.to_string(),
        reason,
    };

    if !secret.is_empty() && secret.len() % 2 == 0 && secret.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return HEXLOWER_PERMISSIVE
            .decode(secret.as_bytes())
            .map_err(|e| invalid(format!("not valid hex: {e}")));
    }
    BASE64
        .decode(secret)
        .map_err(|e| invalid(format!("not valid base64 or hex: {e}")))
}

/// Create a TSIG signer from key name, algorithm identifier and secret.
///
/// The signer uses a fudge window of [`TSIG_FUDGE_TIME_SECS`].
///
/// # Errors
///
/// Returns an error if the algorithm is unsupported, the key name is not a
/// domain name, or the secret is neither base64 nor hex.
pub fn create_tsig_signer(
    key_name: &str,
    algorithm: &str,
    secret: &str,
) -> Result<TSigner, TsigError> {
    let algorithm = KeyAlgorithm::parse(algorithm)?;

    let signer_name =
        Name::from_ascii(fqdn(key_name)).map_err(|e| TsigError::InvalidKeyName {
            key_name: key_name.to_string(),
            reason: e.to_string(),
        })?;

    let key_bytes = decode_secret(key_name, secret)?;

    TSigner::new(
        key_bytes,
        algorithm.to_hickory(),
        signer_name,
        TSIG_FUDGE_TIME_SECS,
    )
    .map_err(|e| TsigError::InvalidSecret {
        key_name: key_name.to_string(),
        reason: e.to_string(),
    })
}

/// Signs requests with a [`TSigner`] and verifies every response envelope.
///
/// Verification chains the MAC across the envelopes of a zone transfer. A
/// response carrying an error rcode and no TSIG record is passed through
/// unverified: servers answer BADKEY, BADSIG and REFUSED unsigned, and such a
/// response can only ever surface as an error.
#[derive(Clone)]
pub struct TsigFinalizer {
    signer: TSigner,
}

impl TsigFinalizer {
    #[must_use]
    pub fn new(signer: TSigner) -> Self {
        Self { signer }
    }

    #[must_use]
    pub fn signer(&self) -> &TSigner {
        &self.signer
    }
}

impl MessageFinalizer for TsigFinalizer {
    fn finalize_message(
        &self,
        message: &Message,
        current_time: u32,
    ) -> ProtoResult<(Vec<Record>, Option<MessageVerifier>)> {
        let (records, verifier) = self.signer.finalize_message(message, current_time)?;
        let Some(mut verifier) = verifier else {
            return Ok((records, None));
        };

        let checked = move |bytes: &[u8]| {
            let response = Message::from_vec(bytes)?;
            if response.response_code() != ResponseCode::NoError && response.signature().is_empty()
            {
                debug!(
                    "Unsigned {} response accepted without TSIG verification",
                    response.response_code()
                );
                return Ok(DnsResponse::new(response, bytes.to_vec()));
            }
            verifier(bytes)
        };
        Ok((records, Some(Box::new(checked))))
    }
}

#[cfg(test)]
#[path = "tsig_tests.rs"]
mod tsig_tests;
