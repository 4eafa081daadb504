// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the RFC 2136 record provider.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port for updates and zone transfers
pub const DNS_PORT: u16 = 53;

/// Maximum length of a single TXT character-string on the wire
pub const TXT_SEGMENT_MAX_LEN: usize = 255;

/// EDNS(0) option code for Extended DNS Errors (RFC 8914)
pub const EDNS_OPTION_EDE: u16 = 15;

/// EDNS(0) UDP payload size advertised in update requests
pub const EDNS_MAX_PAYLOAD: u16 = 1232;

/// Marker that introduces RFC 3597 generic RDATA in zone-file text
pub const RFC3597_MARKER: &str = "\\#";

/// Owner name that denotes the zone apex in zone-file text
pub const APEX_MARKER: &str = "@";

/// Longest run of characters accepted as one zone-file token, including the
/// whitespace before it. hickory's lexer gives up on a token near 4095.
pub const MAX_TOKEN_CHARS: usize = 2000;

// ============================================================================
// TSIG Constants
// ============================================================================

/// TSIG fudge window in seconds (RFC 2845 recommends 300)
pub const TSIG_FUDGE_TIME_SECS: u16 = 300;

/// Default TSIG algorithm when none is configured
pub const DEFAULT_TSIG_ALGORITHM: &str = "hmac-sha256";

// ============================================================================
// Transport Constants
// ============================================================================

/// Default deadline for connecting and for each request, a whole zone
/// transfer included (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Environment Variables
// ============================================================================

/// TSIG key name
pub const ENV_KEY_NAME: &str = "RFC2136_KEYNAME";

/// TSIG algorithm identifier (e.g. "hmac-sha256")
pub const ENV_KEY_ALG: &str = "RFC2136_KEYALG";

/// TSIG secret, base64 or hex
pub const ENV_KEY: &str = "RFC2136_KEY";

/// Name server address (host:port)
pub const ENV_SERVER: &str = "RFC2136_SERVER";

/// Transport deadline in seconds
pub const ENV_TIMEOUT: &str = "RFC2136_TIMEOUT";
