// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone-file text codec for single resource records.
//!
//! Turns one line of the form `<name> <ttl> <class> <type> <rdata>` into a
//! hickory [`Record`] and back. Lines go through hickory's zone-file
//! [`Parser`], except for two RDATA forms it cannot read: the RFC 3597
//! generic form `\# <len> <hex>` for types hickory has no RDATA model for,
//! and SVCB/HTTPS parameters, which [`crate::svcb`] handles.
//!
//! Serialization mirrors parsing: a record parsed from the text this module
//! prints comes back identical.

use std::fmt;
use std::str::FromStr;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use hickory_proto::rr::rdata::{HTTPS, NULL};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::BinEncodable;
use hickory_proto::serialize::txt::Parser;

use crate::constants::{APEX_MARKER, MAX_TOKEN_CHARS, RFC3597_MARKER};
use crate::svcb;

/// Quote one character-string for zone-file output.
///
/// Only `"` and `\` are escaped. Control characters stay raw: hickory's
/// lexer accepts them inside quotes but decodes most `\DDD` escapes wrongly.
#[must_use]
pub fn quote_text(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 2);
    out.push('"');
    for c in segment.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A resource record as produced by the codec.
///
/// Records whose RDATA hickory does not model are kept apart because their
/// text form uses the RFC 3597 header shape (`CLASS<n> TYPE<n>`).
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredRr {
    /// Type with native RDATA support
    Normal(Record),
    /// Type carried as opaque RFC 3597 RDATA
    UnknownType(Record),
}

impl StructuredRr {
    /// Wrap a record received from the wire, choosing the variant from its RDATA.
    #[must_use]
    pub fn from_record(record: Record) -> Self {
        if matches!(record.data(), Some(RData::Unknown { .. })) {
            Self::UnknownType(record)
        } else {
            Self::Normal(record)
        }
    }

    #[must_use]
    pub fn record(&self) -> &Record {
        match self {
            Self::Normal(r) | Self::UnknownType(r) => r,
        }
    }

    #[must_use]
    pub fn into_record(self) -> Record {
        match self {
            Self::Normal(r) | Self::UnknownType(r) => r,
        }
    }

    /// Type mnemonic; `TYPE<n>` for opaque types.
    #[must_use]
    pub fn mnemonic(&self) -> String {
        match self {
            Self::Normal(r) => r.record_type().to_string(),
            Self::UnknownType(r) => format!("TYPE{}", u16::from(r.record_type())),
        }
    }

    /// Header prefix exactly as [`StructuredRr::to_text`] prints it.
    #[must_use]
    pub fn header(&self) -> String {
        let record = self.record();
        match self {
            Self::Normal(_) => format!(
                "{}\t{}\t{}\t{}\t",
                record.name(),
                record.ttl(),
                record.dns_class(),
                self.mnemonic()
            ),
            Self::UnknownType(_) => format!(
                "{}\t{}\tCLASS{}\t{}\t",
                record.name(),
                record.ttl(),
                u16::from(record.dns_class()),
                self.mnemonic()
            ),
        }
    }

    /// RDATA in zone-file text form.
    #[must_use]
    pub fn rdata_text(&self) -> String {
        match self.record().data() {
            None => String::new(),
            Some(RData::TXT(txt)) => txt
                .txt_data()
                .iter()
                .map(|segment| quote_text(&String::from_utf8_lossy(segment)))
                .collect::<Vec<_>>()
                .join(" "),
            Some(RData::SVCB(rdata)) => svcb::svcb_text(rdata),
            Some(RData::HTTPS(rdata)) => svcb::svcb_text(&rdata.0),
            Some(RData::Unknown { rdata, .. }) => generic_rdata_text(rdata),
            Some(rdata) => rdata.to_string(),
        }
    }

    /// Full zone-file line: header followed by RDATA.
    #[must_use]
    pub fn to_text(&self) -> String {
        format!("{}{}", self.header(), self.rdata_text())
    }
}

impl fmt::Display for StructuredRr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn generic_rdata_text(rdata: &NULL) -> String {
    let bytes = rdata.to_bytes().unwrap_or_default();
    if bytes.is_empty() {
        format!("{RFC3597_MARKER} 0")
    } else {
        format!("{RFC3597_MARKER} {} {}", bytes.len(), HEXLOWER.encode(&bytes))
    }
}

/// Parse one zone-file line relative to `origin` (fully qualified).
///
/// The owner is the first token; `@` is the origin and names without a
/// trailing dot are relative to it. TTL and class may follow in either
/// order; the TTL is mandatory because there is no `$TTL` context. TTLs
/// accept unit suffixes (`1h30m`).
///
/// # Errors
///
/// Returns a description of the first syntax problem found.
pub fn parse_line(line: &str, origin: &str) -> Result<StructuredRr, String> {
    let (owner, mut rest) = next_word(line).ok_or_else(|| "empty record line".to_string())?;
    if owner.starts_with('"') {
        return Err("owner name cannot be quoted".to_string());
    }
    let origin_name =
        Name::from_ascii(origin).map_err(|e| format!("invalid origin '{origin}': {e}"))?;
    let name = absolute_name(owner, origin)?;

    let mut ttl: Option<u32> = None;
    let mut class: Option<DNSClass> = None;
    let rtype = loop {
        let (word, remainder) =
            next_word(rest).ok_or_else(|| "missing record type".to_string())?;
        rest = remainder;
        if ttl.is_none() && word.starts_with(|c: char| c.is_ascii_digit()) {
            ttl = Some(Parser::parse_time(word).map_err(|_| format!("bad TTL '{word}'"))?);
        } else if class.is_none() && parse_class(word).is_some() {
            class = parse_class(word);
        } else {
            break parse_type(word)?;
        }
    };
    let ttl = ttl.ok_or_else(|| "missing TTL".to_string())?;
    let class = class.unwrap_or(DNSClass::IN);
    let rdata_text = rest.trim();

    let is_generic = rdata_text
        .strip_prefix(RFC3597_MARKER)
        .is_some_and(|after| after.is_empty() || after.starts_with(char::is_whitespace));

    let mut record = if is_generic {
        let rdata = parse_generic_rdata(rtype, &rdata_text[RFC3597_MARKER.len()..])?;
        Record::from_rdata(name, ttl, rdata)
    } else if let RecordType::Unknown(code) = rtype {
        return Err(format!(
            "type {code} requires RFC 3597 generic encoding ({RFC3597_MARKER} <len> <hex>)"
        ));
    } else if matches!(rtype, RecordType::SVCB | RecordType::HTTPS) {
        let params = svcb::parse_svcb(rdata_text, &origin_name)
            .map_err(|e| format!("invalid {rtype} data: {e}"))?;
        let rdata = if rtype == RecordType::HTTPS {
            RData::HTTPS(HTTPS(params))
        } else {
            RData::SVCB(params)
        };
        Record::from_rdata(name, ttl, rdata)
    } else {
        parse_with_zone_parser(&name, ttl, class, rtype, rdata_text, &origin_name)?
    };

    // the zone parser derives an SOA's TTL from its expire field
    record.set_ttl(ttl);
    record.set_dns_class(class);
    Ok(StructuredRr::from_record(record))
}

fn parse_with_zone_parser(
    name: &Name,
    ttl: u32,
    class: DNSClass,
    rtype: RecordType,
    rdata_text: &str,
    origin: &Name,
) -> Result<Record, String> {
    check_rdata_text(rdata_text)?;

    let line = format!("{name} {ttl} {class} {rtype} {rdata_text}");
    let (_, sets) = Parser::new(line, None, Some(origin.clone()))
        .parse()
        .map_err(|e| format!("invalid {rtype} data: {e}"))?;

    let mut records = sets.into_values().flat_map(IntoIterator::into_iter);
    match (records.next(), records.next()) {
        (Some(record), None) => Ok(record),
        (None, _) => Err(format!("no {rtype} record in '{rdata_text}'")),
        (Some(_), Some(_)) => Err(format!("more than one record in '{rdata_text}'")),
    }
}

/// Check RDATA text before it reaches the zone lexer.
///
/// Outside quoted strings the text must stay on one line, so it cannot carry
/// further records or `$` directives. No token may be longer than
/// [`MAX_TOKEN_CHARS`], counting the whitespace before it; a `( ... )` group
/// counts as one token.
fn check_rdata_text(text: &str) -> Result<(), String> {
    #[derive(PartialEq)]
    enum Lex {
        Between,
        Token,
        Quoted,
        Escaped,
        Comment,
    }

    let mut state = Lex::Between;
    let mut depth = 0usize;
    let mut run = 0usize;

    for c in text.chars() {
        run += 1;
        if run > MAX_TOKEN_CHARS {
            return Err(format!("token longer than {MAX_TOKEN_CHARS} characters"));
        }
        if matches!(c, '\n' | '\r') && !matches!(state, Lex::Quoted | Lex::Escaped) {
            return Err("record text must be a single line".to_string());
        }

        state = match state {
            Lex::Escaped => Lex::Quoted,
            Lex::Quoted => match c {
                '\\' => Lex::Escaped,
                '"' => {
                    run = 0;
                    Lex::Between
                }
                _ => Lex::Quoted,
            },
            Lex::Comment => Lex::Comment,
            Lex::Between | Lex::Token => match c {
                ';' => Lex::Comment,
                '"' if state == Lex::Between && depth == 0 => Lex::Quoted,
                '(' if state == Lex::Between => {
                    depth += 1;
                    Lex::Between
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        run = 0;
                    }
                    Lex::Between
                }
                c if c.is_whitespace() => {
                    if state == Lex::Token && depth == 0 {
                        run = 1;
                    }
                    Lex::Between
                }
                _ => Lex::Token,
            },
        };
    }
    Ok(())
}

fn next_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    Some(text.split_at(end))
}

/// Resolve an owner or target name against a fully-qualified origin.
///
/// # Errors
///
/// Returns an error if the resulting name is not a valid domain name.
pub fn absolute_name(owner: &str, origin: &str) -> Result<Name, String> {
    let text = if owner.is_empty() || owner == APEX_MARKER {
        origin.to_string()
    } else if owner.ends_with('.') {
        owner.to_string()
    } else if origin == "." {
        format!("{owner}.")
    } else {
        format!("{owner}.{origin}")
    };
    Name::from_ascii(&text).map_err(|e| format!("invalid name '{text}': {e}"))
}

/// Parse a class mnemonic (`IN`, `CH`, `HS` or RFC 3597 `CLASS<n>`).
#[must_use]
pub fn parse_class(text: &str) -> Option<DNSClass> {
    match text.to_ascii_uppercase().as_str() {
        "IN" | "CLASS1" => Some(DNSClass::IN),
        "CH" | "CLASS3" => Some(DNSClass::CH),
        "HS" | "CLASS4" => Some(DNSClass::HS),
        _ => None,
    }
}

/// Parse a type mnemonic, accepting RFC 3597 `TYPE<n>`.
///
/// # Errors
///
/// Returns an error for an unrecognized mnemonic.
pub fn parse_type(text: &str) -> Result<RecordType, String> {
    let upper = text.to_ascii_uppercase();
    if let Some(code) = upper.strip_prefix("TYPE") {
        if let Ok(code) = code.parse::<u16>() {
            return Ok(RecordType::from(code));
        }
    }
    RecordType::from_str(&upper).map_err(|_| format!("unknown record type '{text}'"))
}

fn parse_generic_rdata(rtype: RecordType, text: &str) -> Result<RData, String> {
    if !matches!(rtype, RecordType::Unknown(_)) {
        return Err(format!(
            "generic RDATA encoding is only supported for unknown types, not {rtype}"
        ));
    }

    let text = text.split(';').next().unwrap_or_default();
    let mut words = text
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|word| !word.is_empty());
    let length = words
        .next()
        .ok_or_else(|| "missing RDATA length after \\#".to_string())?;
    let length: usize = length
        .parse()
        .map_err(|_| format!("bad RDATA length '{length}'"))?;

    let hex: String = words.collect();
    let bytes = HEXLOWER_PERMISSIVE
        .decode(hex.as_bytes())
        .map_err(|e| format!("bad RDATA hex: {e}"))?;
    if bytes.len() != length {
        return Err(format!(
            "RDATA length {length} does not match {} bytes of data",
            bytes.len()
        ));
    }

    Ok(RData::Unknown {
        code: rtype,
        rdata: NULL::with(bytes),
    })
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod codec_tests;
