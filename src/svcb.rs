// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! RFC 9460 presentation format for SVCB and HTTPS RDATA.
//!
//! `<priority> <target> [<key>[=<value>] ...]`. Values may be quoted. The
//! list values of `mandatory`, `alpn`, `ipv4hint` and `ipv6hint` are comma
//! separated, and `\,` keeps a literal comma inside an ALPN id. `ech` (or the
//! older `echconfig`) carries a base64 ECHConfigList.
//!
//! Parameters are stored in ascending key order, the order the wire format
//! requires, so printing a parsed value may reorder its parameters.

use std::fmt::Write as _;
use std::net::{Ipv4Addr, Ipv6Addr};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hickory_proto::rr::rdata::svcb::{
    Alpn, EchConfig, IpHint, Mandatory, SvcParamKey, SvcParamValue, SVCB,
};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::Name;

/// Parse SVCB/HTTPS RDATA text; relative target names are completed with `origin`.
///
/// # Errors
///
/// Returns a description of the first problem found.
pub fn parse_svcb(text: &str, origin: &Name) -> Result<SVCB, String> {
    let tokens = split_params(text)?;
    let mut tokens = tokens.iter();

    let priority = tokens
        .next()
        .ok_or_else(|| "missing SvcPriority".to_string())?;
    let priority: u16 = priority
        .parse()
        .map_err(|_| format!("bad SvcPriority '{priority}'"))?;

    let target = tokens
        .next()
        .ok_or_else(|| "missing TargetName".to_string())?;
    let target =
        Name::parse(target, Some(origin)).map_err(|e| format!("bad TargetName '{target}': {e}"))?;

    let mut params: Vec<(SvcParamKey, SvcParamValue)> = Vec::new();
    for token in tokens {
        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key, Some(unquote(value)?)),
            None => (token.as_str(), None),
        };
        let key = parse_key(key)?;
        if params.iter().any(|(seen, _)| *seen == key) {
            return Err(format!("duplicate SvcParamKey {}", key_name(key)));
        }
        params.push((key, parse_value(key, value)?));
    }
    params.sort_by_key(|(key, _)| u16::from(*key));

    Ok(SVCB::new(priority, target, params))
}

/// Presentation text of SVCB/HTTPS RDATA, every value quoted.
#[must_use]
pub fn svcb_text(svcb: &SVCB) -> String {
    let mut out = format!("{} {}", svcb.svc_priority(), svcb.target_name());
    for (key, value) in svcb.svc_params() {
        out.push(' ');
        out.push_str(&key_name(*key));
        if let Some(value) = value_text(value) {
            let _ = write!(out, "=\"{value}\"");
        }
    }
    out
}

/// Presentation name of a key; `key<N>` for keys without a mnemonic.
#[must_use]
pub fn key_name(key: SvcParamKey) -> String {
    match key {
        SvcParamKey::Mandatory => "mandatory".to_string(),
        SvcParamKey::Alpn => "alpn".to_string(),
        SvcParamKey::NoDefaultAlpn => "no-default-alpn".to_string(),
        SvcParamKey::Port => "port".to_string(),
        SvcParamKey::Ipv4Hint => "ipv4hint".to_string(),
        SvcParamKey::EchConfig => "ech".to_string(),
        SvcParamKey::Ipv6Hint => "ipv6hint".to_string(),
        other => format!("key{}", u16::from(other)),
    }
}

/// Parse a key mnemonic or `key<N>`.
///
/// # Errors
///
/// Returns an error for an unrecognized name, and for numbered keys hickory
/// cannot encode faithfully (anything beyond the seven registered keys).
pub fn parse_key(name: &str) -> Result<SvcParamKey, String> {
    let key = match name.to_ascii_lowercase().as_str() {
        "mandatory" => SvcParamKey::Mandatory,
        "alpn" => SvcParamKey::Alpn,
        "no-default-alpn" => SvcParamKey::NoDefaultAlpn,
        "port" => SvcParamKey::Port,
        "ipv4hint" => SvcParamKey::Ipv4Hint,
        "ech" | "echconfig" => SvcParamKey::EchConfig,
        "ipv6hint" => SvcParamKey::Ipv6Hint,
        other => other
            .strip_prefix("key")
            .and_then(|n| n.parse::<u16>().ok())
            .map(SvcParamKey::from)
            .ok_or_else(|| format!("unknown SvcParamKey '{name}'"))?,
    };
    match key {
        SvcParamKey::Key(_) | SvcParamKey::Key65535 | SvcParamKey::Unknown(_) => {
            Err(format!("unsupported SvcParamKey '{name}'"))
        }
        key => Ok(key),
    }
}

fn parse_value(key: SvcParamKey, value: Option<&str>) -> Result<SvcParamValue, String> {
    let name = key_name(key);
    if key == SvcParamKey::NoDefaultAlpn {
        return match value {
            None | Some("") => Ok(SvcParamValue::NoDefaultAlpn),
            Some(_) => Err("no-default-alpn takes no value".to_string()),
        };
    }
    let value = value.ok_or_else(|| format!("{name} requires a value"))?;

    let value = match key {
        SvcParamKey::Mandatory => {
            let keys = list_items(value)?
                .iter()
                .map(|item| parse_key(item))
                .collect::<Result<Vec<_>, _>>()?;
            if keys.contains(&SvcParamKey::Mandatory) {
                return Err("mandatory cannot list itself".to_string());
            }
            SvcParamValue::Mandatory(Mandatory(keys))
        }
        SvcParamKey::Alpn => SvcParamValue::Alpn(Alpn(list_items(value)?)),
        SvcParamKey::Port => {
            let port = decode_escapes(value)?;
            let port = port
                .parse::<u16>()
                .map_err(|_| format!("bad port '{port}'"))?;
            SvcParamValue::Port(port)
        }
        SvcParamKey::Ipv4Hint => {
            let addrs = list_items(value)?
                .iter()
                .map(|item| {
                    item.parse::<Ipv4Addr>()
                        .map(A::from)
                        .map_err(|_| format!("bad ipv4hint address '{item}'"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            SvcParamValue::Ipv4Hint(IpHint(addrs))
        }
        SvcParamKey::Ipv6Hint => {
            let addrs = list_items(value)?
                .iter()
                .map(|item| {
                    item.parse::<Ipv6Addr>()
                        .map(AAAA::from)
                        .map_err(|_| format!("bad ipv6hint address '{item}'"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            SvcParamValue::Ipv6Hint(IpHint(addrs))
        }
        SvcParamKey::EchConfig => SvcParamValue::EchConfig(EchConfig(parse_ech(value)?)),
        _ => return Err(format!("unsupported SvcParamKey '{name}'")),
    };
    Ok(value)
}

/// Decode a base64 ECHConfigList into the configs after its length prefix.
fn parse_ech(value: &str) -> Result<Vec<u8>, String> {
    let bytes = BASE64
        .decode(decode_escapes(value)?.trim())
        .map_err(|e| format!("ech is not valid base64: {e}"))?;
    if bytes.len() < 2 {
        return Err("ech value is too short".to_string());
    }
    let (length, configs) = bytes.split_at(2);
    if usize::from(u16::from_be_bytes([length[0], length[1]])) != configs.len() {
        return Err("ech length prefix does not match its data".to_string());
    }
    Ok(configs.to_vec())
}

fn ech_text(configs: &[u8]) -> String {
    let length = u16::try_from(configs.len()).unwrap_or(u16::MAX);
    let mut bytes = length.to_be_bytes().to_vec();
    bytes.extend_from_slice(configs);
    BASE64.encode(bytes)
}

fn value_text(value: &SvcParamValue) -> Option<String> {
    let text = match value {
        SvcParamValue::NoDefaultAlpn => return None,
        SvcParamValue::Mandatory(Mandatory(keys)) => keys
            .iter()
            .map(|key| key_name(*key))
            .collect::<Vec<_>>()
            .join(","),
        SvcParamValue::Alpn(Alpn(ids)) => ids
            .iter()
            .map(|id| escape_text(id.as_bytes(), true))
            .collect::<Vec<_>>()
            .join(","),
        SvcParamValue::Port(port) => port.to_string(),
        SvcParamValue::Ipv4Hint(IpHint(addrs)) => addrs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
        SvcParamValue::Ipv6Hint(IpHint(addrs)) => addrs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
        SvcParamValue::EchConfig(EchConfig(configs)) => ech_text(configs),
        SvcParamValue::Unknown(unknown) => escape_text(&unknown.0, false),
    };
    Some(text)
}

/// Escape bytes for a quoted value; `list` also escapes commas.
fn escape_text(bytes: &[u8], list: bool) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'"' | b'\\' => {
                out.push('\\');
                out.push(char::from(b));
            }
            b',' if list => out.push_str("\\,"),
            0x21..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\{b:03}");
            }
        }
    }
    out
}

/// Split RDATA text into whitespace-separated tokens, keeping quoted runs whole.
fn split_params(text: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            ';' if !in_quotes => break,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if in_quotes || escaped {
        return Err("unterminated quoted value".to_string());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Strip the quotes around a value, leaving escapes in place.
fn unquote(value: &str) -> Result<&str, String> {
    match value.strip_prefix('"') {
        Some(inner) => inner
            .strip_suffix('"')
            .ok_or_else(|| format!("unterminated quoted value '{value}'")),
        None => Ok(value),
    }
}

/// Split a list value on unescaped commas and decode each item.
fn list_items(value: &str) -> Result<Vec<String>, String> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                items.push(decode_escapes(&value[start..i])?);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(decode_escapes(&value[start..])?);

    if items.iter().any(String::is_empty) {
        return Err(format!("empty item in list '{value}'"));
    }
    Ok(items)
}

/// Decode `\X` and `\DDD` escapes.
fn decode_escapes(text: &str) -> Result<String, String> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let next = chars
            .next()
            .ok_or_else(|| format!("dangling escape in '{text}'"))?;
        if !next.is_ascii_digit() {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let digits: String = std::iter::once(next).chain(chars.by_ref().take(2)).collect();
        let byte = digits
            .parse::<u16>()
            .ok()
            .filter(|_| digits.len() == 3)
            .and_then(|value| u8::try_from(value).ok())
            .ok_or_else(|| format!("bad escape \\{digits} in '{text}'"))?;
        bytes.push(byte);
    }
    String::from_utf8(bytes).map_err(|_| format!("value '{text}' is not valid UTF-8"))
}

#[cfg(test)]
#[path = "svcb_tests.rs"]
mod svcb_tests;
