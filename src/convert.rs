// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Conversion between [`Record`] and codec resource records.
//!
//! Both directions go through zone-file text: a record becomes the line
//! `<name> <ttl> IN <type> <value>` which the codec parses, and a resource
//! record becomes a record by stripping the header from the codec's own text
//! form. Structured fields are read from and written to the leading RDATA
//! tokens according to the [`FieldLayouts`] table.
//!
//! For any record in canonical form (as returned by [`Converter::from_rr`]),
//! `from_rr(to_rr(r, zone), zone) == r`.

use std::time::Duration;

use hickory_proto::rr::{Name, RData, RecordType};

use crate::codec::{self, quote_text, StructuredRr};
use crate::constants::{APEX_MARKER, TXT_SEGMENT_MAX_LEN};
use crate::dns_errors::ConversionError;
use crate::layout::{FieldLayout, FieldLayouts};
use crate::record::Record;

/// Normalize a zone or name to fully-qualified form.
///
/// # Example
///
/// ```rust
/// use rfc2136_provider::convert::fqdn;
///
/// assert_eq!(fqdn("example.com"), "example.com.");
/// assert_eq!(fqdn("example.com."), "example.com.");
/// ```
#[must_use]
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Name relative to `zone`; the apex becomes the empty string.
///
/// Names outside the zone are returned unchanged.
#[must_use]
pub fn relative_name(name: &str, zone: &str) -> String {
    let lower_name = name.to_ascii_lowercase();
    let lower_zone = zone.to_ascii_lowercase();

    if lower_name == lower_zone {
        return String::new();
    }
    if lower_zone == "." {
        return name.trim_end_matches('.').to_string();
    }
    match lower_name.strip_suffix(&format!(".{lower_zone}")) {
        Some(prefix) => name[..prefix.len()].to_string(),
        None => name.to_string(),
    }
}

/// What a remove-only update should delete for one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Deletion {
    /// Every record set at the name (record had no type)
    Name(Name),
    /// The whole record set at name+type (record had no value)
    RecordSet {
        /// Owner name
        name: Name,
        /// Record set type
        rtype: RecordType,
    },
    /// Exactly this record
    Exact(StructuredRr),
}

/// Structured fields derived from RDATA text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FieldView {
    priority: Option<u16>,
    weight: Option<u16>,
    target: Option<String>,
}

impl FieldView {
    fn extract(layout: FieldLayout, rdata: &str) -> Self {
        let mut tokens = rdata.split_whitespace();
        let mut view = Self::default();
        if layout.priority {
            view.priority = tokens.next().and_then(|t| t.parse().ok());
        }
        if layout.weight {
            view.weight = tokens.next().and_then(|t| t.parse().ok());
        }
        if layout.exposes_target() {
            view.target = tokens.next().map(str::to_string);
        }
        view
    }
}

/// Bidirectional record converter driven by a field layout table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Converter {
    layouts: FieldLayouts,
}

impl Converter {
    #[must_use]
    pub fn new(layouts: FieldLayouts) -> Self {
        Self { layouts }
    }

    #[must_use]
    pub fn layouts(&self) -> &FieldLayouts {
        &self.layouts
    }

    /// Convert a record to a resource record in `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] if the record does not form valid RR text
    /// or its structured fields disagree with its value.
    pub fn to_rr(&self, record: &Record, zone: &str) -> Result<StructuredRr, ConversionError> {
        let zone = fqdn(zone);
        let owner = owner_of(record);
        let fail = |reason: String| ConversionError::new(owner, reason);

        if owner.chars().any(char::is_whitespace) {
            return Err(fail("name contains whitespace".to_string()));
        }
        if record.rtype.is_empty() || !record.rtype.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(fail(format!("invalid record type '{}'", record.rtype)));
        }

        let layout = self.layouts.get(&record.rtype);
        let (rdata, prefixed) = if record.rtype.eq_ignore_ascii_case("TXT") {
            (chunk_txt(&record.value), false)
        } else {
            compose_rdata(record, layout)
        };

        let line = format!(
            "{owner} {} IN {} {rdata}",
            record.ttl_secs(),
            record.rtype
        );
        let rr = codec::parse_line(&line, &zone).map_err(fail)?;

        // a prefixed field that the parser did not consume means the value
        // carried its own, different, leading fields
        if prefixed
            && rr.rdata_text().split_whitespace().count() != rdata.split_whitespace().count()
        {
            return Err(ConversionError::new(
                owner,
                format!(
                    "structured fields do not match value '{}'",
                    record.value
                ),
            ));
        }

        self.check_fields(record, &rr, layout, &zone)?;
        Ok(rr)
    }

    /// Convert a resource record from `zone` back to a record.
    #[must_use]
    pub fn from_rr(&self, rr: &StructuredRr, zone: &str) -> Record {
        let zone = fqdn(zone);
        let inner = rr.record();
        let rtype = rr.mnemonic();

        let (value, view) = match inner.data() {
            Some(RData::TXT(txt)) => {
                let text: String = txt
                    .txt_data()
                    .iter()
                    .map(|segment| String::from_utf8_lossy(segment))
                    .collect();
                (text, FieldView::default())
            }
            _ => {
                let text = rr.to_text();
                let header = rr.header();
                let value = text
                    .strip_prefix(header.as_str())
                    .map_or_else(|| rr.rdata_text(), str::to_string);
                let view = FieldView::extract(self.layouts.get(&rtype), &value);
                (value, view)
            }
        };

        Record {
            name: relative_name(&inner.name().to_string(), &zone),
            rtype,
            ttl: Duration::from_secs(u64::from(inner.ttl())),
            value,
            priority: view.priority,
            weight: view.weight,
            target: view.target,
        }
    }

    /// Decide what a delete request for `record` removes.
    ///
    /// A record without a type deletes everything at its name; a record
    /// without a value (and no structured fields) deletes its record set;
    /// anything else deletes exactly that record.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] if the name, type or value is invalid.
    pub fn to_deletion(&self, record: &Record, zone: &str) -> Result<Deletion, ConversionError> {
        let zone = fqdn(zone);
        let owner = owner_of(record);

        if record.rtype.trim().is_empty() {
            let name = codec::absolute_name(owner, &zone)
                .map_err(|reason| ConversionError::new(owner, reason))?;
            return Ok(Deletion::Name(name));
        }

        if record.value.trim().is_empty() && record.has_no_fields() {
            let name = codec::absolute_name(owner, &zone)
                .map_err(|reason| ConversionError::new(owner, reason))?;
            let rtype = codec::parse_type(&record.rtype)
                .map_err(|reason| ConversionError::new(owner, reason))?;
            return Ok(Deletion::RecordSet { name, rtype });
        }

        self.to_rr(record, &zone).map(Deletion::Exact)
    }

    fn check_fields(
        &self,
        record: &Record,
        rr: &StructuredRr,
        layout: FieldLayout,
        zone: &str,
    ) -> Result<(), ConversionError> {
        if record.has_no_fields() || layout.is_empty() {
            return Ok(());
        }
        let derived = FieldView::extract(layout, &rr.rdata_text());
        let owner = owner_of(record);

        if let Some(priority) = record.priority.filter(|_| layout.priority) {
            if derived.priority != Some(priority) {
                return Err(ConversionError::new(
                    owner,
                    format!("priority {priority} does not match value '{}'", record.value),
                ));
            }
        }
        if let Some(weight) = record.weight.filter(|_| layout.weight) {
            if derived.weight != Some(weight) {
                return Err(ConversionError::new(
                    owner,
                    format!("weight {weight} does not match value '{}'", record.value),
                ));
            }
        }
        if let Some(target) = record.target.as_deref().filter(|_| layout.exposes_target()) {
            let wanted = codec::absolute_name(target, zone)
                .map_err(|reason| ConversionError::new(owner, reason))?;
            let matches = derived
                .target
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(&wanted.to_string()));
            if !matches {
                return Err(ConversionError::new(
                    owner,
                    format!("target {target} does not match value '{}'", record.value),
                ));
            }
        }
        Ok(())
    }
}

fn owner_of(record: &Record) -> &str {
    if record.name.is_empty() {
        APEX_MARKER
    } else {
        &record.name
    }
}

/// Insert the record's structured fields ahead of its value unless the value
/// already starts with them. The flag reports whether anything was inserted.
fn compose_rdata(record: &Record, layout: FieldLayout) -> (String, bool) {
    let mut fields: Vec<String> = Vec::new();
    if layout.priority {
        fields.extend(record.priority.map(|p| p.to_string()));
    }
    if layout.weight {
        fields.extend(record.weight.map(|w| w.to_string()));
    }
    if layout.exposes_target() {
        fields.extend(record.target.clone());
    }

    let value = record.value.trim();
    if fields.is_empty() {
        return (value.to_string(), false);
    }

    let leading: Vec<&str> = value.split_whitespace().take(fields.len()).collect();
    let already_present = leading.len() == fields.len()
        && leading
            .iter()
            .zip(&fields)
            .all(|(token, field)| token.eq_ignore_ascii_case(field));
    if already_present {
        return (value.to_string(), false);
    }

    if !value.is_empty() {
        fields.push(value.to_string());
    }
    (fields.join(" "), true)
}

/// Split text into quoted character-strings of at most 255 bytes each.
fn chunk_txt(value: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = rest.len().min(TXT_SEGMENT_MAX_LEN);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        segments.push(quote_text(head));
        rest = tail;
    }
    if segments.is_empty() {
        segments.push(quote_text(""));
    }
    segments.join(" ")
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod convert_tests;
