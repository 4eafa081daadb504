// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! RFC 2136 update construction.
//!
//! Every message is addressed to one fully-qualified zone. The update section
//! holds directives in the order they must be applied:
//!
//! | Directive          | Class | Type     | TTL | RDATA  |
//! |--------------------|-------|----------|-----|--------|
//! | insert             | IN    | rr type  | rr  | rr     |
//! | remove record set  | ANY   | rr type  | 0   | empty  |
//! | remove name        | ANY   | ANY      | 0   | empty  |
//! | remove exact       | NONE  | rr type  | 0   | rr     |
//!
//! Updates advertise EDNS(0) so servers can attach extended DNS errors to a
//! rejection. Signing happens in the transport, just before the message is
//! sent.

use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, Record, RecordType};
use tracing::debug;

use crate::codec::StructuredRr;
use crate::constants::EDNS_MAX_PAYLOAD;
use crate::convert::Deletion;

fn update_message(zone: &Name) -> Message {
    // for updates, the query section carries the zone
    let mut zone_section = Query::query(zone.clone(), RecordType::SOA);
    zone_section.set_query_class(DNSClass::IN);

    let mut edns = Edns::new();
    edns.set_max_payload(EDNS_MAX_PAYLOAD).set_version(0);

    let mut message = Message::new();
    message
        .set_id(rand::random())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Update)
        .set_recursion_desired(false);
    message.add_query(zone_section);
    message.set_edns(edns);
    message
}

/// Directive removing every record of `rtype` at `name`.
#[must_use]
pub fn remove_record_set(name: Name, rtype: RecordType) -> Record {
    let mut record = Record::with(name, rtype, 0);
    record.set_dns_class(DNSClass::ANY);
    record
}

/// Directive removing every record set at `name`.
#[must_use]
pub fn remove_name(name: Name) -> Record {
    remove_record_set(name, RecordType::ANY)
}

/// Directive removing exactly `rr`.
#[must_use]
pub fn remove_exact(rr: &StructuredRr) -> Record {
    let mut record = rr.record().clone();
    record.set_ttl(0);
    record.set_dns_class(DNSClass::NONE);
    record
}

/// Update replacing the record sets of `rrs` with exactly `rrs`.
///
/// All remove-record-set directives (one per distinct name+type, in first-seen
/// order) precede all inserts, so several records of one set survive together.
#[must_use]
pub fn replace_set(zone: &Name, rrs: &[StructuredRr]) -> Message {
    let mut message = update_message(zone);

    let mut seen: Vec<(&Name, RecordType)> = Vec::new();
    for rr in rrs {
        let record = rr.record();
        let key = (record.name(), record.record_type());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        debug!("update: remove record set {} {}", key.0, key.1);
        message.add_name_server(remove_record_set(key.0.clone(), key.1));
    }

    for rr in rrs {
        debug!("update: insert {}", rr);
        message.add_name_server(rr.record().clone());
    }
    message
}

/// Update adding `rrs` without touching existing data.
#[must_use]
pub fn insert_only(zone: &Name, rrs: &[StructuredRr]) -> Message {
    let mut message = update_message(zone);
    for rr in rrs {
        debug!("update: insert {}", rr);
        message.add_name_server(rr.record().clone());
    }
    message
}

/// Update removing what each [`Deletion`] names.
#[must_use]
pub fn remove_only(zone: &Name, deletions: &[Deletion]) -> Message {
    let mut message = update_message(zone);
    for deletion in deletions {
        let directive = match deletion {
            Deletion::Name(name) => {
                debug!("update: remove all record sets at {}", name);
                remove_name(name.clone())
            }
            Deletion::RecordSet { name, rtype } => {
                debug!("update: remove record set {} {}", name, rtype);
                remove_record_set(name.clone(), *rtype)
            }
            Deletion::Exact(rr) => {
                debug!("update: remove {}", rr);
                remove_exact(rr)
            }
        };
        message.add_name_server(directive);
    }
    message
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod message_tests;
