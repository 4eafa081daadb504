// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-process authoritative name server for integration tests.
//!
//! Serves one zone over TCP: AXFR (split into two envelopes) and RFC 2136
//! updates applied to an in-memory record list. A server started with a TSIG
//! key verifies every request, answers failed checks with an unsigned
//! NOTAUTH, and signs each response envelope, chaining the MAC the way
//! RFC 8945 describes for multi-message answers.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hickory_proto::op::{Edns, Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::dnssec::rdata::tsig::{make_tsig_record, message_tbs, TSIG};
use hickory_proto::rr::dnssec::tsig::TSigner;
use hickory_proto::rr::rdata::opt::EdnsOption;
use hickory_proto::rr::{DNSClass, Name, Record, RecordType};
use rfc2136_provider::codec::parse_line;
use rfc2136_provider::tsig::create_tsig_signer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub const ZONE: &str = "example.com.";

/// Build a record from a zone-file line relative to [`ZONE`].
pub fn rr(line: &str) -> Record {
    parse_line(line, ZONE)
        .unwrap_or_else(|e| panic!("bad test record '{line}': {e}"))
        .into_record()
}

#[derive(Default)]
struct State {
    records: Vec<Record>,
    rejection: Option<(ResponseCode, u16, String)>,
    signer: Option<TSigner>,
    corrupt_envelope: Option<usize>,
    verified_requests: usize,
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Start a server whose zone holds an SOA, an NS and `lines`.
    pub async fn start(lines: &[&str]) -> Self {
        Self::start_with(lines, None).await
    }

    /// Like [`MockServer::start`], but requests must carry a TSIG made with
    /// the given key and every response is signed with it.
    pub async fn start_signed(
        lines: &[&str],
        key_name: &str,
        algorithm: &str,
        secret: &str,
    ) -> Self {
        let signer = create_tsig_signer(key_name, algorithm, secret).unwrap();
        Self::start_with(lines, Some(signer)).await
    }

    async fn start_with(lines: &[&str], signer: Option<TSigner>) -> Self {
        let mut records = vec![
            rr("@ 3600 IN SOA ns1 hostmaster 2024010101 7200 3600 1209600 300"),
            rr("@ 3600 IN NS ns1"),
        ];
        records.extend(lines.iter().map(|line| rr(line)));

        let state = Arc::new(Mutex::new(State {
            records,
            signer,
            ..State::default()
        }));
        let connections = Arc::new(AtomicUsize::new(0));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = {
            let state = state.clone();
            let connections = connections.clone();
            tokio::spawn(async move {
                while let Ok((conn, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(conn, state.clone()));
                }
            })
        };

        Self {
            addr,
            state,
            connections,
            handle,
        }
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Reject every following update with `rcode` and an extended DNS error.
    pub async fn reject_updates(&self, rcode: ResponseCode, info_code: u16, text: &str) {
        self.state.lock().await.rejection = Some((rcode, info_code, text.to_string()));
    }

    /// Flip a header bit of response envelope `index` after it is signed.
    pub async fn corrupt_envelope(&self, index: usize) {
        self.state.lock().await.corrupt_envelope = Some(index);
    }

    /// Number of requests whose TSIG checked out.
    pub async fn verified_requests(&self) -> usize {
        self.state.lock().await.verified_requests
    }

    /// Zone-file RDATA of every record at `name` with type `rtype`, sorted.
    pub async fn rdata(&self, name: &str, rtype: RecordType) -> Vec<String> {
        let owner = rfc2136_provider::codec::absolute_name(name, ZONE).unwrap();
        let state = self.state.lock().await;
        let mut values: Vec<String> = state
            .records
            .iter()
            .filter(|r| r.name() == &owner && r.record_type() == rtype)
            .filter_map(|r| r.data().map(ToString::to_string))
            .collect();
        values.sort();
        values
    }

    /// Number of records at `name`, any type.
    pub async fn count_at(&self, name: &str) -> usize {
        let owner = rfc2136_provider::codec::absolute_name(name, ZONE).unwrap();
        let state = self.state.lock().await;
        state.records.iter().filter(|r| r.name() == &owner).count()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut conn: TcpStream, state: Arc<Mutex<State>>) {
    loop {
        let mut len = [0u8; 2];
        if conn.read_exact(&mut len).await.is_err() {
            return;
        }
        let mut body = vec![0u8; usize::from(u16::from_be_bytes(len))];
        if conn.read_exact(&mut body).await.is_err() {
            return;
        }
        let Ok(request) = Message::from_vec(&body) else {
            return;
        };

        let envelopes = {
            let mut state = state.lock().await;
            answer(&mut state, &request, &body)
        };

        for bytes in envelopes {
            let len = u16::try_from(bytes.len()).unwrap().to_be_bytes();
            if conn.write_all(&len).await.is_err() || conn.write_all(&bytes).await.is_err() {
                return;
            }
        }
    }
}

/// Wire form of every response envelope for `request`.
fn answer(state: &mut State, request: &Message, body: &[u8]) -> Vec<Vec<u8>> {
    let Some(signer) = state.signer.clone() else {
        return respond(state, request)
            .iter()
            .map(|response| response.to_vec().unwrap())
            .collect();
    };

    let request_mac = match signer.verify_message_byte(None, body, true) {
        Ok((mac, _, _)) => mac,
        Err(_) => {
            let mut response = response_to(request);
            response.set_response_code(ResponseCode::NotAuth);
            return vec![response.to_vec().unwrap()];
        }
    };
    state.verified_requests += 1;

    let responses = respond(state, request);
    let mut envelopes = sign_envelopes(&signer, request_mac, responses);
    if let Some(envelope) = state.corrupt_envelope.and_then(|i| envelopes.get_mut(i)) {
        envelope[2] ^= 0x04;
    }
    envelopes
}

fn respond(state: &mut State, request: &Message) -> Vec<Message> {
    match request.op_code() {
        OpCode::Update => vec![apply_update(state, request)],
        _ => transfer(state, request),
    }
}

/// Sign each response; the first covers the request MAC and the full TSIG
/// variables, later ones the previous MAC plus time and fudge only.
fn sign_envelopes(
    signer: &TSigner,
    request_mac: Vec<u8>,
    responses: Vec<Message>,
) -> Vec<Vec<u8>> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let mut previous = request_mac;

    responses
        .into_iter()
        .enumerate()
        .map(|(index, mut response)| {
            let pre_tsig = TSIG::new(
                signer.algorithm().clone(),
                now,
                signer.fudge(),
                Vec::new(),
                response.id(),
                0,
                Vec::new(),
            );

            let mut tbs = u16::try_from(previous.len()).unwrap().to_be_bytes().to_vec();
            tbs.extend_from_slice(&previous);
            if index == 0 {
                tbs.extend(message_tbs(None, &response, &pre_tsig, signer.signer_name()).unwrap());
            } else {
                tbs.extend(response.to_vec().unwrap());
                tbs.extend_from_slice(&u16::try_from(now >> 32).unwrap().to_be_bytes());
                tbs.extend_from_slice(&u32::try_from(now & 0xffff_ffff).unwrap().to_be_bytes());
                tbs.extend_from_slice(&signer.fudge().to_be_bytes());
            }

            let mac = signer.sign(&tbs).unwrap();
            previous = mac.clone();
            response.add_tsig(make_tsig_record(
                signer.signer_name().clone(),
                pre_tsig.set_mac(mac),
            ));
            response.to_vec().unwrap()
        })
        .collect()
}

fn response_to(request: &Message) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_authoritative(true);
    response.add_queries(request.queries().to_vec());
    response
}

fn same_rdata(a: &Record, b: &Record) -> bool {
    a.name() == b.name() && a.record_type() == b.record_type() && a.data() == b.data()
}

fn apply_update(state: &mut State, request: &Message) -> Message {
    let mut response = response_to(request);

    if let Some((rcode, info_code, text)) = &state.rejection {
        let mut data = info_code.to_be_bytes().to_vec();
        data.extend_from_slice(text.as_bytes());
        let mut edns = Edns::new();
        edns.options_mut().insert(EdnsOption::Unknown(15, data));
        response.set_response_code(*rcode);
        response.set_edns(edns);
        return response;
    }

    for directive in request.name_servers() {
        match (directive.dns_class(), directive.record_type()) {
            (DNSClass::ANY, RecordType::ANY) => state
                .records
                .retain(|r| r.name() != directive.name() || r.record_type() == RecordType::SOA),
            (DNSClass::ANY, rtype) => state
                .records
                .retain(|r| r.name() != directive.name() || r.record_type() != rtype),
            (DNSClass::NONE, _) => state.records.retain(|r| !same_rdata(r, directive)),
            _ => {
                state.records.retain(|r| !same_rdata(r, directive));
                state.records.push(directive.clone());
            }
        }
    }
    response
}

fn transfer(state: &State, request: &Message) -> Vec<Message> {
    let zone = Name::from_ascii(ZONE).unwrap();
    let is_axfr = request
        .queries()
        .first()
        .is_some_and(|q| q.query_type() == RecordType::AXFR && q.name() == &zone);
    if !is_axfr {
        let mut response = response_to(request);
        response.set_response_code(ResponseCode::NotAuth);
        return vec![response];
    }

    let soa = state
        .records
        .iter()
        .find(|r| r.record_type() == RecordType::SOA)
        .cloned()
        .unwrap();
    let body: Vec<Record> = state
        .records
        .iter()
        .filter(|r| r.record_type() != RecordType::SOA)
        .cloned()
        .collect();
    let (head, tail) = body.split_at(body.len() / 2);

    let mut first = response_to(request);
    first.add_answer(soa.clone());
    first.add_answers(head.to_vec());

    let mut second = response_to(request);
    second.add_answers(tail.to_vec());
    second.add_answer(soa);

    vec![first, second]
}
