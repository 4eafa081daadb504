// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS over TCP exchange and AXFR streaming on top of the hickory client.
//!
//! Each call opens its own connection. The client's background task is
//! aborted when the call's future or stream is dropped, which cancels the
//! call and releases the socket. The configured timeout bounds connecting and
//! each request; for a zone transfer it bounds the whole transfer.
//!
//! When a TSIG signer is given, requests are signed and every response
//! envelope is verified, chaining the MAC across a transfer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use hickory_client::client::{AsyncClient, ClientHandle};
use hickory_client::error::{ClientError, ClientErrorKind};
use hickory_proto::error::{ProtoError, ProtoErrorKind};
use hickory_proto::iocompat::AsyncIoTokioAsStd;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::dnssec::tsig::TSigner;
use hickory_proto::rr::rdata::opt::EdnsOption;
use hickory_proto::rr::{Name, Record, RecordType};
use hickory_proto::tcp::TcpClientStream;
use hickory_proto::xfer::{DnsHandle, DnsMultiplexer, DnsResponse};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::constants::{DNS_PORT, EDNS_OPTION_EDE};
use crate::dns_errors::{ProtocolError, ProviderError, TransportError};
use crate::tsig::TsigFinalizer;

const CONNECT_STAGE: &str = "connecting to";
const RESPONSE_STAGE: &str = "waiting for a response from";

/// Interpret the response code of `response`.
///
/// Any extended DNS error options are attached to the returned error.
///
/// # Errors
///
/// Returns [`ProtocolError`] for every response code other than NOERROR.
pub fn check_response(response: &Message) -> Result<(), ProtocolError> {
    let rcode = response.response_code();
    if rcode == ResponseCode::NoError {
        return Ok(());
    }

    let mut protocol_error = ProtocolError::new(u16::from(rcode));
    if let Some(edns) = response.extensions().as_ref() {
        for (code, option) in edns.options().as_ref() {
            if u16::from(*code) != EDNS_OPTION_EDE {
                continue;
            }
            if let EdnsOption::Unknown(_, data) = option {
                if let Some((info_code, extra_text)) = decode_ede(data) {
                    protocol_error = protocol_error.with_extended(info_code, extra_text);
                }
            }
        }
    }
    Err(protocol_error)
}

/// Split an EDE option payload into INFO-CODE and EXTRA-TEXT.
#[must_use]
pub fn decode_ede(data: &[u8]) -> Option<(u16, String)> {
    if data.len() < 2 {
        return None;
    }
    let (code, text) = data.split_at(2);
    let text = String::from_utf8_lossy(text)
        .trim_end_matches('\0')
        .to_string();
    Some((u16::from_be_bytes([code[0], code[1]]), text))
}

/// Normalize `host:port`, defaulting the port to 53.
///
/// # Errors
///
/// Returns [`TransportError::InvalidServer`] for an empty address.
pub fn server_address(server: &str) -> Result<String, TransportError> {
    let server = server.trim();
    if server.is_empty() {
        return Err(TransportError::InvalidServer {
            server: server.to_string(),
            reason: "no server configured".to_string(),
        });
    }
    if server.parse::<std::net::SocketAddr>().is_ok() {
        return Ok(server.to_string());
    }
    if let Ok(ip) = server.parse::<std::net::IpAddr>() {
        return Ok(std::net::SocketAddr::new(ip, DNS_PORT).to_string());
    }
    match server.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            Ok(server.to_string())
        }
        _ => Ok(format!("{server}:{DNS_PORT}")),
    }
}

/// An open client connection.
///
/// Dropping the session aborts the background task that drives the socket.
struct Session {
    client: AsyncClient,
    background: JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.background.abort();
    }
}

/// One name server endpoint with a per-operation deadline.
#[derive(Debug, Clone)]
pub struct Transport {
    server: String,
    timeout: Duration,
}

impl Transport {
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidServer`] for an empty address.
    pub fn new(server: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            server: server_address(server)?,
            timeout,
        })
    }

    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    async fn resolve(&self) -> Result<SocketAddr, TransportError> {
        let mut addrs = tokio::time::timeout(
            self.timeout,
            tokio::net::lookup_host(self.server.as_str()),
        )
        .await
        .map_err(|_| self.timed_out(CONNECT_STAGE))?
        .map_err(|e| self.connect_failed(e.to_string()))?;

        addrs
            .next()
            .ok_or_else(|| self.connect_failed("name resolved to no addresses"))
    }

    async fn connect(&self, signer: Option<TSigner>) -> Result<Session, TransportError> {
        let addr = self.resolve().await?;
        debug!("Connecting to {} ({})", self.server, addr);

        let (stream, handle) =
            TcpClientStream::<AsyncIoTokioAsStd<TcpStream>>::with_timeout(addr, self.timeout);
        let finalizer = signer.map(|signer| Arc::new(TsigFinalizer::new(signer)));
        let multiplexer = DnsMultiplexer::with_timeout(stream, handle, self.timeout, finalizer);

        let (client, background) = AsyncClient::connect(multiplexer)
            .await
            .map_err(|e| self.proto_error(CONNECT_STAGE, &e))?;

        let server = self.server.clone();
        let background = tokio::spawn(async move {
            if let Err(e) = background.await {
                debug!("Connection to {} ended: {}", server, e);
            }
        });
        Ok(Session { client, background })
    }

    fn timed_out(&self, stage: &'static str) -> TransportError {
        TransportError::Timeout {
            server: self.server.clone(),
            stage,
            timeout_secs: self.timeout.as_secs(),
        }
    }

    fn connect_failed(&self, reason: impl Into<String>) -> TransportError {
        TransportError::ConnectFailed {
            server: self.server.clone(),
            reason: reason.into(),
        }
    }

    fn proto_error(&self, stage: &'static str, e: &ProtoError) -> TransportError {
        let server = self.server.clone();
        match e.kind() {
            ProtoErrorKind::Timeout => self.timed_out(stage),
            ProtoErrorKind::Io(io) if stage == CONNECT_STAGE => self.connect_failed(io.to_string()),
            ProtoErrorKind::Io(io)
                if matches!(
                    io.kind(),
                    std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof
                ) =>
            {
                TransportError::UnexpectedEof { server }
            }
            ProtoErrorKind::Io(io) => TransportError::Io {
                server,
                stage,
                reason: io.to_string(),
            },
            ProtoErrorKind::Message("stream closed") => TransportError::UnexpectedEof { server },
            ProtoErrorKind::TsigWrongKey => TransportError::VerificationFailed {
                server,
                reason: e.to_string(),
            },
            ProtoErrorKind::TsigUnsupportedMacAlgorithm(_) => TransportError::SigningFailed {
                server,
                reason: e.to_string(),
            },
            _ => {
                let reason = e.to_string();
                if reason.to_ascii_lowercase().contains("tsig") {
                    TransportError::VerificationFailed { server, reason }
                } else {
                    TransportError::Malformed { server, reason }
                }
            }
        }
    }

    fn client_error(&self, e: &ClientError) -> TransportError {
        match e.kind() {
            ClientErrorKind::Proto(proto) => self.proto_error(RESPONSE_STAGE, proto),
            ClientErrorKind::Timeout => self.timed_out(RESPONSE_STAGE),
            ClientErrorKind::Io(io) => TransportError::Io {
                server: self.server.clone(),
                stage: RESPONSE_STAGE,
                reason: io.to_string(),
            },
            _ => TransportError::Malformed {
                server: self.server.clone(),
                reason: e.to_string(),
            },
        }
    }

    fn check(&self, response: &Message) -> Result<(), ProtocolError> {
        check_response(response).map_err(|protocol_error| {
            error!(
                "Name server {} rejected request: {}",
                self.server, protocol_error
            );
            protocol_error
        })
    }

    /// Send `request` and wait for a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] for connection, framing and TSIG
    /// failures and [`ProviderError::Protocol`] for a non-success response code.
    pub async fn exchange(
        &self,
        request: Message,
        signer: Option<TSigner>,
    ) -> Result<(), ProviderError> {
        let session = self.connect(signer).await?;

        let response = session
            .client
            .send(request)
            .next()
            .await
            .ok_or_else(|| TransportError::UnexpectedEof {
                server: self.server.clone(),
            })?
            .map_err(|e| self.proto_error(RESPONSE_STAGE, &e))?;

        self.check(&response)?;
        Ok(())
    }

    /// Transfer `zone` and yield the records of each response envelope.
    ///
    /// The leading SOA is kept and the trailing SOA that ends the transfer is
    /// dropped. The stream ends after that SOA; any error ends it too, and the
    /// caller is expected to discard what it collected so far.
    pub fn transfer(
        &self,
        zone: &Name,
        signer: Option<TSigner>,
    ) -> impl Stream<Item = Result<Vec<Record>, ProviderError>> + Send + 'static {
        let transport = self.clone();
        let zone = zone.clone();

        stream::once(async move {
            let session = transport.connect(signer).await?;
            debug!("Started zone transfer of {}", zone);

            let mut client = session.client.clone();
            let envelopes = client.zone_transfer(zone.clone(), None).enumerate();
            Ok::<_, ProviderError>(envelopes.map(move |(index, response)| {
                // the connection lives as long as the envelope stream
                let _session = &session;
                transport.envelope_records(&zone, index, response)
            }))
        })
        .try_flatten()
    }

    fn envelope_records(
        &self,
        zone: &Name,
        index: usize,
        response: Result<DnsResponse, ClientError>,
    ) -> Result<Vec<Record>, ProviderError> {
        let response = response.map_err(|e| self.client_error(&e))?;
        self.check(&response)?;

        // only the SOA opening the first envelope is kept
        let records: Vec<Record> = response
            .answers()
            .iter()
            .enumerate()
            .filter(|(position, record)| {
                record.record_type() != RecordType::SOA || (index == 0 && *position == 0)
            })
            .map(|(_, record)| record.clone())
            .collect();

        debug!(
            "Zone transfer of {}: envelope {} with {} record(s)",
            zone,
            index + 1,
            records.len()
        );
        Ok(records)
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod transport_tests;
