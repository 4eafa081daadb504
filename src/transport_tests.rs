// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the TCP transport.

#[cfg(test)]
mod tests {
    use crate::dns_errors::{ProviderError, TransportError};
    use crate::message;
    use crate::transport::*;
    use futures::StreamExt;
    use hickory_proto::op::{Edns, Message, MessageType, ResponseCode};
    use hickory_proto::rr::rdata::opt::EdnsOption;
    use hickory_proto::rr::Name;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn refused_with_ede(code: u16, text: &str) -> Message {
        let mut data = code.to_be_bytes().to_vec();
        data.extend_from_slice(text.as_bytes());

        let mut edns = Edns::new();
        edns.options_mut().insert(EdnsOption::Unknown(15, data));

        let mut response = Message::new();
        response
            .set_message_type(MessageType::Response)
            .set_response_code(ResponseCode::Refused);
        response.set_edns(edns);
        response
    }

    #[test]
    fn test_check_response_success() {
        let response = Message::new();
        assert!(check_response(&response).is_ok());
    }

    #[test]
    fn test_check_response_rcode_only() {
        let mut response = Message::new();
        response.set_response_code(ResponseCode::NotAuth);
        let err = check_response(&response).unwrap_err();
        assert_eq!(err.rcode, 9);
        assert_eq!(err.to_string(), "dns response error code \"NOTAUTH\" (9)");
    }

    #[test]
    fn test_check_response_with_extended_error() {
        let response = refused_with_ede(18, "zone is frozen");
        let err = check_response(&response).unwrap_err();
        assert_eq!(err.rcode_name, "REFUSED");
        assert_eq!(err.extended.len(), 1);
        assert_eq!(
            err.to_string(),
            "dns response error code \"REFUSED\" (5): Prohibited (18): zone is frozen"
        );
    }

    #[test]
    fn test_extended_error_survives_wire_encoding() {
        let bytes = refused_with_ede(20, "not primary").to_vec().unwrap();
        let decoded = Message::from_vec(&bytes).unwrap();
        let err = check_response(&decoded).unwrap_err();
        assert!(err.to_string().ends_with("Not Authoritative (20): not primary"));
    }

    #[test]
    fn test_decode_ede() {
        assert_eq!(decode_ede(&[0, 18]), Some((18, String::new())));
        assert_eq!(
            decode_ede(&[0, 3, b'o', b'l', b'd', 0]),
            Some((3, "old".to_string()))
        );
        assert_eq!(decode_ede(&[1]), None);
    }

    #[test]
    fn test_server_address() {
        assert_eq!(server_address("10.0.0.1").unwrap(), "10.0.0.1:53");
        assert_eq!(server_address("10.0.0.1:5353").unwrap(), "10.0.0.1:5353");
        assert_eq!(server_address("::1").unwrap(), "[::1]:53");
        assert_eq!(server_address("[::1]:5353").unwrap(), "[::1]:5353");
        assert_eq!(server_address("ns1.example.com").unwrap(), "ns1.example.com:53");
        assert_eq!(
            server_address("ns1.example.com:8053").unwrap(),
            "ns1.example.com:8053"
        );
        assert!(matches!(
            server_address("  "),
            Err(TransportError::InvalidServer { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_failure_is_transient() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = Transport::new(&addr.to_string(), Duration::from_secs(2)).unwrap();
        let request = message::insert_only(&Name::from_ascii("example.com.").unwrap(), &[]);
        let err = transport.exchange(request, None).await.unwrap_err();

        assert!(matches!(
            err,
            ProviderError::Transport(TransportError::ConnectFailed { .. })
        ));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            // hold the connection open without answering
            let _ = conn.read_to_end(&mut buf).await;
        });

        let transport = Transport::new(&addr.to_string(), Duration::from_secs(1)).unwrap();
        let request = message::insert_only(&Name::from_ascii("example.com.").unwrap(), &[]);
        let err = transport.exchange(request, None).await.unwrap_err();

        assert!(matches!(
            err,
            ProviderError::Transport(TransportError::Timeout {
                stage: "waiting for a response from",
                timeout_secs: 1,
                ..
            })
        ));
        server.abort();
    }

    #[tokio::test]
    async fn test_closed_before_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut len = [0u8; 2];
            conn.read_exact(&mut len).await.unwrap();
            let mut body = vec![0u8; usize::from(u16::from_be_bytes(len))];
            conn.read_exact(&mut body).await.unwrap();
            conn.shutdown().await.unwrap();
        });

        let transport = Transport::new(&addr.to_string(), Duration::from_secs(2)).unwrap();
        let request = message::insert_only(&Name::from_ascii("example.com.").unwrap(), &[]);
        let err = transport.exchange(request, None).await.unwrap_err();

        assert!(matches!(
            err,
            ProviderError::Transport(TransportError::UnexpectedEof { .. })
        ));
    }

    #[tokio::test]
    async fn test_mismatched_response_id_is_ignored() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut len = [0u8; 2];
            conn.read_exact(&mut len).await.unwrap();
            let mut body = vec![0u8; usize::from(u16::from_be_bytes(len))];
            conn.read_exact(&mut body).await.unwrap();

            let request = Message::from_vec(&body).unwrap();
            let mut response = Message::new();
            response
                .set_id(request.id().wrapping_add(1))
                .set_message_type(MessageType::Response);
            let bytes = response.to_vec().unwrap();
            let len = u16::try_from(bytes.len()).unwrap().to_be_bytes();
            conn.write_all(&len).await.unwrap();
            conn.write_all(&bytes).await.unwrap();

            let mut rest = Vec::new();
            let _ = conn.read_to_end(&mut rest).await;
        });

        let transport = Transport::new(&addr.to_string(), Duration::from_secs(1)).unwrap();
        let request = message::insert_only(&Name::from_ascii("example.com.").unwrap(), &[]);
        let err = transport.exchange(request, None).await.unwrap_err();

        assert!(matches!(
            err,
            ProviderError::Transport(TransportError::Timeout {
                timeout_secs: 1,
                ..
            })
        ));
        assert!(err.is_transient());
        server.abort();
    }

    #[tokio::test]
    async fn test_transfer_connect_failure_ends_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = Transport::new(&addr.to_string(), Duration::from_secs(2)).unwrap();
        let results: Vec<_> = transport
            .transfer(&Name::from_ascii("example.com.").unwrap(), None)
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(ProviderError::Transport(TransportError::ConnectFailed { .. }))
        ));
    }
}
