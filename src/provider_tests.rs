// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for provider configuration and request validation.

#[cfg(test)]
mod tests {
    use crate::constants::DEFAULT_TIMEOUT_SECS;
    use crate::dns_errors::{ProviderError, TsigError};
    use crate::layout::{FieldLayout, FieldLayouts};
    use crate::provider::Provider;
    use crate::record::Record;
    use std::time::Duration;

    // nothing listens here; reaching the network would fail with a transport error
    const UNREACHABLE: &str = "127.0.0.1:1";

    #[test]
    fn test_deserialize_defaults() {
        let provider: Provider = serde_json::from_str(r#"{"server": "10.0.0.1:53"}"#).unwrap();
        assert_eq!(provider.server, "10.0.0.1:53");
        assert_eq!(provider.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(provider.key_name.is_empty());
        assert_eq!(provider, Provider::new("10.0.0.1:53"));
    }

    #[test]
    fn test_deserialize_full_config() {
        let provider: Provider = serde_json::from_str(
            r#"{
                "key_name": "update-key",
                "key_alg": "hmac-sha512",
                "key": "c2VjcmV0",
                "server": "ns1.example.com:53",
                "timeout_secs": 3
            }"#,
        )
        .unwrap();
        assert_eq!(provider.key_alg, "hmac-sha512");
        assert_eq!(provider.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_builders() {
        let provider = Provider::new("ns1")
            .with_key("k", "hmac-sha1", "c2VjcmV0")
            .with_timeout(Duration::from_secs(7))
            .with_layouts(FieldLayouts::empty().with("MX", FieldLayout::NONE));
        assert_eq!(provider.key_name, "k");
        assert_eq!(provider.timeout_secs, 7);
        assert_eq!(provider.converter().layouts().get("MX"), FieldLayout::NONE);
    }

    #[test]
    fn test_no_key_means_unsigned() {
        let provider = Provider::new("10.0.0.1");
        assert!(provider.signer().unwrap().is_none());
    }

    #[test]
    fn test_key_defaults_to_hmac_sha256() {
        let provider = Provider::new("10.0.0.1").with_key("k", "", "c2VjcmV0LWtleQ==");
        assert!(provider.signer().unwrap().is_some());
    }

    #[test]
    fn test_bad_key_is_reported() {
        let provider = Provider::new("10.0.0.1").with_key("k", "hmac-sha256", "%%%");
        let err = provider.signer().err().unwrap();
        assert!(matches!(err, ProviderError::Tsig(TsigError::InvalidSecret { .. })));
        assert_eq!(err.reason(), "InvalidTsigSecret");
    }

    #[tokio::test]
    async fn test_invalid_record_fails_before_network() {
        let provider = Provider::new(UNREACHABLE);
        let records = [
            Record::new("ok", "A", Duration::from_secs(60), "192.0.2.1"),
            Record::new("broken", "A", Duration::from_secs(60), "nope"),
        ];

        for result in [
            provider.set_records("example.com", &records).await,
            provider.append_records("example.com", &records).await,
            provider.delete_records("example.com", &records).await,
        ] {
            match result.unwrap_err() {
                ProviderError::Conversion(e) => assert_eq!(e.name, "broken"),
                other => panic!("expected conversion error, got {other}"),
            }
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient() {
        let provider = Provider::new(UNREACHABLE).with_timeout(Duration::from_secs(2));
        let err = provider.get_records("example.com").await.unwrap_err();
        assert!(err.is_transient(), "{err}");
    }

    #[tokio::test]
    async fn test_empty_server_is_rejected() {
        let provider = Provider::default();
        let err = provider.get_records("example.com").await.unwrap_err();
        assert_eq!(err.reason(), "InvalidServer");
    }
}
