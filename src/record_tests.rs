// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the generic record model.

#[cfg(test)]
mod tests {
    use crate::record::Record;
    use std::time::Duration;

    #[test]
    fn test_display_uses_at_for_apex() {
        let record = Record::new("", "A", Duration::from_secs(300), "192.0.2.1");
        assert_eq!(record.to_string(), "@ 300 A 192.0.2.1");
    }

    #[test]
    fn test_builders_set_fields() {
        let record = Record::new("_sip._tcp", "SRV", Duration::from_secs(60), "10 20 5060 sip.example.com.")
            .with_priority(10)
            .with_weight(20);
        assert_eq!(record.priority, Some(10));
        assert_eq!(record.weight, Some(20));
        assert!(record.target.is_none());
        assert!(!record.has_no_fields());
        assert!(Record::default().has_no_fields());
    }

    #[test]
    fn test_ttl_secs_truncates_and_clamps() {
        let record = Record::new("a", "A", Duration::from_millis(1500), "192.0.2.1");
        assert_eq!(record.ttl_secs(), 1);

        let huge = Record::new("a", "A", Duration::from_secs(u64::from(u32::MAX) + 10), "192.0.2.1");
        assert_eq!(huge.ttl_secs(), u32::MAX);
    }

    #[test]
    fn test_json_shape() {
        let record = Record::new("mx", "MX", Duration::from_secs(150), "10 mail.example.com.")
            .with_priority(10);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["name"], "mx");
        assert_eq!(json["type"], "MX");
        assert_eq!(json["ttl"], 150);
        assert_eq!(json["value"], "10 mail.example.com.");
        assert_eq!(json["priority"], 10);
        assert!(json.get("weight").is_none());
        assert!(json.get("target").is_none());
    }

    #[test]
    fn test_json_defaults_for_delete_input() {
        let record: Record = serde_json::from_str(r#"{"name": "old"}"#).unwrap();
        assert_eq!(record.name, "old");
        assert!(record.rtype.is_empty());
        assert!(record.value.is_empty());
        assert_eq!(record.ttl, Duration::ZERO);
    }
}
