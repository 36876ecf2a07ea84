use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a logged message.
///
/// A log row is created directly in `Sent` or `Failed` depending on the
/// gateway's acceptance code; `Pending` only exists conceptually before the
/// row is written. `Delivered` and `Failed` are terminal, `Sent` awaits a
/// delivery callback, and `Unknown` records a callback status we don't map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
    Unknown,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DeliveryStatus::Pending),
            "sent" => Some(DeliveryStatus::Sent),
            "delivered" => Some(DeliveryStatus::Delivered),
            "failed" => Some(DeliveryStatus::Failed),
            "unknown" => Some(DeliveryStatus::Unknown),
            _ => None,
        }
    }

    /// Map a provider delivery-callback status onto the lifecycle.
    /// Anything outside the provider's documented vocabulary lands in
    /// `Unknown` rather than being rejected.
    pub fn from_report(provider_status: &str) -> Self {
        match provider_status {
            "Success" => DeliveryStatus::Delivered,
            "Sent" => DeliveryStatus::Sent,
            "Failed" | "Rejected" => DeliveryStatus::Failed,
            _ => DeliveryStatus::Unknown,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_mapping_follows_provider_vocabulary() {
        assert_eq!(DeliveryStatus::from_report("Success"), DeliveryStatus::Delivered);
        assert_eq!(DeliveryStatus::from_report("Sent"), DeliveryStatus::Sent);
        assert_eq!(DeliveryStatus::from_report("Failed"), DeliveryStatus::Failed);
        assert_eq!(DeliveryStatus::from_report("Rejected"), DeliveryStatus::Failed);
    }

    #[test]
    fn unrecognized_report_maps_to_unknown() {
        assert_eq!(DeliveryStatus::from_report("Buffered"), DeliveryStatus::Unknown);
        assert_eq!(DeliveryStatus::from_report(""), DeliveryStatus::Unknown);
    }

    #[test]
    fn column_text_round_trips() {
        for status in [
            DeliveryStatus::Pending,
            DeliveryStatus::Sent,
            DeliveryStatus::Delivered,
            DeliveryStatus::Failed,
            DeliveryStatus::Unknown,
        ] {
            assert_eq!(DeliveryStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(DeliveryStatus::parse("queued"), None);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&DeliveryStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");
    }
}
