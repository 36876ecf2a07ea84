use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

/// Provider status code meaning the gateway accepted the message for
/// delivery. Anything else is an immediate rejection.
pub const GATEWAY_ACCEPTED: u16 = 101;

/// Synthetic status code recorded when the provider could not be reached at
/// all. Transport faults are rejections, not errors — see [`SmsGateway`].
const GATEWAY_UNREACHABLE: u16 = 0;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one send attempt as reported by the provider.
#[derive(Debug, Clone)]
pub struct SmsDispatch {
    pub provider_message_id: Option<String>,
    pub status_code: u16,
    pub cost: Option<String>,
}

impl SmsDispatch {
    pub fn accepted(&self) -> bool {
        self.status_code == GATEWAY_ACCEPTED
    }

    fn rejected(status_code: u16) -> Self {
        Self {
            provider_message_id: None,
            status_code,
            cost: None,
        }
    }
}

/// Contract with the SMS provider. Implementations must bound their own
/// latency and must not surface transport failures as errors: an unreachable
/// gateway is a rejection dispatch. The only `Err` path is a response the
/// provider did send but we cannot interpret.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone: &str, body: &str) -> Result<SmsDispatch>;
}

/// Deterministic-shape stand-in for the real provider: always accepts, with
/// a fresh provider message id. Used in development when no API key is
/// configured, and as the default gateway in tests.
pub struct MockGateway;

#[async_trait]
impl SmsGateway for MockGateway {
    async fn send(&self, phone: &str, _body: &str) -> Result<SmsDispatch> {
        let provider_message_id = format!("ATXid_{}", rand::rng().random_range(100_000..=999_999));
        debug!("Mock gateway accepted send to {} as {}", phone, provider_message_id);
        Ok(SmsDispatch {
            provider_message_id: Some(provider_message_id),
            status_code: GATEWAY_ACCEPTED,
            cost: Some("KES 0.8000".to_string()),
        })
    }
}

/// Real provider integration (Africa's-Talking-style bulk messaging API).
pub struct HttpGateway {
    client: reqwest::Client,
    url: String,
    username: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    #[serde(rename = "SMSMessageData")]
    sms_message_data: ProviderMessageData,
}

#[derive(Debug, Deserialize)]
struct ProviderMessageData {
    #[serde(rename = "Recipients")]
    recipients: Vec<ProviderRecipient>,
}

#[derive(Debug, Deserialize)]
struct ProviderRecipient {
    #[serde(rename = "statusCode")]
    status_code: u16,
    #[serde(rename = "messageId")]
    message_id: Option<String>,
    cost: Option<String>,
}

impl HttpGateway {
    pub fn new(url: String, username: String, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .context("building SMS gateway HTTP client")?;
        Ok(Self {
            client,
            url,
            username,
            api_key,
        })
    }
}

#[async_trait]
impl SmsGateway for HttpGateway {
    async fn send(&self, phone: &str, body: &str) -> Result<SmsDispatch> {
        let response = self
            .client
            .post(&self.url)
            .header("apiKey", &self.api_key)
            .header("Accept", "application/json")
            .form(&[
                ("username", self.username.as_str()),
                ("to", phone),
                ("message", body),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                // Timeout or connection fault: the provider never saw the
                // message, which the caller records as a failed send.
                warn!("SMS gateway unreachable: {}", e);
                return Ok(SmsDispatch::rejected(GATEWAY_UNREACHABLE));
            }
        };

        if !response.status().is_success() {
            warn!("SMS gateway returned HTTP {}", response.status());
            return Ok(SmsDispatch::rejected(GATEWAY_UNREACHABLE));
        }

        let parsed: ProviderResponse = response
            .json()
            .await
            .context("parsing SMS gateway response body")?;

        let recipient = parsed
            .sms_message_data
            .recipients
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("SMS gateway response contained no recipients"))?;

        Ok(SmsDispatch {
            provider_message_id: recipient.message_id,
            status_code: recipient.status_code,
            cost: recipient.cost,
        })
    }
}
