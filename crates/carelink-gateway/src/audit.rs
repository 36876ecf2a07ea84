use std::time::Duration;

use anyhow::{Context, Result};
use ed25519_dalek::{Signer, SigningKey};
use serde::Deserialize;
use tracing::{debug, warn};

const LEDGER_TIMEOUT: Duration = Duration::from_secs(10);

/// Ledger text memos are short; longer payloads are cut at a char boundary.
const MEMO_MAX_BYTES: usize = 28;

/// Best-effort tamper-evident logging against an external distributed
/// ledger. Every failure — bad key, unreachable ledger, malformed response —
/// is absorbed here and never reaches the caller, who only ever sees an
/// optional receipt. Nothing user-facing may depend on that receipt.
pub struct AuditLedger {
    client: reqwest::Client,
    base_url: String,
    signing_key: SigningKey,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    sequence: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
}

impl AuditLedger {
    /// Build the sidecar from a hex-encoded ed25519 secret. Returns None on
    /// a malformed secret so the server runs with auditing disabled instead
    /// of refusing to start.
    pub fn new(base_url: String, secret_hex: &str) -> Option<Self> {
        let bytes = match hex::decode(secret_hex.trim()) {
            Ok(b) => b,
            Err(e) => {
                warn!("Audit ledger disabled: secret is not valid hex: {}", e);
                return None;
            }
        };
        let bytes: [u8; 32] = match bytes.try_into() {
            Ok(b) => b,
            Err(_) => {
                warn!("Audit ledger disabled: secret must be 32 bytes");
                return None;
            }
        };

        let client = match reqwest::Client::builder().timeout(LEDGER_TIMEOUT).build() {
            Ok(c) => c,
            Err(e) => {
                warn!("Audit ledger disabled: {}", e);
                return None;
            }
        };

        Some(Self {
            client,
            base_url,
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Submit one audit transaction carrying `memo`. Returns the receipt
    /// hash, or None on any failure.
    pub async fn try_audit(&self, memo: &str) -> Option<String> {
        match self.submit(memo).await {
            Ok(hash) => {
                debug!("Audit ledger receipt {}", hash);
                Some(hash)
            }
            Err(e) => {
                // Advisory logging only: swallow and move on.
                warn!("Audit ledger write skipped: {:#}", e);
                None
            }
        }
    }

    async fn submit(&self, memo: &str) -> Result<String> {
        let account_id = hex::encode(self.signing_key.verifying_key().as_bytes());

        // Load the account to learn the next sequence number
        let account: AccountResponse = self
            .client
            .get(format!("{}/accounts/{}", self.base_url, account_id))
            .send()
            .await
            .context("loading ledger account")?
            .error_for_status()
            .context("ledger account lookup")?
            .json()
            .await
            .context("parsing ledger account")?;

        let sequence: i64 = account
            .sequence
            .parse()
            .context("ledger account sequence is not numeric")?;

        // Minimal self-payment carrying the memo
        let tx = serde_json::json!({
            "source": account_id,
            "destination": account_id,
            "amount": "1",
            "sequence": sequence + 1,
            "memo": truncate_memo(memo),
        });

        let payload = serde_json::to_vec(&tx)?;
        let signature = self.signing_key.sign(&payload);

        let receipt: SubmitResponse = self
            .client
            .post(format!("{}/transactions", self.base_url))
            .json(&serde_json::json!({
                "tx": tx,
                "signature": hex::encode(signature.to_bytes()),
            }))
            .send()
            .await
            .context("submitting ledger transaction")?
            .error_for_status()
            .context("ledger transaction rejected")?
            .json()
            .await
            .context("parsing ledger receipt")?;

        Ok(receipt.hash)
    }
}

fn truncate_memo(memo: &str) -> &str {
    if memo.len() <= MEMO_MAX_BYTES {
        return memo;
    }
    let mut end = MEMO_MAX_BYTES;
    while !memo.is_char_boundary(end) {
        end -= 1;
    }
    &memo[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_secret_disables_auditing() {
        assert!(AuditLedger::new("http://localhost:1".into(), "not hex").is_none());
        assert!(AuditLedger::new("http://localhost:1".into(), "deadbeef").is_none());
    }

    #[test]
    fn well_formed_secret_is_accepted() {
        let secret = hex::encode([7u8; 32]);
        assert!(AuditLedger::new("http://localhost:1".into(), &secret).is_some());
    }

    #[tokio::test]
    async fn unreachable_ledger_yields_no_receipt() {
        let secret = hex::encode([7u8; 32]);
        let ledger = AuditLedger::new("http://127.0.0.1:1".into(), &secret).unwrap();
        assert!(ledger.try_audit("sms log").await.is_none());
    }

    #[test]
    fn memo_truncates_on_char_boundary() {
        let long = "x".repeat(40);
        assert_eq!(truncate_memo(&long).len(), MEMO_MAX_BYTES);

        let multibyte = "é".repeat(20); // 2 bytes each
        let cut = truncate_memo(&multibyte);
        assert!(cut.len() <= MEMO_MAX_BYTES);
        assert!(multibyte.starts_with(cut));
    }
}
