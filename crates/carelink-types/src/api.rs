use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::DeliveryStatus;

// -- JWT Claims --

/// JWT claims shared between token issuance (auth handlers) and verification
/// (the auth middleware). Canonical definition lives here so both sides agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

// -- Patients --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePatientRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PatientResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Messaging --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendSmsRequest {
    pub patient_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendSmsResponse {
    pub log_id: Uuid,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
}

/// Webhook payload posted by the SMS provider. Field names follow the
/// provider's wire format; extra fields are tolerated.
#[derive(Debug, Deserialize)]
pub struct DeliveryReport {
    pub id: String,
    pub status: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(rename = "retryCount", default)]
    pub retry_count: u32,
}

/// Soft acknowledgment for the provider webhook. `status` is `"updated"` or
/// `"not_found"`; a miss is not an error so the provider does not retry.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeliveryReportAck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<DeliveryStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageLogResponse {
    pub id: Uuid,
    pub patient_name: String,
    pub phone: String,
    pub message: String,
    pub status: DeliveryStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Analytics --

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub total_messages: i64,
    pub delivered: i64,
    pub failed: i64,
    pub pending: i64,
    pub delivery_rate: f64,
}

// -- Health --

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}
