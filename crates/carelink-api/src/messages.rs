use anyhow::anyhow;
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info, warn};
use uuid::Uuid;

use carelink_types::DeliveryStatus;
use carelink_types::api::{
    Claims, DeliveryReport, DeliveryReportAck, MessageLogResponse, SendSmsRequest, SendSmsResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_created_at;

const MAX_MESSAGE_CHARS: usize = 500;

/// Send an SMS to a caller-owned patient and append the attempt to the
/// message log. The log row is written in its initial lifecycle state
/// (`sent` on gateway acceptance, `failed` otherwise) — `pending` never
/// persists. A transport-level rejection is a normal `failed` entry; only an
/// uninterpretable adapter response surfaces as a gateway error.
pub async fn send_sms(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendSmsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.message.is_empty() || req.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::Validation(format!(
            "message must be 1-{} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    // Resolve the patient scoped to the caller; this is the ownership check
    // that keeps log.user_id consistent with patient.user_id
    let db = state.clone();
    let pid = req.patient_id.to_string();
    let uid = claims.sub.to_string();
    let patient = tokio::task::spawn_blocking(move || db.db.get_patient_for_user(&pid, &uid))
        .await
        .map_err(join_error)??
        .ok_or(ApiError::NotFound("Patient"))?;

    let dispatch = state
        .sms
        .send(&patient.phone, &req.message)
        .await
        .map_err(ApiError::Gateway)?;

    let status = if dispatch.accepted() {
        DeliveryStatus::Sent
    } else {
        DeliveryStatus::Failed
    };
    // No provider id is recorded for rejected sends, even if the provider
    // echoed one back
    let provider_message_id = if dispatch.accepted() {
        dispatch.provider_message_id.clone()
    } else {
        None
    };

    let log_id = Uuid::new_v4();
    let db = state.clone();
    let lid = log_id.to_string();
    let uid = claims.sub.to_string();
    let pid = patient.id.clone();
    let body = req.message.clone();
    let provider_id = provider_message_id.clone();
    tokio::task::spawn_blocking(move || {
        db.db
            .insert_message_log(&lid, &uid, &pid, &body, status, provider_id.as_deref())
    })
    .await
    .map_err(join_error)??;

    info!("Logged SMS {} to patient {} as {}", log_id, patient.id, status);

    // Fire-and-forget audit write; never on the request's critical path
    if let Some(audit) = &state.audit {
        let audit = audit.clone();
        tokio::spawn(async move {
            audit.try_audit("CareLink SMS log").await;
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(SendSmsResponse {
            log_id,
            status,
            cost: dispatch.cost,
        }),
    ))
}

/// Provider webhook: advance the matching log's status. A miss is a soft
/// acknowledgment, not an error — the provider may report on sends we never
/// logged, and a 2xx keeps it from retrying.
pub async fn delivery_report(
    State(state): State<AppState>,
    Json(report): Json<DeliveryReport>,
) -> Result<Json<DeliveryReportAck>, ApiError> {
    let status = DeliveryStatus::from_report(&report.status);

    let db = state.clone();
    let provider_id = report.id.clone();
    let updated =
        tokio::task::spawn_blocking(move || db.db.update_status_by_provider_id(&provider_id, status))
            .await
            .map_err(join_error)??;

    if updated {
        info!("Delivery report for {}: {} -> {}", report.id, report.status, status);
        Ok(Json(DeliveryReportAck {
            status: "updated".to_string(),
            message_id: Some(report.id),
            new_status: Some(status),
        }))
    } else {
        info!("Delivery report for unknown provider id {}", report.id);
        Ok(Json(DeliveryReportAck {
            status: "not_found".to_string(),
            message_id: None,
            new_status: None,
        }))
    }
}

pub async fn get_logs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.list_logs_for_user(&uid))
        .await
        .map_err(join_error)??;

    let logs: Vec<MessageLogResponse> = rows
        .into_iter()
        .map(|row| MessageLogResponse {
            id: row.id.parse().unwrap_or_else(|e| {
                warn!("Corrupt log id '{}': {}", row.id, e);
                Uuid::default()
            }),
            status: DeliveryStatus::parse(&row.status).unwrap_or_else(|| {
                warn!("Corrupt status '{}' on log '{}'", row.status, row.id);
                DeliveryStatus::Unknown
            }),
            created_at: parse_created_at(&row.created_at, "message log"),
            patient_name: row.patient_name,
            phone: row.phone,
            message: row.body,
        })
        .collect();

    Ok(Json(logs))
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {}", e);
    ApiError::Internal(anyhow!("blocking task failed: {}", e))
}
