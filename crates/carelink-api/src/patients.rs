use anyhow::anyhow;
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;
use uuid::Uuid;

use carelink_types::api::{Claims, CreatePatientRequest, PatientResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_created_at;

pub async fn create_patient(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePatientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("patient name must not be empty".into()));
    }
    if !valid_phone(&req.phone) {
        return Err(ApiError::Validation(
            "phone must be 10-15 digits with an optional leading +".into(),
        ));
    }

    let patient_id = Uuid::new_v4();
    state
        .db
        .create_patient(&patient_id.to_string(), name, &req.phone, &claims.sub.to_string())?;

    // Read the row back so the response carries the stored timestamp, not a
    // second view of "now" that could disagree with later listings
    let row = state
        .db
        .get_patient_for_user(&patient_id.to_string(), &claims.sub.to_string())?
        .ok_or_else(|| ApiError::Internal(anyhow!("patient {} missing after insert", patient_id)))?;

    Ok((
        StatusCode::CREATED,
        Json(PatientResponse {
            id: patient_id,
            name: row.name,
            phone: row.phone,
            created_at: parse_created_at(&row.created_at, "patient"),
        }),
    ))
}

pub async fn list_patients(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_patients_for_user(&claims.sub.to_string())?;

    let patients: Vec<PatientResponse> = rows
        .into_iter()
        .map(|row| PatientResponse {
            id: row.id.parse().unwrap_or_else(|e| {
                warn!("Corrupt patient id '{}': {}", row.id, e);
                Uuid::default()
            }),
            created_at: parse_created_at(&row.created_at, "patient"),
            name: row.name,
            phone: row.phone,
        })
        .collect();

    Ok(Json(patients))
}

/// Optional leading `+`, then 10-15 digits, nothing else.
fn valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (10..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_plus_prefixed_numbers() {
        assert!(valid_phone("+15551234567"));
        assert!(valid_phone("0712345678"));
        assert!(valid_phone("123456789012345"));
    }

    #[test]
    fn rejects_bad_lengths_and_characters() {
        assert!(!valid_phone("123456789")); // 9 digits
        assert!(!valid_phone("1234567890123456")); // 16 digits
        assert!(!valid_phone("+1555123456a"));
        assert!(!valid_phone("555-123-4567"));
        assert!(!valid_phone("++15551234567"));
        assert!(!valid_phone(""));
        assert!(!valid_phone("+"));
    }
}
