use axum::{Extension, Json, extract::State, response::IntoResponse};

use carelink_types::api::{AnalyticsResponse, Claims};

use crate::auth::AppState;
use crate::error::ApiError;

/// Per-user delivery stats over the message log. Pure read-side
/// aggregation; the `pending` bucket also counts `sent` rows still awaiting
/// a delivery callback.
pub async fn get_analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = state.db.count_statuses_for_user(&claims.sub.to_string())?;

    Ok(Json(AnalyticsResponse {
        delivery_rate: delivery_rate(counts.delivered, counts.total),
        total_messages: counts.total,
        delivered: counts.delivered,
        failed: counts.failed,
        pending: counts.pending,
    }))
}

/// Percentage of delivered messages, rounded to two decimal places; zero
/// when nothing has been sent.
fn delivery_rate(delivered: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (delivered as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_is_zero_rate() {
        assert_eq!(delivery_rate(0, 0), 0.0);
    }

    #[test]
    fn rate_rounds_to_two_decimals() {
        assert_eq!(delivery_rate(1, 1), 100.0);
        assert_eq!(delivery_rate(1, 3), 33.33);
        assert_eq!(delivery_rate(2, 3), 66.67);
        assert_eq!(delivery_rate(1, 2), 50.0);
    }
}
