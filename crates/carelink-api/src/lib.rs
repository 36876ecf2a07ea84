pub mod analytics;
pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod patients;

use chrono::{DateTime, Utc};
use tracing::warn;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; corrupt values degrade to the epoch with
/// a warning instead of failing the whole listing.
pub(crate) fn parse_created_at(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}
