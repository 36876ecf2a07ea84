/// Database row types — these map directly to SQLite rows.
/// Distinct from carelink-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct PatientRow {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub user_id: String,
    pub created_at: String,
}

pub struct MessageLogRow {
    pub id: String,
    pub user_id: String,
    pub patient_id: String,
    pub body: String,
    pub status: String,
    pub provider_message_id: Option<String>,
    pub created_at: String,
}

/// Log row joined with the patient it was sent to, for the log listing.
pub struct MessageLogJoined {
    pub id: String,
    pub patient_name: String,
    pub phone: String,
    pub body: String,
    pub status: String,
    pub created_at: String,
}

/// Per-user status counts for the analytics endpoint.
pub struct DeliveryCounts {
    pub total: i64,
    pub delivered: i64,
    pub failed: i64,
    pub pending: i64,
}
