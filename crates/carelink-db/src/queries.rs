use crate::Database;
use crate::models::{DeliveryCounts, MessageLogJoined, MessageLogRow, PatientRow, UserRow};
use anyhow::Result;
use carelink_types::DeliveryStatus;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, name: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password_hash) VALUES (?1, ?2, ?3, ?4)",
                (id, name, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?1",
            )?;
            stmt.query_row([id], map_user_row).optional()
        })
    }

    // -- Patients --

    pub fn create_patient(&self, id: &str, name: &str, phone: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO patients (id, name, phone, user_id) VALUES (?1, ?2, ?3, ?4)",
                (id, name, phone, user_id),
            )?;
            Ok(())
        })
    }

    pub fn list_patients_for_user(&self, user_id: &str) -> Result<Vec<PatientRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, phone, user_id, created_at FROM patients
                 WHERE user_id = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([user_id], map_patient_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Ownership-scoped lookup: the caller only ever sees patients it owns.
    /// Every send path goes through this, which is what enforces the
    /// patient.user_id == log.user_id invariant at log creation.
    pub fn get_patient_for_user(&self, patient_id: &str, user_id: &str) -> Result<Option<PatientRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, phone, user_id, created_at FROM patients
                 WHERE id = ?1 AND user_id = ?2",
            )?;
            stmt.query_row([patient_id, user_id], map_patient_row).optional()
        })
    }

    // -- Message logs --

    pub fn insert_message_log(
        &self,
        id: &str,
        user_id: &str,
        patient_id: &str,
        body: &str,
        status: DeliveryStatus,
        provider_message_id: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO message_logs (id, user_id, patient_id, body, status, provider_message_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, user_id, patient_id, body, status.as_str(), provider_message_id],
            )?;
            Ok(())
        })
    }

    pub fn list_logs_for_user(&self, user_id: &str) -> Result<Vec<MessageLogJoined>> {
        self.with_conn(|conn| query_logs_joined(conn, user_id))
    }

    pub fn get_log_by_provider_id(&self, provider_message_id: &str) -> Result<Option<MessageLogRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, patient_id, body, status, provider_message_id, created_at
                 FROM message_logs WHERE provider_message_id = ?1",
            )?;
            stmt.query_row([provider_message_id], map_log_row).optional()
        })
    }

    /// Apply a delivery callback: overwrite the status of the log matching
    /// the provider message id. Returns false when no log matches (the
    /// webhook may reference a send we never recorded).
    ///
    /// Deliberately not monotonic — a later callback wins even if it moves
    /// the status backwards (delivered -> failed). Last write wins.
    pub fn update_status_by_provider_id(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE message_logs SET status = ?1 WHERE provider_message_id = ?2",
                rusqlite::params![status.as_str(), provider_message_id],
            )?;
            Ok(updated > 0)
        })
    }

    pub fn count_statuses_for_user(&self, user_id: &str) -> Result<DeliveryCounts> {
        self.with_conn(|conn| {
            let counts = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN status = 'delivered' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN status IN ('pending', 'sent') THEN 1 ELSE 0 END), 0)
                 FROM message_logs WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(DeliveryCounts {
                        total: row.get(0)?,
                        delivered: row.get(1)?,
                        failed: row.get(2)?,
                        pending: row.get(3)?,
                    })
                },
            )?;
            Ok(counts)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?1",
    )?;
    stmt.query_row([email], map_user_row).optional()
}

fn query_logs_joined(conn: &Connection, user_id: &str) -> Result<Vec<MessageLogJoined>> {
    // JOIN patients to fetch name/phone in a single query (eliminates N+1).
    // rowid breaks ties between logs written within the same second.
    let mut stmt = conn.prepare(
        "SELECT m.id, p.name, p.phone, m.body, m.status, m.created_at
         FROM message_logs m
         JOIN patients p ON m.patient_id = p.id
         WHERE m.user_id = ?1
         ORDER BY m.created_at DESC, m.rowid DESC",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(MessageLogJoined {
                id: row.get(0)?,
                patient_name: row.get(1)?,
                phone: row.get(2)?,
                body: row.get(3)?,
                status: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_log_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageLogRow> {
    Ok(MessageLogRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        patient_id: row.get(2)?,
        body: row.get(3)?,
        status: row.get(4)?,
        provider_message_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
