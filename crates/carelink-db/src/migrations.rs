use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS patients (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            phone       TEXT NOT NULL,
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_patients_user
            ON patients(user_id);

        CREATE TABLE IF NOT EXISTS message_logs (
            id                  TEXT PRIMARY KEY,
            user_id             TEXT NOT NULL REFERENCES users(id),
            patient_id          TEXT NOT NULL REFERENCES patients(id),
            body                TEXT NOT NULL,
            status              TEXT NOT NULL,
            provider_message_id TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_logs_user
            ON message_logs(user_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_logs_provider
            ON message_logs(provider_message_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
