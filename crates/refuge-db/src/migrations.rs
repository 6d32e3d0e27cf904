use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS directors (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS reports (
            id               TEXT PRIMARY KEY,
            name             TEXT NOT NULL,
            email            TEXT NOT NULL,
            phone            TEXT NOT NULL,
            abuse_type       TEXT NOT NULL,
            description      TEXT NOT NULL,
            sex              TEXT,
            work_position    TEXT,
            education_level  TEXT,
            job_type         TEXT,
            incident_time    TEXT,
            incident_place   TEXT,
            incident_day     TEXT,
            image            TEXT,
            created_at       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_reports_created
            ON reports(created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
