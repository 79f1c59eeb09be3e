//! v001 -- Initial schema creation.
//!
//! A single `slots` table: one row per named slot, value stored as JSON text.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS slots (
    name       TEXT PRIMARY KEY NOT NULL,
    json       TEXT NOT NULL,
    updated_at TEXT NOT NULL            -- RFC-3339
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
