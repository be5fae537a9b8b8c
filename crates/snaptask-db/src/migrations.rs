use rusqlite::Connection;

use crate::DbError;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    // Idempotent CREATE TABLE IF NOT EXISTS
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tasks (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            image_path   TEXT NOT NULL,
            title        TEXT NOT NULL,
            description  TEXT,
            due_date     TEXT,
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT NOT NULL
        );
        -- At most one task per screenshot; INSERT OR REPLACE in the insert
        -- path makes concurrent promotes of the same image converge.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_image_path
            ON tasks(image_path);
        CREATE INDEX IF NOT EXISTS idx_tasks_completed
            ON tasks(is_completed);
        ",
    )?;
    Ok(())
}
