use rusqlite::{params, OptionalExtension, Row};

use snaptask_core::Task;

use crate::{Db, DbError};

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        image_path: row.get("image_path")?,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        is_completed: row.get("is_completed")?,
        created_at: row.get("created_at")?,
    })
}

impl Db {
    /// Full listing: incomplete before complete, then ascending due date with
    /// nulls last.
    pub fn get_all_tasks(&self) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM tasks
                 ORDER BY is_completed ASC, due_date IS NULL ASC, due_date ASC, id ASC",
            )?;
            let tasks = stmt
                .query_map([], row_to_task)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>, DbError> {
        self.with_conn(|conn| {
            let task = conn
                .query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .optional()?;
            Ok(task)
        })
    }

    pub fn get_task_by_path(&self, path: &str) -> Result<Option<Task>, DbError> {
        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    "SELECT * FROM tasks WHERE image_path = ?1 LIMIT 1",
                    params![path],
                    row_to_task,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// Upsert. A task with id 0 gets a fresh id; an existing id replaces that
    /// row. The unique index on `image_path` makes a second insert for the
    /// same image replace the first row rather than duplicate it.
    pub fn insert_task(&self, task: &Task) -> Result<i64, DbError> {
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tasks
                    (id, image_path, title, description, due_date, is_completed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    (task.id != 0).then_some(task.id),
                    task.image_path,
                    task.title,
                    task.description,
                    task.due_date,
                    task.is_completed,
                    task.created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        self.mark_changed();
        Ok(id)
    }

    /// Returns the number of rows affected (0 when the id is unknown).
    pub fn update_task(&self, task: &Task) -> Result<usize, DbError> {
        let changed = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET
                    image_path = ?1, title = ?2, description = ?3,
                    due_date = ?4, is_completed = ?5, created_at = ?6
                 WHERE id = ?7",
                params![
                    task.image_path,
                    task.title,
                    task.description,
                    task.due_date,
                    task.is_completed,
                    task.created_at,
                    task.id,
                ],
            )?;
            Ok(changed)
        })?;
        if changed > 0 {
            self.mark_changed();
        }
        Ok(changed)
    }

    pub fn delete_task(&self, task: &Task) -> Result<usize, DbError> {
        let changed = self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task.id])?;
            Ok(changed)
        })?;
        if changed > 0 {
            self.mark_changed();
        }
        Ok(changed)
    }

    pub fn get_completed_tasks(&self) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks WHERE is_completed = 1")?;
            let tasks = stmt
                .query_map([], row_to_task)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    pub fn delete_completed_tasks(&self) -> Result<usize, DbError> {
        let changed = self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE is_completed = 1", [])?;
            Ok(changed)
        })?;
        if changed > 0 {
            self.mark_changed();
        }
        Ok(changed)
    }
}
