use crate::error::Result;
use crate::models::{Color, Task};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::Path;

const TASK_COLUMNS: &str = "id, content, position, color, label, due_date, completion_note,
                            requires_id, context, created_at, completed_at";

/// Columns added after the first schema, with their definitions.
/// Rows that predate a column read it as absent (or its default).
const ADDITIVE_COLUMNS: &[(&str, &str)] = &[
    ("color", "TEXT DEFAULT 'default'"),
    ("label", "TEXT"),
    ("due_date", "TEXT"),
    ("completion_note", "TEXT"),
    ("requires_id", "INTEGER"),
    ("context", "TEXT"),
];

const LEGACY_TABLE: &str = "task";

/// Database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) and migrate the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL keeps readers off the writer's lock
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Database { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize the schema and add any missing columns
    pub fn init(&self) -> Result<()> {
        self.adopt_legacy_table()?;
        self.create_tables()?;
        self.migrate()?;
        self.create_indexes()?;
        Ok(())
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%S', 'now')),
                completed_at TEXT
            )",
            [],
        )?;
        Ok(())
    }

    /// Stores written by the earlier web app keep their rows in a table
    /// named `task`; rename it so the additive migration picks it up.
    fn adopt_legacy_table(&self) -> Result<()> {
        if self.table_exists("tasks")? || !self.table_exists(LEGACY_TABLE)? {
            return Ok(());
        }
        tracing::info!(from = LEGACY_TABLE, "adopting legacy task table");
        self.conn
            .execute(&format!("ALTER TABLE {LEGACY_TABLE} RENAME TO tasks"), [])?;
        Ok(())
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn migrate(&self) -> Result<()> {
        let existing = self.column_names("tasks")?;
        for (name, definition) in ADDITIVE_COLUMNS {
            if !existing.iter().any(|c| c == name) {
                tracing::info!(column = *name, "adding missing column to tasks");
                self.conn.execute(
                    &format!("ALTER TABLE tasks ADD COLUMN {name} {definition}"),
                    [],
                )?;
            }
        }
        Ok(())
    }

    fn create_indexes(&self) -> Result<()> {
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_position ON tasks(position)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_requires_id ON tasks(requires_id)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_completed_at ON tasks(completed_at)",
            [],
        )?;
        Ok(())
    }

    fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT name FROM pragma_table_info('{table}')"))?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        names
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }

    /// Run `f` inside one immediate transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls back every write made
    /// through this handle since the transaction began.
    pub fn atomically<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // ==================== Task Operations ====================

    #[allow(clippy::too_many_arguments)]
    pub fn create_task(
        &self,
        content: &str,
        position: i64,
        color: Color,
        label: Option<&str>,
        due_date: Option<&str>,
        context: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO tasks (content, position, color, label, due_date, context, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                content,
                position,
                color.as_str(),
                label,
                due_date,
                context,
                created_at.to_rfc3339(),
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        self.conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                [id],
                task_from_row,
            )
            .optional()
            .map_err(|e| e.into())
    }

    pub fn task_exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM tasks WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// All tasks in store order (by id)
    pub fn get_all_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"))?;

        let tasks = stmt.query_map([], task_from_row)?;
        tasks
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }

    pub fn get_tasks_with_label(&self, label: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE label = ?1 ORDER BY id"
        ))?;

        let tasks = stmt.query_map([label], task_from_row)?;
        tasks
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }

    /// Active tasks in store order (by id); callers sort by position
    pub fn get_active_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE completed_at IS NULL ORDER BY id"
        ))?;

        let tasks = stmt.query_map([], task_from_row)?;
        tasks
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }

    /// Minimum position over every task, completed ones included
    pub fn min_position(&self) -> Result<Option<i64>> {
        let min: Option<i64> =
            self.conn
                .query_row("SELECT MIN(position) FROM tasks", [], |row| row.get(0))?;
        Ok(min)
    }

    pub fn distinct_labels(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT label FROM tasks
             WHERE label IS NOT NULL AND label != ''
             ORDER BY label",
        )?;

        let labels = stmt.query_map([], |row| row.get::<_, String>(0))?;
        labels
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }

    pub fn update_position(&self, id: i64, position: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE tasks SET position = ?1 WHERE id = ?2",
            (position, id),
        )?;
        Ok(rows > 0)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_task(
        &self,
        id: i64,
        content: &str,
        color: Color,
        label: Option<&str>,
        due_date: Option<&str>,
        requires_id: Option<i64>,
        context: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks
             SET content = ?1, color = ?2, label = ?3, due_date = ?4, requires_id = ?5, context = ?6
             WHERE id = ?7",
            (
                content,
                color.as_str(),
                label,
                due_date,
                requires_id,
                context,
                id,
            ),
        )?;
        Ok(())
    }

    pub fn set_completion_note(&self, id: i64, note: Option<&str>) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET completion_note = ?1 WHERE id = ?2",
            (note, id),
        )?;
        Ok(())
    }

    pub fn mark_completed(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET completed_at = ?1 WHERE id = ?2",
            (at.to_rfc3339(), id),
        )?;
        Ok(())
    }

    /// Back to active: completion time and note are dropped, position replaced
    pub fn mark_active(&self, id: i64, position: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET completed_at = NULL, completion_note = NULL, position = ?1
             WHERE id = ?2",
            (position, id),
        )?;
        Ok(())
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    // ==================== Dependency Operations ====================

    /// Ids of tasks whose `requires_id` points at `id`
    pub fn get_dependents(&self, id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM tasks WHERE requires_id = ?1 ORDER BY id")?;

        let ids = stmt.query_map([id], |row| row.get::<_, i64>(0))?;
        ids.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }

    /// Clear every `requires_id` pointing at `id`; returns rows touched
    pub fn clear_requirements_on(&self, id: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE tasks SET requires_id = NULL WHERE requires_id = ?1",
            [id],
        )?;
        Ok(rows)
    }

    pub fn get_completed_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM tasks WHERE completed_at IS NOT NULL ORDER BY id")?;

        let ids = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        ids.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }
}

// ==================== Row Parsers ====================

fn task_from_row(row: &Row) -> std::result::Result<Task, rusqlite::Error> {
    let color: Option<String> = row.get(3)?;
    let completed_at = row
        .get::<_, Option<String>>(10)?
        .map(parse_datetime)
        .transpose()?;
    // Legacy rows may lack a creation time
    let created_at = match row.get::<_, Option<String>>(9)? {
        Some(s) => parse_datetime(s)?,
        None => completed_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    };

    Ok(Task {
        id: row.get(0)?,
        content: row.get(1)?,
        position: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
        color: Color::parse_or_default(color.as_deref()),
        label: row.get(4)?,
        due_date: row.get(5)?,
        completion_note: row.get(6)?,
        requires_id: row.get(7)?,
        context: row.get(8)?,
        created_at,
        completed_at,
    })
}

fn parse_datetime(s: String) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Naive timestamps (older rows, SQLite defaults) are taken as UTC
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, format) {
            return Ok(DateTime::from_naive_utc_and_offset(ndt, Utc));
        }
    }
    Err(rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Cannot parse datetime: {s}"),
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path().join("test.db")).unwrap();
        (db, temp_dir)
    }

    fn insert(db: &Database, content: &str, position: i64) -> i64 {
        db.create_task(content, position, Color::Default, None, None, None, Utc::now())
            .unwrap()
    }

    #[test]
    fn test_min_position_empty() {
        let (db, _temp) = setup();
        assert_eq!(db.min_position().unwrap(), None);
    }

    #[test]
    fn test_min_position_includes_completed() {
        let (db, _temp) = setup();
        insert(&db, "a", 4);
        let b = insert(&db, "b", -3);
        db.mark_completed(b, Utc::now()).unwrap();
        assert_eq!(db.min_position().unwrap(), Some(-3));
    }

    #[test]
    fn test_create_and_get_round_trip() {
        let (db, _temp) = setup();
        let id = db
            .create_task(
                "Write report",
                -2,
                Color::Blue,
                Some("Work"),
                Some("2024-05-01"),
                Some("draft in docs"),
                Utc::now(),
            )
            .unwrap();

        let task = db.get_task(id).unwrap().unwrap();
        assert_eq!(task.content, "Write report");
        assert_eq!(task.position, -2);
        assert_eq!(task.color, Color::Blue);
        assert_eq!(task.label.as_deref(), Some("Work"));
        assert_eq!(task.due_date.as_deref(), Some("2024-05-01"));
        assert_eq!(task.context.as_deref(), Some("draft in docs"));
        assert!(task.is_active());
        assert!(db.get_task(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_mark_active_clears_completion() {
        let (db, _temp) = setup();
        let id = insert(&db, "a", 0);
        db.mark_completed(id, Utc::now()).unwrap();
        db.set_completion_note(id, Some("done early")).unwrap();

        db.mark_active(id, -5).unwrap();
        let task = db.get_task(id).unwrap().unwrap();
        assert!(task.completed_at.is_none());
        assert!(task.completion_note.is_none());
        assert_eq!(task.position, -5);
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let (db, _temp) = setup();
        let id = insert(&db, "a", 0);

        let result: Result<()> = db.atomically(|db| {
            db.update_position(id, 42)?;
            Err(crate::error::TaskError::TaskNotFound(999))
        });
        assert!(result.is_err());
        assert_eq!(db.get_task(id).unwrap().unwrap().position, 0);
    }

    #[test]
    fn test_distinct_labels_sorted() {
        let (db, _temp) = setup();
        for label in ["Work", "Home", "Work"] {
            db.create_task("x", 0, Color::Default, Some(label), None, None, Utc::now())
                .unwrap();
        }
        insert(&db, "unlabelled", 0);
        assert_eq!(db.distinct_labels().unwrap(), vec!["Home", "Work"]);
    }

    #[test]
    fn test_migration_adds_missing_columns() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE tasks (
                    id INTEGER PRIMARY KEY,
                    content TEXT NOT NULL,
                    position INTEGER,
                    created_at TEXT,
                    completed_at TEXT
                );
                INSERT INTO tasks (content, position, created_at)
                VALUES ('old task', 3, '2023-01-02 03:04:05.123456');",
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let tasks = db.get_all_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].content, "old task");
        assert_eq!(tasks[0].color, Color::Default);
        assert!(tasks[0].label.is_none());
        assert!(tasks[0].requires_id.is_none());
        assert!(tasks[0].context.is_none());
    }

    #[test]
    fn test_missing_created_at_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE tasks (
                    id INTEGER PRIMARY KEY,
                    content TEXT NOT NULL,
                    position INTEGER,
                    created_at TEXT,
                    completed_at TEXT
                );
                INSERT INTO tasks (id, content, position) VALUES (1, 'undated', 0);
                INSERT INTO tasks (id, content, position, completed_at)
                VALUES (2, 'finished', 1, '2023-04-05 06:07:08.250000');",
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let undated = db.get_task(1).unwrap().unwrap();
        assert_eq!(undated.created_at, DateTime::<Utc>::UNIX_EPOCH);

        let finished = db.get_task(2).unwrap().unwrap();
        assert_eq!(Some(finished.created_at), finished.completed_at);
        assert_eq!(db.get_all_tasks().unwrap().len(), 2);
    }

    #[test]
    fn test_legacy_task_table_is_adopted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE task (
                    id INTEGER NOT NULL PRIMARY KEY,
                    content TEXT NOT NULL,
                    position INTEGER,
                    color VARCHAR(20),
                    created_at DATETIME,
                    completed_at DATETIME
                );
                INSERT INTO task (id, content, position, color, created_at)
                VALUES (4, 'from before', 2, 'red', '2023-01-02 03:04:05.123456');",
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let task = db.get_task(4).unwrap().unwrap();
        assert_eq!(task.content, "from before");
        assert_eq!(task.color, Color::Red);
        assert!(task.label.is_none());
        assert!(!db.table_exists(LEGACY_TABLE).unwrap());

        let id = insert(&db, "new", 1);
        assert!(id > 4);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.db");
        let id = {
            let db = Database::open(&path).unwrap();
            insert(&db, "persisted", 7)
        };
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_task(id).unwrap().unwrap().position, 7);
    }
}
