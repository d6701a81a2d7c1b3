use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::checkpoint::{Checkpoint, PersistenceError, ProgressSink};
use crate::content::{ContentError, ContentRepository};
use crate::words::tokenize;

/// One row of the project listing.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub id: i64,
    pub title: String,
    pub word_count: usize,
    pub completed_words: usize,
    pub wpm: u32,
    pub accuracy: u32,
    pub last_practiced: Option<DateTime<Local>>,
}

/// Local project library: stores project text and progress checkpoints in a
/// single SQLite database. Implements both collaborator interfaces the
/// session engine consumes.
#[derive(Debug)]
pub struct ProjectStore {
    conn: Connection,
}

impl ProjectStore {
    /// Opens (and if needed creates) the database at the default location.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("typedrill.db"));
        Self::open(&db_path)
    }

    /// Opens a store at an explicit path, used by tests.
    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path.as_ref())
    }

    fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                word_count INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                completed_words INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_checkpoints_project ON checkpoints(project_id)",
            [],
        )?;

        Ok(ProjectStore { conn })
    }

    /// Inserts a new project and returns its id. The word count is derived
    /// once at import time so listings never re-tokenize content.
    pub fn create_project(&self, title: &str, content: &str) -> Result<i64> {
        let word_count = tokenize(content).len();
        self.conn.execute(
            r#"
            INSERT INTO projects (title, content, word_count, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![title, content, word_count, Local::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Removes a project and its checkpoints. Returns false when no project
    /// had the given id.
    pub fn delete_project(&self, project_id: i64) -> Result<bool> {
        self.conn.execute(
            "DELETE FROM checkpoints WHERE project_id = ?1",
            params![project_id],
        )?;
        let removed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
        Ok(removed > 0)
    }

    /// All projects with their latest checkpoint folded in, newest first.
    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                p.id,
                p.title,
                p.word_count,
                c.wpm,
                c.accuracy,
                c.completed_words,
                c.timestamp
            FROM projects p
            LEFT JOIN checkpoints c ON c.id = (
                SELECT id FROM checkpoints
                WHERE project_id = p.id
                ORDER BY timestamp DESC, id DESC
                LIMIT 1
            )
            ORDER BY p.id DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let last_practiced: Option<String> = row.get(6)?;
            Ok(ProjectSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                word_count: row.get::<_, i64>(2)? as usize,
                wpm: row.get::<_, Option<i64>>(3)?.unwrap_or(0) as u32,
                accuracy: row.get::<_, Option<i64>>(4)?.unwrap_or(0) as u32,
                completed_words: row.get::<_, Option<i64>>(5)?.unwrap_or(0) as usize,
                last_practiced: last_practiced.and_then(|ts| {
                    DateTime::parse_from_rfc3339(&ts)
                        .ok()
                        .map(|dt| dt.with_timezone(&Local))
                }),
            })
        })?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// The most recent checkpoint for a project, if any. This is the resume
    /// entry point: its `completed_words` seeds the next session.
    pub fn latest_checkpoint(&self, project_id: i64) -> Result<Option<Checkpoint>> {
        self.conn
            .query_row(
                r#"
                SELECT project_id, wpm, accuracy, completed_words, timestamp
                FROM checkpoints
                WHERE project_id = ?1
                ORDER BY timestamp DESC, id DESC
                LIMIT 1
                "#,
                params![project_id],
                Self::checkpoint_from_row,
            )
            .optional()
    }

    /// Full checkpoint history for a project, oldest first.
    pub fn checkpoint_history(&self, project_id: i64) -> Result<Vec<Checkpoint>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT project_id, wpm, accuracy, completed_words, timestamp
            FROM checkpoints
            WHERE project_id = ?1
            ORDER BY timestamp ASC, id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![project_id], Self::checkpoint_from_row)?;
        let mut history = Vec::new();
        for row in rows {
            history.push(row?);
        }
        Ok(history)
    }

    fn checkpoint_from_row(row: &rusqlite::Row<'_>) -> Result<Checkpoint> {
        let timestamp_str: String = row.get(4)?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    4,
                    "timestamp".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?
            .with_timezone(&Local);

        Ok(Checkpoint {
            project_id: row.get(0)?,
            wpm: row.get::<_, i64>(1)? as u32,
            accuracy: row.get::<_, i64>(2)? as u32,
            completed_words: row.get::<_, i64>(3)? as usize,
            timestamp,
        })
    }
}

impl ContentRepository for ProjectStore {
    fn fetch_content(&self, project_id: i64) -> Result<crate::content::ProjectContent, ContentError> {
        let result = self.conn.query_row(
            "SELECT id, title, content FROM projects WHERE id = ?1",
            params![project_id],
            |row| {
                Ok(crate::content::ProjectContent {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                })
            },
        );

        match result {
            Ok(project) => Ok(project),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(ContentError::NotFound(project_id)),
            Err(e) => Err(ContentError::Storage(e.to_string())),
        }
    }
}

impl ProgressSink for ProjectStore {
    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> std::result::Result<(), PersistenceError> {
        self.conn
            .execute(
                r#"
                INSERT INTO checkpoints (project_id, wpm, accuracy, completed_words, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    checkpoint.project_id,
                    checkpoint.wpm,
                    checkpoint.accuracy,
                    checkpoint.completed_words as i64,
                    checkpoint.timestamp.to_rfc3339(),
                ],
            )
            .map(|_| ())
            .map_err(|e| PersistenceError(e.to_string()))
    }
}
