use super::{BoardStore, PersistenceError, PersistenceResult};
use crate::model::{ChildTask, Column, ColumnId, ParentTask, TaskId};
use crate::sprint::SprintMetadata;
use crate::Board;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

pub struct SqliteBoardStore {
    connection: Mutex<Connection>,
}

impl SqliteBoardStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS board_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                sprint_json TEXT NOT NULL,
                done_column TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS columns (
                ord INTEGER NOT NULL,
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS parent_tasks (
                ord INTEGER NOT NULL,
                id TEXT PRIMARY KEY,
                task_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS child_tasks (
                id TEXT PRIMARY KEY,
                parent_id TEXT NOT NULL REFERENCES parent_tasks(id) ON DELETE CASCADE,
                parent_ord INTEGER NOT NULL,
                content TEXT NOT NULL,
                status TEXT NOT NULL,
                position INTEGER NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_metadata(&self, tx: &rusqlite::Transaction, board: &Board) -> PersistenceResult<()> {
        let json = serde_json::to_string(board.sprint())?;
        tx.execute("DELETE FROM board_metadata", [])?;
        tx.execute(
            "INSERT INTO board_metadata (id, sprint_json, done_column) VALUES (1, ?1, ?2)",
            params![json, board.done_column().as_str()],
        )?;
        Ok(())
    }

    fn save_columns(&self, tx: &rusqlite::Transaction, board: &Board) -> PersistenceResult<()> {
        tx.execute("DELETE FROM columns", [])?;
        let mut stmt = tx.prepare("INSERT INTO columns (ord, id, title) VALUES (?1, ?2, ?3)")?;
        for (ord, column) in board.columns().iter().enumerate() {
            stmt.execute(params![ord as i64, column.id.as_str(), column.title])?;
        }
        Ok(())
    }

    fn save_tasks(&self, tx: &rusqlite::Transaction, board: &Board) -> PersistenceResult<()> {
        tx.execute("DELETE FROM child_tasks", [])?;
        tx.execute("DELETE FROM parent_tasks", [])?;
        let mut parent_stmt =
            tx.prepare("INSERT INTO parent_tasks (ord, id, task_json) VALUES (?1, ?2, ?3)")?;
        let mut child_stmt = tx.prepare(
            "INSERT INTO child_tasks (id, parent_id, parent_ord, content, status, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (ord, parent) in board.parent_tasks().iter().enumerate() {
            let mut stored = parent.clone();
            stored.children.clear();
            let json = serde_json::to_string(&stored)?;
            parent_stmt.execute(params![ord as i64, parent.id.as_str(), json])?;
            for (child_ord, child) in board.children_of(&parent.id).into_iter().enumerate() {
                child_stmt.execute(params![
                    child.id.as_str(),
                    parent.id.as_str(),
                    child_ord as i64,
                    child.content,
                    child.status.as_str(),
                    child.position as i64,
                ])?;
            }
        }
        Ok(())
    }
}

impl BoardStore for SqliteBoardStore {
    fn save_board(&self, board: &Board) -> PersistenceResult<()> {
        super::validate_board(board)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        self.save_metadata(&tx, board)?;
        self.save_columns(&tx, board)?;
        self.save_tasks(&tx, board)?;
        tx.commit()?;
        info!(children = board.child_count(), "board saved to sqlite");
        Ok(())
    }

    fn load_board(&self) -> PersistenceResult<Option<Board>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");

        let mut stmt =
            conn.prepare("SELECT sprint_json, done_column FROM board_metadata WHERE id = 1")?;
        let metadata_opt: Option<(String, String)> = stmt
            .query_row([], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((sprint_json, done_column)) = metadata_opt else {
            return Ok(None);
        };
        let sprint: SprintMetadata = serde_json::from_str(&sprint_json)?;

        let mut stmt = conn.prepare("SELECT id, title FROM columns ORDER BY ord ASC")?;
        let columns = stmt
            .query_map([], |row| {
                Ok(Column::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare("SELECT task_json FROM parent_tasks ORDER BY ord ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut parents: Vec<ParentTask> = Vec::new();
        for json in rows {
            let mut parent: ParentTask = serde_json::from_str(&json?)?;
            parent.children.clear();
            parents.push(parent);
        }

        let mut stmt = conn.prepare(
            "SELECT id, parent_id, content, status, position FROM child_tasks
             ORDER BY parent_id ASC, parent_ord ASC",
        )?;
        let children = stmt
            .query_map([], |row| {
                let mut child = ChildTask::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(3)?,
                );
                child.position = row.get::<_, i64>(4)? as u64;
                Ok(child)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let index: HashMap<TaskId, usize> = parents
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.id.clone(), idx))
            .collect();
        for child in &children {
            let Some(&idx) = index.get(&child.parent_id) else {
                return Err(PersistenceError::InvalidData(format!(
                    "child task {} references missing parent {}",
                    child.id, child.parent_id
                )));
            };
            parents[idx].children.push(child.id.clone());
        }

        let board = Board::from_parts(
            sprint,
            ColumnId::new(done_column),
            columns,
            parents,
            children,
        )?;
        super::validate_board(&board)?;
        Ok(Some(board))
    }

    fn update_child_status(&self, task_id: &TaskId, status: &ColumnId) -> PersistenceResult<()> {
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        let known: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM columns WHERE id = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if known.is_none() {
            return Err(PersistenceError::InvalidData(format!(
                "column {status} not found"
            )));
        }
        let updated = tx.execute(
            "UPDATE child_tasks
             SET status = ?1,
                 position = (SELECT COALESCE(MAX(position), -1) + 1 FROM child_tasks)
             WHERE id = ?2 AND status <> ?1",
            params![status.as_str(), task_id.as_str()],
        )?;
        if updated == 0 {
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM child_tasks WHERE id = ?1",
                    params![task_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(PersistenceError::TaskNotFound(task_id.clone()));
            }
        }
        tx.commit()?;
        Ok(())
    }
}
