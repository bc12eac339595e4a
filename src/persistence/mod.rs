use crate::Board;
use crate::board::BoardError;
use crate::board_validation::{self, BoardValidationError};
use crate::model::{ColumnId, TaskId};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
}

impl From<BoardError> for PersistenceError {
    fn from(value: BoardError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

impl From<BoardValidationError> for PersistenceError {
    fn from(value: BoardValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Backing store the board is synced to after the reducer has run.
pub trait BoardStore {
    fn save_board(&self, board: &Board) -> PersistenceResult<()>;
    fn load_board(&self) -> PersistenceResult<Option<Board>>;
    /// Persists a single child status change, keyed by task id.
    fn update_child_status(&self, task_id: &TaskId, status: &ColumnId) -> PersistenceResult<()>;
}

pub fn validate_board(board: &Board) -> PersistenceResult<()> {
    board_validation::validate_board(board)?;
    Ok(())
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonBoardStore, load_board_from_csv, load_board_from_json, save_board_to_csv,
    save_board_to_json,
};
