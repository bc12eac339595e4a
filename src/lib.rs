//! Kanban board state engine.
//!
//! A [`Board`] holds parent tasks, their child tasks and the status columns
//! the children are laid out in. All changes go through [`Board::apply`] (or
//! the cloning [`reduce`]) with an [`Action`]; actions that name missing
//! tasks or columns leave the board unchanged.
//!
//! ```
//! use kanban_board::{Action, Board, SprintRecord, default_columns};
//!
//! let board = Board::from_sprint(&SprintRecord::demo(), default_columns()).unwrap();
//! let board = board.apply(&Action::move_task("TODO", "DONE", "child-3"));
//! assert_eq!(board.child(&"child-3".into()).unwrap().status.as_str(), "DONE");
//! ```

pub mod action;
pub mod board;
pub(crate) mod board_validation;
pub mod config;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod sprint;

pub use action::{Action, IgnoreReason, Outcome};
pub use board::{Board, BoardError, BoardView, ColumnView, ParentTaskView, reduce};
pub use board_validation::BoardValidationError;
pub use config::{ConfigError, ServerConfig};
pub use model::{ChildTask, Column, ColumnId, DevStatus, ParentTask, TaskId, TaskProgress};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteBoardStore;
pub use persistence::{
    BoardStore, JsonBoardStore, PersistenceError, load_board_from_csv, load_board_from_json,
    save_board_to_csv, save_board_to_json, validate_board,
};
pub use sprint::{ChildTaskRecord, SprintMetadata, SprintRecord, SprintTaskRecord, default_columns};
