use crate::board::Board;
use crate::model::{ColumnId, TaskId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BoardValidationError {
    message: String,
}

impl BoardValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn validate_board(board: &Board) -> Result<(), BoardValidationError> {
    let mut column_ids: HashSet<&ColumnId> = HashSet::with_capacity(board.columns().len());
    for column in board.columns() {
        if !column_ids.insert(&column.id) {
            return Err(BoardValidationError::new(format!(
                "duplicate column id {}",
                column.id
            )));
        }
    }
    if !column_ids.contains(board.done_column()) {
        return Err(BoardValidationError::new(format!(
            "done column {} is not a board column",
            board.done_column()
        )));
    }

    let mut owners: HashMap<&TaskId, &TaskId> = HashMap::new();
    let mut parent_ids: HashSet<&TaskId> = HashSet::with_capacity(board.parent_tasks().len());
    for parent in board.parent_tasks() {
        if !parent_ids.insert(&parent.id) {
            return Err(BoardValidationError::new(format!(
                "duplicate parent task id {}",
                parent.id
            )));
        }
        for child_id in &parent.children {
            if board.child(child_id).is_none() {
                return Err(BoardValidationError::new(format!(
                    "parent task {} lists missing child task {}",
                    parent.id, child_id
                )));
            }
            if let Some(previous) = owners.insert(child_id, &parent.id) {
                return Err(BoardValidationError::new(format!(
                    "child task {} is owned by both {} and {}",
                    child_id, previous, parent.id
                )));
            }
        }
    }

    let mut positions = HashSet::with_capacity(board.child_count());
    for child in board.child_tasks() {
        if parent_ids.contains(&child.id) {
            return Err(BoardValidationError::new(format!(
                "task id {} is used by both a parent and a child task",
                child.id
            )));
        }
        if !column_ids.contains(&child.status) {
            return Err(BoardValidationError::new(format!(
                "child task {} has status {} which is not a board column",
                child.id, child.status
            )));
        }
        match owners.get(&child.id) {
            Some(owner) if *owner == &child.parent_id => {}
            Some(owner) => {
                return Err(BoardValidationError::new(format!(
                    "child task {} points at parent {} but is owned by {}",
                    child.id, child.parent_id, owner
                )));
            }
            None => {
                return Err(BoardValidationError::new(format!(
                    "child task {} is not listed by its parent {}",
                    child.id, child.parent_id
                )));
            }
        }
        if child.position >= board.next_position() {
            return Err(BoardValidationError::new(format!(
                "child task {} has position {} beyond the next free position {}",
                child.id,
                child.position,
                board.next_position()
            )));
        }
        if !positions.insert(child.position) {
            return Err(BoardValidationError::new(format!(
                "child task {} shares position {} with another task",
                child.id, child.position
            )));
        }
    }

    let placed: usize = board
        .columns()
        .iter()
        .map(|c| board.column_tasks(&c.id).len())
        .sum();
    if placed != board.child_count() {
        return Err(BoardValidationError::new(format!(
            "{} child task(s) placed in columns but {} exist",
            placed,
            board.child_count()
        )));
    }

    Ok(())
}
