//! Board aggregate and its reducer.
//!
//! Child tasks are stored once, in an arena keyed by id. A parent's child list
//! and a column's task list are both views over that arena: the parent keeps an
//! ordered list of ids, and a column is every child whose `status` equals the
//! column id, ordered by `position`. A move therefore touches a single record
//! and the two views cannot disagree.

use crate::action::{Action, IgnoreReason, Outcome};
use crate::model::{ChildTask, Column, ColumnId, DevStatus, ParentTask, TaskId, TaskProgress};
use crate::sprint::{SprintMetadata, SprintRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Errors raised while assembling a board from external records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("duplicate column id {0}")]
    DuplicateColumn(ColumnId),
    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),
    #[error("task {task_id} has status {status} which is not a board column")]
    UnknownStatus { task_id: TaskId, status: ColumnId },
    #[error("child task {child_id} references missing parent {parent_id}")]
    MissingParent { child_id: TaskId, parent_id: TaskId },
    #[error("child task {0} has a position outside the board's range")]
    PositionOutOfRange(TaskId),
}

/// Only built through the validated constructors and loaders, so there is no
/// `Deserialize`; stored boards go through the persistence snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    sprint: SprintMetadata,
    done_column: ColumnId,
    columns: Vec<Column>,
    parent_tasks: Vec<ParentTask>,
    child_tasks: BTreeMap<TaskId, ChildTask>,
    next_position: u64,
}

impl Board {
    /// Empty board with the given columns. The `DONE` column counts as
    /// complete when present, otherwise the last column does.
    pub fn new(columns: Vec<Column>) -> Result<Self, BoardError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.id.clone()) {
                return Err(BoardError::DuplicateColumn(column.id.clone()));
            }
        }
        let done_column = columns
            .iter()
            .find(|c| c.id.as_str() == ColumnId::DONE)
            .or_else(|| columns.last())
            .map(|c| c.id.clone())
            .unwrap_or_else(|| ColumnId::new(ColumnId::DONE));
        Ok(Self {
            sprint: SprintMetadata::default(),
            done_column,
            columns,
            parent_tasks: Vec::new(),
            child_tasks: BTreeMap::new(),
            next_position: 0,
        })
    }

    /// Builds the board for a sprint. Every task status must name one of
    /// `columns`.
    pub fn from_sprint(sprint: &SprintRecord, columns: Vec<Column>) -> Result<Self, BoardError> {
        let mut board = Self::new(columns)?;
        board.sprint = sprint.metadata();
        for record in &sprint.tasks {
            let mut parent = ParentTask::new(record.id.clone(), record.title.clone(), record.status.clone());
            parent.epic = record.epic_label.clone();
            board.insert_parent(parent)?;
            for child in &record.child_tasks {
                board.insert_child(ChildTask::new(
                    child.id.clone(),
                    child.title.clone(),
                    record.id.clone(),
                    child.status.clone(),
                ))?;
            }
        }
        debug!(
            sprint = %board.sprint.id,
            parents = board.parent_tasks.len(),
            children = board.child_tasks.len(),
            "board built from sprint"
        );
        Ok(board)
    }

    /// Adds a parent task with no children. Any ids listed in
    /// `parent.children` are dropped; children are attached with
    /// [`Board::insert_child`].
    pub fn insert_parent(&mut self, mut parent: ParentTask) -> Result<(), BoardError> {
        if self.contains_task(&parent.id) {
            return Err(BoardError::DuplicateTask(parent.id));
        }
        if self.column(&parent.status).is_none() {
            return Err(BoardError::UnknownStatus {
                task_id: parent.id,
                status: parent.status,
            });
        }
        parent.children.clear();
        self.parent_tasks.push(parent);
        Ok(())
    }

    /// Attaches a child to its parent and places it at the end of its column.
    pub fn insert_child(&mut self, mut child: ChildTask) -> Result<(), BoardError> {
        if self.contains_task(&child.id) {
            return Err(BoardError::DuplicateTask(child.id));
        }
        if self.column(&child.status).is_none() {
            return Err(BoardError::UnknownStatus {
                task_id: child.id,
                status: child.status,
            });
        }
        let Some(parent_idx) = self.parent_index(&child.parent_id) else {
            return Err(BoardError::MissingParent {
                child_id: child.id,
                parent_id: child.parent_id,
            });
        };
        child.position = self.take_position();
        self.parent_tasks[parent_idx].children.push(child.id.clone());
        self.child_tasks.insert(child.id.clone(), child);
        Ok(())
    }

    /// Reassembles a board from stored parts, keeping child positions as
    /// stored. Rejects repeated child ids and positions of `u64::MAX`;
    /// callers still run the full validation on the result.
    pub(crate) fn from_parts(
        sprint: SprintMetadata,
        done_column: ColumnId,
        columns: Vec<Column>,
        parent_tasks: Vec<ParentTask>,
        child_tasks: Vec<ChildTask>,
    ) -> Result<Self, BoardError> {
        let mut next_position = 0u64;
        let mut arena = BTreeMap::new();
        for child in child_tasks {
            let Some(after) = child.position.checked_add(1) else {
                return Err(BoardError::PositionOutOfRange(child.id));
            };
            next_position = next_position.max(after);
            if arena.contains_key(&child.id) {
                return Err(BoardError::DuplicateTask(child.id));
            }
            arena.insert(child.id.clone(), child);
        }
        Ok(Self {
            sprint,
            done_column,
            columns,
            parent_tasks,
            child_tasks: arena,
            next_position,
        })
    }

    pub fn sprint(&self) -> &SprintMetadata {
        &self.sprint
    }

    pub fn done_column(&self) -> &ColumnId {
        &self.done_column
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    /// Tasks in a column, in column order.
    pub fn column_tasks(&self, id: &ColumnId) -> Vec<&ChildTask> {
        let mut tasks: Vec<&ChildTask> = self
            .child_tasks
            .values()
            .filter(|c| &c.status == id)
            .collect();
        tasks.sort_by_key(|c| c.position);
        tasks
    }

    pub fn parent_tasks(&self) -> &[ParentTask] {
        &self.parent_tasks
    }

    pub fn parent(&self, id: &TaskId) -> Option<&ParentTask> {
        self.parent_tasks.iter().find(|p| &p.id == id)
    }

    pub fn child(&self, id: &TaskId) -> Option<&ChildTask> {
        self.child_tasks.get(id)
    }

    pub fn child_tasks(&self) -> impl Iterator<Item = &ChildTask> {
        self.child_tasks.values()
    }

    pub fn child_count(&self) -> usize {
        self.child_tasks.len()
    }

    /// Children of a parent in ownership order.
    pub fn children_of(&self, parent_id: &TaskId) -> Vec<&ChildTask> {
        self.parent(parent_id)
            .map(|p| p.children.iter().filter_map(|id| self.child_tasks.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn parent_of(&self, child_id: &TaskId) -> Option<&ParentTask> {
        self.child(child_id).and_then(|c| self.parent(&c.parent_id))
    }

    pub fn progress(&self, parent_id: &TaskId) -> Option<TaskProgress> {
        let parent = self.parent(parent_id)?;
        let completed = self
            .children_of(parent_id)
            .iter()
            .filter(|c| c.status == self.done_column)
            .count();
        Some(TaskProgress {
            completed,
            total: parent.children.len(),
        })
    }

    /// Dev status may only change once every child sits in the done column.
    pub fn can_change_dev_status(&self, parent_id: &TaskId) -> bool {
        self.progress(parent_id).is_some_and(|p| p.is_complete())
    }

    /// Applies `action`, consuming the board and returning the next one.
    /// Actions that reference missing entities return the board unchanged.
    pub fn apply(mut self, action: &Action) -> Self {
        self.dispatch(action);
        self
    }

    /// In-place form of [`Board::apply`] that also reports whether the action
    /// changed anything.
    pub fn dispatch(&mut self, action: &Action) -> Outcome {
        let outcome = match action {
            Action::MoveTask {
                source,
                destination,
                task_id,
            } => self.move_task(source, destination, task_id),
            Action::AddChildTask { parent_id, content } => self.add_child_task(parent_id, content),
            Action::UpdateDevStatus { task_id, status } => self.update_dev_status(task_id, *status),
            Action::AddColumn { id, title } => self.add_column(id, title),
        };
        match &outcome {
            Outcome::Applied => debug!(action = action.kind(), "action applied"),
            Outcome::Ignored(reason) => {
                debug!(action = action.kind(), %reason, "action ignored")
            }
        }
        outcome
    }

    fn move_task(&mut self, source: &ColumnId, destination: &ColumnId, task_id: &TaskId) -> Outcome {
        if source == destination {
            return Outcome::Ignored(IgnoreReason::SameColumn);
        }
        if self.column(destination).is_none() {
            return Outcome::Ignored(IgnoreReason::ColumnNotFound {
                column_id: destination.clone(),
            });
        }
        match self.child(task_id) {
            None => {
                return Outcome::Ignored(IgnoreReason::TaskNotFound {
                    task_id: task_id.clone(),
                });
            }
            Some(child) if &child.status != source => {
                return Outcome::Ignored(IgnoreReason::TaskNotInSource {
                    task_id: task_id.clone(),
                    source: source.clone(),
                });
            }
            Some(_) => {}
        }
        let position = self.take_position();
        if let Some(child) = self.child_tasks.get_mut(task_id) {
            child.status = destination.clone();
            child.position = position;
        }
        Outcome::Applied
    }

    fn add_child_task(&mut self, parent_id: &TaskId, content: &str) -> Outcome {
        let content = content.trim();
        if content.is_empty() {
            return Outcome::Ignored(IgnoreReason::EmptyContent);
        }
        let Some(parent) = self.parent(parent_id) else {
            return Outcome::Ignored(IgnoreReason::ParentNotFound {
                parent_id: parent_id.clone(),
            });
        };
        let status = if self.column(&parent.status).is_some() {
            parent.status.clone()
        } else {
            match self.columns.first() {
                Some(column) => column.id.clone(),
                None => {
                    return Outcome::Ignored(IgnoreReason::ColumnNotFound {
                        column_id: parent.status.clone(),
                    });
                }
            }
        };
        let mut id = TaskId::generate();
        while self.contains_task(&id) {
            id = TaskId::generate();
        }
        let child = ChildTask::new(id, content, parent_id.clone(), status);
        match self.insert_child(child) {
            Ok(()) => Outcome::Applied,
            Err(_) => Outcome::Ignored(IgnoreReason::ParentNotFound {
                parent_id: parent_id.clone(),
            }),
        }
    }

    fn update_dev_status(&mut self, task_id: &TaskId, status: DevStatus) -> Outcome {
        let Some(progress) = self.progress(task_id) else {
            return Outcome::Ignored(IgnoreReason::ParentNotFound {
                parent_id: task_id.clone(),
            });
        };
        if !progress.is_complete() {
            return Outcome::Ignored(IgnoreReason::ChildrenNotDone {
                parent_id: task_id.clone(),
                remaining: progress.total - progress.completed,
            });
        }
        if let Some(idx) = self.parent_index(task_id) {
            self.parent_tasks[idx].dev_status = status;
        }
        Outcome::Applied
    }

    fn add_column(&mut self, id: &ColumnId, title: &str) -> Outcome {
        if id.as_str().trim().is_empty() {
            return Outcome::Ignored(IgnoreReason::BlankColumnId);
        }
        if self.column(id).is_some() {
            return Outcome::Ignored(IgnoreReason::ColumnExists {
                column_id: id.clone(),
            });
        }
        self.columns.push(Column::new(id.clone(), title));
        Outcome::Applied
    }

    fn parent_index(&self, id: &TaskId) -> Option<usize> {
        self.parent_tasks.iter().position(|p| &p.id == id)
    }

    fn contains_task(&self, id: &TaskId) -> bool {
        self.child_tasks.contains_key(id) || self.parent_index(id).is_some()
    }

    pub(crate) fn next_position(&self) -> u64 {
        self.next_position
    }

    fn take_position(&mut self) -> u64 {
        if self.next_position == u64::MAX {
            self.compact_positions();
        }
        let position = self.next_position;
        self.next_position += 1;
        position
    }

    /// Renumbers positions to `0..n`, keeping their relative order.
    fn compact_positions(&mut self) {
        let mut order: Vec<(u64, TaskId)> = self
            .child_tasks
            .values()
            .map(|c| (c.position, c.id.clone()))
            .collect();
        order.sort();
        for (position, (_, id)) in order.into_iter().enumerate() {
            if let Some(child) = self.child_tasks.get_mut(&id) {
                child.position = position as u64;
            }
        }
        self.next_position = self.child_tasks.len() as u64;
        debug!(children = self.child_tasks.len(), "child positions compacted");
    }
}

/// Pure reducer: returns the board that results from applying `action` to
/// `board`, leaving `board` untouched.
pub fn reduce(board: &Board, action: &Action) -> Board {
    board.clone().apply(action)
}

/// Denormalised board shape used by renderers and the HTTP API: each parent
/// carries its child records and each column its derived task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub sprint: SprintMetadata,
    pub parent_tasks: Vec<ParentTaskView>,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentTaskView {
    pub id: TaskId,
    pub content: String,
    pub status: ColumnId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic: Option<String>,
    pub dev_status: DevStatus,
    pub progress: TaskProgress,
    pub can_change_dev_status: bool,
    pub children: Vec<ChildTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub id: ColumnId,
    pub title: String,
    pub child_tasks: Vec<ChildTask>,
}

impl BoardView {
    pub fn parent(board: &Board, parent: &ParentTask) -> ParentTaskView {
        let children: Vec<ChildTask> = board.children_of(&parent.id).into_iter().cloned().collect();
        let progress = board.progress(&parent.id).unwrap_or(TaskProgress {
            completed: 0,
            total: 0,
        });
        ParentTaskView {
            id: parent.id.clone(),
            content: parent.content.clone(),
            status: parent.status.clone(),
            epic: parent.epic.clone(),
            dev_status: parent.dev_status,
            progress,
            can_change_dev_status: progress.is_complete(),
            children,
        }
    }

    pub fn column(board: &Board, column: &Column) -> ColumnView {
        ColumnView {
            id: column.id.clone(),
            title: column.title.clone(),
            child_tasks: board.column_tasks(&column.id).into_iter().cloned().collect(),
        }
    }
}

impl From<&Board> for BoardView {
    fn from(board: &Board) -> Self {
        Self {
            sprint: board.sprint.clone(),
            parent_tasks: board
                .parent_tasks
                .iter()
                .map(|p| BoardView::parent(board, p))
                .collect(),
            columns: board
                .columns
                .iter()
                .map(|c| BoardView::column(board, c))
                .collect(),
        }
    }
}
