use crate::model::{ColumnId, DevStatus, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every state transition the board understands.
///
/// Serialised with a `type` tag, e.g.
/// `{"type":"MOVE_TASK","source":"TODO","destination":"DONE","taskId":"child-1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    MoveTask {
        source: ColumnId,
        destination: ColumnId,
        task_id: TaskId,
    },
    AddChildTask {
        parent_id: TaskId,
        content: String,
    },
    UpdateDevStatus {
        task_id: TaskId,
        status: DevStatus,
    },
    AddColumn {
        id: ColumnId,
        title: String,
    },
}

impl Action {
    pub fn move_task(
        source: impl Into<ColumnId>,
        destination: impl Into<ColumnId>,
        task_id: impl Into<TaskId>,
    ) -> Self {
        Action::MoveTask {
            source: source.into(),
            destination: destination.into(),
            task_id: task_id.into(),
        }
    }

    pub fn add_child_task(parent_id: impl Into<TaskId>, content: impl Into<String>) -> Self {
        Action::AddChildTask {
            parent_id: parent_id.into(),
            content: content.into(),
        }
    }

    pub fn update_dev_status(task_id: impl Into<TaskId>, status: DevStatus) -> Self {
        Action::UpdateDevStatus {
            task_id: task_id.into(),
            status,
        }
    }

    pub fn add_column(id: impl Into<ColumnId>, title: impl Into<String>) -> Self {
        Action::AddColumn {
            id: id.into(),
            title: title.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::MoveTask { .. } => "MOVE_TASK",
            Action::AddChildTask { .. } => "ADD_CHILD_TASK",
            Action::UpdateDevStatus { .. } => "UPDATE_DEV_STATUS",
            Action::AddColumn { .. } => "ADD_COLUMN",
        }
    }
}

/// Why an action left the board unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IgnoreReason {
    SameColumn,
    TaskNotFound { task_id: TaskId },
    TaskNotInSource { task_id: TaskId, source: ColumnId },
    ColumnNotFound { column_id: ColumnId },
    ParentNotFound { parent_id: TaskId },
    EmptyContent,
    ChildrenNotDone { parent_id: TaskId, remaining: usize },
    ColumnExists { column_id: ColumnId },
    BlankColumnId,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::SameColumn => write!(f, "source and destination are the same column"),
            IgnoreReason::TaskNotFound { task_id } => write!(f, "task {task_id} not found"),
            IgnoreReason::TaskNotInSource { task_id, source } => {
                write!(f, "task {task_id} is not in column {source}")
            }
            IgnoreReason::ColumnNotFound { column_id } => {
                write!(f, "column {column_id} not found")
            }
            IgnoreReason::ParentNotFound { parent_id } => {
                write!(f, "parent task {parent_id} not found")
            }
            IgnoreReason::EmptyContent => write!(f, "child task content is empty"),
            IgnoreReason::ChildrenNotDone {
                parent_id,
                remaining,
            } => write!(
                f,
                "parent task {parent_id} still has {remaining} unfinished child task(s)"
            ),
            IgnoreReason::ColumnExists { column_id } => {
                write!(f, "column {column_id} already exists")
            }
            IgnoreReason::BlankColumnId => write!(f, "column id is blank"),
        }
    }
}

/// Result of dispatching one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Ignored(IgnoreReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}
