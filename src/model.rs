use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a `#[serde(transparent)]` string identifier.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a parent or child task.
    TaskId
);

string_id!(
    /// Identifier of a column. A task's status is the id of the column it sits in.
    ColumnId
);

impl TaskId {
    /// Fresh identifier for a child task created on the board.
    pub fn generate() -> Self {
        Self(format!("child-{}", Uuid::new_v4()))
    }
}

impl ColumnId {
    pub const TODO: &'static str = "TODO";
    pub const IN_PROGRESS: &'static str = "INPROGRESS";
    pub const DONE: &'static str = "DONE";
}

/// Downstream readiness of a parent task, independent of its column status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DevStatus {
    #[default]
    Pending,
    DevComplete,
    QaComplete,
    ProdReady,
}

impl DevStatus {
    pub const ALL: [DevStatus; 4] = [
        DevStatus::Pending,
        DevStatus::DevComplete,
        DevStatus::QaComplete,
        DevStatus::ProdReady,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DevStatus::Pending => "pending",
            DevStatus::DevComplete => "devComplete",
            DevStatus::QaComplete => "qaComplete",
            DevStatus::ProdReady => "prodReady",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DevStatus::Pending => "Pending",
            DevStatus::DevComplete => "Dev Complete",
            DevStatus::QaComplete => "QA Complete",
            DevStatus::ProdReady => "Prod Ready",
        }
    }
}

impl fmt::Display for DevStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDevStatus(pub String);

impl fmt::Display for UnknownDevStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown dev status '{}'", self.0)
    }
}

impl std::error::Error for UnknownDevStatus {}

impl FromStr for DevStatus {
    type Err = UnknownDevStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "");
        match normalized.as_str() {
            "pending" => Ok(DevStatus::Pending),
            "devcomplete" => Ok(DevStatus::DevComplete),
            "qacomplete" => Ok(DevStatus::QaComplete),
            "prodready" => Ok(DevStatus::ProdReady),
            _ => Err(UnknownDevStatus(s.to_string())),
        }
    }
}

/// A status column. Its task list is derived from child statuses, see
/// [`Board::column_tasks`](crate::Board::column_tasks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
}

impl Column {
    pub fn new(id: impl Into<ColumnId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A top-level unit of work. Owns its children by id; the records themselves
/// live in the board's child arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentTask {
    pub id: TaskId,
    pub content: String,
    pub status: ColumnId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic: Option<String>,
    #[serde(default)]
    pub dev_status: DevStatus,
    #[serde(default)]
    pub children: Vec<TaskId>,
}

impl ParentTask {
    pub fn new(id: impl Into<TaskId>, content: impl Into<String>, status: impl Into<ColumnId>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            status: status.into(),
            epic: None,
            dev_status: DevStatus::Pending,
            children: Vec::new(),
        }
    }

    pub fn with_epic(mut self, epic: impl Into<String>) -> Self {
        self.epic = Some(epic.into());
        self
    }

    pub fn with_dev_status(mut self, dev_status: DevStatus) -> Self {
        self.dev_status = dev_status;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildTask {
    pub id: TaskId,
    pub content: String,
    pub parent_id: TaskId,
    pub status: ColumnId,
    /// Board-wide sequence number; orders the task inside its column.
    #[serde(default)]
    pub position: u64,
}

impl ChildTask {
    pub fn new(
        id: impl Into<TaskId>,
        content: impl Into<String>,
        parent_id: impl Into<TaskId>,
        status: impl Into<ColumnId>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            parent_id: parent_id.into(),
            status: status.into(),
            position: 0,
        }
    }
}

/// Completed vs. total children of a parent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub completed: usize,
    pub total: usize,
}

impl TaskProgress {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_status_parses_wire_and_loose_forms() {
        assert_eq!("qaComplete".parse::<DevStatus>(), Ok(DevStatus::QaComplete));
        assert_eq!("prod_ready".parse::<DevStatus>(), Ok(DevStatus::ProdReady));
        assert_eq!("Dev Complete".parse::<DevStatus>(), Ok(DevStatus::DevComplete));
        assert!("shipped".parse::<DevStatus>().is_err());
    }

    #[test]
    fn dev_status_serializes_camel_case() {
        let json = serde_json::to_string(&DevStatus::QaComplete).unwrap();
        assert_eq!(json, "\"qaComplete\"");
        for status in DevStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("child-"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let task: TaskId = serde_json::from_str("\"child-1\"").unwrap();
        assert_eq!(task, TaskId::from("child-1"));
        assert_eq!(task.to_string(), "child-1");
        let column = ColumnId::new(String::from(ColumnId::DONE));
        assert_eq!(serde_json::to_string(&column).unwrap(), "\"DONE\"");
    }
}
