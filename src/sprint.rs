use crate::model::{Column, ColumnId, TaskId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sprint the board was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintMetadata {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Default for SprintMetadata {
    fn default() -> Self {
        Self {
            id: "sprint-1".to_string(),
            name: "Sprint 1".to_string(),
            project_id: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// Sprint as returned by the task query layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub tasks: Vec<SprintTaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintTaskRecord {
    pub id: TaskId,
    pub title: String,
    pub status: ColumnId,
    #[serde(default, alias = "epic", skip_serializing_if = "Option::is_none")]
    pub epic_label: Option<String>,
    #[serde(default)]
    pub child_tasks: Vec<ChildTaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildTaskRecord {
    pub id: TaskId,
    pub title: String,
    pub status: ColumnId,
}

impl SprintRecord {
    pub fn metadata(&self) -> SprintMetadata {
        SprintMetadata {
            id: self.id.clone(),
            name: self.name.clone(),
            project_id: self.project_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Demo sprint with three parents and six children spread over the
    /// default columns.
    pub fn demo() -> Self {
        fn child(id: &str, title: &str, status: &str) -> ChildTaskRecord {
            ChildTaskRecord {
                id: id.into(),
                title: title.to_string(),
                status: status.into(),
            }
        }

        Self {
            id: "sprint-1".to_string(),
            name: "Sprint 1".to_string(),
            project_id: Some("project-1".to_string()),
            start_date: None,
            end_date: None,
            tasks: vec![
                SprintTaskRecord {
                    id: "task-1".into(),
                    title: "Design System".to_string(),
                    status: ColumnId::IN_PROGRESS.into(),
                    epic_label: Some("UI Modernization".to_string()),
                    child_tasks: vec![
                        child("child-1", "Color Palette", ColumnId::DONE),
                        child("child-2", "Typography", ColumnId::IN_PROGRESS),
                    ],
                },
                SprintTaskRecord {
                    id: "task-2".into(),
                    title: "User Authentication".to_string(),
                    status: ColumnId::TODO.into(),
                    epic_label: Some("Security".to_string()),
                    child_tasks: vec![
                        child("child-3", "Login Page", ColumnId::TODO),
                        child("child-4", "Sign Up Flow", ColumnId::TODO),
                    ],
                },
                SprintTaskRecord {
                    id: "task-3".into(),
                    title: "Project Setup".to_string(),
                    status: ColumnId::DONE.into(),
                    epic_label: Some("Infrastructure".to_string()),
                    child_tasks: vec![
                        child("child-5", "Repository Creation", ColumnId::DONE),
                        child("child-6", "Dependencies Installation", ColumnId::DONE),
                    ],
                },
            ],
        }
    }
}

/// TODO / INPROGRESS / DONE.
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new(ColumnId::TODO, "To Do"),
        Column::new(ColumnId::IN_PROGRESS, "In Progress"),
        Column::new(ColumnId::DONE, "Done"),
    ]
}
