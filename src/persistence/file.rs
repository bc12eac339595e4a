use super::{BoardStore, PersistenceError, PersistenceResult};
use crate::action::{Action, IgnoreReason, Outcome};
use crate::model::{ChildTask, Column, ColumnId, DevStatus, ParentTask, TaskId};
use crate::sprint::SprintMetadata;
use crate::Board;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardSnapshot {
    sprint: SprintMetadata,
    done_column: ColumnId,
    columns: Vec<Column>,
    parent_tasks: Vec<ParentTask>,
    child_tasks: Vec<ChildTask>,
}

impl BoardSnapshot {
    fn from_board(board: &Board) -> PersistenceResult<Self> {
        super::validate_board(board)?;
        Ok(Self {
            sprint: board.sprint().clone(),
            done_column: board.done_column().clone(),
            columns: board.columns().to_vec(),
            parent_tasks: board.parent_tasks().to_vec(),
            child_tasks: board.child_tasks().cloned().collect(),
        })
    }

    fn into_board(self) -> PersistenceResult<Board> {
        let board = Board::from_parts(
            self.sprint,
            self.done_column,
            self.columns,
            self.parent_tasks,
            self.child_tasks,
        )?;
        super::validate_board(&board)?;
        Ok(board)
    }
}

pub fn save_board_to_json<P: AsRef<Path>>(board: &Board, path: P) -> PersistenceResult<()> {
    let snapshot = BoardSnapshot::from_board(board)?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    info!(path = %path.as_ref().display(), "board saved as json");
    Ok(())
}

pub fn load_board_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Board> {
    let file = File::open(path.as_ref())?;
    let snapshot: BoardSnapshot = serde_json::from_reader(file)?;
    let board = snapshot.into_board()?;
    info!(path = %path.as_ref().display(), "board loaded from json");
    Ok(board)
}

const KIND_SPRINT: &str = "sprint";
const KIND_COLUMN: &str = "column";
const KIND_PARENT: &str = "parent";
const KIND_CHILD: &str = "child";

/// One CSV row. `kind` selects which of the remaining fields are used.
#[derive(Default, Serialize, Deserialize)]
struct BoardCsvRecord {
    kind: String,
    id: String,
    content: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    parent_id: String,
    #[serde(default)]
    epic: String,
    #[serde(default)]
    dev_status: String,
    #[serde(default)]
    position: String,
    #[serde(default)]
    sprint_json: String,
}

impl BoardCsvRecord {
    fn sprint_row(board: &Board) -> PersistenceResult<Self> {
        Ok(Self {
            kind: KIND_SPRINT.to_string(),
            id: board.sprint().id.clone(),
            content: board.sprint().name.clone(),
            status: board.done_column().to_string(),
            sprint_json: serde_json::to_string(board.sprint())?,
            ..Self::default()
        })
    }

    fn column_row(column: &Column) -> Self {
        Self {
            kind: KIND_COLUMN.to_string(),
            id: column.id.to_string(),
            content: column.title.clone(),
            ..Self::default()
        }
    }

    fn parent_row(parent: &ParentTask) -> Self {
        Self {
            kind: KIND_PARENT.to_string(),
            id: parent.id.to_string(),
            content: parent.content.clone(),
            status: parent.status.to_string(),
            epic: parent.epic.clone().unwrap_or_default(),
            dev_status: parent.dev_status.as_str().to_string(),
            ..Self::default()
        }
    }

    fn child_row(child: &ChildTask) -> Self {
        Self {
            kind: KIND_CHILD.to_string(),
            id: child.id.to_string(),
            content: child.content.clone(),
            status: child.status.to_string(),
            parent_id: child.parent_id.to_string(),
            position: child.position.to_string(),
            ..Self::default()
        }
    }

    fn into_parent(self) -> PersistenceResult<ParentTask> {
        let dev_status = if self.dev_status.trim().is_empty() {
            DevStatus::default()
        } else {
            self.dev_status
                .parse::<DevStatus>()
                .map_err(|err| PersistenceError::InvalidData(err.to_string()))?
        };
        let mut parent = ParentTask::new(self.id, self.content, self.status.trim());
        parent.epic = parse_string_option(self.epic);
        parent.dev_status = dev_status;
        Ok(parent)
    }

    fn into_child(self) -> PersistenceResult<ChildTask> {
        let position = self.position.trim().parse::<u64>().map_err(|e| {
            PersistenceError::InvalidData(format!(
                "invalid position '{}' for child task {}: {e}",
                self.position, self.id
            ))
        })?;
        let mut child = ChildTask::new(self.id, self.content, self.parent_id.trim(), self.status.trim());
        child.position = position;
        Ok(child)
    }
}

pub fn save_board_to_csv<P: AsRef<Path>>(board: &Board, path: P) -> PersistenceResult<()> {
    super::validate_board(board)?;
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(BoardCsvRecord::sprint_row(board)?)?;
    for column in board.columns() {
        writer.serialize(BoardCsvRecord::column_row(column))?;
    }
    for parent in board.parent_tasks() {
        writer.serialize(BoardCsvRecord::parent_row(parent))?;
    }
    // Grouped by parent so that row order restores ownership order.
    for parent in board.parent_tasks() {
        for child in board.children_of(&parent.id) {
            writer.serialize(BoardCsvRecord::child_row(child))?;
        }
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), "board saved as csv");
    Ok(())
}

pub fn load_board_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Board> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut sprint: Option<(SprintMetadata, ColumnId)> = None;
    let mut columns = Vec::new();
    let mut parents: Vec<ParentTask> = Vec::new();
    let mut children = Vec::new();
    for record in reader.deserialize::<BoardCsvRecord>() {
        let record: BoardCsvRecord = record?;
        match record.kind.trim() {
            KIND_SPRINT => {
                if sprint.is_some() {
                    return Err(PersistenceError::InvalidData(
                        "CSV file contained multiple sprint rows".into(),
                    ));
                }
                let metadata: SprintMetadata =
                    serde_json::from_str(&record.sprint_json).map_err(|err| {
                        PersistenceError::InvalidData(format!("invalid sprint json: {err}"))
                    })?;
                sprint = Some((metadata, ColumnId::new(record.status.trim())));
            }
            KIND_COLUMN => columns.push(Column::new(record.id.trim(), record.content)),
            KIND_PARENT => parents.push(record.into_parent()?),
            KIND_CHILD => children.push(record.into_child()?),
            other => {
                return Err(PersistenceError::InvalidData(format!(
                    "unknown row kind '{other}'"
                )));
            }
        }
    }

    let Some((metadata, done_column)) = sprint else {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no sprint row".into(),
        ));
    };

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

    let board = Board::from_parts(metadata, done_column, columns, parents, children)?;
    super::validate_board(&board)?;
    info!(path = %path.as_ref().display(), "board loaded from csv");
    Ok(board)
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Keeps the whole board in one JSON snapshot file.
#[derive(Debug, Clone)]
pub struct JsonBoardStore {
    path: PathBuf,
}

impl JsonBoardStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BoardStore for JsonBoardStore {
    fn save_board(&self, board: &Board) -> PersistenceResult<()> {
        save_board_to_json(board, &self.path)
    }

    fn load_board(&self) -> PersistenceResult<Option<Board>> {
        if !self.path.exists() {
            return Ok(None);
        }
        load_board_from_json(&self.path).map(Some)
    }

    fn update_child_status(&self, task_id: &TaskId, status: &ColumnId) -> PersistenceResult<()> {
        let Some(mut board) = self.load_board()? else {
            return Err(PersistenceError::TaskNotFound(task_id.clone()));
        };
        let Some(source) = board.child(task_id).map(|c| c.status.clone()) else {
            return Err(PersistenceError::TaskNotFound(task_id.clone()));
        };
        match board.dispatch(&Action::move_task(source, status.clone(), task_id.clone())) {
            Outcome::Applied | Outcome::Ignored(IgnoreReason::SameColumn) => {}
            Outcome::Ignored(reason) => {
                return Err(PersistenceError::InvalidData(reason.to_string()));
            }
        }
        self.save_board(&board)
    }
}
