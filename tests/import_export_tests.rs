use kanban_board::{
    Action, Board, BoardStore, DevStatus, JsonBoardStore, PersistenceError, SprintRecord,
    default_columns, load_board_from_csv, load_board_from_json, save_board_to_csv,
    save_board_to_json,
};
use tempfile::{NamedTempFile, tempdir};

fn build_sample_board() -> Board {
    Board::from_sprint(&SprintRecord::demo(), default_columns())
        .unwrap()
        .apply(&Action::add_column("REVIEW", "In Review"))
        .apply(&Action::move_task("TODO", "REVIEW", "child-3"))
        .apply(&Action::add_child_task("task-3", "CI, pipelines and \"quotes\""))
        .apply(&Action::update_dev_status("task-3", DevStatus::QaComplete))
}

#[test]
fn json_round_trip_preserves_board() {
    let board = build_sample_board();
    let file = NamedTempFile::new().unwrap();

    save_board_to_json(&board, file.path()).unwrap();
    let loaded = load_board_from_json(file.path()).unwrap();

    assert_eq!(loaded, board);
}

#[test]
fn csv_round_trip_preserves_board() {
    let board = build_sample_board();
    let file = NamedTempFile::new().unwrap();

    save_board_to_csv(&board, file.path()).unwrap();
    let loaded = load_board_from_csv(file.path()).unwrap();

    assert_eq!(loaded, board);
    assert_eq!(
        loaded.parent(&"task-3".into()).unwrap().dev_status,
        DevStatus::QaComplete
    );
    assert_eq!(loaded.column_tasks(&"REVIEW".into())[0].id.as_str(), "child-3");
}

#[test]
fn loaded_board_keeps_reducing() {
    let board = build_sample_board();
    let file = NamedTempFile::new().unwrap();
    save_board_to_json(&board, file.path()).unwrap();

    let loaded = load_board_from_json(file.path())
        .unwrap()
        .apply(&Action::move_task("TODO", "DONE", "child-4"));
    let done = loaded.column_tasks(&"DONE".into());
    assert_eq!(done.last().unwrap().id.as_str(), "child-4");
}

#[test]
fn json_load_rejects_child_in_unknown_column() {
    let snapshot = serde_json::json!({
        "sprint": { "id": "s", "name": "S", "projectId": "p", "startDate": "2025-01-06" },
        "doneColumn": "DONE",
        "columns": [{ "id": "TODO", "title": "To Do" }, { "id": "DONE", "title": "Done" }],
        "parentTasks": [
            { "id": "task-1", "content": "A", "status": "TODO", "devStatus": "pending", "children": ["c-1"] }
        ],
        "childTasks": [
            { "id": "c-1", "content": "x", "parentId": "task-1", "status": "LIMBO", "position": 0 }
        ]
    });

    let file = NamedTempFile::new().unwrap();
    serde_json::to_writer_pretty(file.as_file(), &snapshot).unwrap();

    match load_board_from_json(file.path()) {
        Ok(_) => panic!("expected unknown column to be rejected"),
        Err(PersistenceError::InvalidData(msg)) => {
            assert!(msg.contains("LIMBO"), "unexpected message: {msg}")
        }
        Err(other) => panic!("expected InvalidData error, got {other:?}"),
    }
}

#[test]
fn csv_load_rejects_orphan_child() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "kind,id,content,status,parent_id,epic,dev_status,position,sprint_json\n\
         sprint,s,S,DONE,,,,,\"{\"\"id\"\":\"\"s\"\",\"\"name\"\":\"\"S\"\",\"\"projectId\"\":\"\"p\"\",\"\"startDate\"\":\"\"2025-01-06\"\"}\"\n\
         column,DONE,Done,,,,,,\n\
         child,c-1,x,DONE,task-9,,,0,\n",
    )
    .unwrap();

    match load_board_from_csv(file.path()) {
        Err(PersistenceError::InvalidData(msg)) => {
            assert!(msg.contains("task-9"), "unexpected message: {msg}")
        }
        other => panic!("expected InvalidData error, got {other:?}"),
    }
}

#[test]
fn json_store_persists_status_updates() {
    let dir = tempdir().unwrap();
    let store = JsonBoardStore::new(dir.path().join("board.json"));
    assert!(store.load_board().unwrap().is_none());

    store.save_board(&build_sample_board()).unwrap();
    store
        .update_child_status(&"child-4".into(), &"INPROGRESS".into())
        .unwrap();

    let loaded = store.load_board().unwrap().unwrap();
    assert_eq!(
        loaded.child(&"child-4".into()).unwrap().status.as_str(),
        "INPROGRESS"
    );

    match store.update_child_status(&"child-404".into(), &"DONE".into()) {
        Err(PersistenceError::TaskNotFound(id)) => assert_eq!(id.as_str(), "child-404"),
        other => panic!("expected TaskNotFound, got {other:?}"),
    }
    assert!(matches!(
        store.update_child_status(&"child-4".into(), &"GHOST".into()),
        Err(PersistenceError::InvalidData(_))
    ));
}

fn rewrite_snapshot(board: &Board, edit: impl FnOnce(&mut serde_json::Value)) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    save_board_to_json(board, file.path()).unwrap();
    let mut snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
    edit(&mut snapshot);
    std::fs::write(file.path(), serde_json::to_vec_pretty(&snapshot).unwrap()).unwrap();
    file
}

#[test]
fn json_load_rejects_position_at_upper_bound() {
    let file = rewrite_snapshot(&build_sample_board(), |snapshot| {
        snapshot["childTasks"][0]["position"] = serde_json::json!(u64::MAX);
    });

    match load_board_from_json(file.path()) {
        Err(PersistenceError::InvalidData(msg)) => {
            assert!(msg.contains("position"), "unexpected message: {msg}")
        }
        other => panic!("expected InvalidData error, got {other:?}"),
    }
}

#[test]
fn json_load_rejects_repeated_child_record() {
    let file = rewrite_snapshot(&build_sample_board(), |snapshot| {
        let children = snapshot["childTasks"].as_array_mut().unwrap();
        let mut copy = children
            .iter()
            .find(|c| c["id"] == "child-4")
            .cloned()
            .unwrap();
        copy["status"] = serde_json::json!("DONE");
        copy["content"] = serde_json::json!("Shadow copy");
        children.push(copy);
    });

    match load_board_from_json(file.path()) {
        Err(PersistenceError::InvalidData(msg)) => {
            assert!(msg.contains("duplicate task id child-4"), "unexpected message: {msg}")
        }
        other => panic!("expected InvalidData error, got {other:?}"),
    }
}

#[test]
fn csv_load_rejects_position_at_upper_bound() {
    let board = build_sample_board();
    let file = NamedTempFile::new().unwrap();
    save_board_to_csv(&board, file.path()).unwrap();
    let text = std::fs::read_to_string(file.path()).unwrap();
    let rewritten: Vec<String> = text
        .lines()
        .map(|line| {
            if line.starts_with("child,child-1,") {
                let mut cells: Vec<&str> = line.split(',').collect();
                cells[7] = "18446744073709551615";
                cells.join(",")
            } else {
                line.to_string()
            }
        })
        .collect();
    std::fs::write(file.path(), rewritten.join("\n")).unwrap();

    assert!(matches!(
        load_board_from_csv(file.path()),
        Err(PersistenceError::InvalidData(_))
    ));
}
