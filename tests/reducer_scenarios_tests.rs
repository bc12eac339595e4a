use kanban_board::{
    Action, Board, ChildTask, ColumnId, DevStatus, IgnoreReason, Outcome, ParentTask,
    SprintRecord, default_columns, reduce, validate_board,
};

fn demo_board() -> Board {
    Board::from_sprint(&SprintRecord::demo(), default_columns()).unwrap()
}

fn column(board: &Board, id: &str) -> Vec<String> {
    board
        .column_tasks(&ColumnId::new(id))
        .into_iter()
        .map(|c| c.id.to_string())
        .collect()
}

fn placed_count(board: &Board) -> usize {
    board
        .columns()
        .iter()
        .map(|c| board.column_tasks(&c.id).len())
        .sum()
}

#[test]
fn moving_a_task_updates_column_and_parent_views() {
    let mut board = Board::new(default_columns()).unwrap();
    board
        .insert_parent(ParentTask::new("task-1", "Design System", "TODO"))
        .unwrap();
    board
        .insert_child(ChildTask::new("childA", "Color Palette", "task-1", "TODO"))
        .unwrap();

    let board = board.apply(&Action::move_task("TODO", "DONE", "childA"));

    assert!(column(&board, "TODO").is_empty());
    assert_eq!(column(&board, "DONE"), vec!["childA"]);
    let done = board.column_tasks(&"DONE".into());
    assert_eq!(done[0].status.as_str(), "DONE");
    let children = board.children_of(&"task-1".into());
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].status.as_str(), "DONE");
    validate_board(&board).unwrap();
}

#[test]
fn adding_a_child_task_generates_an_id_and_places_it() {
    let mut board = Board::new(default_columns()).unwrap();
    board
        .insert_parent(ParentTask::new("task-2", "User Authentication", "TODO"))
        .unwrap();
    let before = board.child_count();

    let board = board.apply(&Action::add_child_task("task-2", "Login Page"));

    let children = board.children_of(&"task-2".into());
    assert_eq!(children.len(), 1);
    let child = children[0];
    assert_eq!(child.content, "Login Page");
    assert_eq!(child.parent_id.as_str(), "task-2");
    assert!(!child.id.as_str().is_empty());
    assert_eq!(column(&board, "TODO"), vec![child.id.to_string()]);
    assert_eq!(board.child_count(), before + 1);
    validate_board(&board).unwrap();
}

#[test]
fn adding_a_column_leaves_existing_columns_untouched() {
    let board = demo_board();
    let next = reduce(&board, &Action::add_column("REVIEW", "In Review"));

    assert_eq!(next.columns().len(), 4);
    let review = next.column(&"REVIEW".into()).unwrap();
    assert_eq!(review.title, "In Review");
    assert!(next.column_tasks(&"REVIEW".into()).is_empty());
    for id in ["TODO", "INPROGRESS", "DONE"] {
        assert_eq!(column(&next, id), column(&board, id));
        assert_eq!(next.column(&id.into()), board.column(&id.into()));
    }
}

#[test]
fn updating_dev_status_changes_only_that_field() {
    let board = demo_board().apply(&Action::move_task("INPROGRESS", "DONE", "child-2"));
    let next = reduce(&board, &Action::update_dev_status("task-1", DevStatus::QaComplete));

    let before = board.parent(&"task-1".into()).unwrap();
    let after = next.parent(&"task-1".into()).unwrap();
    assert_eq!(after.dev_status, DevStatus::QaComplete);
    assert_eq!(after.content, before.content);
    assert_eq!(after.status, before.status);
    assert_eq!(after.epic, before.epic);
    assert_eq!(after.children, before.children);
    assert_eq!(next.parent_tasks()[1..], board.parent_tasks()[1..]);
    assert_eq!(next.child_count(), board.child_count());
}

#[test]
fn dev_status_is_guarded_until_children_are_done() {
    let mut board = demo_board();
    let outcome = board.dispatch(&Action::update_dev_status("task-1", DevStatus::DevComplete));
    assert_eq!(
        outcome,
        Outcome::Ignored(IgnoreReason::ChildrenNotDone {
            parent_id: "task-1".into(),
            remaining: 1,
        })
    );
    assert_eq!(
        board.parent(&"task-1".into()).unwrap().dev_status,
        DevStatus::Pending
    );
}

#[test]
fn same_column_move_returns_equal_board() {
    let board = demo_board();
    for id in ["child-1", "child-3", "missing"] {
        let status = board
            .child(&id.into())
            .map(|c| c.status.to_string())
            .unwrap_or_else(|| "TODO".to_string());
        let next = reduce(&board, &Action::move_task(status.as_str(), status.as_str(), id));
        assert_eq!(next, board);
    }
}

#[test]
fn moving_a_missing_task_returns_equal_board() {
    let board = demo_board();
    let next = reduce(&board, &Action::move_task("TODO", "DONE", "nonexistent-id"));
    assert_eq!(next, board);

    let mut board = board;
    assert_eq!(
        board.dispatch(&Action::move_task("TODO", "DONE", "nonexistent-id")),
        Outcome::Ignored(IgnoreReason::TaskNotFound {
            task_id: "nonexistent-id".into()
        })
    );
}

#[test]
fn adding_to_a_missing_parent_is_ignored() {
    let board = demo_board();
    let next = reduce(&board, &Action::add_child_task("task-404", "Ghost"));
    assert_eq!(next, board);
}

#[test]
fn child_counts_are_conserved() {
    let board = demo_board();
    let total = board.child_count();
    assert_eq!(placed_count(&board), total);

    let moved = reduce(&board, &Action::move_task("TODO", "INPROGRESS", "child-3"));
    assert_eq!(moved.child_count(), total);
    assert_eq!(placed_count(&moved), total);

    let dev = reduce(&board, &Action::update_dev_status("task-3", DevStatus::ProdReady));
    assert_eq!(dev.child_count(), total);
    assert_eq!(placed_count(&dev), total);

    let added = reduce(&board, &Action::add_child_task("task-3", "CI Pipeline"));
    assert_eq!(added.child_count(), total + 1);
    assert_eq!(placed_count(&added), total + 1);
}

#[test]
fn reduce_leaves_its_input_untouched() {
    let board = demo_board();
    let snapshot = board.clone();
    let next = reduce(&board, &Action::move_task("TODO", "DONE", "child-4"));
    assert_eq!(board, snapshot);
    assert_ne!(next, board);
}

#[test]
fn moved_tasks_queue_at_the_end_of_the_destination() {
    let board = demo_board()
        .apply(&Action::move_task("TODO", "DONE", "child-4"))
        .apply(&Action::move_task("TODO", "DONE", "child-3"));
    assert_eq!(
        column(&board, "DONE"),
        vec!["child-1", "child-5", "child-6", "child-4", "child-3"]
    );
}

#[test]
fn progress_tracks_done_children() {
    let board = demo_board();
    let progress = board.progress(&"task-1".into()).unwrap();
    assert_eq!((progress.completed, progress.total), (1, 2));
    assert!(!board.can_change_dev_status(&"task-1".into()));
    assert!(board.can_change_dev_status(&"task-3".into()));
    assert!(board.progress(&"task-404".into()).is_none());
    assert_eq!(
        board.parent_of(&"child-4".into()).map(|p| p.id.as_str()),
        Some("task-2")
    );
}
