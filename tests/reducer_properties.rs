use kanban_board::{
    Action, Board, DevStatus, SprintRecord, default_columns, reduce, validate_board,
};
use proptest::prelude::*;

const COLUMNS: &[&str] = &["TODO", "INPROGRESS", "DONE", "REVIEW", "GHOST"];
const TASKS: &[&str] = &[
    "child-1", "child-2", "child-3", "child-4", "child-5", "child-6", "child-x",
];
const PARENTS: &[&str] = &["task-1", "task-2", "task-3", "task-9"];

fn demo_board() -> Board {
    Board::from_sprint(&SprintRecord::demo(), default_columns()).unwrap()
}

fn dev_status_strategy() -> impl Strategy<Value = DevStatus> {
    prop::sample::select(DevStatus::ALL.to_vec())
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => (
            prop::sample::select(COLUMNS),
            prop::sample::select(COLUMNS),
            prop::sample::select(TASKS),
        )
            .prop_map(|(source, destination, task)| Action::move_task(source, destination, task)),
        2 => (prop::sample::select(PARENTS), "[a-z ]{0,12}")
            .prop_map(|(parent, content)| Action::add_child_task(parent, content)),
        2 => (prop::sample::select(PARENTS), dev_status_strategy())
            .prop_map(|(parent, status)| Action::update_dev_status(parent, status)),
        1 => (prop::sample::select(COLUMNS), "[A-Za-z ]{0,8}")
            .prop_map(|(id, title)| Action::add_column(id, title)),
    ]
}

fn placed_count(board: &Board) -> usize {
    board
        .columns()
        .iter()
        .map(|c| board.column_tasks(&c.id).len())
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn every_reachable_board_is_consistent(actions in prop::collection::vec(action_strategy(), 0..24)) {
        let mut board = demo_board();
        for action in &actions {
            board = reduce(&board, action);
            prop_assert!(validate_board(&board).is_ok(), "invalid after {:?}", action);
            prop_assert_eq!(placed_count(&board), board.child_count());
        }
    }

    #[test]
    fn ignored_actions_leave_the_board_equal(actions in prop::collection::vec(action_strategy(), 1..16)) {
        let mut board = demo_board();
        for action in &actions {
            let before = board.clone();
            let outcome = board.dispatch(action);
            if !outcome.is_applied() {
                prop_assert_eq!(&board, &before);
            }
        }
    }

    #[test]
    fn only_add_child_changes_the_child_count(actions in prop::collection::vec(action_strategy(), 1..16)) {
        let mut board = demo_board();
        for action in &actions {
            let before = board.child_count();
            let applied = board.dispatch(action).is_applied();
            let expected = match action {
                Action::AddChildTask { .. } if applied => before + 1,
                _ => before,
            };
            prop_assert_eq!(board.child_count(), expected);
        }
    }

    #[test]
    fn same_column_moves_are_identity(
        column in prop::sample::select(COLUMNS),
        task in prop::sample::select(TASKS),
    ) {
        let board = demo_board();
        let next = reduce(&board, &Action::move_task(column, column, task));
        prop_assert_eq!(next, board);
    }

    #[test]
    fn moves_to_undefined_columns_are_ignored(task in prop::sample::select(TASKS)) {
        let board = demo_board();
        for source in ["TODO", "INPROGRESS", "DONE"] {
            let next = reduce(&board, &Action::move_task(source, "GHOST", task));
            prop_assert_eq!(&next, &board);
        }
    }
}
