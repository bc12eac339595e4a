use kanban_board::{
    Action, Board, DevStatus, Outcome, SprintRecord, default_columns, load_board_from_csv,
    load_board_from_json, logging, save_board_to_csv, save_board_to_json,
};
use std::io::{self, Write};

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (i, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[i].saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_board(board: &Board) -> String {
    let mut rows = Vec::new();
    for column in board.columns() {
        let tasks = board.column_tasks(&column.id);
        if tasks.is_empty() {
            rows.push(vec![
                format!("{} ({})", column.title, column.id),
                String::new(),
                String::new(),
                String::new(),
            ]);
            continue;
        }
        for (i, task) in tasks.into_iter().enumerate() {
            let column_label = if i == 0 {
                format!("{} ({})", column.title, column.id)
            } else {
                String::new()
            };
            let parent = board
                .parent(&task.parent_id)
                .map(|p| p.content.clone())
                .unwrap_or_default();
            rows.push(vec![
                column_label,
                task.id.to_string(),
                task.content.clone(),
                parent,
            ]);
        }
    }
    render_text_table(&["column", "task", "content", "parent"], &rows)
}

fn render_parents(board: &Board) -> String {
    let rows: Vec<Vec<String>> = board
        .parent_tasks()
        .iter()
        .map(|parent| {
            let progress = board
                .progress(&parent.id)
                .map(|p| format!("{}/{}", p.completed, p.total))
                .unwrap_or_default();
            vec![
                parent.id.to_string(),
                parent.content.clone(),
                parent.status.to_string(),
                parent.epic.clone().unwrap_or_default(),
                parent.dev_status.label().to_string(),
                progress,
            ]
        })
        .collect();
    render_text_table(
        &["id", "content", "status", "epic", "dev status", "progress"],
        &rows,
    )
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show columns and their tasks\n  parents                            Show parent tasks with progress\n  move <task> <column>               Move a child task to another column\n  add <parent> <content...>          Add a child task to a parent\n  dev <parent> <status>              Set dev status (pending|devComplete|qaComplete|prodReady)\n  column <id> [title...]             Add a column\n  save <json|csv> <path>             Persist board to disk\n  load <json|csv> <path>             Load board from disk\n  quit|exit                          Exit"
    );
}

fn report(outcome: Outcome, done: &str, board: &Board) {
    match outcome {
        Outcome::Applied => {
            println!("{done}");
            println!("{}", render_board(board));
        }
        Outcome::Ignored(reason) => println!("Ignored: {reason}."),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default("warn");
    let mut board = Board::from_sprint(&SprintRecord::demo(), default_columns())?;

    println!("Kanban Board (CLI) - type 'help' for commands\n");
    println!("{}", render_board(&board));

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_board(&board)),
            "parents" => println!("{}", render_parents(&board)),
            "move" => match (parts.next(), parts.next()) {
                (Some(task), Some(destination)) => {
                    let Some(source) = board.child(&task.into()).map(|c| c.status.clone()) else {
                        println!("Task {task} not found.");
                        continue;
                    };
                    let outcome = board.dispatch(&Action::move_task(source, destination, task));
                    report(outcome, &format!("Moved {task} to {destination}."), &board);
                }
                _ => println!("Usage: move <task> <column>"),
            },
            "add" => {
                let parent = parts.next();
                let rest: Vec<&str> = parts.collect();
                match (parent, !rest.is_empty()) {
                    (Some(parent), true) => {
                        let content = rest.join(" ");
                        let outcome = board.dispatch(&Action::add_child_task(parent, content));
                        report(outcome, &format!("Added child task to {parent}."), &board);
                    }
                    _ => println!("Usage: add <parent> <content...>"),
                }
            }
            "dev" => match (parts.next(), parts.next()) {
                (Some(parent), Some(status_s)) => {
                    let status = match status_s.parse::<DevStatus>() {
                        Ok(s) => s,
                        Err(e) => {
                            println!("Invalid dev status: {e}");
                            continue;
                        }
                    };
                    match board.dispatch(&Action::update_dev_status(parent, status)) {
                        Outcome::Applied => {
                            println!("Dev status of {parent} set to {}.", status.label());
                            println!("{}", render_parents(&board));
                        }
                        Outcome::Ignored(reason) => println!("Ignored: {reason}."),
                    }
                }
                _ => println!("Usage: dev <parent> <status>"),
            },
            "column" => {
                let id = parts.next();
                let rest: Vec<&str> = parts.collect();
                match id {
                    Some(id) => {
                        let title = if rest.is_empty() {
                            id.to_string()
                        } else {
                            rest.join(" ")
                        };
                        let outcome = board.dispatch(&Action::add_column(id, title));
                        report(outcome, &format!("Column {id} added."), &board);
                    }
                    None => println!("Usage: column <id> [title...]"),
                }
            }
            "save" => {
                let fmt = parts.next();
                let path = parts.next();
                let result = match (fmt, path) {
                    (Some("json"), Some(path)) => Some((save_board_to_json(&board, path), path)),
                    (Some("csv"), Some(path)) => Some((save_board_to_csv(&board, path), path)),
                    _ => None,
                };
                match result {
                    Some((Ok(()), path)) => println!("Board saved to {path}."),
                    Some((Err(e), _)) => println!("Error saving board: {e}"),
                    None => println!("Usage: save <json|csv> <path>"),
                }
            }
            "load" => {
                let fmt = parts.next();
                let path = parts.next();
                let result = match (fmt, path) {
                    (Some("json"), Some(path)) => Some((load_board_from_json(path), path)),
                    (Some("csv"), Some(path)) => Some((load_board_from_csv(path), path)),
                    _ => None,
                };
                match result {
                    Some((Ok(loaded), path)) => {
                        board = loaded;
                        println!("Board loaded from {path}.");
                        println!("{}", render_board(&board));
                    }
                    Some((Err(e), _)) => println!("Error loading board: {e}"),
                    None => println!("Usage: load <json|csv> <path>"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
    Ok(())
}
