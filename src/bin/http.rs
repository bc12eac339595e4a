#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use kanban_board::{
        Board, BoardStore, ServerConfig, SprintRecord, default_columns, http_api, logging,
    };

    logging::init();
    let config = ServerConfig::from_env()?;

    let sprint = match &config.sprint_json {
        Some(path) => serde_json::from_str::<SprintRecord>(&std::fs::read_to_string(path)?)?,
        None => SprintRecord::demo(),
    };

    let state = match &config.db_path {
        #[cfg(feature = "sqlite")]
        Some(path) => {
            let store = kanban_board::SqliteBoardStore::new(path)?;
            let board = match store.load_board()? {
                Some(board) => board,
                None => {
                    let board = Board::from_sprint(&sprint, default_columns())?;
                    store.save_board(&board)?;
                    board
                }
            };
            http_api::AppState::new(board).with_store(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        Some(_) => {
            return Err("KANBAN_DB_PATH requires the `sqlite` feature".into());
        }
        None => http_api::AppState::new(Board::from_sprint(&sprint, default_columns())?),
    };

    http_api::serve(config.addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
