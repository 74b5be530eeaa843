//! Collection service command — `userbook serve`.

use anyhow::Result;
use tracing::info;
use userbook::server::{ServerConfig, open_database, start_server};

pub async fn cmd_serve(config: ServerConfig, init: bool) -> Result<()> {
    if init {
        // Just initialize the database
        open_database(&config.db_path)?;
        info!(db = %config.db_path.display(), "users database initialized");
        println!("Users database initialized at {}", config.db_path.display());
        return Ok(());
    }

    start_server(config).await
}
