use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_appender::rolling;

use worktime::{Config, init_db, project_worklogs};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "worktime.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(scope = ?config.report_scope, "Worklog rebuild starting...");

    let pool = init_db(&config.database_url, config.max_connections)
        .await
        .context("failed to open the database")?;

    let rows = match project_worklogs(&pool, config.report_scope).await {
        Ok(rows) => rows,
        Err(e) => {
            if e.is_client_error() {
                warn!(error = %e, "Worklog rebuild rejected");
            } else {
                error!(error = %e, "Worklog rebuild failed");
            }
            return Err(e).context("worklog rebuild failed");
        }
    };

    println!("{}", serde_json::to_string_pretty(&rows)?);

    pool.close().await;
    info!(rows = rows.len(), "Worklog rebuild done");
    Ok(())
}
