mod cli;
mod infra;
mod recommend;
mod routes;
mod server;
mod train;

use stat_selector::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
