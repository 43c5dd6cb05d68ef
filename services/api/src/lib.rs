mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use open_home::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
