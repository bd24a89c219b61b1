mod cli;
mod forecast;
mod infra;
mod page;
mod routes;
mod server;

use sales_forecaster::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
