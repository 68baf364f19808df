mod checkin;
mod cli;
mod infra;
mod routes;
mod server;

use gym_checkin::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
