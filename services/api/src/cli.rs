use crate::checkin::run_check_in;
use crate::server;
use clap::{Args, Parser, Subcommand};
use gym_checkin::config::{AppConfig, MembershipApiConfig};
use gym_checkin::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Gym Check-In Kiosk",
    about = "Run the gym check-in kiosk or check a member in from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the kiosk HTTP service (default command)
    Serve(ServeArgs),
    /// Check a member in once and print the result as JSON
    CheckIn(CheckInArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the membership API base URL
    #[arg(long)]
    pub(crate) api_base_url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct CheckInArgs {
    /// Member DNI, as it would be typed at the kiosk
    pub(crate) dni: String,
    /// Override the membership API base URL
    #[arg(long)]
    pub(crate) api_base_url: Option<String>,
}

/// Points the membership client at `base_url`, keeping the configured timeout.
pub(crate) fn override_api_base_url(
    config: &mut AppConfig,
    base_url: Option<String>,
) -> Result<(), AppError> {
    if let Some(base_url) = base_url {
        config.membership_api = MembershipApiConfig::new(base_url, config.membership_api.timeout)?;
    }
    Ok(())
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::CheckIn(args) => run_check_in(args).await,
    }
}
