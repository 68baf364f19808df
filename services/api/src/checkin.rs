use crate::cli::{override_api_base_url, CheckInArgs};
use gym_checkin::config::AppConfig;
use gym_checkin::error::AppError;
use gym_checkin::telemetry;
use gym_checkin::workflows::checkin::{validate_dni, CheckInProcessor};
use gym_checkin::workflows::membership::HttpMembershipApi;
use std::sync::Arc;

/// One check-in from the terminal, printed as JSON.
pub(crate) async fn run_check_in(args: CheckInArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    override_api_base_url(&mut config, args.api_base_url)?;
    telemetry::init(&config.telemetry)?;

    let dni = validate_dni(&args.dni)?;
    let api = Arc::new(HttpMembershipApi::new(&config.membership_api)?);
    let result = CheckInProcessor::new(api).process(&dni).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
