//! Check-now command handler

use crate::cli::CheckNowArgs;
use crate::client::ApiClient;
use crate::config::DashConfig;

/// Handle `streamdash check-now` command
pub async fn handle_check_now(
    _args: &CheckNowArgs,
    config: &DashConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let api = ApiClient::new(&config.server)?;
    api.check_now().await?;
    Ok("✓ Check triggered. The result arrives with the next state push.".to_string())
}
