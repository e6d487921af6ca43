//! History command handler

use crate::cli::lang::load_translations;
use crate::cli::output::format_history_json;
use crate::cli::HistoryArgs;
use crate::client::ApiClient;
use crate::config::DashConfig;
use crate::dashboard::{ChartData, HistoryChart};

/// Handle `streamdash history` command
pub async fn handle_history(
    args: &HistoryArgs,
    config: &DashConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let api = ApiClient::new(&config.server)?;
    let entries = api.history().await?;

    if args.json {
        return Ok(format_history_json(&entries)?);
    }

    let translations = load_translations(&api, config).await;
    let chart = HistoryChart::new(ChartData::from_history(&entries), &translations);
    Ok(chart.render(args.width.unwrap_or(config.chart.width)))
}
