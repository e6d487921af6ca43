//! Watch command: the interactive dashboard
//!
//! The screen is redrawn on every paint. Commands are typed on stdin, one per
//! line; `help` lists them.

use crate::cli::output::format_dashboard;
use crate::cli::{parse_switch, WatchArgs};
use crate::client::{ApiClient, WsConnector};
use crate::config::DashConfig;
use crate::dashboard::editor::parse_seconds;
use crate::dashboard::{Control, DashboardSession, HistoryChart, Page, Surface, UserAction};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub const HELP: &str = "\
Commands:
  interval <secs>    set the check interval
  live on|off        toggle live mode
  timeout <secs>     set the live mode timeout
  youtube on|off     toggle YouTube checks (off also turns OBS control off)
  obs on|off         toggle OBS control
  check              trigger a check now
  history            reload the history chart
  lang <code>        switch display language
  help               show this list
  quit               leave";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(UserAction),
    Help,
}

/// Parse one line typed in watch mode. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for '{}'", verb));
    }

    let need = |what: &str| arg.ok_or_else(|| format!("'{}' needs {}", verb, what));

    let action = match verb.to_lowercase().as_str() {
        "interval" => UserAction::Edit(Control::CheckInterval(
            parse_seconds("check_interval", need("a number of seconds")?)
                .map_err(|e| e.to_string())?,
        )),
        "timeout" => UserAction::Edit(Control::LiveModeTimeout(
            parse_seconds("live_mode_timeout", need("a number of seconds")?)
                .map_err(|e| e.to_string())?,
        )),
        "live" => UserAction::Edit(Control::LiveMode(parse_switch(need("on or off")?)?)),
        "youtube" => UserAction::Edit(Control::YoutubeEnabled(parse_switch(need("on or off")?)?)),
        "obs" => UserAction::Edit(Control::ObsEnabled(parse_switch(need("on or off")?)?)),
        "check" => UserAction::CheckNow,
        "history" => UserAction::RefreshHistory,
        "lang" => UserAction::SetLanguage(need("a language code")?.to_string()),
        "quit" | "exit" | "q" => UserAction::Quit,
        "help" | "?" => return Ok(Some(Command::Help)),
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(Command::Action(action)))
}

/// Draws frames on the terminal.
pub struct TerminalSurface<W: Write> {
    out: W,
    chart_width: usize,
    clear: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, chart_width: usize, clear: bool) -> Self {
        Self {
            out,
            chart_width,
            clear,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn paint(&mut self, page: &Page, chart: Option<&HistoryChart>) {
        let frame = format_dashboard(page, chart, self.chart_width);
        let prefix = if self.clear { CLEAR_SCREEN } else { "" };
        if let Err(e) = write!(self.out, "{}{}\n> ", prefix, frame).and_then(|_| self.out.flush())
        {
            tracing::warn!(error = %e, "Could not draw dashboard");
        }
    }
}

/// Forward stdin lines as actions until EOF or the session goes away.
async fn read_commands(actions: mpsc::UnboundedSender<UserAction>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Stopped reading commands");
                break;
            }
        };
        match parse_command(&line) {
            Ok(Some(Command::Action(action))) => {
                if actions.send(action).is_err() {
                    break;
                }
            }
            Ok(Some(Command::Help)) => eprintln!("{}", HELP),
            Ok(None) => {}
            Err(message) => eprintln!("{}", message),
        }
    }
}

/// Handle `streamdash watch` command
pub async fn handle_watch(
    args: &WatchArgs,
    config: &DashConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let api = ApiClient::new(&config.server)?;
    let connector = WsConnector::from_config(&config.server, &config.connection);
    let surface = TerminalSurface::new(
        std::io::stdout(),
        args.width.unwrap_or(config.chart.width),
        true,
    );

    let session = DashboardSession::new(config, api, connector, surface);
    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted");
            cancel.cancel();
        }
    });

    let (actions, action_rx) = mpsc::unbounded_channel();
    let reader = tokio::spawn(read_commands(actions));
    let stats = session.run(action_rx).await;
    reader.abort();

    Ok(format!(
        "\nSession ended: {} pushes, {} patches sent, {} failed",
        stats.pushes, stats.edits_sent, stats.edits_failed
    ))
}
