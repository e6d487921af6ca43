use clap::Parser;
use streamdash::cli::{
    check, handle_completions, handle_config_init, history, lang, load_config, set, status, watch,
    Cli, CommonArgs, Commands, ConfigCommands,
};
use streamdash::config::DashConfig;
use streamdash::logging::init_tracing;

/// Load config for a backend-facing command and start logging.
fn prepare(common: &CommonArgs) -> Result<DashConfig, Box<dyn std::error::Error>> {
    let config = load_config(common)?;
    init_tracing(&config.logging)?;
    tracing::debug!(base_url = %config.server.base_url, "Configuration loaded");
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch(args) => match prepare(&args.common) {
            Ok(config) => watch::handle_watch(&args, &config).await,
            Err(e) => Err(e),
        },
        Commands::Status(args) => match prepare(&args.common) {
            Ok(config) => status::handle_status(&args, &config).await,
            Err(e) => Err(e),
        },
        Commands::Set(args) => match prepare(&args.common) {
            Ok(config) => set::handle_set(&args, &config).await,
            Err(e) => Err(e),
        },
        Commands::CheckNow(args) => match prepare(&args.common) {
            Ok(config) => check::handle_check_now(&args, &config).await,
            Err(e) => Err(e),
        },
        Commands::History(args) => match prepare(&args.common) {
            Ok(config) => history::handle_history(&args, &config).await,
            Err(e) => Err(e),
        },
        Commands::Lang(args) => match prepare(&args.common) {
            Ok(config) => lang::handle_lang(&args, &config).await,
            Err(e) => Err(e),
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(String::new())
        }
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
