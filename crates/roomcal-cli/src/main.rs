//! roomcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use roomcal_core::init_tracing;

use roomcal_cli::cli::{Cli, Command, ConfigAction};
use roomcal_cli::commands;
use roomcal_cli::config::AppConfig;
use roomcal_cli::error::CliResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let mut config = AppConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Serve(ref args) => args.apply(&mut config),
        Command::Render(ref args) => args.source.apply(&mut config),
        Command::Rooms(ref args) => args.apply(&mut config),
        Command::Config { .. } => {}
    }

    if let Err(e) = init_tracing(cli.tracing_config(&config)) {
        eprintln!("warning: {}", e);
    }

    match cli.command {
        Command::Serve(_) => commands::serve::run(&config).await,
        Command::Render(ref args) => commands::render::run(&config, args).await,
        Command::Rooms(_) => commands::rooms::run(&config).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, cli.config.as_deref()),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(cli.config.as_deref()),
        },
    }
}
