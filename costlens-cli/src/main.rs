use std::process;

use clap::CommandFactory;
use costlens_cli::cli::{Cli, Commands};
use costlens_cli::error::handle_cli_result;
use costlens_cli::exit_codes::{EXIT_GENERAL, EXIT_SUCCESS};
use costlens_cli::forecast::ForecastOptions;
use costlens_cli::{analyze, completions, config, forecast};

fn main() {
    let cli = Cli::parse_args();

    // Fast path for help
    let Some(command) = cli.command else {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Failed to print help: {}", e);
            process::exit(EXIT_GENERAL);
        }
        process::exit(EXIT_SUCCESS);
    };

    use tracing::Level;

    let log_level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::TRACE
    } else if cli.debug {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(log_level)
        .init();

    let exit_code = match command {
        Commands::Analyze {
            file,
            window_days,
            granularity,
            format,
            config,
        } => {
            tracing::info!("Analyzing {}", file.display());
            handle_cli_result(analyze::run_analyze_command(
                &file,
                window_days,
                granularity,
                format,
                config.as_deref(),
            ))
        }
        Commands::Forecast {
            file,
            horizon,
            seasonality,
            revenue_ratio,
            scenarios,
            presets,
            format,
            config,
        } => {
            tracing::info!("Forecasting {}", file.display());
            let options = ForecastOptions {
                horizon,
                seasonality,
                revenue_ratio,
                scenarios,
                presets,
            };
            handle_cli_result(forecast::run_forecast_command(
                &file,
                options,
                format,
                config.as_deref(),
            ))
        }
        Commands::Config { subcommand } => {
            handle_cli_result(config::run_config_command(subcommand))
        }
        Commands::Completion { shell } => {
            tracing::info!("Generating completion for {:?}", shell);
            run_completions(shell)
        }
    };

    process::exit(exit_code);
}

fn run_completions(shell: clap_complete::Shell) -> i32 {
    match completions::print_completion(shell) {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => {
            tracing::error!("Completion error: {}", e);
            EXIT_GENERAL
        }
    }
}
