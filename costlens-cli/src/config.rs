use costlens::EngineConfig;
use std::path::Path;

use crate::analyze::load_config;
use crate::cli::ConfigSubcommand;
use crate::error::CliResult;

pub fn run_config_command(subcommand: ConfigSubcommand) -> CliResult<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => print!("{}", effective_config_yaml(config.as_deref())?),
        ConfigSubcommand::Example => print!("{}", EngineConfig::example_yaml_config()),
    }
    Ok(())
}

/// The layered configuration, rendered as YAML
pub fn effective_config_yaml(explicit: Option<&Path>) -> CliResult<String> {
    let config = load_config(explicit)?;
    if let Some(path) = explicit.map(Path::to_path_buf).or_else(EngineConfig::find_yaml_config_file) {
        tracing::info!("Using configuration file {}", path.display());
    }
    Ok(config.to_yaml()?)
}
