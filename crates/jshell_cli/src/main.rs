//! Shell executable.
//!
//! # Responsibility
//! - Layer startup configuration: defaults, config file, environment, flags.
//! - Bootstrap logging, run the script and exit with its status.

use clap::Parser;
use jshell_core::{
    flush_log, init_logging, load_config_file, HostConfig, ScriptHost, DEFAULT_CONFIG_FILE,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "jshell", version, about = "JavaScript shell")]
struct Cli {
    /// Script file to execute.
    script: PathBuf,

    /// Arguments passed through to the script.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    script_args: Vec<String>,

    /// Disable network-dependent script features.
    #[arg(short = 'n', long)]
    no_network: bool,

    /// Boot script directory override.
    #[arg(short = 'b', long, value_name = "DIR")]
    boot_path: Option<PathBuf>,

    /// Logfile path.
    #[arg(short = 'l', long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Config file path.
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(status) => ExitCode::from(status.clamp(0, 255) as u8),
        Err(message) => {
            log::error!("event=shell_exit module=cli status=error message={message}");
            eprintln!("jshell: {message}");
            flush_log();
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<i32, String> {
    let mut config = load_layered_config(cli.config.as_deref())?;
    if cli.no_network {
        config.no_network = true;
    }
    if let Some(path) = cli.boot_path {
        config.boot_path = Some(path);
    }
    if let Some(path) = cli.log_file {
        config.log_file = Some(path);
    }
    if let Some(level) = cli.log_level {
        config.log_level = Some(level);
    }
    config.apply_env();
    config.script_args = cli.script_args;

    let log_file = config.effective_log_file();
    let log_level = config.effective_log_level();
    let log_file = log_file
        .to_str()
        .ok_or_else(|| "logfile path is not valid UTF-8".to_string())?;
    init_logging(&log_level, log_file).map_err(|err| format!("logging setup failed: {err}"))?;

    let mut host = ScriptHost::new(config).map_err(|err| err.to_string())?;
    let status = host.run_file(&cli.script).map_err(|err| err.to_string())?;
    host.shutdown();
    Ok(status)
}

fn load_layered_config(explicit: Option<&Path>) -> Result<HostConfig, String> {
    if let Some(path) = explicit {
        return load_config_file(path).map_err(|err| err.to_string());
    }
    if Path::new(DEFAULT_CONFIG_FILE).is_file() {
        return load_config_file(DEFAULT_CONFIG_FILE).map_err(|err| err.to_string());
    }
    Ok(HostConfig::default())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::CommandFactory;
    use clap::Parser;

    #[test]
    fn cli_declaration_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn script_arguments_pass_through_untouched() {
        let cli = Cli::parse_from(["jshell", "-n", "main.js", "--frob", "in.txt"]);
        assert!(cli.no_network);
        assert_eq!(cli.script.to_str(), Some("main.js"));
        assert_eq!(cli.script_args, vec!["--frob", "in.txt"]);
    }
}
