use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ecosentry")]
#[command(version)]
#[command(about = "Risk monitoring and alerting for a DeFi token ecosystem", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and environment overrides
    #[arg(short, long, default_value = "config", env = "ECOSENTRY_CONFIG_DIR")]
    pub config_dir: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the scheduler and API server until shutdown (default)
    Run,
    /// Run one report cycle now and print the outcome
    Report {
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the governor's current risk status
    Status,
    /// Validate the configuration and exit
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::parse_from(["ecosentry"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config_dir, "config");
    }

    #[test]
    fn test_report_json_flag() {
        let cli = Cli::parse_from(["ecosentry", "--config-dir", "/etc/ecosentry", "report", "--json"]);
        assert_eq!(cli.command, Some(Commands::Report { json: true }));
        assert_eq!(cli.config_dir, "/etc/ecosentry");
    }
}
