use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weather-repo-processor")]
#[command(about = "Cleaning and weekly rollups for Global Weather Repository snapshots")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        help = "TOML file with pipeline settings (WEATHER_REPO_* variables override it)"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a snapshot and write the output tables
    Process {
        #[arg(short, long, help = "Snapshot CSV file")]
        input: PathBuf,

        #[arg(short, long, help = "Country translation CSV (raw,canonical)")]
        translations: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output directory [default: output/weather-repo-{YYMMDD}]"
        )]
        output_dir: Option<PathBuf>,

        #[arg(short, long, default_value = "snappy")]
        compression: String,

        #[arg(long, default_value = "false")]
        validate_only: bool,
    },

    /// Run cleaning and the integrity check without writing anything
    Validate {
        #[arg(short, long, help = "Snapshot CSV file")]
        input: PathBuf,

        #[arg(short, long, help = "Country translation CSV (raw,canonical)")]
        translations: Option<PathBuf>,
    },

    /// Display information about a Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_command() {
        let cli = Cli::parse_from([
            "weather-repo-processor",
            "--verbose",
            "process",
            "--input",
            "snapshot.csv",
            "--compression",
            "zstd",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Process {
                input,
                translations,
                output_dir,
                compression,
                validate_only,
            } => {
                assert_eq!(input, PathBuf::from("snapshot.csv"));
                assert!(translations.is_none());
                assert!(output_dir.is_none());
                assert_eq!(compression, "zstd");
                assert!(!validate_only);
            }
            _ => panic!("expected process command"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "weather-repo-processor",
            "info",
            "--file",
            "weekly.parquet",
            "--config",
            "pipeline.toml",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("pipeline.toml")));
        assert!(matches!(cli.command, Commands::Info { .. }));
    }
}
