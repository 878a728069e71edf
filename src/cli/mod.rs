//! Command-line interface for the report pipeline.

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::OutputFormat;
use crate::core::levels::LevelVocabulary;
use crate::visualization::PlottersRenderer;
use crate::ReportConfig;

#[derive(Parser)]
#[command(name = "modernity-report")]
#[command(about = "Language level surface plot reports", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log failing plots and continue with the rest
    #[arg(long, global = true)]
    keep_going: bool,

    /// Defaults to `report`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render whole, scoped and per-package surface plots
    Report {
        /// Directory receiving the plots
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Plot file format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Convert wide result tables into the long tables the report reads
    Preprocess,

    /// Write the effective configuration as YAML
    InitConfig {
        /// Output YAML file
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// The configuration to run with: the given YAML file, or the defaults when
/// none was given. A file that cannot be loaded is an error.
fn resolve_config(path: Option<&Path>) -> anyhow::Result<ReportConfig> {
    let Some(path) = path else {
        return Ok(ReportConfig::default());
    };

    let config = ReportConfig::from_yaml(path)
        .map_err(|e| anyhow!("Failed to load config from {}: {}", path.display(), e))?;
    info!("Loaded config from: {}", path.display());
    Ok(config)
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let mut config = match resolve_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if cli.keep_going {
        config.keep_going = true;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let vocab = match LevelVocabulary::new(config.levels.labels.iter().cloned()) {
        Ok(vocab) => vocab,
        Err(e) => {
            error!("Invalid level vocabulary: {}", e);
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Report {
        output_dir: None,
        format: None,
    });

    // Dispatch to subcommands
    match command {
        Commands::Report { output_dir, format } => {
            if let Some(dir) = output_dir {
                config.paths.output_dir = dir;
            }
            if let Some(format) = format {
                config.render.format = format;
            }
            cmd_report(&config, &vocab);
        }
        Commands::Preprocess => {
            cmd_preprocess(&config, &vocab);
        }
        Commands::InitConfig { path } => {
            cmd_init_config(&path, &config);
        }
    }
}

fn cmd_report(config: &ReportConfig, vocab: &LevelVocabulary) {
    use crate::processors::report;

    let start = Instant::now();

    println!("Rendering surface plots...");
    println!("Results directory: {}", config.paths.results_dir.display());
    println!("Output directory: {}", config.paths.output_dir.display());
    println!(
        "Scope: level {:?} > {}",
        config.levels.scope_mode, config.levels.scope_threshold
    );

    let spinner = create_spinner("Loading fonts...");
    let renderer = PlottersRenderer::new(config.render.clone(), vocab);

    spinner.set_message("Rendering plots...");

    match report::run_report(config, vocab, &renderer) {
        Ok(summary) => {
            spinner.finish_and_clear();

            print_summary(
                "Report Complete",
                &[
                    ("Datasets", config.datasets.len().to_string()),
                    ("Plots written", summary.written.len().to_string()),
                    ("Plots failed", summary.failed.len().to_string()),
                    ("Output directory", config.paths.output_dir.display().to_string()),
                    ("Format", config.render.format.extension().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );

            if !summary.failed.is_empty() {
                for (name, reason) in &summary.failed {
                    error!("{}: {}", name, reason);
                }
                std::process::exit(1);
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Report failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_preprocess(config: &ReportConfig, vocab: &LevelVocabulary) {
    use crate::processors::preprocess;

    let start = Instant::now();

    println!("Converting wide result tables...");
    for input in &config.preprocess.inputs {
        println!("  {} -> {}", input.wide.display(), input.long.display());
    }
    println!("Combined table: {}", config.preprocess.combined.display());

    let spinner = create_spinner("Melting result tables...");

    match preprocess::run_preprocess(&config.preprocess, vocab) {
        Ok(summary) => {
            spinner.finish_and_clear();

            let mut items: Vec<(&str, String)> = summary
                .outputs
                .iter()
                .map(|(path, rows)| ("Rows written", format!("{} ({})", rows, path.display())))
                .collect();
            items.push(("Combined rows", summary.combined.1.to_string()));
            items.push(("Duration", format!("{:.2?}", start.elapsed())));

            print_summary("Preprocess Complete", &items);
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Preprocess failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_init_config(path: &PathBuf, config: &ReportConfig) {
    match config.to_yaml(path) {
        Ok(()) => println!("Wrote configuration to {}", path.display()),
        Err(e) => {
            error!("Failed to write config to {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_report() {
        let cli = Cli::try_parse_from(["modernity-report"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.keep_going);
    }

    #[test]
    fn test_report_overrides() {
        let cli = Cli::try_parse_from([
            "modernity-report",
            "--keep-going",
            "report",
            "--output-dir",
            "plots",
            "--format",
            "svg",
        ])
        .unwrap();
        assert!(cli.keep_going);

        match cli.command {
            Some(Commands::Report { output_dir, format }) => {
                assert_eq!(output_dir, Some(PathBuf::from("plots")));
                assert_eq!(format, Some(OutputFormat::Svg));
            }
            _ => panic!("expected report subcommand"),
        }
    }

    #[test]
    fn test_resolve_config_defaults_without_file() {
        let config = resolve_config(None).unwrap();
        assert_eq!(config.datasets.len(), 3);
        assert!(!config.keep_going);
    }

    #[test]
    fn test_resolve_config_loads_given_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.yaml");
        std::fs::write(&path, "keep_going: true\n").unwrap();

        let config = resolve_config(Some(path.as_path())).unwrap();
        assert!(config.keep_going);
    }

    #[test]
    fn test_resolve_config_rejects_unreadable_file() {
        let temp_dir = TempDir::new().unwrap();

        let missing = temp_dir.path().join("absent.yaml");
        let err = resolve_config(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));

        let broken = temp_dir.path().join("broken.yaml");
        std::fs::write(&broken, "datasets: [unterminated\n").unwrap();
        assert!(resolve_config(Some(broken.as_path())).is_err());
    }
}
