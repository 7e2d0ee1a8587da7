use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use bookrec::config::Config;
use bookrec::language::Translations;
use bookrec::logging;
use bookrec::pipeline::{Pipeline, RunReport};

#[derive(Parser)]
#[command(name = "bookrec")]
#[command(about = "Turns pcbis.de title exports into enriched recommendation sheets")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich an export: local normalization, covers, then the catalog
    Run {
        /// Export to read (overrides paths.input)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Sheet to write (overrides paths.output)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip the KNV catalog and write the locally enriched records
        #[arg(long)]
        no_catalog: bool,
        /// Skip cover downloads
        #[arg(long)]
        no_covers: bool,
        /// Print the run report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

fn print_summary(report: &RunReport) {
    println!("\n📊 Results for {}:", report.input_file);
    println!("   Total records: {}", report.total_records);
    println!("   Enriched: {}", report.enriched_records);
    println!("   Written: {}", report.written_records);
    println!("   Catalog: {}", report.provider.as_deref().unwrap_or("none"));
    println!("   Failures: {}", report.failures.len());
    println!("   Output file: {}", report.output_file);

    if !report.failures.is_empty() {
        println!("\n⚠️  Failures:");
        for failure in &report.failures {
            println!("   - {}", failure);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Commands::Run {
            input,
            output,
            no_catalog,
            no_covers,
            json,
        } => {
            if let Some(input) = input {
                config.paths.input = input;
            }
            if let Some(output) = output {
                config.paths.output = output;
            }
            if no_catalog {
                config.catalog.enabled = false;
            }
            if no_covers {
                config.cover.enabled = false;
            }

            let translations = Translations::load(&config.paths.language)
                .with_context(|| format!("loading {}", config.paths.language.display()))?;
            let pipeline = Pipeline::from_config(&config, Arc::new(translations))?;

            info!("Starting run");
            match pipeline.run(&config.paths.input, &config.paths.output).await {
                Ok(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        print_summary(&report);
                    }
                    if report.written_records == 0 {
                        warn!("Nothing was written");
                    }
                }
                Err(e) => {
                    error!("Run failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
