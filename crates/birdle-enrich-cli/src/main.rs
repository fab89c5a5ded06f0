use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use birdle_enrich::contributor::scraper::DEFAULT_TIMEOUT;
use birdle_enrich::dataset::{load_records, save_records};
use birdle_enrich::names::{NamesBrowser, NamesOptions};
use birdle_enrich::pipeline::{DEFAULT_DELAY, enrich_common_names, enrich_contributors};
use birdle_enrich::types::BirdRecord;
use birdle_enrich::utils::DatasetStats;
use birdle_enrich::{CONTRIBUTORS_OUTPUT, ContributorScraper, DEFAULT_INPUT, NAMES_OUTPUT};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "birdle-enrich")]
#[command(about = "Enriches the Birdle bird dataset with contributors and common names", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Add the Macaulay Library contributor of each record's picture
    Contributors {
        #[arg(long, default_value = DEFAULT_INPUT, help = "Dataset to read")]
        input: PathBuf,

        #[arg(long, default_value = CONTRIBUTORS_OUTPUT, help = "Where to write the result")]
        output: PathBuf,

        #[arg(
            long,
            default_value_t = DEFAULT_DELAY.as_millis() as u64,
            help = "Pause after every request, in milliseconds"
        )]
        delay_ms: u64,

        #[arg(
            long,
            default_value_t = DEFAULT_TIMEOUT.as_secs(),
            help = "HTTP timeout in seconds",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        timeout_secs: u64,
    },
    /// Add localized common names scraped from each record's Doi page
    CommonNames {
        #[arg(long, default_value = CONTRIBUTORS_OUTPUT, help = "Dataset to read")]
        input: PathBuf,

        #[arg(long, default_value = NAMES_OUTPUT, help = "Where to write the result")]
        output: PathBuf,

        #[arg(
            long,
            default_value_t = 60,
            help = "Seconds to wait for the 'Names (N)' toggle",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        toggle_timeout_secs: u64,

        #[arg(
            long,
            default_value_t = 60,
            help = "Seconds to wait for the common names dialog",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        dialog_timeout_secs: u64,

        #[arg(long, help = "Show the browser window")]
        headed: bool,
    },
    /// Print statistics about a dataset file
    Summary {
        #[arg(help = "Dataset to inspect")]
        file: PathBuf,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn load_or_exit(path: &Path) -> Vec<BirdRecord> {
    let records = load_records(path).unwrap_or_else(|e| {
        log::error!("{}", e);
        process::exit(1);
    });
    log::info!("Loaded {} record(s) from {}", records.len(), path.display());
    records
}

fn save_or_exit(path: &Path, records: &[BirdRecord]) {
    save_records(path, records).unwrap_or_else(|e| {
        log::error!("{}", e);
        process::exit(1);
    });
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Contributors {
            input,
            output,
            delay_ms,
            timeout_secs,
        } => {
            let mut records = load_or_exit(&input);

            let scraper = ContributorScraper::with_timeout(Duration::from_secs(timeout_secs))
                .unwrap_or_else(|e| {
                    log::error!("Error creating scraper: {}", e);
                    process::exit(1);
                });

            let report =
                enrich_contributors(&mut records, &scraper, Duration::from_millis(delay_ms)).await;

            save_or_exit(&output, &records);
            print!("{}", report);
            println!(
                "\nDone. Wrote updated birds with contributors to {}",
                output.display()
            );
        }

        Commands::CommonNames {
            input,
            output,
            toggle_timeout_secs,
            dialog_timeout_secs,
            headed,
        } => {
            let records = load_or_exit(&input);

            let options = NamesOptions {
                headless: !headed,
                toggle_timeout: Duration::from_secs(toggle_timeout_secs),
                dialog_timeout: Duration::from_secs(dialog_timeout_secs),
                ..NamesOptions::default()
            };

            // headless_chrome blocks, keep it off the async workers
            let outcome = tokio::task::spawn_blocking(move || {
                let mut records = records;
                let mut browser = NamesBrowser::launch(options)?;
                let report = enrich_common_names(&mut records, &mut browser);
                Ok::<_, birdle_enrich::names::BrowserError>((records, report))
            })
            .await;

            let (records, report) = match outcome {
                Ok(Ok(done)) => done,
                Ok(Err(e)) => {
                    log::error!("{}", e);
                    process::exit(1);
                }
                Err(e) => {
                    log::error!("Browser task failed: {}", e);
                    process::exit(1);
                }
            };

            save_or_exit(&output, &records);
            print!("{}", report);
            println!("\n🎉 Done. Saved {}", output.display());
        }

        Commands::Summary { file, format } => {
            let records = load_or_exit(&file);
            let stats = DatasetStats::from_records(&records);

            match format {
                OutputFormat::Json => serialize_json(&stats),
                OutputFormat::Text => {
                    if records.is_empty() {
                        println!("No entries to display.");
                    } else {
                        for (i, record) in records.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, record);
                        }
                        print!("{}", stats);
                    }
                }
            }
        }
    }
}
