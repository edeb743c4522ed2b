pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use launderly_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "launderly",
    about = "Launderly pricing operator CLI",
    long_about = "Operate the Launderly pricing catalog: migrations, seed data, price \
                  calculations, modifier listings and config inspection.",
    after_help = "Examples:\n  launderly seed\n  \
                  launderly price --category CLOTHING --item Coat --modifier kids_items\n  \
                  launderly modifiers --category LEATHER"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the standard price list and modifier set (idempotent)")]
    Seed,
    #[command(about = "Calculate the price of one item and print the result with its full trace")]
    Price(commands::price::PriceArgs),
    #[command(about = "List modifier definitions, optionally only those valid for a category")]
    Modifiers(commands::modifiers::ModifiersArgs),
    #[command(about = "Recommend modifiers and risk warnings for stains and defects")]
    Recommend(commands::recommend::RecommendArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands report config failures themselves; logging falls back to defaults.
    let logging_config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    init_logging(&logging_config);

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Price(args) => commands::price::run(args),
        Command::Modifiers(args) => commands::modifiers::run(args),
        Command::Recommend(args) => commands::recommend::run(args),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays a single JSON document.
pub fn init_logging(config: &AppConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let initialized = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = initialized {
        eprintln!("logging already initialized: {error}");
    }
}
