use clap::{Parser, Subcommand};
use dbreset::output::OutputFormat;
use dbreset::DbResetConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.dbreset/dbreset.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// SQLite database path, overrides the configured one
    #[clap(long, global = true)]
    db: Option<String>,

    /// Output format: table, markdown, json, json-pretty
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create all application tables that do not exist yet
    Init,

    /// Drop all tables, falling back to a cascade drop when needed
    Drop(commands::schema::DestructiveArgs),

    /// Drop all tables, then create them again
    Reset(commands::schema::DestructiveArgs),

    /// Compare the live database against the application tables
    Status,

    /// Show the effective configuration
    Config,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // a missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = match DbResetConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    let result = match cli.command {
        Commands::Init => commands::schema::run_init(&config, cli.format),
        Commands::Drop(args) => commands::schema::run_drop(&config, args, cli.format),
        Commands::Reset(args) => commands::schema::run_reset(&config, args, cli.format),
        Commands::Status => commands::schema::run_status(&config, cli.format),
        Commands::Config => commands::config::run(&config, cli.format),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}
