use anyhow::{anyhow, Result};
use clap::Args;
use dbreset::database::{
    ensure_parent_dir, open_app_engine, DropReport, SchemaLifecycle, SchemaStatus, SqliteEngine,
};
use dbreset::output::OutputFormat;
use dbreset::DbResetConfig;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Arguments shared by commands that delete data
#[derive(Args)]
pub struct DestructiveArgs {
    /// Skip confirmation; required, since all data is lost
    #[clap(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct DropResult<'a> {
    database: &'a str,
    #[serde(flatten)]
    report: DropReport,
}

#[derive(Debug, Serialize, Tabled)]
struct TableRow {
    table: String,
    registered: bool,
    present: bool,
    rows: String,
}

#[derive(Debug, Serialize)]
struct StatusInfo {
    database: String,
    schema: SchemaStatus,
    tables: Vec<TableRow>,
}

fn open_engine(config: &DbResetConfig) -> Result<SqliteEngine> {
    ensure_parent_dir(&config.database_path)?;
    open_app_engine(&config.database_path, config.busy_timeout())
}

fn confirm(args: &DestructiveArgs, action: &str, config: &DbResetConfig) -> Result<()> {
    if args.yes {
        Ok(())
    } else {
        Err(anyhow!(
            "Refusing to {} '{}' without --yes",
            action,
            config.database_path
        ))
    }
}

fn print_drop(config: &DbResetConfig, report: DropReport, output_format: OutputFormat) -> Result<()> {
    if output_format.is_json() {
        let result = DropResult {
            database: &config.database_path,
            report,
        };
        println!("{}", output_format.to_json(&result)?);
    } else {
        println!(
            "Dropped {} tables from {} ({} strategy)",
            report.tables_dropped, config.database_path, report.strategy
        );
    }
    Ok(())
}

pub fn run_init(config: &DbResetConfig, output_format: OutputFormat) -> Result<()> {
    let engine = open_engine(config)?;
    SchemaLifecycle::new(&engine).initialize()?;
    run_status_with(&engine, config, output_format)
}

pub fn run_drop(
    config: &DbResetConfig,
    args: DestructiveArgs,
    output_format: OutputFormat,
) -> Result<()> {
    confirm(&args, "drop all tables in", config)?;
    let engine = open_engine(config)?;
    let report = SchemaLifecycle::new(&engine).drop_schema()?;
    print_drop(config, report, output_format)
}

pub fn run_reset(
    config: &DbResetConfig,
    args: DestructiveArgs,
    output_format: OutputFormat,
) -> Result<()> {
    confirm(&args, "reset", config)?;
    let engine = open_engine(config)?;
    let report = SchemaLifecycle::new(&engine).reset()?;
    print_drop(config, report, output_format)
}

pub fn run_status(config: &DbResetConfig, output_format: OutputFormat) -> Result<()> {
    if !std::path::Path::new(&config.database_path).exists() {
        return Err(anyhow!(
            "Database '{}' does not exist, run `dbreset init` first",
            config.database_path
        ));
    }
    let engine = open_engine(config)?;
    run_status_with(&engine, config, output_format)
}

fn run_status_with(
    engine: &SqliteEngine,
    config: &DbResetConfig,
    output_format: OutputFormat,
) -> Result<()> {
    let lifecycle = SchemaLifecycle::new(engine);
    let registry = engine.registry();
    let db = engine.connection();
    let schema = lifecycle.status(registry)?;

    let mut tables = Vec::new();
    for name in registry.table_names() {
        let present = db.table_exists(name)?;
        let rows = if present {
            db.table_count(name)?.to_string()
        } else {
            "-".to_string()
        };
        tables.push(TableRow {
            table: name.to_string(),
            registered: true,
            present,
            rows,
        });
    }
    for name in lifecycle.unregistered_tables(registry)? {
        let rows = db.table_count(&name)?.to_string();
        tables.push(TableRow {
            table: name,
            registered: false,
            present: true,
            rows,
        });
    }

    match output_format {
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let info = StatusInfo {
                database: config.database_path.clone(),
                schema,
                tables,
            };
            println!("{}", output_format.to_json(&info)?);
        }
        OutputFormat::Table => {
            println!("Database: {}", config.database_path);
            println!("Schema:   {}\n", schema);
            println!("{}", Table::new(tables).with(Style::rounded()));
        }
        OutputFormat::Markdown => {
            println!("Database: {}", config.database_path);
            println!("Schema:   {}\n", schema);
            println!("{}", Table::new(tables).with(Style::markdown()));
        }
    }
    Ok(())
}
