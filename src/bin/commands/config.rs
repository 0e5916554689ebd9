use anyhow::Result;
use dbreset::output::OutputFormat;
use dbreset::DbResetConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ConfigInfo<'a> {
    config_file: String,
    #[serde(flatten)]
    config: &'a DbResetConfig,
    database_exists: bool,
}

pub fn run(config: &DbResetConfig, output_format: OutputFormat) -> Result<()> {
    if output_format.is_json() {
        let info = ConfigInfo {
            config_file: DbResetConfig::config_file_path(),
            config,
            database_exists: std::path::Path::new(&config.database_path).exists(),
        };
        println!("{}", output_format.to_json(&info)?);
    } else {
        println!("{}", config.summary());
    }
    Ok(())
}
