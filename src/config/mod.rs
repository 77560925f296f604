mod file_config;

pub use file_config::{ClusterConfig, FileConfig, IamRoleConfig, S3Config};

use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "sparkify.toml";
pub const DEFAULT_DB_PATH: &str = "sparkify.db";
pub const DEFAULT_SONG_DATA_DIR: &str = "data/song_data";
pub const DEFAULT_LOG_DATA_DIR: &str = "data/log_data";
pub const DEFAULT_FILE_EXTENSION: &str = "json";
pub const DEFAULT_WAREHOUSE_PORT: u16 = 5439;

/// Where the data ends up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LoadMode {
    /// Row extraction from local files into a SQLite database.
    #[default]
    Direct,
    /// S3 bulk copy into Redshift staging tables, then set-based inserts.
    Warehouse,
}

fn parse_load_mode(s: &str) -> Option<LoadMode> {
    LoadMode::from_str(s, true).ok()
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub mode: Option<LoadMode>,
    pub db_path: Option<PathBuf>,
    pub song_data_dir: Option<PathBuf>,
    pub log_data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: LoadMode,
    pub db_path: PathBuf,
    pub song_data_dir: PathBuf,
    pub log_data_dir: PathBuf,
    pub file_extension: String,

    /// Present only when `mode` is [`LoadMode::Warehouse`].
    pub warehouse: Option<WarehouseSettings>,
}

/// Connection parameters and S3 sources for warehouse-mode loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseSettings {
    pub host: String,
    pub port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
    pub iam_role_arn: String,
}

impl WarehouseSettings {
    /// Key/value connection string understood by tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.db_name, self.db_user, self.db_password
        )
    }

    fn resolve(file: &FileConfig) -> Result<Self> {
        let cluster = file.cluster.clone().unwrap_or_default();
        let s3 = file.s3.clone().unwrap_or_default();
        let iam_role = file.iam_role.clone().unwrap_or_default();

        fn required(value: Option<String>, key: &str) -> Result<String> {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    anyhow!("{} must be specified in config file for warehouse mode", key)
                })
        }

        Ok(Self {
            host: required(cluster.host, "cluster.host")?,
            port: cluster.db_port.unwrap_or(DEFAULT_WAREHOUSE_PORT),
            db_name: required(cluster.db_name, "cluster.db_name")?,
            db_user: required(cluster.db_user, "cluster.db_user")?,
            db_password: required(cluster.db_password, "cluster.db_password")?,
            log_data: required(s3.log_data, "s3.log_data")?,
            log_jsonpath: required(s3.log_jsonpath, "s3.log_jsonpath")?,
            song_data: required(s3.song_data, "s3.song_data")?,
            iam_role_arn: required(iam_role.arn, "iam_role.arn")?,
        })
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let mode = match file.mode.as_deref() {
            Some(s) => parse_load_mode(s).ok_or_else(|| {
                anyhow!("Unknown mode in config file: {}. Use 'direct' or 'warehouse'.", s)
            })?,
            None => cli.mode.unwrap_or_default(),
        };

        let db_path = file
            .db_path
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let song_data_dir = file
            .song_data_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| cli.song_data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SONG_DATA_DIR));

        let log_data_dir = file
            .log_data_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| cli.log_data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DATA_DIR));

        let file_extension = file
            .file_extension
            .clone()
            .map(|e| e.trim_start_matches('.').to_string())
            .unwrap_or_else(|| DEFAULT_FILE_EXTENSION.to_string());
        if file_extension.is_empty() {
            bail!("file_extension must not be empty");
        }

        let warehouse = match mode {
            LoadMode::Warehouse => Some(WarehouseSettings::resolve(&file)?),
            LoadMode::Direct => None,
        };

        Ok(Self {
            mode,
            db_path,
            song_data_dir,
            log_data_dir,
            file_extension,
            warehouse,
        })
    }

    pub fn warehouse_settings(&self) -> Result<&WarehouseSettings> {
        self.warehouse
            .as_ref()
            .ok_or_else(|| anyhow!("Warehouse settings are only resolved in warehouse mode"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAREHOUSE_TOML: &str = r#"
mode = "warehouse"

[cluster]
host = "dwh.example.us-west-2.redshift.amazonaws.com"
db_name = "dev"
db_user = "awsuser"
db_password = "Passw0rd"

[s3]
log_data = "s3://udacity-dend/log_data"
log_jsonpath = "s3://udacity-dend/log_json_path.json"
song_data = "s3://udacity-dend/song_data"

[iam_role]
arn = "arn:aws:iam::123456789012:role/dwhRole"
"#;

    #[test]
    fn defaults_apply_without_file_or_cli() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();
        assert_eq!(config.mode, LoadMode::Direct);
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.song_data_dir, PathBuf::from(DEFAULT_SONG_DATA_DIR));
        assert_eq!(config.log_data_dir, PathBuf::from(DEFAULT_LOG_DATA_DIR));
        assert_eq!(config.file_extension, "json");
        assert!(config.warehouse.is_none());
    }

    #[test]
    fn file_values_override_cli_values() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("cli.db")),
            song_data_dir: Some(PathBuf::from("cli/songs")),
            ..Default::default()
        };
        let file = FileConfig::parse("db_path = \"file.db\"").unwrap();

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(config.db_path, PathBuf::from("file.db"));
        assert_eq!(config.song_data_dir, PathBuf::from("cli/songs"));
    }

    #[test]
    fn warehouse_mode_resolves_all_sections() {
        let file = FileConfig::parse(WAREHOUSE_TOML).unwrap();
        let config = AppConfig::resolve(&CliConfig::default(), Some(file)).unwrap();

        assert_eq!(config.mode, LoadMode::Warehouse);
        let warehouse = config.warehouse_settings().unwrap();
        assert_eq!(warehouse.port, DEFAULT_WAREHOUSE_PORT);
        assert_eq!(warehouse.log_data, "s3://udacity-dend/log_data");
        assert_eq!(
            warehouse.iam_role_arn,
            "arn:aws:iam::123456789012:role/dwhRole"
        );
        assert_eq!(
            warehouse.connection_string(),
            "host=dwh.example.us-west-2.redshift.amazonaws.com port=5439 dbname=dev user=awsuser password=Passw0rd"
        );
    }

    #[test]
    fn warehouse_mode_requires_iam_role() {
        let without_role = WAREHOUSE_TOML.replace("arn = ", "# arn = ");
        let file = FileConfig::parse(&without_role).unwrap();

        let err = AppConfig::resolve(&CliConfig::default(), Some(file)).unwrap_err();
        assert!(err.to_string().contains("iam_role.arn"));
    }

    #[test]
    fn cli_mode_is_used_when_file_is_silent() {
        let cli = CliConfig {
            mode: Some(LoadMode::Warehouse),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("cluster.host"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let file = FileConfig::parse("mode = \"streaming\"").unwrap();
        let err = AppConfig::resolve(&CliConfig::default(), Some(file)).unwrap_err();
        assert!(err.to_string().contains("Unknown mode"));
    }

    #[test]
    fn extension_leading_dot_is_stripped() {
        let file = FileConfig::parse("file_extension = \".ndjson\"").unwrap();
        let config = AppConfig::resolve(&CliConfig::default(), Some(file)).unwrap();
        assert_eq!(config.file_extension, "ndjson");
    }
}
