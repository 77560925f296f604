use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sparkify_etl::config::{AppConfig, CliConfig, FileConfig, LoadMode, DEFAULT_CONFIG_FILE};
use sparkify_etl::pipeline::{run_direct, PipelineReport};
use sparkify_etl::store::SqliteSparkifyStore;
use sparkify_etl::warehouse::{self, RedshiftClient};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct CliArgs {
    /// Path to a TOML config file. Defaults to `sparkify.toml` when present.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Where to load the data.
    #[clap(long, value_enum)]
    pub mode: Option<LoadMode>,

    /// Path to the SQLite database file (direct mode).
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Root directory of the song-metadata files (direct mode).
    #[clap(long, value_parser = parse_path)]
    pub song_data: Option<PathBuf>,

    /// Root directory of the activity-log files (direct mode).
    #[clap(long, value_parser = parse_path)]
    pub log_data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Loads the song files, then the log files.
    #[default]
    Etl,

    /// Drops and recreates every table.
    CreateTables,

    /// Checks an existing database against the expected schema.
    Validate,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            mode: self.mode,
            db_path: self.db_path.clone(),
            song_data_dir: self.song_data.clone(),
            log_data_dir: self.log_data.clone(),
        }
    }
}

fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    match explicit {
        Some(path) => Ok(Some(FileConfig::load(path)?)),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                info!("Using config file {:?}", default_path);
                Ok(Some(FileConfig::load(default_path)?))
            } else {
                Ok(None)
            }
        }
    }
}

fn log_report(report: &PipelineReport) {
    let rows = &report.rows;
    info!(
        "{} files loaded: {} songs, {} artists, {} users, {} time rows, {} songplays",
        report.files, rows.songs, rows.artists, rows.users, rows.time, rows.songplays
    );
}

fn run_direct_command(config: &AppConfig, command: Command) -> Result<()> {
    match command {
        Command::Etl => {
            let mut store = SqliteSparkifyStore::open(&config.db_path)
                .with_context(|| format!("Cannot open database {:?}", config.db_path))?;
            let report = run_direct(
                &mut store,
                &config.song_data_dir,
                &config.log_data_dir,
                &config.file_extension,
            )?;
            log_report(&report);
            store.close()?;
        }
        Command::CreateTables => {
            SqliteSparkifyStore::recreate(&config.db_path)?.close()?;
        }
        Command::Validate => {
            let store = SqliteSparkifyStore::open_existing(&config.db_path)
                .with_context(|| format!("Database {:?} is not valid", config.db_path))?;
            for (table, count) in store.table_counts()? {
                info!("{}: {} rows", table, count);
            }
            info!("Database {:?} is valid", config.db_path);
            store.close()?;
        }
    }
    Ok(())
}

fn run_warehouse_command(config: &AppConfig, command: Command) -> Result<()> {
    let settings = config.warehouse_settings()?;
    if let Command::Validate = command {
        bail!("validate is only available in direct mode");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let mut client = RedshiftClient::connect(settings)
            .await
            .with_context(|| format!("Cannot connect to {}", settings.host))?;
        match command {
            Command::CreateTables => warehouse::create_tables(&mut client).await?,
            _ => warehouse::run_etl(&mut client, settings).await?,
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    info!(
        "sparkify-etl {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("SPARKIFY_GIT_HASH")
    );

    let file_config = load_file_config(cli_args.config.as_deref())?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    let command = cli_args.command.unwrap_or_default();
    info!("Running {:?} in {:?} mode", command, config.mode);

    match config.mode {
        LoadMode::Direct => run_direct_command(&config, command),
        LoadMode::Warehouse => run_warehouse_command(&config, command),
    }
}
