//! Warehouse-mode loading: S3 `COPY` into staging tables on Redshift, then
//! set-based inserts into the analytics tables.

use crate::config::WarehouseSettings;
use crate::error::EtlResult;
use crate::schema::warehouse;
use async_trait::async_trait;
use tracing::{debug, error, info};

/// Runs one SQL statement against the warehouse.
#[async_trait]
pub trait StatementExecutor {
    async fn execute(&mut self, sql: &str) -> EtlResult<()>;
}

/// A single Redshift session in autocommit mode.
pub struct RedshiftClient {
    client: tokio_postgres::Client,
}

impl RedshiftClient {
    pub async fn connect(settings: &WarehouseSettings) -> EtlResult<Self> {
        let (client, connection) =
            tokio_postgres::connect(&settings.connection_string(), tokio_postgres::NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Redshift connection error: {}", e);
            }
        });

        info!(
            "Connected to {}:{}/{}",
            settings.host, settings.port, settings.db_name
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl StatementExecutor for RedshiftClient {
    async fn execute(&mut self, sql: &str) -> EtlResult<()> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }
}

async fn execute_all<E, S>(executor: &mut E, statements: &[S]) -> EtlResult<()>
where
    E: StatementExecutor + Send,
    S: AsRef<str> + Sync,
{
    for statement in statements {
        debug!("{}", statement.as_ref());
        executor.execute(statement.as_ref()).await?;
    }
    Ok(())
}

/// Drops then recreates the staging and analytics tables.
pub async fn create_tables<E: StatementExecutor + Send>(executor: &mut E) -> EtlResult<()> {
    execute_all(executor, &warehouse::drop_statements()).await?;
    execute_all(executor, &warehouse::create_statements()).await?;
    info!("Warehouse tables created");
    Ok(())
}

/// Empties the staging tables, then bulk-loads the S3 event and song data
/// into them.
pub async fn load_staging_tables<E: StatementExecutor + Send>(
    executor: &mut E,
    settings: &WarehouseSettings,
) -> EtlResult<()> {
    execute_all(executor, &warehouse::truncate_staging_statements()).await?;

    let copies = warehouse::copy_statements(settings);
    let total = copies.len();
    for (i, copy) in copies.iter().enumerate() {
        debug!("{}", copy);
        executor.execute(copy).await?;
        info!("{}/{} staging tables loaded.", i + 1, total);
    }
    Ok(())
}

/// Fills the analytics tables from staging.
pub async fn insert_tables<E: StatementExecutor + Send>(executor: &mut E) -> EtlResult<()> {
    let inserts = warehouse::insert_statements();
    let total = inserts.len();
    for (i, insert) in inserts.iter().enumerate() {
        debug!("{}", insert);
        executor.execute(insert).await?;
        info!("{}/{} analytics tables filled.", i + 1, total);
    }
    Ok(())
}

/// Staging load followed by the analytics inserts.
pub async fn run_etl<E: StatementExecutor + Send>(
    executor: &mut E,
    settings: &WarehouseSettings,
) -> EtlResult<()> {
    load_staging_tables(executor, settings).await?;
    insert_tables(executor).await
}
