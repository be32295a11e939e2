use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{error, info};

use crate::config::ClusterConfig;
use crate::error::EtlError;
use crate::pipeline::Session;

const APPLICATION_NAME: &str = "warehouse-etl";

/// Single warehouse connection.
///
/// Wraps a `tokio_postgres::Client` together with the task that drives its
/// connection. Every statement goes through the simple query protocol, so
/// nothing is prepared server side and the statement text reaches the
/// warehouse exactly as rendered.
///
/// # Transactions
///
/// The client runs in autocommit mode. Transaction boundaries are explicit
/// `BEGIN` / `COMMIT` / `ROLLBACK` statements issued by the pipeline through
/// the [`Session`] trait.
///
/// # Example
///
/// ```rust
/// let mut warehouse = WarehouseClient::connect(&config.cluster).await?;
/// warehouse.check_connection().await?;
/// pipeline.run(&mut warehouse).await?;
/// warehouse.close().await;
/// ```
#[derive(Debug)]
pub struct WarehouseClient {
    client: Client,
    connection: JoinHandle<()>,
}

impl WarehouseClient {
    /// Opens the connection and spawns its driver task.
    pub async fn connect(cluster: &ClusterConfig) -> Result<Self, EtlError> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&cluster.host)
            .dbname(&cluster.db_name)
            .user(&cluster.db_user)
            .password(&cluster.db_password)
            .port(cluster.db_port)
            .application_name(APPLICATION_NAME);

        info!(
            "Connecting to {}:{}/{} as {}",
            cluster.host, cluster.db_port, cluster.db_name, cluster.db_user
        );
        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| EtlError::Connect(Box::new(e)))?;

        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Warehouse connection error: {}", e);
            }
        });

        Ok(Self { client, connection })
    }

    /// Verifies the connection by running a trivial query.
    pub async fn check_connection(&self) -> Result<(), EtlError> {
        self.client.simple_query("SELECT 1").await.map_err(|e| {
            error!("Connection check failed: {}", e);
            EtlError::Connect(Box::new(e))
        })?;
        info!("Connection check successful");
        Ok(())
    }

    /// Closes the connection and waits for its driver task to finish.
    pub async fn close(self) {
        let Self { client, connection } = self;
        drop(client);
        if let Err(e) = connection.await {
            error!("Warehouse connection task failed: {}", e);
        }
        info!("Connection closed");
    }
}

impl Session for WarehouseClient {
    type Error = tokio_postgres::Error;

    async fn begin(&mut self) -> Result<(), Self::Error> {
        self.client.batch_execute("BEGIN").await
    }

    async fn execute(&mut self, sql: &str) -> Result<(), Self::Error> {
        self.client.batch_execute(sql).await
    }

    async fn commit(&mut self) -> Result<(), Self::Error> {
        self.client.batch_execute("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), Self::Error> {
        self.client.batch_execute("ROLLBACK").await
    }

    async fn query_i64(&mut self, sql: &str) -> Result<Option<i64>, Self::Error> {
        let messages = self.client.simple_query(sql).await?;
        let value = messages.iter().find_map(|message| match message {
            SimpleQueryMessage::Row(row) => Some(
                row.try_get(0)
                    .ok()
                    .flatten()
                    .and_then(|v| v.parse::<i64>().ok()),
            ),
            _ => None,
        });
        Ok(value.flatten())
    }
}
