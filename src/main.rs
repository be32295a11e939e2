mod catalog;
mod config;
mod error;
mod logging;
mod pipeline;
mod report;
mod warehouse;


use anyhow::Result;
use tracing::info;

use crate::catalog::StatementCatalog;
use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::warehouse::WarehouseClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging()?;

    let config = Config::from_env()?;
    let region = config::resolve_region(&config.s3).await;
    let catalog = StatementCatalog::build(&config.s3, &config.iam_role.arn, &region);
    info!(
        "Prepared {} statements for {} tables",
        catalog.statement_count(),
        catalog.create.len()
    );

    let mut warehouse = WarehouseClient::connect(&config.cluster).await?;
    warehouse.check_connection().await?;

    let report = Pipeline::new(&catalog, &config.pipeline)
        .run(&mut warehouse)
        .await?;

    warehouse.close().await;
    report.log();

    Ok(())
}
