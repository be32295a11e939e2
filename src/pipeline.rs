#![allow(async_fn_in_trait)]

use tracing::{info, instrument, warn};

use crate::catalog::{Statement, StatementCatalog};
use crate::config::{CommitMode, PipelineConfig};
use crate::error::EtlError;
use crate::report::{self, PipelineReport};

/// One open warehouse connection, used by exactly one flow at a time.
///
/// `execute` only runs the statement; transaction boundaries are driven by
/// the caller through `begin`, `commit` and `rollback`.
pub trait Session {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn begin(&mut self) -> Result<(), Self::Error>;
    async fn execute(&mut self, sql: &str) -> Result<(), Self::Error>;
    async fn commit(&mut self) -> Result<(), Self::Error>;
    async fn rollback(&mut self) -> Result<(), Self::Error>;

    /// Runs a query returning at most one integer cell. SQL `NULL` is `None`.
    async fn query_i64(&mut self, sql: &str) -> Result<Option<i64>, Self::Error>;
}

fn statement_error<E>(statement: &Statement, source: E) -> EtlError
where
    E: std::error::Error + Send + Sync + 'static,
{
    EtlError::Statement {
        name: statement.name.clone(),
        source: Box::new(source),
    }
}

async fn abort<S: Session>(session: &mut S) {
    if let Err(e) = session.rollback().await {
        warn!("Rollback after failure did not succeed: {e}");
    }
}

fn log_statement(statement: &Statement) {
    info!(
        statement = %statement.name,
        "Executing {} statement:\n{}",
        statement.kind,
        statement.sql.trim()
    );
}

/// Executes each statement in its own transaction, committing immediately.
///
/// Stops at the first failure. Statements committed before it stay committed.
pub async fn run_statements<S: Session>(
    session: &mut S,
    statements: &[Statement],
) -> Result<usize, EtlError> {
    for statement in statements {
        log_statement(statement);

        let result = async {
            session.begin().await?;
            session.execute(&statement.sql).await?;
            session.commit().await
        }
        .await;

        if let Err(e) = result {
            abort(session).await;
            return Err(statement_error(statement, e));
        }
    }
    Ok(statements.len())
}

/// Executes every statement inside one transaction and commits once at the end.
///
/// A failure rolls back everything, including the drops.
pub async fn run_atomically<S: Session>(
    session: &mut S,
    statements: &[&Statement],
) -> Result<usize, EtlError> {
    session.begin().await.map_err(|e| EtlError::Statement {
        name: "begin".to_string(),
        source: Box::new(e),
    })?;

    for statement in statements {
        log_statement(statement);
        if let Err(e) = session.execute(&statement.sql).await {
            abort(session).await;
            return Err(statement_error(statement, e));
        }
    }

    session.commit().await.map_err(|e| EtlError::Statement {
        name: "commit".to_string(),
        source: Box::new(e),
    })?;
    Ok(statements.len())
}

/// The full load: drop, create, copy, insert, then the post-load report.
pub struct Pipeline<'a> {
    catalog: &'a StatementCatalog,
    options: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(catalog: &'a StatementCatalog, options: &'a PipelineConfig) -> Self {
        Self { catalog, options }
    }

    #[instrument(skip_all, fields(commit_mode = ?self.options.commit_mode))]
    pub async fn run<S: Session>(&self, session: &mut S) -> Result<PipelineReport, EtlError> {
        let statements_executed = match self.options.commit_mode {
            CommitMode::PerStatement => {
                let mut executed = 0;
                for (kind, statements) in self.catalog.stages() {
                    info!("Starting {kind} stage ({} statements)", statements.len());
                    executed += run_statements(session, statements).await?;
                }
                executed
            }
            CommitMode::SingleTransaction => {
                let statements: Vec<&Statement> = self
                    .catalog
                    .stages()
                    .into_iter()
                    .flat_map(|(_, statements)| statements.iter())
                    .collect();
                info!("Running {} statements in one transaction", statements.len());
                run_atomically(session, &statements).await?
            }
        };
        info!("All {statements_executed} statements committed");

        Ok(report::collect(session, statements_executed, self.options.report_unmatched).await)
    }
}
