//! Operator CLI for the Aurora restore pipeline.
//!
//! `run` drives a full restore in-process through the local dispatcher
//! (polling with real sleeps); `step` invokes a single handler, enqueueing
//! successors onto the SQS step queue when one is configured; `cleanup`
//! removes what a finished or abandoned operation left behind.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use aurora_cloud::{
    AwsClients, RdsClusterControl, RdsSnapshotStore, S3LogStore, SecretsManagerProvider,
    SnsNotifier, SqsStepDispatcher, SsmParameterSource,
};
use aurora_db::PostgresAdmin;
use aurora_engine::ports::{StepDispatcher, SystemClock};
use aurora_engine::{EngineServices, LocalDispatcher, LocalWorker, StepRunner};
use aurora_observability::{CloudWatchMetricsSink, DynamoAuditSink};
use aurora_state::DynamoStateStore;
use aurora_types::{StepEvent, StepName};

#[derive(Parser)]
#[command(name = "aurora-restore", version)]
#[command(about = "Cross-region Aurora snapshot restore pipeline")]
struct Cli {
    /// Deployment environment (dev, test, prod)
    #[arg(long, env = "ENVIRONMENT", default_value = "dev")]
    environment: String,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "INFO")]
    log_level: String,

    /// State table name
    #[arg(long, env = "STATE_TABLE_NAME", default_value = "aurora-restore-state")]
    state_table: String,

    /// Audit table name
    #[arg(long, env = "AUDIT_TABLE_NAME", default_value = "aurora-restore-audit")]
    audit_table: String,

    /// SQS queue URL for asynchronous step dispatch
    #[arg(long, env = "STEP_QUEUE_URL")]
    queue_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a full restore locally, polling until the chain terminates
    Run {
        /// Snapshot date (YYYY-MM-DD); defaults to yesterday
        #[arg(long)]
        date: Option<String>,

        /// Extra event payload as a JSON object
        #[arg(long)]
        event: Option<String>,
    },

    /// Invoke a single step
    Step {
        /// Step name (e.g. snapshot_check, check_copy_status)
        step: StepName,

        /// Operation id to act on
        #[arg(long)]
        operation_id: Option<String>,

        /// Event payload as a JSON object
        #[arg(long)]
        event: Option<String>,
    },

    /// Remove what an operation left behind (snapshot copy, state, logs)
    Cleanup {
        /// Operation id to clean up
        #[arg(long)]
        operation_id: String,
    },
}

fn parse_event(raw: Option<&str>) -> Result<StepEvent> {
    match raw {
        Some(raw) => serde_json::from_str(raw).context("event payload is not a JSON object"),
        None => Ok(StepEvent::default()),
    }
}

async fn build_services(cli: &Cli, dispatcher: Arc<dyn StepDispatcher>) -> Result<EngineServices> {
    let home = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let clients = Arc::new(AwsClients::new());

    Ok(EngineServices {
        clock: Arc::new(SystemClock),
        state: Arc::new(DynamoStateStore::new(
            aws_sdk_dynamodb::Client::new(&home),
            &cli.state_table,
        )),
        audit: Arc::new(DynamoAuditSink::new(
            aws_sdk_dynamodb::Client::new(&home),
            &cli.audit_table,
        )),
        metrics: Arc::new(CloudWatchMetricsSink::new(aws_sdk_cloudwatch::Client::new(
            &home,
        ))),
        parameters: Some(Arc::new(SsmParameterSource::new(
            aws_sdk_ssm::Client::from_conf(
                aws_sdk_ssm::config::Builder::from(&home)
                    .timeout_config(
                        aws_config::timeout::TimeoutConfig::builder()
                            .operation_attempt_timeout(std::time::Duration::from_secs(5))
                            .build(),
                    )
                    .build(),
            ),
        ))),
        snapshots: Arc::new(RdsSnapshotStore::new(clients.clone())),
        clusters: Arc::new(RdsClusterControl::new(clients.clone())),
        secrets: Arc::new(SecretsManagerProvider::new(clients.clone())),
        notifier: Arc::new(SnsNotifier::new(clients)),
        logs: Some(Arc::new(S3LogStore::new(aws_sdk_s3::Client::new(&home)))),
        database: Arc::new(PostgresAdmin::new()),
        dispatcher,
        environment: cli.environment.clone(),
    })
}

/// Dispatcher selection: the SQS queue when configured, otherwise a local
/// queue whose worker is handed back to the caller.
async fn dispatcher_for(cli: &Cli) -> Result<(Arc<dyn StepDispatcher>, Option<LocalWorker>)> {
    match &cli.queue_url {
        Some(queue_url) => {
            let home = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let dispatcher =
                SqsStepDispatcher::new(aws_sdk_sqs::Client::new(&home), queue_url.clone());
            Ok((Arc::new(dispatcher), None))
        }
        None => {
            let (dispatcher, worker) = LocalDispatcher::channel();
            Ok((Arc::new(dispatcher), Some(worker)))
        }
    }
}

fn print_response(response: &aurora_types::StepResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_ascii_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Run { date, event } => {
            let (dispatcher, worker) = {
                let (dispatcher, worker) = LocalDispatcher::channel();
                (Arc::new(dispatcher) as Arc<dyn StepDispatcher>, worker)
            };
            let services = build_services(&cli, dispatcher).await?;
            let runner = StepRunner::new(Arc::new(services));

            let mut entry = parse_event(event.as_deref())?;
            if let Some(date) = date {
                entry.date = Some(date.clone());
            }

            let response = runner.execute(StepName::SnapshotCheck, entry).await;
            print_response(&response)?;
            if !response.is_success() {
                anyhow::bail!("restore halted at snapshot_check");
            }

            let mut worker = worker;
            loop {
                let responses = worker.drive(&runner).await;
                if responses.is_empty() {
                    break;
                }
                for response in &responses {
                    info!(
                        step = %response.body.step,
                        status_code = response.status_code,
                        "{}",
                        response.body.message
                    );
                    if !response.is_success() {
                        print_response(response)?;
                        anyhow::bail!("restore halted at {}", response.body.step);
                    }
                }
                if let Some(last) = responses.last() {
                    if last.body.step == StepName::SnsNotification {
                        print_response(last)?;
                        return Ok(());
                    }
                }
            }
            Ok(())
        }

        Commands::Step {
            step,
            operation_id,
            event,
        } => {
            let (dispatcher, worker) = dispatcher_for(&cli).await?;
            let services = build_services(&cli, dispatcher).await?;
            let runner = StepRunner::new(Arc::new(services));

            let mut entry = parse_event(event.as_deref())?;
            if let Some(operation_id) = operation_id {
                entry.operation_id = Some(operation_id.clone());
            }

            let response = runner.execute(*step, entry).await;
            print_response(&response)?;

            // Without a queue, successors stay local; report instead of
            // silently dropping them.
            if let Some(mut worker) = worker {
                while let Some(request) = worker.try_next() {
                    info!(
                        next_step = %request.step,
                        delay_secs = request.delay.map(|d| d.as_secs()).unwrap_or(0),
                        "next step queued locally; no --queue-url configured, not executing"
                    );
                }
            }
            Ok(())
        }

        Commands::Cleanup { operation_id } => {
            let (dispatcher, _) = dispatcher_for(&cli).await?;
            let services = build_services(&cli, dispatcher).await?;
            let runner = StepRunner::new(Arc::new(services));

            let response = runner
                .execute(StepName::Cleanup, StepEvent::for_operation(operation_id))
                .await;
            print_response(&response)?;
            Ok(())
        }
    }
}
