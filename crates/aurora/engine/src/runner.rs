//! Engine core: the shared entry logic every step runs through.
//!
//! One `execute` call performs the full per-step contract: resolve the
//! operation id, merge configuration, load the operation's latest record,
//! check the prior-step precondition, run the handler, persist the outcome,
//! emit audit and metrics, and dispatch the next step. A single top-level
//! failure trap turns classified errors into failure records and response
//! codes; the chain self-halts because no successor is dispatched on
//! failure.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use aurora_config::{ConfigResolver, RestoreConfig};
use aurora_types::{
    AuditEvent, AuditStatus, Metric, OperationId, StepEvent, StepName, StepRecord, StepResponse,
};

use crate::chain::handler_for;
use crate::context::StepContext;
use crate::outcome::NextAction;
use crate::ports::DispatchRequest;
use crate::services::EngineServices;
use crate::StepError;

/// Runs steps against a collaborator bundle.
pub struct StepRunner {
    services: Arc<EngineServices>,
}

impl StepRunner {
    pub fn new(services: Arc<EngineServices>) -> Self {
        Self { services }
    }

    /// Execute one step against an event payload.
    pub async fn execute(&self, step: StepName, event: StepEvent) -> StepResponse {
        let started = Instant::now();
        let operation_id = match event.resolve_operation_id() {
            Some(id) => OperationId::new(id),
            None => OperationId::mint(self.services.clock.unix()),
        };
        info!(operation_id = %operation_id, step = %step, "step invoked");

        match self.try_execute(step, &operation_id, &event).await {
            Ok(response) => {
                info!(
                    operation_id = %operation_id,
                    step = %step,
                    status_code = response.status_code,
                    "step finished"
                );
                response
            }
            Err(err) => self.fail(step, &operation_id, &event, err, started).await,
        }
    }

    async fn try_execute(
        &self,
        step: StepName,
        operation_id: &OperationId,
        event: &StepEvent,
    ) -> Result<StepResponse, StepError> {
        let started = Instant::now();
        let services = &self.services;

        // Configuration, lowest priority first.
        let mut resolver = ConfigResolver::new(&services.environment);
        if let Some(parameters) = &services.parameters {
            resolver.load_parameter_store(parameters.as_ref()).await;
        }
        resolver.load_env();

        // Latest persisted record is both the precondition input and a
        // configuration layer.
        let prior = services.state.load_latest(operation_id).await?;
        if let Some(record) = &prior {
            resolver.load_state(record);
        }
        resolver.load_event(event);

        self.check_precondition(step, &prior)?;

        resolver.validate_for(step)?;
        let config = RestoreConfig::from_resolver(&resolver);

        let ctx = StepContext {
            operation_id: operation_id.clone(),
            config,
            event: event.clone(),
            prior,
        };

        let handler = handler_for(step);
        let outcome = handler.run(&ctx, services).await?;

        // Persist the accumulated context: prior record, then incoming
        // payload, then the handler's new fields. The latest record is the
        // authoritative state, so it must stay a superset even when a step
        // is replayed with a bare operation id.
        let mut fields = ctx
            .prior
            .as_ref()
            .map(|record| record.fields.clone())
            .unwrap_or_default();
        fields.extend(ctx.event.extra.clone());
        fields.extend(outcome.fields.clone());
        if outcome.persist_record {
            let record = StepRecord {
                operation_id: operation_id.clone(),
                step,
                timestamp: services.clock.unix(),
                success: true,
                error: None,
                fields: fields.clone(),
            };
            services.state.save(&record).await?;
        }

        self.emit_audit(operation_id, step, outcome.audit_status, &outcome.fields)
            .await;
        self.emit_duration(operation_id, step, &ctx.config.environment, started)
            .await;
        if !outcome.is_in_progress() {
            self.emit_metric(
                operation_id,
                &ctx.config.environment,
                format!("{step}_completed"),
                1.0,
            )
            .await;
        }

        match &outcome.next {
            NextAction::Advance { step: next, delay } => {
                self.dispatch(operation_id, *next, fields, *delay).await;
            }
            NextAction::Requeue { delay } => {
                self.dispatch(operation_id, step, fields, Some(*delay)).await;
            }
            NextAction::Terminal => {}
        }

        let response = if outcome.is_in_progress() {
            StepResponse::in_progress(operation_id.clone(), step, &outcome.message)
        } else {
            StepResponse::completed(operation_id.clone(), step, &outcome.message)
        };
        Ok(response.with_fields(outcome.fields))
    }

    /// Prior-step gate: the entry step tolerates absent state, cleanup is
    /// out-of-band, and a step may re-run after its own failure (operator
    /// replay) but never after another step's.
    fn check_precondition(
        &self,
        step: StepName,
        prior: &Option<StepRecord>,
    ) -> Result<(), StepError> {
        if step.is_entry() || step == StepName::Cleanup {
            return Ok(());
        }
        match prior {
            None => Err(StepError::PreconditionFailed {
                message: format!("no prior state found for operation (step {step})"),
                previous: None,
            }),
            Some(record) if !record.success && record.step != step => {
                Err(StepError::PreconditionFailed {
                    message: format!("previous step failed: {}", record.step),
                    previous: Some(Box::new(record.clone())),
                })
            }
            Some(_) => Ok(()),
        }
    }

    /// Top-level failure trap: persist a failure record (except for
    /// precondition failures, where a write would block replay), audit,
    /// count the failure, and map the error kind onto a status code. The
    /// failure record keeps the incoming payload fields so an operator
    /// replay of the failed step still has its carried context.
    async fn fail(
        &self,
        step: StepName,
        operation_id: &OperationId,
        event: &StepEvent,
        err: StepError,
        started: Instant,
    ) -> StepResponse {
        let services = &self.services;
        let environment = services.environment.clone();

        if let StepError::PreconditionFailed { message, previous } = &err {
            warn!(operation_id = %operation_id, step = %step, "{message}");
            let mut details = Map::new();
            details.insert("error".to_string(), Value::String(message.clone()));
            self.emit_audit(operation_id, step, AuditStatus::Failed, &details)
                .await;
            let mut response =
                StepResponse::bad_request(operation_id.clone(), step, message.clone());
            if let Some(previous) = previous {
                response = response.with("previous_state", previous.as_ref());
            }
            return response;
        }

        let message = err.to_string();
        error!(operation_id = %operation_id, step = %step, error = %message, "step failed");

        let mut record = StepRecord::failure(
            operation_id.clone(),
            step,
            services.clock.unix(),
            &message,
        );
        // Carry the accumulated context into the failure record so an
        // operator replay of this step still has its inputs.
        record.fields = match services.state.load_latest(operation_id).await {
            Ok(Some(prior)) => prior.fields,
            _ => Map::new(),
        };
        record.fields.extend(event.extra.clone());
        if let Err(save_err) = services.state.save(&record).await {
            error!(
                operation_id = %operation_id,
                step = %step,
                error = %save_err,
                "failed to persist failure record"
            );
        }

        let mut details = Map::new();
        details.insert("error".to_string(), Value::String(message.clone()));
        self.emit_audit(operation_id, step, AuditStatus::Failed, &details)
            .await;
        self.emit_metric(operation_id, &environment, format!("{step}_failures"), 1.0)
            .await;
        self.emit_duration(operation_id, step, &environment, started)
            .await;

        let code = err.status_code();
        match code {
            400 => StepResponse::bad_request(operation_id.clone(), step, message),
            404 => StepResponse::not_found(operation_id.clone(), step, message),
            _ => StepResponse::internal_error(operation_id.clone(), step, message),
        }
    }

    /// Dispatch is best-effort: at-least-once delivery means a lost
    /// dispatch is recovered by operator replay, so a failure here is
    /// logged but does not fail the step.
    async fn dispatch(
        &self,
        operation_id: &OperationId,
        step: StepName,
        mut payload: Map<String, Value>,
        delay: Option<std::time::Duration>,
    ) {
        payload.insert(
            "operation_id".to_string(),
            Value::String(operation_id.to_string()),
        );
        let request = DispatchRequest {
            operation_id: operation_id.clone(),
            step,
            payload,
            delay,
        };
        if let Err(err) = self.services.dispatcher.dispatch(request).await {
            error!(
                operation_id = %operation_id,
                next_step = %step,
                error = %err,
                "failed to dispatch next step"
            );
        }
    }

    async fn emit_audit(
        &self,
        operation_id: &OperationId,
        step: StepName,
        status: AuditStatus,
        details: &Map<String, Value>,
    ) {
        let services = &self.services;
        let event = AuditEvent::new(
            operation_id.clone(),
            step,
            status,
            services.clock.now(),
            &services.environment,
        )
        .with_details(details.clone());
        if let Err(err) = services.audit.record(&event).await {
            warn!(operation_id = %operation_id, step = %step, error = %err, "audit write failed");
        }
    }

    async fn emit_metric(
        &self,
        operation_id: &OperationId,
        environment: &str,
        name: String,
        value: f64,
    ) {
        let metric = Metric::count(operation_id.clone(), environment, name, value);
        if let Err(err) = self.services.metrics.emit(&metric).await {
            warn!(operation_id = %operation_id, error = %err, "metric write failed");
        }
    }

    async fn emit_duration(
        &self,
        operation_id: &OperationId,
        step: StepName,
        environment: &str,
        started: Instant,
    ) {
        let metric = Metric::seconds(
            operation_id.clone(),
            environment,
            format!("{step}_duration"),
            started.elapsed().as_secs_f64(),
        );
        if let Err(err) = self.services.metrics.emit(&metric).await {
            warn!(operation_id = %operation_id, error = %err, "metric write failed");
        }
    }
}
