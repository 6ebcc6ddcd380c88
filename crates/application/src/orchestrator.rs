//! Execution orchestrator.
//!
//! Turns a suite, a model selection and sampling parameters into a sealed
//! [`RunResult`]. Every (test case, model) pair becomes one task on the
//! [`TaskRunner`]; each task streams the candidate response into the store,
//! retries silently-empty completions, and scores what it receives.

use crate::gateway::InferenceGateway;
use crate::runner::{RunnerError, TaskError, TaskRunner};
use crate::scoring::{JudgeContext, ScoringDispatcher};
use crate::store::ResultStore;
use crate::ApplicationError;
use benchmaker_common::{AppConfig, CancellationToken, RetryPolicy};
use benchmaker_domain::{
    ChatCompletion, ChatMessage, GatewayError, ModelInfo, ModelParameters, ResultStatus,
    ResultUpdate, RunId, RunResult, ScoringMethod, TestCase, TestSuite,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Minimum spacing between partial-content writes while streaming
const STREAM_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Tasks in flight at once
    pub max_concurrency: usize,
    /// Backoff between attempts when a model returns nothing
    pub empty_retry: RetryPolicy,
    /// Capacity of the chunk channel used while streaming
    pub stream_buffer: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            empty_retry: RetryPolicy::linear(2, Duration::from_secs(1)),
            stream_buffer: 64,
        }
    }
}

impl OrchestratorConfig {
    /// Settings from the execution section of the application config
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_concurrency: config.execution.max_concurrency,
            empty_retry: config.empty_response_policy(),
            ..Default::default()
        }
    }
}

/// Everything needed to start a run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Suite to execute
    pub suite: TestSuite,
    /// Candidate models, with pricing for cost accounting
    pub models: Vec<ModelInfo>,
    /// Sampling parameters as stored on the run
    pub parameters: ModelParameters,
    /// Judge for llm-judge test cases
    pub judge_model: Option<String>,
}

/// Emitted whenever a task settles
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Run the task belongs to
    pub run_id: RunId,
    /// Test case id
    pub test_case_id: String,
    /// Model id
    pub model_id: String,
    /// Status the result settled in
    pub status: ResultStatus,
    /// Tasks settled so far
    pub done: usize,
    /// Tasks in the run
    pub total: usize,
}

/// Callback receiving progress events
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Drives a run through the gateway, the store and the scorers
pub struct ExecutionOrchestrator {
    gateway: Arc<dyn InferenceGateway>,
    store: Arc<dyn ResultStore>,
    dispatcher: Arc<ScoringDispatcher>,
    config: OrchestratorConfig,
    progress: Option<ProgressSink>,
}

impl ExecutionOrchestrator {
    /// Orchestrator with default tuning
    pub fn new(
        gateway: Arc<dyn InferenceGateway>,
        store: Arc<dyn ResultStore>,
        dispatcher: Arc<ScoringDispatcher>,
    ) -> Self {
        Self {
            gateway,
            store,
            dispatcher,
            config: OrchestratorConfig::default(),
            progress: None,
        }
    }

    /// Override tuning
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Report each settled task to `sink`
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Execute a run to completion or cancellation.
    ///
    /// Only invalid input and store failures are errors. Task failures are
    /// recorded on their results and cancellation seals the run early with
    /// `cancelled` set; both still return the sealed run.
    #[instrument(skip(self, request, cancel), fields(suite_id = %request.suite.id, models = request.models.len()))]
    pub async fn execute_run(
        &self,
        request: RunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunResult, ApplicationError> {
        self.check_request(&request)?;

        let RunRequest {
            suite,
            models,
            parameters,
            judge_model,
        } = request;

        let run = RunResult::new(
            &suite,
            models.iter().map(|m| m.id.clone()).collect(),
            parameters.clone(),
            judge_model.clone(),
        );
        let run = self.store.create_run(run).await?;
        let total = run.results.len();

        info!(run_id = %run.id, total, concurrency = self.config.max_concurrency, "Starting run");

        let messages_for = |case: &TestCase| {
            let mut messages = Vec::with_capacity(2);
            if let Some(system) = suite.system_prompt() {
                messages.push(ChatMessage::system(system));
            }
            messages.push(ChatMessage::user(&case.prompt));
            messages
        };

        let ctx = Arc::new(TaskContext {
            run_id: run.id,
            gateway: self.gateway.clone(),
            store: self.store.clone(),
            dispatcher: self.dispatcher.clone(),
            params: parameters.effective(),
            judge_model,
            rubric_addendum: suite.judge_system_prompt.clone(),
            empty_retry: self.config.empty_retry.clone(),
            stream_buffer: self.config.stream_buffer.max(1),
            progress: self.progress.clone(),
            cancel: cancel.clone(),
            done: AtomicUsize::new(0),
            total,
        });

        let tasks: Vec<_> = suite
            .test_cases
            .iter()
            .flat_map(|case| models.iter().map(move |model| (case, model)))
            .map(|(case, model)| {
                let ctx = ctx.clone();
                let case = case.clone();
                let model = model.clone();
                let messages = messages_for(&case);
                move || async move { ctx.execute_pair(case, model, messages).await }
            })
            .collect();

        let runner = TaskRunner::new(self.config.max_concurrency);
        let cancelled = match runner.run(tasks, cancel).await {
            Ok(report) => {
                debug!(succeeded = report.succeeded, failed = report.failures.len(), "All tasks settled");
                false
            }
            Err(RunnerError::Aborted(report)) => {
                info!(
                    launched = report.launched,
                    not_started = report.not_started(),
                    "Run aborted by cancellation"
                );
                true
            }
        };

        let sealed = self.store.seal_run(run.id, cancelled).await?;
        info!(run_id = %sealed.id, summary = %sealed.summary(), "Run sealed");
        Ok(sealed)
    }

    fn check_request(&self, request: &RunRequest) -> Result<(), ApplicationError> {
        let warnings = request
            .suite
            .validate()
            .into_result()
            .map_err(|e| ApplicationError::InvalidInput(e.to_string()))?;
        for issue in &warnings {
            warn!(issue = %issue, "Suite validation warning");
        }

        if request.models.is_empty() {
            return Err(ApplicationError::InvalidInput(
                "At least one model must be selected".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = request.models.iter().find(|m| !seen.insert(m.id.as_str())) {
            return Err(ApplicationError::InvalidInput(format!(
                "Model selected more than once: {}",
                dup.id
            )));
        }

        let needs_judge = request
            .suite
            .test_cases
            .iter()
            .any(|tc| tc.scoring_method == ScoringMethod::LlmJudge);
        if needs_judge && (request.judge_model.is_none() || !self.dispatcher.has_judge()) {
            warn!("Suite has llm-judge cases but no judge is configured; they will be scored as boolean");
        }

        Ok(())
    }
}

/// State shared by every task of one run
struct TaskContext {
    run_id: RunId,
    gateway: Arc<dyn InferenceGateway>,
    store: Arc<dyn ResultStore>,
    dispatcher: Arc<ScoringDispatcher>,
    params: ModelParameters,
    judge_model: Option<String>,
    rubric_addendum: Option<String>,
    empty_retry: RetryPolicy,
    stream_buffer: usize,
    progress: Option<ProgressSink>,
    cancel: CancellationToken,
    done: AtomicUsize,
    total: usize,
}

impl TaskContext {
    async fn execute_pair(
        &self,
        case: TestCase,
        model: ModelInfo,
        messages: Vec<ChatMessage>,
    ) -> Result<(), TaskError> {
        let (status, outcome) = match self.attempt_pair(&case, &model, &messages).await {
            Ok(()) => (ResultStatus::Completed, Ok(())),
            Err(PairFailure::Cancelled { settled }) => (settled, Err(TaskError::Cancelled)),
            Err(PairFailure::Failed(message)) => (ResultStatus::Failed, Err(TaskError::Failed(message))),
        };

        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(sink) = &self.progress {
            sink(ProgressEvent {
                run_id: self.run_id,
                test_case_id: case.id.clone(),
                model_id: model.id.clone(),
                status,
                done,
                total: self.total,
            });
        }

        outcome
    }

    #[instrument(skip_all, fields(run_id = %self.run_id, test_case_id = %case.id, model = %model.id))]
    async fn attempt_pair(
        &self,
        case: &TestCase,
        model: &ModelInfo,
        messages: &[ChatMessage],
    ) -> Result<(), PairFailure> {
        if self.cancel.is_cancelled() {
            self.update(case, model, ResultUpdate::status(ResultStatus::Cancelled)).await?;
            return Err(PairFailure::cancelled(ResultStatus::Cancelled));
        }

        self.update(case, model, ResultUpdate::status(ResultStatus::Running)).await?;
        let started = Instant::now();

        let completion = match self.complete_with_retry(case, model, messages).await {
            Ok(completion) => completion,
            Err(e) if e.is_cancelled() => {
                self.update(case, model, ResultUpdate::status(ResultStatus::Cancelled)).await?;
                return Err(PairFailure::cancelled(ResultStatus::Cancelled));
            }
            Err(e) => {
                warn!(error = %e, "Candidate call failed");
                self.update(case, model, ResultUpdate::failed(e.to_string())).await?;
                return Err(PairFailure::Failed(e.to_string()));
            }
        };

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let cost = completion.usage.as_ref().map(|usage| model.pricing.cost(usage));

        self.update(
            case,
            model,
            ResultUpdate {
                response: Some(completion.content.clone()),
                status: Some(ResultStatus::Completed),
                latency_ms: Some(latency_ms),
                token_counts: completion.usage,
                cost,
                ..Default::default()
            },
        )
        .await?;

        let judge = self.judge_model.as_deref().map(|judge_model| JudgeContext {
            model: judge_model,
            rubric_addendum: self.rubric_addendum.as_deref(),
            cancel: &self.cancel,
        });

        let score = self
            .cancel
            .run_until_cancelled(self.dispatcher.score(case, &completion.content, judge.as_ref()))
            .await
            .map_err(|_| PairFailure::cancelled(ResultStatus::Completed))?;

        debug!(score = score.score, latency_ms, "Pair scored");

        self.store
            .set_score(self.run_id, &case.id, &model.id, score)
            .await
            .map_err(|e| PairFailure::Failed(e.to_string()))
    }

    /// Stream, fall back to a plain call, and back off while the model keeps
    /// answering with nothing.
    ///
    /// Transport and HTTP errors on the streaming call are returned as is.
    /// After the last retry an empty completion is accepted as the answer.
    async fn complete_with_retry(
        &self,
        case: &TestCase,
        model: &ModelInfo,
        messages: &[ChatMessage],
    ) -> Result<ChatCompletion, GatewayError> {
        let mut retry = 0;
        loop {
            let streamed = self.stream_once(case, model, messages).await?;
            if !streamed.is_blank() {
                return Ok(streamed);
            }

            debug!(retry, "Empty stream, trying non-streaming fallback");
            match self
                .gateway
                .chat_completion(&model.id, messages, &self.params, &self.cancel)
                .await
            {
                Ok(completion) if !completion.is_blank() => return Ok(completion),
                Ok(_) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => warn!(error = %e, "Non-streaming fallback failed"),
            }

            if retry >= self.empty_retry.max_retries {
                warn!(
                    attempts = retry + 1,
                    "Model returned an empty response on every attempt"
                );
                return Ok(streamed);
            }

            retry += 1;
            self.cancel
                .sleep(self.empty_retry.delay_for(retry))
                .await
                .map_err(|_| GatewayError::Cancelled)?;
        }
    }

    async fn stream_once(
        &self,
        case: &TestCase,
        model: &ModelInfo,
        messages: &[ChatMessage],
    ) -> Result<ChatCompletion, GatewayError> {
        let (tx, mut rx) = mpsc::channel::<String>(self.stream_buffer);

        let call = self
            .gateway
            .chat_completion_stream(&model.id, messages, &self.params, tx, &self.cancel);

        // Partial writes are throttled; the final text is always written.
        let consume = async {
            let mut text = String::new();
            let mut last_flush: Option<Instant> = None;
            let mut pending = false;
            while let Some(chunk) = rx.recv().await {
                text.push_str(&chunk);
                pending = true;
                if last_flush.map_or(true, |at| at.elapsed() >= STREAM_FLUSH_INTERVAL) {
                    self.record_streamed(case, model, &text).await;
                    last_flush = Some(Instant::now());
                    pending = false;
                }
            }
            if pending {
                self.record_streamed(case, model, &text).await;
            }
            text
        };

        let (outcome, streamed_text) = tokio::join!(call, consume);
        let mut completion = outcome?;
        if completion.is_blank() && !streamed_text.trim().is_empty() {
            completion.content = streamed_text;
        }
        Ok(completion)
    }

    async fn record_streamed(&self, case: &TestCase, model: &ModelInfo, text: &str) {
        if let Err(e) = self
            .store
            .update_result(self.run_id, &case.id, &model.id, ResultUpdate::streamed(text.to_string()))
            .await
        {
            warn!(error = %e, "Failed to record streamed content");
        }
    }

    async fn update(&self, case: &TestCase, model: &ModelInfo, update: ResultUpdate) -> Result<(), PairFailure> {
        self.store
            .update_result(self.run_id, &case.id, &model.id, update)
            .await
            .map_err(|e| PairFailure::Failed(e.to_string()))
    }
}

/// Why a pair stopped early
enum PairFailure {
    /// Cancellation observed; `settled` is the status the result was left in
    Cancelled { settled: ResultStatus },
    /// Any other failure
    Failed(String),
}

impl PairFailure {
    fn cancelled(settled: ResultStatus) -> Self {
        Self::Cancelled { settled }
    }
}
