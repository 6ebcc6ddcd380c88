//! Mock implementations of the gateway and the result store.
//!
//! Provides scripted, in-memory doubles for testing without network access.

use async_trait::async_trait;
use benchmaker_application::{InferenceGateway, ProgressEvent, ProgressSink, ResultStore};
use benchmaker_common::CancellationToken;
use benchmaker_domain::{
    ChatCompletion, ChatMessage, GatewayError, ModelInfo, ModelParameters, ResultUpdate, RunId,
    RunResult, ScoringResult, StoreError, TokenUsage,
};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// What the scripted gateway does for one call
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    /// Reply with this text; streamed word by word
    Text(String),
    /// Stream exactly these chunks
    Chunks(Vec<String>),
    /// Reply with nothing
    Empty,
    /// Fail with this error
    Error(GatewayError),
    /// Block until cancelled
    HangUntilCancelled,
    /// Wait, then behave like the inner reply
    Delayed(Duration, Box<ScriptedReply>),
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn delayed(delay: Duration, reply: ScriptedReply) -> Self {
        Self::Delayed(delay, Box::new(reply))
    }
}

/// A call the scripted gateway received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub streaming: bool,
    pub messages: Vec<ChatMessage>,
    pub params: ModelParameters,
}

/// Gateway double that replays per-model scripts.
///
/// Streaming and non-streaming calls have separate queues. When a queue is
/// empty the default reply is used.
pub struct ScriptedGateway {
    models: Vec<ModelInfo>,
    stream_scripts: Arc<RwLock<HashMap<String, VecDeque<ScriptedReply>>>>,
    completion_scripts: Arc<RwLock<HashMap<String, VecDeque<ScriptedReply>>>>,
    default_reply: Arc<RwLock<ScriptedReply>>,
    usage: Option<TokenUsage>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            stream_scripts: Arc::new(RwLock::new(HashMap::new())),
            completion_scripts: Arc::new(RwLock::new(HashMap::new())),
            default_reply: Arc::new(RwLock::new(ScriptedReply::text("42"))),
            usage: None,
            calls: Arc::new(RwLock::new(Vec::new())),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.models = models;
        self
    }

    pub fn with_default_reply(self, reply: ScriptedReply) -> Self {
        *self.default_reply.write() = reply;
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Queue a reply for the next streaming call to `model`
    pub fn script_stream(&self, model: impl Into<String>, reply: ScriptedReply) {
        self.stream_scripts
            .write()
            .entry(model.into())
            .or_default()
            .push_back(reply);
    }

    /// Queue a reply for the next non-streaming call to `model`
    pub fn script_completion(&self, model: impl Into<String>, reply: ScriptedReply) {
        self.completion_scripts
            .write()
            .entry(model.into())
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().clone()
    }

    pub fn stream_calls(&self, model: &str) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| c.streaming && c.model == model)
            .count()
    }

    pub fn completion_calls(&self, model: &str) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| !c.streaming && c.model == model)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.read().len()
    }

    /// Highest number of calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, model: &str, streaming: bool) -> ScriptedReply {
        let scripts = if streaming {
            &self.stream_scripts
        } else {
            &self.completion_scripts
        };
        scripts
            .write()
            .get_mut(model)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| self.default_reply.read().clone())
    }

    fn record(&self, model: &str, streaming: bool, messages: &[ChatMessage], params: &ModelParameters) {
        self.calls.write().push(RecordedCall {
            model: model.to_string(),
            streaming,
            messages: messages.to_vec(),
            params: params.clone(),
        });
    }

    async fn play(
        &self,
        reply: ScriptedReply,
        chunks: Option<&mpsc::Sender<String>>,
        cancel: &CancellationToken,
    ) -> Result<ChatCompletion, GatewayError> {
        let _guard = InFlightGuard::enter(&self.in_flight, &self.max_in_flight);

        let mut reply = reply;
        while let ScriptedReply::Delayed(delay, inner) = reply {
            cancel.sleep(delay).await.map_err(|_| GatewayError::Cancelled)?;
            reply = *inner;
        }

        let pieces: Vec<String> = match reply {
            ScriptedReply::Text(text) => text.split_inclusive(' ').map(str::to_string).collect(),
            ScriptedReply::Chunks(chunks) => chunks,
            ScriptedReply::Empty => Vec::new(),
            ScriptedReply::Error(e) => return Err(e),
            ScriptedReply::HangUntilCancelled => {
                cancel.cancelled().await;
                return Err(GatewayError::Cancelled);
            }
            ScriptedReply::Delayed(..) => unreachable!("delays are unwrapped above"),
        };

        let mut content = String::new();
        for piece in pieces {
            if cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }
            if let Some(tx) = chunks {
                let _ = tx.send(piece.clone()).await;
                tokio::task::yield_now().await;
            }
            content.push_str(&piece);
        }

        Ok(ChatCompletion {
            content,
            usage: self.usage,
        })
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceGateway for ScriptedGateway {
    async fn fetch_models(&self) -> Result<Vec<ModelInfo>, GatewayError> {
        Ok(self.models.clone())
    }

    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &ModelParameters,
        cancel: &CancellationToken,
    ) -> Result<ChatCompletion, GatewayError> {
        self.record(model, false, messages, params);
        let reply = self.next_reply(model, false);
        self.play(reply, None, cancel).await
    }

    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &ModelParameters,
        chunks: mpsc::Sender<String>,
        cancel: &CancellationToken,
    ) -> Result<ChatCompletion, GatewayError> {
        self.record(model, true, messages, params);
        let reply = self.next_reply(model, true);
        self.play(reply, Some(&chunks), cancel).await
    }
}

struct InFlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory result store that also logs every update it receives
pub struct MockResultStore {
    runs: Arc<RwLock<HashMap<RunId, RunResult>>>,
    updates: Arc<RwLock<Vec<(String, String, ResultUpdate)>>>,
}

impl MockResultStore {
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
            updates: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Updates for one (test case, model) pair, in arrival order
    pub fn updates_for(&self, test_case_id: &str, model_id: &str) -> Vec<ResultUpdate> {
        self.updates
            .read()
            .iter()
            .filter(|(tc, m, _)| tc == test_case_id && m == model_id)
            .map(|(_, _, u)| u.clone())
            .collect()
    }

    pub fn update_count(&self) -> usize {
        self.updates.read().len()
    }

    pub fn run_count(&self) -> usize {
        self.runs.read().len()
    }
}

impl Default for MockResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for MockResultStore {
    async fn create_run(&self, run: RunResult) -> Result<RunResult, StoreError> {
        self.runs.write().insert(run.id, run.clone());
        Ok(run)
    }

    async fn update_result(
        &self,
        run_id: RunId,
        test_case_id: &str,
        model_id: &str,
        update: ResultUpdate,
    ) -> Result<(), StoreError> {
        let mut runs = self.runs.write();
        let run = runs.get_mut(&run_id).ok_or(StoreError::RunNotFound(run_id))?;
        if run.is_sealed() {
            return Err(StoreError::Sealed(run_id));
        }
        let result = run
            .result_mut(test_case_id, model_id)
            .ok_or_else(|| StoreError::ResultNotFound {
                run_id,
                test_case_id: test_case_id.to_string(),
                model_id: model_id.to_string(),
            })?;
        self.updates
            .write()
            .push((test_case_id.to_string(), model_id.to_string(), update.clone()));
        update.apply(result);
        Ok(())
    }

    async fn set_score(
        &self,
        run_id: RunId,
        test_case_id: &str,
        model_id: &str,
        score: ScoringResult,
    ) -> Result<(), StoreError> {
        let mut runs = self.runs.write();
        let run = runs.get_mut(&run_id).ok_or(StoreError::RunNotFound(run_id))?;
        if run.is_sealed() {
            return Err(StoreError::Sealed(run_id));
        }
        let result = run
            .result_mut(test_case_id, model_id)
            .ok_or_else(|| StoreError::ResultNotFound {
                run_id,
                test_case_id: test_case_id.to_string(),
                model_id: model_id.to_string(),
            })?;
        result.score = Some(score);
        Ok(())
    }

    async fn seal_run(&self, run_id: RunId, cancelled: bool) -> Result<RunResult, StoreError> {
        let mut runs = self.runs.write();
        let run = runs.get_mut(&run_id).ok_or(StoreError::RunNotFound(run_id))?;
        run.seal(cancelled);
        Ok(run.clone())
    }

    async fn get_run(&self, run_id: RunId) -> Result<RunResult, StoreError> {
        self.runs
            .read()
            .get(&run_id)
            .cloned()
            .ok_or(StoreError::RunNotFound(run_id))
    }

    async fn list_runs(&self) -> Result<Vec<RunResult>, StoreError> {
        let mut runs: Vec<RunResult> = self.runs.read().values().cloned().collect();
        runs.sort_by_key(|r| r.started_at);
        Ok(runs)
    }
}

/// Collects progress events for assertions
#[derive(Clone, Default)]
pub struct ProgressRecorder {
    events: Arc<RwLock<Vec<ProgressEvent>>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> ProgressSink {
        let events = self.events.clone();
        Arc::new(move |event: ProgressEvent| events.write().push(event))
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.read().clone()
    }
}
