//! Workflow engine: drives one run from TopicGeneration to a terminal outcome.
//!
//! Each node reads the current state, calls out through the [`Toolbox`] and
//! returns a [`StateUpdate`] plus a [`Transition`]. The driver applies the
//! update, records a snapshot and follows the transition. Leaf failures are
//! absorbed here: text and image failures fall back, terminal failures end
//! the run with [`RunOutcome::PostFailed`]. Only internal faults surface as
//! `Err`.

use crate::error::{GenerationError, ImageError, PersistenceError, PublishingError, WorkflowError};
use crate::progress::{
    new_run_id, NodeCompletedData, ProgressBus, RunCompletedData, RunStartedData,
};
use crate::store::{MetricsStore, PostRecord};
use crate::workflow::fallback::{FallbackStrategy, TimestampFallback};
use crate::workflow::node::{max_node_executions, route, Node, RunOutcome, Transition};
use crate::workflow::prompts;
use crate::workflow::state::{AssetId, StateUpdate, WorkflowState};
use crate::workflow::tools::Toolbox;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

/// Tunables for a run
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Review passes before approval is forced (minimum 1)
    pub max_review_iterations: u32,
    /// Deadline applied to every leaf call
    pub call_timeout: Duration,
    /// Platform label written into post records
    pub platform: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_review_iterations: 1,
            call_timeout: Duration::from_secs(120),
            platform: "linkedin".to_string(),
        }
    }
}

impl EngineSettings {
    fn review_cap(&self) -> u32 {
        self.max_review_iterations.max(1)
    }
}

/// State after one node execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub node: Node,
    pub next: Transition,
    pub state: WorkflowState,
}

/// What the terminal node published, when the platform accepted the post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub post_id: Option<String>,
    /// `None` when the post went live but the record could not be saved
    pub record_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub final_state: WorkflowState,
    pub steps: Vec<StepSnapshot>,
    pub published: Option<PublishReceipt>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Node labels in execution order
    pub fn path(&self) -> Vec<Node> {
        self.steps.iter().map(|s| s.node).collect()
    }
}

struct NodeStep {
    update: StateUpdate,
    next: Transition,
    published: Option<PublishReceipt>,
}

impl NodeStep {
    fn next(update: StateUpdate, node: Node) -> Self {
        Self {
            update,
            next: Transition::Next(node),
            published: None,
        }
    }

    fn terminal(update: StateUpdate, outcome: RunOutcome) -> Self {
        Self {
            update,
            next: Transition::Terminal(outcome),
            published: None,
        }
    }
}

#[derive(Clone)]
pub struct WorkflowEngine {
    tools: Arc<dyn Toolbox>,
    metrics: Arc<dyn MetricsStore>,
    fallback: Arc<dyn FallbackStrategy>,
    settings: EngineSettings,
    progress: Option<ProgressBus>,
}

impl WorkflowEngine {
    pub fn new(tools: Arc<dyn Toolbox>, metrics: Arc<dyn MetricsStore>) -> Self {
        Self {
            tools,
            metrics,
            fallback: Arc::new(TimestampFallback),
            settings: EngineSettings::default(),
            progress: None,
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackStrategy>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBus) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsStore> {
        &self.metrics
    }

    /// Execute one run for `niche`.
    ///
    /// Leaf failures never surface here; `Err` means a blank niche or an
    /// internal fault (invariant violation, step ceiling breach).
    pub async fn run(&self, niche: &str) -> Result<RunReport, WorkflowError> {
        let state = WorkflowState::new(niche)?;
        self.drive(state).await
    }

    async fn drive(&self, mut state: WorkflowState) -> Result<RunReport, WorkflowError> {
        let run_id = new_run_id();
        let limit = max_node_executions(self.settings.review_cap());
        let started = Instant::now();
        let mut steps: Vec<StepSnapshot> = Vec::new();
        let mut published = None;
        let mut node = Node::INITIAL;

        info!(run_id = %run_id, niche = %state.niche(), "workflow run started");
        self.emit(
            &run_id,
            "run_started",
            serde_json::to_value(RunStartedData {
                niche: state.niche().to_string(),
                max_review_iterations: self.settings.review_cap(),
            }),
        );

        loop {
            if steps.len() >= limit {
                error!(run_id = %run_id, limit, "workflow exceeded node execution ceiling");
                return Err(WorkflowError::StepLimitExceeded { limit });
            }

            let node_started = Instant::now();
            let step = self.execute(node, &state).await;
            state.apply(step.update)?;
            if step.published.is_some() {
                published = step.published;
            }

            // Review's exit is decided on the updated state, never by the node.
            let next = match node {
                Node::Review => Transition::Next(route(&state)),
                _ => step.next,
            };

            debug!(
                run_id = %run_id,
                node = %node,
                iteration = state.iteration_count(),
                approved = state.is_approved(),
                "node completed"
            );
            self.emit(
                &run_id,
                "node_completed",
                serde_json::to_value(NodeCompletedData {
                    node,
                    next,
                    iteration_count: state.iteration_count(),
                    is_approved: state.is_approved(),
                    duration_ms: node_started.elapsed().as_millis(),
                }),
            );
            steps.push(StepSnapshot {
                node,
                next,
                state: state.clone(),
            });

            match next {
                Transition::Next(following) => node = following,
                Transition::Terminal(outcome) => {
                    info!(
                        run_id = %run_id,
                        outcome = %outcome,
                        steps = steps.len(),
                        "workflow run finished"
                    );
                    self.emit(
                        &run_id,
                        "run_completed",
                        serde_json::to_value(RunCompletedData {
                            outcome,
                            steps: steps.len(),
                            duration_ms: started.elapsed().as_millis(),
                        }),
                    );
                    return Ok(RunReport {
                        run_id,
                        outcome,
                        final_state: state,
                        steps,
                        published,
                    });
                }
            }
        }
    }

    async fn execute(&self, node: Node, state: &WorkflowState) -> NodeStep {
        match node {
            Node::TopicGeneration => self.topic_generation(state).await,
            Node::ContentCreation => self.content_creation(state).await,
            Node::Review => self.review(state).await,
            Node::ImageGeneration => self.image_generation(state).await,
            Node::PostExecution => self.post_execution(state).await,
        }
    }

    async fn topic_generation(&self, state: &WorkflowState) -> NodeStep {
        let niche = state.niche();
        let topic = match self
            .generate(prompts::TOPIC_GENERATOR_ROLE, &prompts::topic_context(niche))
            .await
        {
            Ok(topic) => topic,
            Err(err) => {
                warn!(node = %Node::TopicGeneration, error = %err, "topic generation failed, using fallback");
                self.count_failed(Node::TopicGeneration).await;
                self.fallback.topic(niche)
            }
        };
        NodeStep::next(
            StateUpdate::for_node(Node::TopicGeneration).topic(topic),
            Node::ContentCreation,
        )
    }

    async fn content_creation(&self, state: &WorkflowState) -> NodeStep {
        let topic = state.topic.as_deref().unwrap_or_else(|| state.niche());
        // After a rejected review the draft slot holds the critique.
        let feedback = if state.iteration_count() > 0 && !state.is_approved() {
            state.draft.as_deref()
        } else {
            None
        };

        let draft = match self
            .generate(
                prompts::CONTENT_CREATOR_ROLE,
                &prompts::content_context(topic, feedback),
            )
            .await
        {
            Ok(draft) => draft,
            Err(err) => {
                warn!(node = %Node::ContentCreation, error = %err, "content creation failed, using fallback");
                self.count_failed(Node::ContentCreation).await;
                self.fallback.draft(topic)
            }
        };
        NodeStep::next(
            StateUpdate::for_node(Node::ContentCreation).draft(draft),
            Node::Review,
        )
    }

    async fn review(&self, state: &WorkflowState) -> NodeStep {
        let iteration = state.iteration_count() + 1;
        let cap_reached = iteration >= self.settings.review_cap();
        let draft = state.draft.clone().unwrap_or_default();

        let critique = match self
            .generate(prompts::REVIEWER_ROLE, &prompts::review_context(&draft))
            .await
        {
            Ok(text) => text,
            Err(err) => {
                warn!(node = %Node::Review, iteration, error = %err, "review failed, using fallback");
                self.count_failed(Node::Review).await;
                self.fallback.critique(cap_reached)
            }
        };

        let update = StateUpdate::for_node(Node::Review).iteration(iteration);
        if prompts::contains_approval(&critique) || cap_reached {
            info!(iteration, forced = !prompts::contains_approval(&critique), "draft approved");
            NodeStep::next(update.approve(draft), Node::ImageGeneration)
        } else {
            info!(iteration, "draft sent back for revision");
            NodeStep::next(update.draft(critique), Node::ContentCreation)
        }
    }

    async fn image_generation(&self, state: &WorkflowState) -> NodeStep {
        let update = StateUpdate::for_node(Node::ImageGeneration);
        let Some(post) = state.final_post() else {
            error!(node = %Node::ImageGeneration, "reached image generation without an approved post");
            self.count_failed(Node::ImageGeneration).await;
            return NodeStep::next(update.image_asset(None), Node::PostExecution);
        };

        let asset = self.produce_asset(post).await;
        if asset.is_none() {
            self.count_failed(Node::ImageGeneration).await;
        }
        NodeStep::next(update.image_asset(asset), Node::PostExecution)
    }

    /// Generate, stage and upload an image. `None` on any failure.
    async fn produce_asset(&self, post: &str) -> Option<AssetId> {
        let prompt = prompts::image_prompt(post);
        let bytes = match self
            .deadline(self.tools.generate_image(&prompt), ImageError::Timeout)
            .await
        {
            Ok(Some(bytes)) if !bytes.is_empty() => bytes,
            Ok(_) => {
                warn!(node = %Node::ImageGeneration, "image service returned no image");
                return None;
            }
            Err(err) => {
                warn!(node = %Node::ImageGeneration, error = %err, "image generation failed");
                return None;
            }
        };

        let file = match stage_image(&bytes) {
            Ok(file) => file,
            Err(err) => {
                warn!(node = %Node::ImageGeneration, error = %err, "could not stage image");
                return None;
            }
        };

        let uploaded = self
            .deadline(self.tools.upload_asset(file.path()), PublishingError::Timeout)
            .await;
        if let Err(err) = file.close() {
            warn!(error = %err, "could not remove staged image");
        }

        match uploaded {
            Ok(Some(raw)) => {
                let asset = AssetId::parse(&raw);
                if asset.is_none() {
                    warn!(node = %Node::ImageGeneration, asset = %raw, "upload returned a malformed asset id");
                }
                asset
            }
            Ok(None) => {
                warn!(node = %Node::ImageGeneration, "upload returned no asset id");
                None
            }
            Err(err) => {
                warn!(node = %Node::ImageGeneration, error = %err, status = ?err.status(), "image upload failed");
                None
            }
        }
    }

    async fn post_execution(&self, state: &WorkflowState) -> NodeStep {
        let update = StateUpdate::for_node(Node::PostExecution);
        let Some(post) = state.final_post() else {
            error!(node = %Node::PostExecution, "reached post execution without an approved post");
            self.count_failed(Node::PostExecution).await;
            return NodeStep::terminal(update, RunOutcome::PostFailed);
        };

        let asset = state.image_asset_id.as_ref();
        let outcome = match self
            .deadline(self.tools.publish(post, asset), PublishingError::Timeout)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(node = %Node::PostExecution, error = %err, status = ?err.status(), "publish failed");
                self.count_failed(Node::PostExecution).await;
                return NodeStep::terminal(update, RunOutcome::PostFailed);
            }
        };
        info!(status = outcome.status, post_id = ?outcome.post_id, with_image = asset.is_some(), "post published");

        let record = PostRecord {
            platform: self.settings.platform.clone(),
            niche: state.niche().to_string(),
            topic: state.topic.clone(),
            content: post.to_string(),
            image_asset_id: state.image_asset_id.clone(),
            posted_at: Utc::now(),
            publish_response: json!({
                "status": outcome.status,
                "post_id": outcome.post_id,
                "body": outcome.response,
            }),
        };

        let saved = self
            .deadline(self.tools.save_record(&record), PersistenceError::Timeout)
            .await;
        let (result, record_id) = match saved {
            Ok(id) => {
                self.count_completed().await;
                (RunOutcome::PostSuccess, Some(id))
            }
            Err(err) => {
                error!(
                    node = %Node::PostExecution,
                    post_id = ?outcome.post_id,
                    error = %err,
                    "post is live but its record could not be saved; counting run as failed"
                );
                self.count_failed(Node::PostExecution).await;
                (RunOutcome::PostFailed, None)
            }
        };

        NodeStep {
            update,
            next: Transition::Terminal(result),
            published: Some(PublishReceipt {
                post_id: outcome.post_id,
                record_id,
            }),
        }
    }

    /// Text call with a deadline; blank output counts as a failure.
    async fn generate(&self, role: &str, context: &str) -> Result<String, GenerationError> {
        let text = self
            .deadline(self.tools.generate_text(role, context), GenerationError::Timeout)
            .await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::InvalidResponse("empty completion".to_string()));
        }
        Ok(text.to_string())
    }

    async fn deadline<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
        on_timeout: impl FnOnce(Duration) -> E,
    ) -> Result<T, E> {
        let limit = self.settings.call_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(limit)),
        }
    }

    async fn count_failed(&self, node: Node) {
        let metrics = Arc::clone(&self.metrics);
        match self
            .deadline(off_runtime(move || metrics.increment_failed()), PersistenceError::Timeout)
            .await
        {
            Ok(total) => debug!(node = %node, total_failed = total, "failure counted"),
            Err(err) => warn!(node = %node, error = %err, "could not increment failed counter"),
        }
    }

    async fn count_completed(&self) {
        let metrics = Arc::clone(&self.metrics);
        match self
            .deadline(off_runtime(move || metrics.increment_completed()), PersistenceError::Timeout)
            .await
        {
            Ok(total) => debug!(total_completed = total, "completion counted"),
            Err(err) => warn!(error = %err, "could not increment completed counter"),
        }
    }

    fn emit(
        &self,
        run_id: &str,
        event_type: &str,
        data: Result<serde_json::Value, serde_json::Error>,
    ) {
        let Some(bus) = &self.progress else {
            return;
        };
        match data {
            Ok(data) => bus.emit_best_effort(run_id, event_type, data),
            Err(err) => warn!(event_type, error = %err, "could not encode progress event"),
        }
    }
}

/// Run a synchronous store call on the blocking pool.
async fn off_runtime<T, F>(call: F) -> Result<T, PersistenceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PersistenceError> + Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| PersistenceError::Backend(format!("store task failed: {}", e)))?
}

fn stage_image(bytes: &[u8]) -> Result<NamedTempFile, ImageError> {
    let mut file = tempfile::Builder::new()
        .prefix("postsmith-image-")
        .suffix(".png")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}
