//! Workflow API
//!
//! Library entry point: accepts a niche, drives one run in its own task and
//! always answers with a [`RunResponse`] envelope. Also serves the counter
//! summary and the post log.

use crate::config::PostsmithConfig;
use crate::error::{AppError, PersistenceError, WorkflowError};
use crate::image::GeminiImageClient;
use crate::progress::ProgressBus;
use crate::provider::ProviderContentService;
use crate::publishing::LinkedInPublisher;
use crate::store::{
    open_db, JobSummary, MetricsStore, RecordStore, SledMetricsStore, SledPostStore, StoredPost,
};
use crate::workflow::{
    PublishReceipt, RunOutcome, RunReport, ServiceToolbox, WorkflowEngine, WorkflowState,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Envelope returned for every run request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub status: String,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RunOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_state: Option<WorkflowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishReceipt>,
}

impl RunResponse {
    fn completed(report: RunReport) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            code: 200,
            message: "Workflow completed".to_string(),
            run_id: Some(report.run_id),
            outcome: Some(report.outcome),
            final_state: Some(report.final_state),
            published: report.published,
        }
    }

    fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            code,
            message: message.into(),
            run_id: None,
            outcome: None,
            final_state: None,
            published: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

pub struct WorkflowApi {
    engine: Arc<WorkflowEngine>,
    records: Arc<dyn RecordStore>,
}

impl WorkflowApi {
    pub fn new(engine: WorkflowEngine, records: Arc<dyn RecordStore>) -> Self {
        Self {
            engine: Arc::new(engine),
            records,
        }
    }

    /// Wire the production services described by `config`.
    ///
    /// Missing credentials fail here, before any run starts.
    pub fn from_config(
        config: &PostsmithConfig,
        progress: Option<ProgressBus>,
    ) -> Result<Self, AppError> {
        let content = Arc::new(ProviderContentService::from_config(&config.content)?);
        info!(
            provider = content.provider_name(),
            model = content.model_name(),
            "content service ready"
        );
        let images = Arc::new(GeminiImageClient::from_config(&config.image)?);
        let publisher = Arc::new(LinkedInPublisher::from_config(&config.linkedin)?);

        let db = open_db(config.storage.resolve_store_path())?;
        let metrics: Arc<dyn MetricsStore> = Arc::new(SledMetricsStore::new(&db)?);
        let records: Arc<dyn RecordStore> = Arc::new(SledPostStore::new(&db)?);

        let tools = ServiceToolbox::new(content, images, publisher, Arc::clone(&records));
        let mut engine = WorkflowEngine::new(Arc::new(tools), metrics)
            .with_settings(config.workflow.engine_settings());
        if let Some(bus) = progress {
            engine = engine.with_progress(bus);
        }
        Ok(Self::new(engine, records))
    }

    /// Run the workflow for `niche`. Never fails: faults become error
    /// envelopes (400 for a blank niche, 500 for anything internal).
    pub async fn run_workflow(&self, niche: &str) -> RunResponse {
        if niche.trim().is_empty() {
            return RunResponse::error(400, WorkflowError::EmptyNiche.to_string());
        }

        let engine = Arc::clone(&self.engine);
        let niche = niche.to_string();
        let joined = tokio::spawn(async move { engine.run(&niche).await }).await;

        match joined {
            Ok(Ok(report)) => RunResponse::completed(report),
            Ok(Err(WorkflowError::EmptyNiche)) => {
                RunResponse::error(400, WorkflowError::EmptyNiche.to_string())
            }
            Ok(Err(err)) => {
                error!(error = %err, "workflow run aborted");
                RunResponse::error(500, err.to_string())
            }
            Err(join_err) => {
                let err = WorkflowError::Aborted(panic_message(join_err));
                error!(error = %err, "workflow task did not complete");
                RunResponse::error(500, err.to_string())
            }
        }
    }

    /// Counter totals; zero before the first run.
    pub fn summary(&self) -> Result<JobSummary, PersistenceError> {
        self.engine.metrics().read_summary()
    }

    pub fn recent_posts(&self, limit: usize) -> Result<Vec<StoredPost>, PersistenceError> {
        self.records.list(limit)
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "workflow task panicked".to_string()
    }
}
