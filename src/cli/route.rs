//! CLI route: single route table and run context.

use crate::api::WorkflowApi;
use crate::cli::help::command_name;
use crate::cli::output::CommandOutput;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_posts_json, format_posts_text, format_run_json, format_run_text, format_summary_json,
    format_summary_text, format_validation_json, format_validation_text,
};
use crate::config::{ConfigLoader, PostsmithConfig};
use crate::error::AppError;
use crate::progress::{ProgressBus, ProgressEvent};
use crate::store::{open_db, MetricsStore, RecordStore, SledMetricsStore, SledPostStore};
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: PostsmithConfig,
    verbose: bool,
}

impl RunContext {
    /// Load configuration from `config_path` when given, else from the
    /// workspace layers.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        verbose: bool,
    ) -> Result<Self, AppError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self::with_config(workspace_root, config, verbose))
    }

    pub fn with_config(workspace_root: PathBuf, config: PostsmithConfig, verbose: bool) -> Self {
        Self {
            workspace_root,
            config,
            verbose,
        }
    }

    pub fn config(&self) -> &PostsmithConfig {
        &self.config
    }

    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput, AppError> {
        let started = Instant::now();
        debug!(
            command = command_name(command),
            workspace = %self.workspace_root.display(),
            "executing command"
        );
        let result = self.execute_inner(command).await;
        info!(
            command = command_name(command),
            ok = matches!(&result, Ok(out) if out.ok),
            duration_ms = started.elapsed().as_millis() as u64,
            "command finished"
        );
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<CommandOutput, AppError> {
        match command {
            Commands::Run { niche, format } => self.handle_run(niche, *format).await,
            Commands::Summary { format } => {
                let db = open_db(self.config.storage.resolve_store_path())?;
                let summary = SledMetricsStore::new(&db)?.read_summary()?;
                let body = match format {
                    OutputFormat::Text => format_summary_text(&summary),
                    OutputFormat::Json => format_summary_json(&summary)?,
                };
                Ok(CommandOutput::ok(body))
            }
            Commands::Posts { limit, format } => {
                let db = open_db(self.config.storage.resolve_store_path())?;
                let posts = SledPostStore::new(&db)?.list(*limit)?;
                let body = match format {
                    OutputFormat::Text => format_posts_text(&posts),
                    OutputFormat::Json => format_posts_json(&posts)?,
                };
                Ok(CommandOutput::ok(body))
            }
            Commands::Validate { format } => {
                let result = self.config.validate();
                let body = match format {
                    OutputFormat::Text => format_validation_text(&result),
                    OutputFormat::Json => format_validation_json(&result)?,
                };
                Ok(CommandOutput {
                    body,
                    ok: result.is_ok(),
                })
            }
        }
    }

    async fn handle_run(&self, niche: &str, format: OutputFormat) -> Result<CommandOutput, AppError> {
        let (progress, logger) = if self.verbose {
            let (bus, rx) = ProgressBus::new_pair();
            (Some(bus), Some(spawn_progress_logger(rx)))
        } else {
            (None, None)
        };

        let api = WorkflowApi::from_config(&self.config, progress)?;
        let response = api.run_workflow(niche).await;
        // The engine owns the only sender; dropping it closes the channel.
        drop(api);
        if let Some(logger) = logger {
            match logger.await {
                Ok(count) => debug!(events = count, "progress log drained"),
                Err(err) => warn!(error = %err, "progress logger task failed"),
            }
        }

        let body = match format {
            OutputFormat::Text => format_run_text(&response),
            OutputFormat::Json => format_run_json(&response)?,
        };
        let ok = response.is_success()
            && response.outcome.map(|o| o.is_success()).unwrap_or(false);
        Ok(CommandOutput { body, ok })
    }
}

/// Log every progress event until all senders are gone. Yields the event count.
fn spawn_progress_logger(mut rx: UnboundedReceiver<ProgressEvent>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut count = 0;
        while let Some(event) = rx.recv().await {
            count += 1;
            info!(
                run_id = %event.run,
                seq = event.seq,
                event = %event.event_type,
                data = %event.data,
                "progress"
            );
        }
        count
    })
}
