//! Every run terminates within the node ceiling, whatever the services answer.

use async_trait::async_trait;
use parking_lot::Mutex;
use postsmith::error::{GenerationError, ImageError, PersistenceError, PublishingError};
use postsmith::publishing::PublishOutcome;
use postsmith::store::{InMemoryMetricsStore, MetricsStore, PostRecord};
use postsmith::workflow::{
    max_node_executions, prompts, AssetId, EngineSettings, Node, RunOutcome, StaticFallback,
    Toolbox, WorkflowEngine,
};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Review verdicts and failure switches drawn by proptest
#[derive(Debug, Clone)]
struct Script {
    cap: u32,
    verdicts: Vec<Option<bool>>,
    drafts_fail: bool,
    publish_ok: bool,
}

struct RandomTools {
    verdicts: Mutex<VecDeque<Option<bool>>>,
    drafts_fail: bool,
    publish_ok: bool,
    drafted: Mutex<u32>,
}

#[async_trait]
impl Toolbox for RandomTools {
    async fn generate_text(&self, role: &str, _: &str) -> Result<String, GenerationError> {
        if role == prompts::TOPIC_GENERATOR_ROLE {
            return Ok("topic".to_string());
        }
        if role == prompts::CONTENT_CREATOR_ROLE {
            if self.drafts_fail {
                return Err(GenerationError::Provider("down".to_string()));
            }
            let mut drafted = self.drafted.lock();
            *drafted += 1;
            return Ok(format!("draft {}", *drafted));
        }
        // None: the review call itself fails
        match self.verdicts.lock().pop_front().flatten() {
            Some(true) => Ok("APPROVED".to_string()),
            Some(false) => Ok("Tighten the hook.".to_string()),
            None => Err(GenerationError::Provider("review down".to_string())),
        }
    }

    async fn generate_image(&self, _: &str) -> Result<Option<Vec<u8>>, ImageError> {
        Ok(Some(vec![1]))
    }

    async fn upload_asset(&self, _: &Path) -> Result<Option<String>, PublishingError> {
        Ok(Some("urn:li:asset:P".to_string()))
    }

    async fn publish(
        &self,
        _: &str,
        _: Option<&AssetId>,
    ) -> Result<PublishOutcome, PublishingError> {
        if self.publish_ok {
            Ok(PublishOutcome {
                status: 201,
                post_id: None,
                response: Value::Null,
            })
        } else {
            Err(PublishingError::Rejected {
                status: 500,
                body: String::new(),
            })
        }
    }

    async fn save_record(&self, _: &PostRecord) -> Result<String, PersistenceError> {
        Ok("1".to_string())
    }
}

fn script_strategy() -> impl Strategy<Value = Script> {
    (
        1u32..6,
        prop::collection::vec(prop::option::weighted(0.8, any::<bool>()), 0..8),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(cap, verdicts, drafts_fail, publish_ok)| Script {
            cap,
            verdicts,
            drafts_fail,
            publish_ok,
        })
}

#[test]
fn test_runs_terminate_within_ceiling() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let mut runner = proptest::test_runner::TestRunner::new(proptest::test_runner::Config {
        cases: 64,
        ..Default::default()
    });

    runner
        .run(&script_strategy(), |script| {
            let tools = Arc::new(RandomTools {
                verdicts: Mutex::new(script.verdicts.clone().into()),
                drafts_fail: script.drafts_fail,
                publish_ok: script.publish_ok,
                drafted: Mutex::new(0),
            });
            let metrics = Arc::new(InMemoryMetricsStore::new());
            let engine = WorkflowEngine::new(tools, metrics.clone())
                .with_fallback(Arc::new(StaticFallback::new("p")))
                .with_settings(EngineSettings {
                    max_review_iterations: script.cap,
                    ..EngineSettings::default()
                });

            let report = runtime.block_on(engine.run("rust")).unwrap();
            let state = &report.final_state;

            prop_assert!(report.steps.len() <= max_node_executions(script.cap));
            prop_assert!(state.is_approved());
            prop_assert!(state.iteration_count() >= 1);
            prop_assert!(state.iteration_count() <= script.cap);
            prop_assert!(!state.final_post().unwrap_or_default().trim().is_empty());

            let path = report.path();
            prop_assert_eq!(path.first(), Some(&Node::TopicGeneration));
            prop_assert_eq!(path.last(), Some(&Node::PostExecution));
            let reviews = path.iter().filter(|n| **n == Node::Review).count();
            prop_assert_eq!(reviews as u32, state.iteration_count());
            prop_assert_eq!(path.iter().filter(|n| **n == Node::ImageGeneration).count(), 1);

            for step in &report.steps {
                prop_assert_eq!(step.state.is_approved(), step.state.final_post().is_some());
            }

            // iteration count and approval never go backwards
            for pair in report.steps.windows(2) {
                prop_assert!(pair[0].state.iteration_count() <= pair[1].state.iteration_count());
                prop_assert!(!pair[0].state.is_approved() || pair[1].state.is_approved());
                if pair[0].state.is_approved() {
                    prop_assert_eq!(pair[0].state.final_post(), pair[1].state.final_post());
                }
            }

            // one failed increment per fallback taken, plus one for a rejected publish
            let failed_reviews = (0..state.iteration_count() as usize)
                .filter(|i| script.verdicts.get(*i).copied().flatten().is_none())
                .count();
            let failed_drafts = if script.drafts_fail {
                path.iter().filter(|n| **n == Node::ContentCreation).count()
            } else {
                0
            };
            let failed_publish = usize::from(!script.publish_ok);
            let expected_failed = (failed_reviews + failed_drafts + failed_publish) as u64;

            let summary = metrics.read_summary().unwrap();
            prop_assert_eq!(summary.total_failed, expected_failed);
            if script.publish_ok {
                prop_assert_eq!(report.outcome, RunOutcome::PostSuccess);
                prop_assert_eq!(summary.total_completed, 1);
            } else {
                prop_assert_eq!(report.outcome, RunOutcome::PostFailed);
                prop_assert_eq!(summary.total_completed, 0);
            }
            Ok(())
        })
        .unwrap();
}
