//! CLI parsing and read-only commands.

use clap::Parser;
use postsmith::cli::{command_name, Cli, Commands, OutputFormat, RunContext};
use postsmith::config::{PostsmithConfig, StorageConfig};
use postsmith::store::{open_db, MetricsStore, SledMetricsStore};
use tempfile::TempDir;

#[test]
fn run_takes_a_quoted_niche() {
    let cli = Cli::try_parse_from(["postsmith", "run", "cloud computing", "--format", "json"])
        .unwrap();
    match &cli.command {
        Commands::Run { niche, format } => {
            assert_eq!(niche, "cloud computing");
            assert_eq!(*format, OutputFormat::Json);
        }
        _ => panic!("expected run"),
    }
    assert_eq!(command_name(&cli.command), "run");
    assert!(!cli.verbose);
}

#[test]
fn posts_defaults_to_ten() {
    let cli = Cli::try_parse_from(["postsmith", "posts"]).unwrap();
    match cli.command {
        Commands::Posts { limit, format } => {
            assert_eq!(limit, 10);
            assert_eq!(format, OutputFormat::Text);
        }
        _ => panic!("expected posts"),
    }
}

#[test]
fn run_requires_a_niche() {
    assert!(Cli::try_parse_from(["postsmith", "run"]).is_err());
    assert!(Cli::try_parse_from(["postsmith", "summary", "--format", "yaml"]).is_err());
}

#[tokio::test]
async fn summary_reads_existing_counters() {
    let temp = TempDir::new().unwrap();
    let store_path = temp.path().join("store");
    {
        let db = open_db(&store_path).unwrap();
        let metrics = SledMetricsStore::new(&db).unwrap();
        metrics.increment_completed().unwrap();
        metrics.increment_failed().unwrap();
        metrics.increment_failed().unwrap();
    }

    let config = PostsmithConfig {
        storage: StorageConfig {
            store_path: Some(store_path),
        },
        ..PostsmithConfig::default()
    };
    let context = RunContext::with_config(temp.path().to_path_buf(), config, false);

    let text = context
        .execute(&Commands::Summary {
            format: OutputFormat::Text,
        })
        .await
        .unwrap();
    assert!(text.ok);
    assert!(text.body.contains("Completed"));

    let json = context
        .execute(&Commands::Summary {
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json.body).unwrap();
    assert_eq!(value["total_completed"], 1);
    assert_eq!(value["total_failed"], 2);

    let posts = context
        .execute(&Commands::Posts {
            limit: 5,
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&posts.body).unwrap();
    assert_eq!(value["total"], 0);
    assert!(value["posts"].as_array().unwrap().is_empty());
}
