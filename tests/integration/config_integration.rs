//! Layered configuration loading: global file, workspace files, environment.

use crate::integration::with_env;
use postsmith::config::{ConfigLoader, ProviderType};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

const CLEAN: [(&str, Option<&str>); 4] = [
    ("POSTSMITH_ENV", None),
    ("POSTSMITH__WORKFLOW__MAX_REVIEW_ITERATIONS", None),
    ("POSTSMITH__LINKEDIN__ACCESS_TOKEN", None),
    ("XDG_CONFIG_HOME", None),
];

fn env_with<'a>(
    overrides: &[(&'a str, Option<&'a str>)],
) -> Vec<(&'a str, Option<&'a str>)> {
    let mut vars: Vec<(&str, Option<&str>)> = CLEAN
        .iter()
        .filter(|(key, _)| !overrides.iter().any(|(k, _)| k == key))
        .copied()
        .collect();
    vars.extend_from_slice(overrides);
    vars
}

#[test]
fn workspace_without_files_yields_defaults() {
    let workspace = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    let xdg_path = xdg.path().to_string_lossy().to_string();

    let config = with_env(
        &env_with(&[("XDG_CONFIG_HOME", Some(xdg_path.as_str()))]),
        || ConfigLoader::load(workspace.path()).unwrap(),
    );

    assert_eq!(config.content.provider_type, ProviderType::OpenAI);
    assert_eq!(config.content.model, "gpt-4o");
    assert_eq!(config.workflow.max_review_iterations, 1);
    assert_eq!(config.workflow.call_timeout_secs, 120);
    assert!(config.linkedin.access_token.is_none());
}

#[test]
fn workspace_file_overrides_global_file() {
    let workspace = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    let xdg_path = xdg.path().to_string_lossy().to_string();

    write(
        &xdg.path().join("postsmith").join("config.toml"),
        r#"
[content]
provider_type = "anthropic"
model = "claude-sonnet"
api_key = "global-key"

[linkedin]
access_token = "global-token"
person_urn = "urn:li:person:global"
"#,
    );
    write(
        &workspace.path().join("config").join("config.toml"),
        r#"
[content]
model = "claude-haiku"

[workflow]
max_review_iterations = 2
"#,
    );

    let (config, global_path) = with_env(
        &env_with(&[("XDG_CONFIG_HOME", Some(xdg_path.as_str()))]),
        || {
            (
                ConfigLoader::load(workspace.path()).unwrap(),
                ConfigLoader::global_config_path(),
            )
        },
    );

    assert_eq!(
        global_path,
        Some(xdg.path().join("postsmith").join("config.toml"))
    );
    assert_eq!(config.content.provider_type, ProviderType::Anthropic);
    assert_eq!(config.content.model, "claude-haiku");
    assert_eq!(config.content.api_key.as_deref(), Some("global-key"));
    assert_eq!(config.linkedin.access_token.as_deref(), Some("global-token"));
    assert_eq!(config.workflow.max_review_iterations, 2);
}

#[test]
fn environment_file_and_variables_take_precedence() {
    let workspace = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    let xdg_path = xdg.path().to_string_lossy().to_string();

    write(
        &workspace.path().join("config").join("config.toml"),
        r#"
[workflow]
max_review_iterations = 2
platform = "linkedin"

[linkedin]
access_token = "file-token"
"#,
    );
    write(
        &workspace.path().join("config").join("production.toml"),
        r#"
[workflow]
max_review_iterations = 3
call_timeout_secs = 30
"#,
    );

    let production = with_env(
        &env_with(&[
            ("XDG_CONFIG_HOME", Some(xdg_path.as_str())),
            ("POSTSMITH_ENV", Some("production")),
        ]),
        || ConfigLoader::load(workspace.path()).unwrap(),
    );
    assert_eq!(production.workflow.max_review_iterations, 3);
    assert_eq!(production.workflow.call_timeout_secs, 30);
    assert_eq!(production.linkedin.access_token.as_deref(), Some("file-token"));

    let overridden = with_env(
        &env_with(&[
            ("XDG_CONFIG_HOME", Some(xdg_path.as_str())),
            ("POSTSMITH_ENV", Some("production")),
            ("POSTSMITH__WORKFLOW__MAX_REVIEW_ITERATIONS", Some("5")),
            ("POSTSMITH__LINKEDIN__ACCESS_TOKEN", Some("env-token")),
        ]),
        || ConfigLoader::load(workspace.path()).unwrap(),
    );
    assert_eq!(overridden.workflow.max_review_iterations, 5);
    assert_eq!(overridden.linkedin.access_token.as_deref(), Some("env-token"));
}

#[test]
fn explicit_file_skips_workspace_layers() {
    let workspace = TempDir::new().unwrap();
    write(
        &workspace.path().join("config").join("config.toml"),
        "[workflow]\nmax_review_iterations = 4\n",
    );
    let explicit = workspace.path().join("custom.toml");
    write(&explicit, "[content]\nprovider_type = \"ollama\"\nmodel = \"llama3\"\n");

    let config = with_env(&env_with(&[]), || {
        ConfigLoader::load_from_file(&explicit).unwrap()
    });

    assert_eq!(config.content.provider_type, ProviderType::Ollama);
    assert_eq!(config.workflow.max_review_iterations, 1);
}

#[test]
fn invalid_values_fail_validation() {
    let workspace = TempDir::new().unwrap();
    let explicit = workspace.path().join("bad.toml");
    write(
        &explicit,
        r#"
[workflow]
max_review_iterations = 0

[logging]
format = "xml"
"#,
    );

    let config = with_env(&env_with(&[]), || {
        ConfigLoader::load_from_file(&explicit).unwrap()
    });
    let errors = config.validate().unwrap_err();
    let report = postsmith::config::PostsmithConfig::validation_report(&errors);
    assert!(report.contains("workflow: max_review_iterations must be at least 1"));
    assert!(report.contains("logging: Invalid log format: xml"));
}
