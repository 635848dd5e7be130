//! Integration tests for configuration management
//!
//! Configs are loaded from TOML text or files in a temp directory, so the
//! user's real ~/.tutor is never touched.

use std::fs;
use tempfile::TempDir;
use tutor_engine::config::Config;

fn with_data_dir(dir: &TempDir, body: &str) -> String {
    format!(
        "[core]\nlog_level = \"debug\"\ndata_dir = \"{}\"\n\n{}",
        dir.path().join("data").display(),
        body
    )
}

#[test]
fn test_full_config_parsing() {
    let dir = TempDir::new().unwrap();
    let toml_content = with_data_dir(
        &dir,
        r#"
[server]
bind = "0.0.0.0:9000"
cors = true

[llm]
provider = "ollama"
timeout_secs = 30
max_retries = 0

[llm.ollama]
base_url = "http://gpu-box:11434"
model = "qwen2.5:7b"

[quiz]
language = "Slovak"
evaluation_prompt = "Grade the answer"

[store]
backend = "sqlite"
path = "/var/lib/tutor/threads.db"
"#,
    );

    let config = Config::from_toml_str(&toml_content).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert!(config.core.data_dir.exists());
    assert_eq!(config.bind_addr().unwrap().port(), 9000);
    assert!(config.server.cors);
    assert_eq!(config.llm.provider, "ollama");
    assert_eq!(config.llm.timeout_secs, 30);
    assert_eq!(config.llm.max_retries, 0);
    assert_eq!(config.llm.ollama.model, "qwen2.5:7b");
    assert_eq!(config.quiz.language, "Slovak");
    assert_eq!(config.quiz.evaluation_prompt.as_deref(), Some("Grade the answer"));
    assert!(config.quiz.system_prompt.is_none());
    assert_eq!(config.store.backend, "sqlite");
}

#[test]
fn test_defaults_fill_missing_sections() {
    let dir = TempDir::new().unwrap();
    let config = Config::from_toml_str(&with_data_dir(&dir, "")).unwrap();

    assert_eq!(config.server.bind, "127.0.0.1:8000");
    assert!(!config.server.cors);
    assert_eq!(config.llm.provider, "gemini");
    assert_eq!(config.llm.timeout_secs, 60);
    assert_eq!(config.llm.max_retries, 2);
    assert_eq!(config.llm.retry_base_delay_ms, 500);
    assert_eq!(config.llm.gemini.model, "gemini-2.5-flash-lite");
    assert_eq!(config.llm.gemini.temperature, 0.0);
    assert_eq!(config.llm.gemini.api_key_env, "GEMINI_API_KEY");
    assert_eq!(config.quiz.language, "Czech");
    assert_eq!(config.store.backend, "memory");
}

#[test]
fn test_invalid_values_rejected() {
    let dir = TempDir::new().unwrap();
    let cases = [
        "[llm]\nprovider = \"openai\"",
        "[store]\nbackend = \"redis\"",
        "[llm.gemini]\ntemperature = 3.5",
        "[llm]\ntimeout_secs = 0",
        "[server]\nbind = \"not-an-address\"",
        "[quiz]\nlanguage = \"  \"",
    ];

    for body in cases {
        let result = Config::from_toml_str(&with_data_dir(&dir, body));
        assert!(result.is_err(), "expected rejection for: {}", body);
    }

    let bad_level = format!(
        "[core]\nlog_level = \"loud\"\ndata_dir = \"{}\"\n",
        dir.path().display()
    );
    assert!(Config::from_toml_str(&bad_level).is_err());
}

#[test]
fn test_load_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, with_data_dir(&dir, "[quiz]\nlanguage = \"German\"\n")).unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.quiz.language, "German");

    assert!(Config::load_from_path(&dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_rendered_config_parses_back() {
    let dir = TempDir::new().unwrap();
    let config = Config::from_toml_str(&with_data_dir(&dir, "[quiz]\nlanguage = \"Polish\"\n")).unwrap();

    let rendered = toml::to_string_pretty(&config).unwrap();
    let reparsed = Config::from_toml_str(&rendered).unwrap();

    assert_eq!(reparsed.quiz.language, "Polish");
    assert_eq!(reparsed.core.data_dir, config.core.data_dir);
    assert_eq!(reparsed.llm.gemini.model, config.llm.gemini.model);
}
