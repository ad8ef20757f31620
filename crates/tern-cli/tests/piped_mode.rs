//! Piped stdin runs a single exchange and prints only the response text.


use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use fixtures::{anthropic_sse, openai_sse, sse_response};
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_echo_prints_prompt_back() {
    let temp_dir = TempDir::new().unwrap();

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", temp_dir.path())
        .env_remove("TERN_CONFIG")
        .arg("echo")
        .write_stdin("hello world\n")
        .assert()
        .success()
        .stdout(predicate::eq("hello world\n"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_empty_pipe_fails() {
    let temp_dir = TempDir::new().unwrap();

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", temp_dir.path())
        .env_remove("TERN_CONFIG")
        .arg("echo")
        .write_stdin("   \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No input provided via pipe"));
}

#[test]
fn test_unknown_model_fails() {
    let temp_dir = TempDir::new().unwrap();

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", temp_dir.path())
        .env_remove("TERN_CONFIG")
        .arg("gpt-2")
        .write_stdin("hello")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown model 'gpt-2'"))
        .stderr(predicate::str::contains("sonnet"));
}

#[test]
fn test_model_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("alt.toml");
    fs::write(&config_path, "model = \"echo\"\nreasoning = false\n").unwrap();

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", temp_dir.path())
        .arg("--config")
        .arg(&config_path)
        .write_stdin("from config")
        .assert()
        .success()
        .stdout(predicate::eq("from config\n"));
}

#[tokio::test]
async fn test_anthropic_streams_response_only() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-api-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "claude-sonnet-4-5",
            "stream": true,
            "system": "answer tersely"
        })))
        .respond_with(sse_response(&anthropic_sse("Hello from Claude!")))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", temp_dir.path())
        .env_remove("TERN_CONFIG")
        .env("ANTHROPIC_API_KEY", "test-api-key")
        .env("ANTHROPIC_BASE_URL", mock_server.uri())
        .args(["sonnet", "-P", "answer tersely"])
        .write_stdin("hi")
        .assert()
        .success()
        .stdout(predicate::eq("Hello from Claude!\n"));
}

#[tokio::test]
async fn test_openai_key_flag_overrides_env() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer flag-key"))
        .respond_with(sse_response(&openai_sse("Hello from GPT!")))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", temp_dir.path())
        .env_remove("TERN_CONFIG")
        .env("OPENAI_API_KEY", "env-key")
        .env("OPENAI_BASE_URL", mock_server.uri())
        .args(["gpt-4o-mini", "--openai-api-key", "flag-key"])
        .write_stdin("hi")
        .assert()
        .success()
        .stdout(predicate::eq("Hello from GPT!\n"));
}

#[tokio::test]
async fn test_http_error_exits_non_zero() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#,
        ))
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", temp_dir.path())
        .env_remove("TERN_CONFIG")
        .env("ANTHROPIC_API_KEY", "test-api-key")
        .env("ANTHROPIC_BASE_URL", mock_server.uri())
        .arg("sonnet")
        .write_stdin("hi")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("HTTP 429"))
        .stderr(predicate::str::contains("slow down"));
}

#[test]
fn test_missing_api_key_fails() {
    let temp_dir = TempDir::new().unwrap();

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", temp_dir.path())
        .env_remove("TERN_CONFIG")
        .env_remove("OPENAI_API_KEY")
        .arg("gpt-5")
        .write_stdin("hi")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}
