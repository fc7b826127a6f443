use std::process::Command;

const ENV_VARS: &[&str] = &[
    "NEWS_API_KEY",
    "NEWS_PROVIDER",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_MODEL",
    "FACILITATOR_URL",
    "ADDRESS_BASE",
    "ADDRESS_BASE_SEPOLIA",
];

fn newsgate(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_newsgate"));
    cmd.current_dir(dir).env("RUST_LOG", "off");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = newsgate(dir.path()).arg("init").output().unwrap();

    assert!(
        output.status.success(),
        "newsgate init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join("newsgate.toml");
    assert!(config_path.exists(), "newsgate.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[provider]"));
    assert!(content.contains("[payment]"));

    let _config: newsgate_core::NewsgateConfig = toml::from_str(&content).unwrap();
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("newsgate.toml"), "# existing").unwrap();

    let output = newsgate(dir.path()).arg("init").output().unwrap();

    assert!(!output.status.success());
}

#[test]
fn doctor_reports_missing_credentials_as_json() {
    let dir = tempfile::tempdir().unwrap();

    let output = newsgate(dir.path())
        .args(["doctor", "--format", "json"])
        .env("OPENAI_API_KEY", "sk-test")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let status = |name: &str| {
        report["checks"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == name)
            .map(|c| c["status"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(status("news_api_key"), "fail");
    assert_eq!(status("llm_api_key"), "pass");
    assert_eq!(status("recipients"), "fail");
}

#[test]
fn headlines_prints_normalized_json_and_summary() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1/news/headlines")
        .match_query(mockito::Matcher::UrlEncoded(
            "api_token".into(),
            "news-key".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data": {
                "general": [{"uuid": "a1", "title": "First", "source": "one.com"}],
                "business": [{"uuid": "a2", "title": "Second", "source": "two.com"}]
            }}"#,
        )
        .create();

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("custom.toml");
    std::fs::write(
        &config_path,
        format!("[provider]\nbase_url = \"{}\"\n", server.url()),
    )
    .unwrap();

    let output = newsgate(dir.path())
        .args(["headlines", "--format", "json", "--config"])
        .arg(&config_path)
        .env("NEWS_API_KEY", "news-key")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "headlines failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let articles: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = articles
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["identifier"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a1", "a2"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("found 2 | returned 2 | limit 2 | page 1"));
    mock.assert();
}

#[test]
fn headlines_upstream_failure_exits_nonzero() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/v1/news/headlines")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .create();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("newsgate.toml"),
        format!("[provider]\nbase_url = \"{}\"\napi_key = \"k\"\n", server.url()),
    )
    .unwrap();

    let output = newsgate(dir.path()).arg("headlines").output().unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to fetch top headlines"));
}
