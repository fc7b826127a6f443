use std::sync::Arc;

use async_trait::async_trait;
use mockito::Matcher;
use newsgate_core::{
    ArticleList, LlmConfig, NetworkConfig, NewsgateError, PaymentConfig,
};
use newsgate_filter::RelevanceFilter;
use newsgate_headlines::HeadlineProvider;
use newsgate_mcp::payment::{FacilitatorGate, OpenGate, PaymentGate};
use newsgate_mcp::tools::NewsgateServer;
use rmcp::{model::*, ServerHandler};
use serde_json::{json, Value};

/// Provider returning a fixed list, or failing like an unreachable upstream.
struct StaticProvider(Option<ArticleList>);

#[async_trait]
impl HeadlineProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_top_headlines(&self) -> Result<ArticleList, NewsgateError> {
        self.0
            .clone()
            .ok_or_else(|| NewsgateError::upstream("HTTP 502 Bad Gateway"))
    }
}

fn headlines() -> ArticleList {
    serde_json::from_value(json!([
        {"identifier": "a", "title": "Central bank cuts rates", "source": "ft.com"},
        {"identifier": "b", "title": "Pop star tours Europe", "source": "people.com"},
        {"identifier": "c", "title": "Startup raises $40M", "source": "techcrunch.com", "imageUrl": null}
    ]))
    .unwrap()
}

fn server_with(
    provider: Option<ArticleList>,
    llm: LlmConfig,
    gate: Arc<dyn PaymentGate>,
) -> NewsgateServer {
    NewsgateServer::new(
        Arc::new(StaticProvider(provider)),
        Arc::new(RelevanceFilter::new(&llm).unwrap()),
        gate,
    )
}

fn llm_at(server: &mockito::ServerGuard) -> LlmConfig {
    LlmConfig {
        api_key: Some("sk-test".into()),
        base_url: Some(server.url()),
        ..LlmConfig::default()
    }
}

fn completion(content: &str) -> String {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
}

fn extract_json(result: &CallToolResult) -> Value {
    assert_eq!(result.content.len(), 1);
    match &result.content[0].raw {
        RawContent::Text(t) => serde_json::from_str(&t.text).unwrap(),
        _ => panic!("expected text content"),
    }
}

fn paid_config(facilitator: &mockito::ServerGuard) -> PaymentConfig {
    let mut config = PaymentConfig {
        facilitator_url: Some(facilitator.url()),
        networks: Default::default(),
        ..PaymentConfig::default()
    };
    config.networks.insert(
        "base-sepolia".into(),
        NetworkConfig {
            pay_to: Some("0xRecipient".into()),
            asset: Some("0x036CbD53842c5426634e7929541eC2318f3dCF7e".into()),
            decimals: 6,
        },
    );
    config
}

fn payment_payload() -> Value {
    json!({
        "x402Version": 1,
        "scheme": "exact",
        "network": "base-sepolia",
        "payload": {"signature": "0xsig", "authorization": {"from": "0xPayer"}}
    })
}

#[test]
fn server_info_is_correct() {
    let server = server_with(None, LlmConfig::default(), Arc::new(OpenGate));
    let info = server.get_info();

    assert_eq!(info.server_info.name, "newsgate");
    assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    let instructions = info.instructions.unwrap();
    assert!(instructions.contains("news"));
    assert!(instructions.contains("business_news"));
}

#[tokio::test]
async fn news_returns_unfiltered_list() {
    let server = server_with(Some(headlines()), LlmConfig::default(), Arc::new(OpenGate));
    let result = server.run_news().await.unwrap();

    assert_ne!(result.is_error, Some(true));
    let parsed = extract_json(&result);
    let titles: Vec<_> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec!["Central bank cuts rates", "Pop star tours Europe", "Startup raises $40M"]
    );
    assert!(parsed[2]["imageUrl"].is_null());
    assert!(parsed[0].get("imageUrl").is_none());
}

#[tokio::test]
async fn news_upstream_failure_yields_error_envelope() {
    let server = server_with(None, LlmConfig::default(), Arc::new(OpenGate));
    let result = server.run_news().await.unwrap();

    assert_eq!(result.is_error, Some(true));
    assert_eq!(
        extract_json(&result),
        json!({"error": "Failed to fetch top headlines"})
    );
}

#[tokio::test]
async fn business_news_without_model_key_makes_no_model_call() {
    let mut llm = mockito::Server::new_async().await;
    let mock = llm.mock("POST", Matcher::Any).expect(0).create_async().await;

    let config = LlmConfig {
        api_key: None,
        base_url: Some(llm.url()),
        ..LlmConfig::default()
    };
    let server = server_with(Some(headlines()), config, Arc::new(OpenGate));
    let result = server.run_business_news(None).await.unwrap();

    assert_eq!(result.is_error, Some(true));
    assert_eq!(
        extract_json(&result),
        json!({"error": "Missing OPENAI_API_KEY"})
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn business_news_malformed_model_output_is_empty_success() {
    let mut llm = mockito::Server::new_async().await;
    let mock = llm
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion("Here you go: the rate cut and the startup."))
        .create_async()
        .await;

    let server = server_with(Some(headlines()), llm_at(&llm), Arc::new(OpenGate));
    let result = server.run_business_news(None).await.unwrap();

    assert_ne!(result.is_error, Some(true));
    assert_eq!(extract_json(&result), json!({"articles": []}));
    mock.assert_async().await;
}

#[tokio::test]
async fn business_news_passes_selected_articles_through() {
    let mut llm = mockito::Server::new_async().await;
    let selected = json!([
        {"identifier": "a", "title": "Central bank cuts rates", "source": "ft.com"},
        {"identifier": "c", "title": "Startup raises $40M", "source": "techcrunch.com", "imageUrl": null}
    ]);
    let mock = llm
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(&selected.to_string()))
        .create_async()
        .await;

    let server = server_with(Some(headlines()), llm_at(&llm), Arc::new(OpenGate));
    let result = server.run_business_news(None).await.unwrap();

    assert_eq!(extract_json(&result), json!({"articles": selected}));
    mock.assert_async().await;
}

#[tokio::test]
async fn business_news_upstream_failure_yields_error_envelope() {
    let mut llm = mockito::Server::new_async().await;
    let mock = llm.mock("POST", Matcher::Any).expect(0).create_async().await;

    let server = server_with(None, llm_at(&llm), Arc::new(OpenGate));
    let result = server.run_business_news(None).await.unwrap();

    assert_eq!(
        extract_json(&result),
        json!({"error": "Failed to fetch top headlines"})
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn business_news_requires_payment() {
    let mut facilitator = mockito::Server::new_async().await;
    let verify = facilitator
        .mock("POST", "/verify")
        .expect(0)
        .create_async()
        .await;

    let gate = FacilitatorGate::new(&paid_config(&facilitator)).unwrap();
    let server = server_with(Some(headlines()), LlmConfig::default(), Arc::new(gate));
    let result = server.run_business_news(None).await.unwrap();

    assert_eq!(result.is_error, Some(true));
    let parsed = extract_json(&result);
    assert_eq!(parsed["error"], "Payment required");
    assert_eq!(parsed["accepts"][0]["network"], "base-sepolia");
    assert_eq!(parsed["accepts"][0]["maxAmountRequired"], "10000");
    assert_eq!(parsed["accepts"][0]["payTo"], "0xRecipient");
    verify.assert_async().await;
}

#[tokio::test]
async fn business_news_verifies_then_settles_payment() {
    let mut facilitator = mockito::Server::new_async().await;
    let verify = facilitator
        .mock("POST", "/verify")
        .match_body(Matcher::PartialJson(json!({
            "x402Version": 1,
            "paymentPayload": {"network": "base-sepolia"},
            "paymentRequirements": {"payTo": "0xRecipient", "maxAmountRequired": "10000"}
        })))
        .with_status(200)
        .with_body(r#"{"isValid": true, "payer": "0xPayer"}"#)
        .expect(1)
        .create_async()
        .await;
    let settle = facilitator
        .mock("POST", "/settle")
        .with_status(200)
        .with_body(r#"{"success": true, "transaction": "0xtx", "network": "base-sepolia", "payer": "0xPayer"}"#)
        .expect(1)
        .create_async()
        .await;

    let mut llm = mockito::Server::new_async().await;
    let model = llm
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(r#"{"articles": [{"identifier": "a"}]}"#))
        .create_async()
        .await;

    let gate = FacilitatorGate::new(&paid_config(&facilitator)).unwrap();
    let server = server_with(Some(headlines()), llm_at(&llm), Arc::new(gate));
    let payload = payment_payload();
    let result = server.run_business_news(Some(&payload)).await.unwrap();

    assert_eq!(extract_json(&result), json!({"articles": [{"identifier": "a"}]}));
    verify.assert_async().await;
    model.assert_async().await;
    settle.assert_async().await;
}

#[tokio::test]
async fn rejected_payment_stops_before_fetching() {
    let mut facilitator = mockito::Server::new_async().await;
    let verify = facilitator
        .mock("POST", "/verify")
        .with_status(200)
        .with_body(r#"{"isValid": false, "invalidReason": "insufficient_funds"}"#)
        .create_async()
        .await;

    let mut llm = mockito::Server::new_async().await;
    let model = llm.mock("POST", Matcher::Any).expect(0).create_async().await;

    let gate = FacilitatorGate::new(&paid_config(&facilitator)).unwrap();
    let server = server_with(Some(headlines()), llm_at(&llm), Arc::new(gate));
    let payload = payment_payload();
    let result = server.run_business_news(Some(&payload)).await.unwrap();

    assert_eq!(
        extract_json(&result),
        json!({"error": "Payment rejected: insufficient_funds"})
    );
    verify.assert_async().await;
    model.assert_async().await;
}

#[tokio::test]
async fn failed_filter_is_not_settled() {
    let mut facilitator = mockito::Server::new_async().await;
    let _verify = facilitator
        .mock("POST", "/verify")
        .with_status(200)
        .with_body(r#"{"isValid": true}"#)
        .create_async()
        .await;
    let settle = facilitator
        .mock("POST", "/settle")
        .expect(0)
        .create_async()
        .await;

    let gate = FacilitatorGate::new(&paid_config(&facilitator)).unwrap();
    let server = server_with(Some(headlines()), LlmConfig::default(), Arc::new(gate));
    let payload = payment_payload();
    let result = server.run_business_news(Some(&payload)).await.unwrap();

    assert_eq!(
        extract_json(&result),
        json!({"error": "Missing OPENAI_API_KEY"})
    );
    settle.assert_async().await;
}
