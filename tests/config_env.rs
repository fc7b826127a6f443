use std::collections::HashMap;
use std::io::Write;

use newsgate_core::{NewsgateConfig, NewsgateError, ProviderKind, UPSTREAM_MESSAGE};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn env_overrides_file_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[provider]
kind = "newsapi"
api_key = "from-file"

[llm]
model = "gpt-4o"

[payment]
price = "$0.05"

[payment.networks.base-sepolia]
asset = "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
"#
    )
    .unwrap();

    let config = NewsgateConfig::from_file(file.path())
        .unwrap()
        .apply_env(lookup(&[
            ("NEWS_API_KEY", "from-env"),
            ("OPENAI_API_KEY", "sk-env"),
            ("FACILITATOR_URL", "https://facilitator.example"),
            ("ADDRESS_BASE_SEPOLIA", "0xRecipient"),
        ]))
        .unwrap();

    assert_eq!(config.provider.kind, ProviderKind::NewsApi);
    assert_eq!(config.provider.api_key.as_deref(), Some("from-env"));
    assert_eq!(config.llm.model, "gpt-4o");
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-env"));
    assert_eq!(config.payment.price, "$0.05");
    assert_eq!(
        config.payment.facilitator_url.as_deref(),
        Some("https://facilitator.example")
    );
    // a networks table in the file replaces the default set
    assert_eq!(config.payment.networks.len(), 1);
    assert_eq!(
        config.payment.networks["base-sepolia"].pay_to.as_deref(),
        Some("0xRecipient")
    );
    assert_eq!(config.payment.networks["base-sepolia"].decimals, 6);
}

#[test]
fn unknown_provider_in_env_is_rejected() {
    let err = NewsgateConfig::default()
        .apply_env(lookup(&[("NEWS_PROVIDER", "gnews")]))
        .unwrap_err();
    assert!(matches!(err, NewsgateError::Config(ref m) if m.contains("gnews")));
}

#[test]
fn invalid_toml_is_reported() {
    let err = NewsgateConfig::from_toml("[provider\nkind = 1").unwrap_err();
    assert!(matches!(err, NewsgateError::Toml(_)));
}

#[test]
fn caller_messages_hide_upstream_detail() {
    let upstream = NewsgateError::upstream("connection refused (os error 111)");
    assert_eq!(upstream.caller_message(), UPSTREAM_MESSAGE);
    assert!(upstream.to_string().contains("connection refused"));

    let config = NewsgateError::Config("Missing OPENAI_API_KEY".into());
    assert_eq!(config.caller_message(), "Missing OPENAI_API_KEY");
}

#[test]
fn defaults_serialize_back_to_valid_toml() {
    let rendered = toml::to_string(&NewsgateConfig::default()).unwrap();
    let reparsed = NewsgateConfig::from_toml(&rendered).unwrap();
    assert_eq!(reparsed.llm.model, "gpt-4o-mini");
    assert_eq!(reparsed.payment.networks.len(), 2);
}
