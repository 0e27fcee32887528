#![allow(dead_code)]

use genai_gateway::config::{
    GatewayConfig, GoogleConfig, LimitsConfig, ModelConfig, ProviderKind, DEFAULT_API_BASE,
};
use genai_gateway::services::providers::mock::MockTextProvider;
use genai_gateway::services::providers::TextProvider;
use genai_gateway::startup::{build_router, AppState, Application};
use service_core::config::Config;
use std::sync::Arc;

pub const TEST_MODEL: &str = "gemini-2.5-flash";

/// Config that never touches the environment; port 0 binds a random port.
pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        common: Config { port: 0 },
        provider: ProviderKind::Mock,
        google: GoogleConfig {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        },
        models: ModelConfig {
            model: TEST_MODEL.to_string(),
        },
        limits: LimitsConfig {
            max_upload_bytes: 1024 * 1024,
            request_timeout_secs: 5,
        },
    }
}

pub fn router_with(provider: Arc<MockTextProvider>) -> axum::Router {
    let provider: Arc<dyn TextProvider> = provider;
    build_router(AppState {
        config: test_config(),
        provider,
    })
}

pub struct TestApp {
    pub address: String,
    pub provider: Arc<MockTextProvider>,
    pub client: reqwest::Client,
}

/// Spawn the application on a random port backed by `provider`.
pub async fn spawn_app(provider: MockTextProvider) -> TestApp {
    let provider = Arc::new(provider);
    let dyn_provider: Arc<dyn TextProvider> = provider.clone();

    let app = Application::build_with_provider(test_config(), dyn_provider)
        .await
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", app.port());

    tokio::spawn(app.run_until_stopped());

    TestApp {
        address,
        provider,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_form(&self, path: &str, form: reqwest::multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub fn file_part(bytes: Vec<u8>, file_name: &str, mime: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("valid mime type")
}
