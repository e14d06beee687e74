#![allow(dead_code)]

use bfhl_service::config::{BfhlConfig, GenaiConfig, ProviderKind};
use bfhl_service::services::providers::mock::MockTextProvider;
use bfhl_service::services::providers::TextProvider;
use bfhl_service::startup::{build_router, AppState, Application};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const TEST_EMAIL: &str = "tester@example.com";

pub fn test_config() -> BfhlConfig {
    BfhlConfig {
        // Use random port for testing (port 0)
        common: CoreConfig {
            port: 0,
            log_level: "info".to_string(),
            otlp_endpoint: None,
        },
        official_email: TEST_EMAIL.to_string(),
        genai: GenaiConfig {
            provider: ProviderKind::Mock,
            api_key: None,
            text_model: "mock".to_string(),
            timeout_secs: 5,
        },
    }
}

/// Router backed by `provider`, for `oneshot` tests.
pub fn router_with(provider: impl TextProvider + 'static) -> axum::Router {
    build_router(AppState::new(test_config(), Arc::new(provider)))
}

pub fn router() -> axum::Router {
    router_with(MockTextProvider::new(true))
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let app = Application::build(test_config())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        Self { address, port }
    }
}
