//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p depot-api --test artifacts_generate_test`.
//! The generation engine is replaced by [`MockImageGenerator`], so no network
//! services are needed.

#![allow(dead_code)]

pub mod mock_generator;
pub mod multipart;

use axum::Router;
use axum_test::TestServer;
use depot_api::constants;
use depot_api::setup::routes;
use depot_api::state::AppState;
use depot_core::{BaseConfig, Config, GenerationConfig};
use std::sync::Arc;

pub use mock_generator::{MockBehaviour, MockImageGenerator};

/// Artifact size limit used by the test config.
pub const TEST_MAX_ARTIFACT_BYTES: u64 = 1024 * 1024;

/// API path prefix for tests (e.g. `/api/v1`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub fn generate_path() -> String {
    api_path(constants::GENERATE_ARTIFACT_PATH)
}

/// Test application: server plus the engine double behind it.
pub struct TestApp {
    pub server: TestServer,
    pub generator: Arc<MockImageGenerator>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn generator(&self) -> &MockImageGenerator {
        &self.generator
    }
}

pub fn create_test_config() -> Config {
    Config(Box::new(GenerationConfig {
        base: BaseConfig {
            server_port: 0,
            environment: "test".to_string(),
            http_concurrency_limit: 64,
        },
        max_artifact_size_bytes: TEST_MAX_ARTIFACT_BYTES,
        max_field_bytes: 4 * 1024,
        generator_url: "http://generator.test/generate".to_string(),
        generator_timeout_secs: 5,
    }))
}

/// Bare router for requests that need exact control over headers such as
/// Content-Length, which [`TestServer`] does not send.
pub fn setup_test_router(behaviour: MockBehaviour) -> (Router, Arc<MockImageGenerator>) {
    let config = create_test_config();
    let generator = Arc::new(MockImageGenerator::new(behaviour));
    let state = Arc::new(AppState::new(config.clone(), generator.clone()));
    (routes::setup_routes(&config, state), generator)
}

/// Setup test app whose engine answers with `behaviour`.
pub fn setup_test_app(behaviour: MockBehaviour) -> TestApp {
    let (router, generator) = setup_test_router(behaviour);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp { server, generator }
}
