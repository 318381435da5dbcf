use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

use agentdesk::api::{HttpTransport, Transport};
use agentdesk::config::ApiConfig;

/// API root of a mock server, the way the platform mounts it
#[allow(dead_code)]
pub fn api_root(server: &MockServer) -> String {
    format!("{}/api/v1", server.uri())
}

/// A transport talking to the mock server with a short timeout
#[allow(dead_code)]
pub fn transport_for(server: &MockServer) -> Arc<dyn Transport> {
    let config = ApiConfig {
        base_url: api_root(server),
        timeout_seconds: 5,
        ..ApiConfig::default()
    };
    Arc::new(HttpTransport::new(&config).expect("valid transport config"))
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("agentdesk.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write test file");
    path
}
