#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

use std::sync::Arc;

use patchport_opencode_adapter::OpenCodeAdapter;
use patchport_server::{ServerConfig, run_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("Invalid PORT");

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    let mut config = ServerConfig::new(host, port);

    if let Ok(root) = std::env::var("PATCHPORT_WORKSPACE_ROOT") {
        config = config.with_workspace_root(root.into());
    }

    if let Ok(command) = std::env::var("PATCHPORT_TEST_COMMAND") {
        config = config.with_test_command(
            command.split_whitespace().map(String::from).collect(),
        );
    }

    if let Ok(extensions) = std::env::var("PATCHPORT_EXTENSIONS") {
        config = config.with_extensions(
            extensions
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect(),
        );
    }

    let adapter = Arc::new(OpenCodeAdapter::new());

    run_server(config, adapter).await
}
