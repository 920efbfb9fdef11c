#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Backport HTTP service for `PatchPort`.
//!
//! Exposes the backport pipeline as a single request-style operation:
//! `POST /backport` with `{repository_url, commit_reference, target_version}`
//! returns a structured `BackportReport`.

pub mod backport;
pub mod session;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use patchport_adapter::PatchAdapter;
use state::AppState;
use tokio::task::JoinHandle;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Root directory holding per-repository working copies.
    pub workspace_root: PathBuf,
    /// Test command run as the validation gate (program followed by args).
    pub test_command: Vec<String>,
    /// File extensions eligible for backporting.
    pub extensions: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let workspace_root = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("patchport")
            .join("worktrees");

        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workspace_root,
            test_command: vec!["pytest".to_string(), ".".to_string()],
            extensions: vec!["py".to_string()],
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_workspace_root(mut self, root: PathBuf) -> Self {
        self.workspace_root = root;
        self
    }

    #[must_use]
    pub fn with_test_command(mut self, command: Vec<String>) -> Self {
        self.test_command = command;
        self
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }
}

/// # Errors
///
/// Returns an error if the server fails to bind or run
#[allow(clippy::future_not_send)]
pub async fn run_server(
    config: ServerConfig,
    adapter: Arc<dyn PatchAdapter>,
) -> std::io::Result<()> {
    let RunServerResponse { join_handle, .. } = run_server_with_handle(&config, adapter)?;

    join_handle.await?
}

pub struct RunServerResponse {
    pub handle: actix_web::dev::ServerHandle,
    pub addrs: Vec<std::net::SocketAddr>,
    pub join_handle: JoinHandle<Result<(), std::io::Error>>,
}

/// # Errors
///
/// Returns an error if the server fails to bind
pub fn run_server_with_handle(
    config: &ServerConfig,
    adapter: Arc<dyn PatchAdapter>,
) -> std::io::Result<RunServerResponse> {
    log::info!(
        "Starting backport server on {}:{} (workspace root: {})",
        config.host,
        config.port,
        config.workspace_root.display()
    );

    let state = web::Data::new(AppState::new(config.clone(), adapter));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .route("/backport", web::post().to(backport::handler))
            .route("/health", web::get().to(|| async { "OK" }))
    })
    .bind((config.host.as_str(), config.port))?;

    let addrs = server.addrs();
    let server = server.run();
    let handle = server.handle();

    let join_handle = tokio::spawn(server);

    Ok(RunServerResponse {
        handle,
        addrs,
        join_handle,
    })
}
