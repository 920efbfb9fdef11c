#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `OpenCode`-backed patch adapter for `PatchPort`.
//!
//! This crate provides an implementation of the `PatchAdapter` trait that
//! shells out to the `OpenCode` CLI to adapt a patch for an older target
//! version.

mod executor;

use async_trait::async_trait;
use patchport_adapter::{PatchAdapter, PatchAdapterError};
use patchport_adapter_models::{AdaptedPatch, PatchContext};

pub use executor::OpenCodeExecutor;

/// `OpenCode` patch adapter implementation.
pub struct OpenCodeAdapter {
    /// Path to the opencode binary.
    binary_path: String,
    /// Agent to run.
    agent: String,
    /// Model override, if any.
    model: Option<String>,
}

impl OpenCodeAdapter {
    /// Create a new `OpenCode` adapter.
    ///
    /// Uses `OPENCODE_BINARY` environment variable if set,
    /// otherwise defaults to "opencode".
    #[must_use]
    pub fn new() -> Self {
        let binary_path =
            std::env::var("OPENCODE_BINARY").unwrap_or_else(|_| "opencode".to_string());

        Self {
            binary_path,
            agent: "build".to_string(),
            model: None,
        }
    }

    /// Create with a specific binary path.
    #[must_use]
    pub fn with_binary_path(binary_path: String) -> Self {
        Self {
            binary_path,
            agent: "build".to_string(),
            model: None,
        }
    }

    /// Set the agent to run.
    #[must_use]
    pub fn with_agent(mut self, agent: String) -> Self {
        self.agent = agent;
        self
    }

    /// Set a model override.
    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

impl Default for OpenCodeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatchAdapter for OpenCodeAdapter {
    fn adapter_name(&self) -> &'static str {
        "opencode"
    }

    async fn adapt(&self, context: &PatchContext) -> Result<AdaptedPatch, PatchAdapterError> {
        let executor = OpenCodeExecutor::new(&self.binary_path);
        let response = executor
            .execute(context, &self.agent, self.model.as_deref())
            .await?;

        Ok(executor::parse_response(&response))
    }
}
