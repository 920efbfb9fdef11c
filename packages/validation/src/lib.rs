#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Test-suite validation gate for `PatchPort`.
//!
//! Runs the repository's configured test command and reports the combined
//! output plus exit status. A failing test run is a normal result here, not
//! an error; only "the runner could not be invoked at all" is an error.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

/// Result of a single test-suite run.
#[derive(Debug, Clone)]
pub struct TestRunResult {
    /// Combined stdout and stderr of the test run.
    pub output: String,
    /// Process exit status. `0` is the sole success predicate.
    pub exit_status: i32,
}

impl TestRunResult {
    /// Whether the test run passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.exit_status == 0
    }
}

/// Errors that can occur when invoking the test runner.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The configured test command is empty.
    #[error("Test command is empty")]
    EmptyCommand,

    /// The test runner process could not be spawned.
    #[error("Failed to spawn test runner {program}: {source}")]
    Spawn {
        /// The program that could not be spawned.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Executes the configured test command against a repository root.
#[derive(Debug, Clone)]
pub struct ValidationGate {
    command: Vec<String>,
}

impl ValidationGate {
    /// Create a gate running the given command (program followed by args).
    #[must_use]
    pub const fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// The configured test command.
    #[must_use]
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Run the test suite rooted at `repo_path`, once.
    ///
    /// Captures stdout and stderr as combined text. A non-zero exit status
    /// is returned in the `TestRunResult`, never as an `Err`. The caller
    /// decides how many times to run; there are no retries here.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Spawn` if the runner cannot be invoked,
    /// or `ValidationError::EmptyCommand` if no command is configured.
    pub async fn run(&self, repo_path: &Path) -> Result<TestRunResult, ValidationError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(ValidationError::EmptyCommand)?;

        log::info!(
            "Running test command {:?} in {}",
            self.command,
            repo_path.display()
        );

        let output = Command::new(program)
            .args(args)
            .current_dir(repo_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ValidationError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        // Killed-by-signal has no code; treat it as a failing run.
        let exit_status = output.status.code().unwrap_or(-1);

        log::info!("Test command exited with status {exit_status}");

        Ok(TestRunResult {
            output: text,
            exit_status,
        })
    }
}
