//! `OpenCode` CLI executor.

use std::fmt::Write;
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{Duration, timeout};

use patchport_adapter::PatchAdapterError;
use patchport_adapter_models::{AdaptedPatch, PatchContext};

/// Marker separating the adapted content from the explanation in the
/// adapter's response.
const EXPLANATION_MARKER: &str = "### Changes Made:";

/// Matches a whole response wrapped in a fenced code block.
static CODE_FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A```[^\n]*\n(.*?)\n?```\s*\z").unwrap());

/// Executor for the `OpenCode` CLI.
pub struct OpenCodeExecutor<'a> {
    /// Path to the opencode binary.
    binary_path: &'a str,
}

impl<'a> OpenCodeExecutor<'a> {
    /// Create a new executor.
    #[must_use]
    pub const fn new(binary_path: &'a str) -> Self {
        Self { binary_path }
    }

    /// Build the prompt from context.
    #[must_use]
    pub fn build_prompt(context: &PatchContext) -> String {
        let mut prompt = String::new();

        write!(
            prompt,
            "The following patch was written against a newer version of a codebase. \
             Rewrite the file so the change works on version {target}.\n\n\
             FILE: {path}\n",
            target = context.target_version,
            path = context.file_path,
        )
        .unwrap();

        if let Some(original) = &context.original_content {
            write!(
                prompt,
                "\nCURRENT FILE CONTENT ON {target}:\n```\n{original}\n```\n",
                target = context.target_version,
            )
            .unwrap();
        }

        write!(
            prompt,
            "\nPATCH:\n```diff\n{}\n```\n",
            context.diff_text.trim_end_matches('\n'),
        )
        .unwrap();

        write!(
            prompt,
            "\nGUIDELINES:\n\
             1. Syntax must be compatible with version {target}\n\
             2. Dependencies that do not exist in {target} must be replaced with alternatives\n\
             3. The logic must remain unchanged\n\
             4. Respond with the complete adapted file content, followed by a line \
             `{EXPLANATION_MARKER}` and an explanation of the modifications\n",
            target = context.target_version,
        )
        .unwrap();

        prompt
    }

    /// Execute the `OpenCode` CLI and return the raw response text.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, exits non-zero,
    /// times out, or emits an error event.
    pub async fn execute(
        &self,
        context: &PatchContext,
        agent: &str,
        model: Option<&str>,
    ) -> Result<String, PatchAdapterError> {
        let prompt = Self::build_prompt(context);

        // Get timeout from environment (default: no timeout)
        let timeout_secs: Option<u64> = std::env::var("OPENCODE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok());

        log::info!(
            "Executing OpenCode for {}: {} run --agent {agent} --format json (timeout: {})",
            context.file_path,
            self.binary_path,
            timeout_secs.map_or_else(|| "none".to_string(), |s| format!("{s}s"))
        );

        let mut cmd = Command::new(self.binary_path);
        cmd.arg("run")
            .arg(&prompt)
            .arg("--agent")
            .arg(agent)
            .arg("--format")
            .arg("json")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(model) = model {
            cmd.arg("--model").arg(model);
        }

        let mut child = cmd.spawn().map_err(|e| {
            log::error!("Failed to spawn OpenCode process: {e}");
            PatchAdapterError::SpawnFailed(e.to_string())
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            PatchAdapterError::ExecutionFailed("Failed to capture stdout".to_string())
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            PatchAdapterError::ExecutionFailed("Failed to capture stderr".to_string())
        })?;

        // Collect stderr in the background
        let stderr_handle = tokio::spawn(async move {
            let mut stderr_reader = BufReader::new(stderr);
            let mut stderr_output = String::new();
            if let Err(e) = stderr_reader.read_to_string(&mut stderr_output).await {
                log::warn!("Failed to read stderr: {e}");
            }
            stderr_output
        });

        let mut response_text = String::new();

        let stdout_reader = BufReader::new(stdout);
        let mut lines = stdout_reader.lines();

        let process_lines = async {
            while let Ok(Some(line)) = lines.next_line().await {
                if line.is_empty() {
                    continue;
                }

                log::trace!("OpenCode output: {line}");

                let event: Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        log::warn!("Failed to parse JSON line: {e} - line: {line}");
                        continue;
                    }
                };

                match event["type"].as_str() {
                    Some("text") => {
                        if let Some(part) = event.get("part") {
                            // Only capture final text (has time.end)
                            if part["time"]["end"].is_number() {
                                response_text = part["text"].as_str().unwrap_or("").to_string();
                                log::debug!(
                                    "OpenCode text response: {} chars",
                                    response_text.len()
                                );
                            }
                        }
                    }
                    Some("error") => {
                        let error_msg = event["error"]["data"]["message"]
                            .as_str()
                            .or_else(|| event["error"]["message"].as_str())
                            .or_else(|| event["error"]["name"].as_str())
                            .unwrap_or("Unknown error");
                        log::error!("OpenCode error event: {error_msg}");
                        return Err(PatchAdapterError::ExecutionFailed(error_msg.to_string()));
                    }
                    Some(other) => {
                        log::trace!("Unhandled OpenCode event type: {other}");
                    }
                    None => {
                        log::trace!("OpenCode event without type: {event:?}");
                    }
                }
            }
            Ok(())
        };

        let inner_result = if let Some(secs) = timeout_secs {
            match timeout(Duration::from_secs(secs), process_lines).await {
                Ok(inner) => inner,
                Err(_elapsed) => {
                    log::error!("OpenCode execution timed out after {secs}s");
                    if let Err(e) = child.kill().await {
                        log::warn!("Failed to kill timed-out process: {e}");
                    }
                    return Err(PatchAdapterError::Timeout(secs));
                }
            }
        } else {
            process_lines.await
        };

        let status = child.wait().await.map_err(|e| {
            PatchAdapterError::ExecutionFailed(format!("Failed to wait for process: {e}"))
        })?;

        let stderr_output = stderr_handle.await.unwrap_or_default();

        inner_result?;

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            log::error!("OpenCode exited with code {exit_code}: {stderr_output}");
            return Err(PatchAdapterError::ProcessFailed {
                exit_code,
                stderr: stderr_output,
            });
        }

        if response_text.is_empty() {
            return Err(PatchAdapterError::ParseError(
                "OpenCode produced no text response".to_string(),
            ));
        }

        Ok(response_text)
    }
}

/// Split a raw response into adapted content and explanation.
///
/// The adapted content is everything before the `### Changes Made:` marker
/// (with any surrounding code fence stripped); the explanation is everything
/// after it, or a placeholder when the marker is missing.
#[must_use]
pub fn parse_response(response: &str) -> AdaptedPatch {
    let (content_part, explanation) = response.split_once(EXPLANATION_MARKER).map_or_else(
        || (response, "No explanation provided.".to_string()),
        |(content, explanation)| (content, explanation.trim().to_string()),
    );

    let content_part = content_part.trim();
    let content = CODE_FENCE_REGEX.captures(content_part).map_or_else(
        || content_part.to_string(),
        |captures| captures[1].to_string(),
    );

    AdaptedPatch {
        content,
        explanation,
    }
}
