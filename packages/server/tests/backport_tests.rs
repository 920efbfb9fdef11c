use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use git2::Repository;
use patchport_adapter::{PatchAdapter, PatchAdapterError};
use patchport_adapter_models::{AdaptedPatch, PatchContext};
use patchport_server::{RunServerResponse, ServerConfig, run_server_with_handle};
use serde_json::{Value, json};

/// Adapter that "backports" by appending a marker comment.
struct RewriteAdapter;

#[async_trait]
impl PatchAdapter for RewriteAdapter {
    fn adapter_name(&self) -> &'static str {
        "rewrite"
    }

    async fn adapt(&self, context: &PatchContext) -> Result<AdaptedPatch, PatchAdapterError> {
        Ok(AdaptedPatch {
            content: "x = 2  # backported\n".to_string(),
            explanation: format!(
                "Rewrote {} for {}",
                context.file_path, context.target_version
            ),
        })
    }
}

fn create_test_repo() -> (tempfile::TempDir, Repository) {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    (dir, repo)
}

fn create_commit(repo: &Repository, message: &str, files: &[(&str, &str)]) -> git2::Oid {
    let mut index = repo.index().unwrap();

    for (path, content) in files {
        fs::write(repo.workdir().unwrap().join(path), content).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }

    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = repo.signature().unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Repo with a tagged old version and a newer fix commit to backport.
fn backport_fixture() -> (tempfile::TempDir, String) {
    let (dir, repo) = create_test_repo();

    let first = create_commit(&repo, "Old version", &[("app.py", "x = 1\n")]);
    let target = repo.find_object(first, None).unwrap();
    repo.tag_lightweight("v1.0", &target, false).unwrap();

    let fix = create_commit(&repo, "The fix", &[("app.py", "x = 2\n")]).to_string();

    (dir, fix)
}

fn start_server(test_command: Vec<String>) -> anyhow::Result<(RunServerResponse, String)> {
    let config = ServerConfig::new("127.0.0.1".to_string(), 0).with_test_command(test_command);

    let response = run_server_with_handle(&config, Arc::new(RewriteAdapter))?;
    let url = format!("http://{}", response.addrs[0]);

    Ok((response, url))
}

fn request_body(repo_path: &Path, commit: &str) -> Value {
    json!({
        "repository_url": repo_path.to_str().unwrap(),
        "commit_reference": commit,
        "target_version": "v1.0",
    })
}

#[test_log::test(tokio::test)]
async fn test_health_endpoint() -> anyhow::Result<()> {
    let (server, url) = start_server(vec!["true".to_string()])?;

    let body = reqwest::get(format!("{url}/health")).await?.text().await?;
    assert_eq!(body, "OK");

    server.handle.stop(false).await;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_successful_backport() -> anyhow::Result<()> {
    let (dir, fix) = backport_fixture();
    let (server, url) = start_server(vec!["true".to_string()])?;

    let response = reqwest::Client::new()
        .post(format!("{url}/backport"))
        .json(&request_body(dir.path(), &fix))
        .send()
        .await?;

    assert_eq!(response.status(), 200);

    let report: Value = response.json().await?;
    assert_eq!(report["status"], "success");
    assert_eq!(report["explanations"]["app.py"], "Rewrote app.py for v1.0");

    // The working tree now holds the adapted content.
    assert_eq!(
        fs::read_to_string(dir.path().join("app.py"))?,
        "x = 2  # backported\n"
    );

    server.handle.stop(false).await;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_validation_failure_reverts_and_reports() -> anyhow::Result<()> {
    let (dir, fix) = backport_fixture();

    // Passes against the original tree, fails once the marker is written.
    let (server, url) = start_server(vec![
        "sh".to_string(),
        "-c".to_string(),
        "! grep -q backported app.py".to_string(),
    ])?;

    let response = reqwest::Client::new()
        .post(format!("{url}/backport"))
        .json(&request_body(dir.path(), &fix))
        .send()
        .await?;

    assert_eq!(response.status(), 200);

    let report: Value = response.json().await?;
    assert_eq!(report["status"], "error");
    assert!(
        report["message"]
            .as_str()
            .unwrap()
            .contains("Reverted to original")
    );
    assert!(report["test_output"].is_string());
    assert_eq!(report["explanations"]["app.py"], "Rewrote app.py for v1.0");

    // Tree restored to the tagged version's content.
    assert_eq!(fs::read_to_string(dir.path().join("app.py"))?, "x = 1\n");

    server.handle.stop(false).await;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_unknown_target_version_is_client_error() -> anyhow::Result<()> {
    let (dir, fix) = backport_fixture();
    let (server, url) = start_server(vec!["true".to_string()])?;

    let response = reqwest::Client::new()
        .post(format!("{url}/backport"))
        .json(&json!({
            "repository_url": dir.path().to_str().unwrap(),
            "commit_reference": fix,
            "target_version": "v9.9",
        }))
        .send()
        .await?;

    assert_eq!(response.status(), 400);

    let report: Value = response.json().await?;
    assert_eq!(report["status"], "error");
    assert!(
        report["message"]
            .as_str()
            .unwrap()
            .contains("neither a known branch nor a tag")
    );

    server.handle.stop(false).await;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_unknown_commit_reference_is_client_error() -> anyhow::Result<()> {
    let (dir, _fix) = backport_fixture();
    let (server, url) = start_server(vec!["true".to_string()])?;

    let response = reqwest::Client::new()
        .post(format!("{url}/backport"))
        .json(&request_body(dir.path(), "deadbeef"))
        .send()
        .await?;

    assert_eq!(response.status(), 400);

    let report: Value = response.json().await?;
    assert_eq!(report["status"], "error");
    assert!(
        report["message"]
            .as_str()
            .unwrap()
            .contains("Commit reference not found")
    );

    server.handle.stop(false).await;
    Ok(())
}
