//! The backport request handler.

use actix_web::{HttpResponse, web};
use patchport_extractor::DiffExtractor;
use patchport_orchestrator::{
    BackportError, BackportOrchestrator, BackportReport, BackportRequest, ReportStatus,
};

use crate::session::{self, SessionError};
use crate::state::AppState;

/// Handle one backport request end to end.
///
/// Pipeline outcomes (baseline failure, validation failure, apply failure)
/// come back as `200` with an error-status report; client mistakes (bad
/// reference, nothing to backport, unknown target version) as `400`;
/// adapter failures as `502`; anything unexpected as `500`. Every failure
/// is a single structured report, never a bare error string.
#[allow(clippy::future_not_send)]
pub async fn handler(
    request: web::Json<BackportRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let request = request.into_inner();

    log::info!(
        "Backport request: {} @ {} -> {}",
        request.repository_url,
        request.commit_reference,
        request.target_version
    );

    let workdir = state.resolve_workdir(&request.repository_url);

    // One transaction owns the tree at a time.
    let lock = state.tree_lock(&workdir).await;
    let _guard = lock.lock().await;

    let repo = match session::prepare(&workdir, &request.target_version) {
        Ok(repo) => repo,
        Err(e) => {
            log::warn!("Session preparation failed: {e}");
            return session_error_response(&e);
        }
    };

    let orchestrator = BackportOrchestrator::new(
        DiffExtractor::new(state.filter()),
        state.adapter.clone(),
        state.gate.clone(),
    );

    match orchestrator
        .run(
            &*repo,
            &request.commit_reference,
            &request.target_version,
        )
        .await
    {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => backport_error_response(&e),
    }
}

fn session_error_response(error: &SessionError) -> HttpResponse {
    let report = error_report(error.to_string());

    match error {
        SessionError::Git(_) => HttpResponse::InternalServerError().json(report),
        _ => HttpResponse::BadRequest().json(report),
    }
}

fn backport_error_response(error: &BackportError) -> HttpResponse {
    let report = BackportReport::from(error);

    match error {
        // Pipeline outcomes: the request was well-formed and ran to a
        // terminal state; the body says what happened to the tree.
        BackportError::BaselineFailed { .. }
        | BackportError::ApplyFailed { .. }
        | BackportError::ValidationFailed { .. } => HttpResponse::Ok().json(report),
        BackportError::NoChangesFound | BackportError::ReferenceNotFound { .. } => {
            HttpResponse::BadRequest().json(report)
        }
        BackportError::Adaptation { .. } => HttpResponse::BadGateway().json(report),
        BackportError::Internal { .. } => HttpResponse::InternalServerError().json(report),
    }
}

fn error_report(message: String) -> BackportReport {
    BackportReport {
        status: ReportStatus::Error,
        message,
        test_output: None,
        explanations: None,
    }
}
