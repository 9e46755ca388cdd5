use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::authentication::is_authorized;
use crate::configuration::JobSettings;
use crate::domain::RunStats;
use crate::email_client::Mailer;
use crate::notifications::{dispatch_notifications, DeliveryOutcome};
use crate::subscribers::SubscriberStore;

/// The only failure detail a caller ever sees.
pub const GENERIC_ERROR_MESSAGE: &str = "Example error handler triggered";

#[derive(Deserialize)]
pub struct Parameters {
    token: Option<String>,
}

#[derive(Serialize)]
pub struct JobReport {
    status: &'static str,
    stats: RunStats,
}

#[tracing::instrument(
    name = "Running the view alerts job",
    skip_all,
    fields(
        users_processed = tracing::field::Empty,
        emails_sent = tracing::field::Empty,
        emails_failed = tracing::field::Empty,
    )
)]
pub async fn run_job(
    State(job): State<JobSettings>,
    State(store): State<Arc<dyn SubscriberStore>>,
    State(mailer): State<Arc<dyn Mailer>>,
    parameters: Option<Query<Parameters>>,
) -> Result<Json<JobReport>, JobError> {
    let token = parameters
        .as_ref()
        .and_then(|Query(parameters)| parameters.token.as_deref());
    if !is_authorized(token, &job.secret_token) {
        return Err(JobError::Unauthorized);
    }

    let mut stats = RunStats::default();

    let subscribers = store.get_subscribers(job.subscriber_limit).await?;
    let reports =
        dispatch_notifications(mailer.as_ref(), &job.notification, subscribers, &mut stats).await;

    let failed = reports
        .iter()
        .filter(|report| report.outcome == DeliveryOutcome::Failed)
        .count();
    let span = tracing::Span::current();
    span.record("users_processed", stats.users_processed);
    span.record("emails_sent", stats.emails_sent);
    span.record("emails_failed", failed);

    Ok(Json(JobReport {
        status: "ok",
        stats,
    }))
}

#[derive(thiserror::Error)]
pub enum JobError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        match self {
            JobError::Unauthorized => {
                tracing::warn!("Rejected a job trigger without a valid token");

                (
                    StatusCode::FORBIDDEN,
                    Json(serde_json::json!({ "error": "Unauthorized" })),
                )
                    .into_response()
            }
            JobError::UnexpectedError(_) => {
                tracing::error!(error.cause_chain = ?self, "The job run failed");

                internal_error_response()
            }
        }
    }
}

/// Turns a panic inside a handler into the same opaque 500 as any other failure.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic.message = %detail, "The job handler panicked");

    internal_error_response()
}

fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "status": "error",
            "message": GENERIC_ERROR_MESSAGE,
        })),
    )
        .into_response()
}

fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
