use std::sync::Arc;

use axum::{
    extract::{FromRef, MatchedPath},
    http::Request,
    routing::get,
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::configuration::{JobSettings, Settings};
use crate::email_client::Mailer;
use crate::routes::{check_health, handle_panic, run_job};
use crate::subscribers::{PgSubscriberStore, SubscriberStore};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub job: JobSettings,
    pub store: Arc<dyn SubscriberStore>,
    pub mailer: Arc<dyn Mailer>,
}

/// Wires the Postgres store and the SMTP client from configuration.
///
/// The pool connects lazily, so a rejected trigger never touches the database.
pub fn get_app_state(configuration: &Settings) -> Result<AppState, anyhow::Error> {
    let pool = PgPoolOptions::new().connect_lazy_with(configuration.database.connect_options());
    let email_client = configuration.email_client.client()?;

    Ok(AppState {
        job: configuration.job.clone(),
        store: Arc::new(PgSubscriberStore::new(pool)),
        mailer: Arc::new(email_client),
    })
}

pub async fn run(listener: TcpListener, app_state: AppState) -> Result<(), std::io::Error> {
    let app = router(app_state);

    axum::serve(listener, app).await
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/jobs/view-alerts", get(run_job))
        .with_state(app_state)
        .route("/health_check", get(check_health))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            // Refer to https://github.com/tokio-rs/axum/blob/main/examples/tracing-aka-logging/Cargo.toml
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);
                tracing::info_span!(
                    "Starting HTTP request",
                    method = ?request.method(),
                    path,
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
}
