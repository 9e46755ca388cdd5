use reqwest::StatusCode;

use crate::helpers::{App, StoreBehaviour, SUBSCRIBER_LIMIT, TEST_TOKEN};

const FIVE_SUBSCRIBERS: [&str; 5] = [
    "first@example.com",
    "second@example.com",
    "third@example.com",
    "fourth@example.com",
    "fifth@example.com",
];

fn assert_json(response: &reqwest::Response) {
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn valid_token_notifies_every_subscriber() {
    let app = App::spawn(StoreBehaviour::Rows(FIVE_SUBSCRIBERS.to_vec()), vec![]).await;

    let response = app.trigger_job(TEST_TOKEN).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_json(&response);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "status": "ok",
            "stats": {"usersProcessed": 5, "videosChecked": 0, "emailsSent": 5}
        })
    );
    assert_eq!(app.mailer.delivered(), FIVE_SUBSCRIBERS.to_vec());
}

#[tokio::test]
async fn a_failed_send_is_reported_through_the_counters_only() {
    let app = App::spawn(
        StoreBehaviour::Rows(FIVE_SUBSCRIBERS.to_vec()),
        vec!["third@example.com"],
    )
    .await;

    let response = app.trigger_job(TEST_TOKEN).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["stats"]["usersProcessed"], 5);
    assert_eq!(body["stats"]["emailsSent"], 4);
    assert_eq!(app.mailer.attempts(), 5);
    assert!(!app
        .mailer
        .delivered()
        .contains(&"third@example.com".to_string()));
}

#[tokio::test]
async fn invalid_tokens_are_rejected_with_403() {
    let app = App::spawn(StoreBehaviour::Rows(FIVE_SUBSCRIBERS.to_vec()), vec![]).await;

    let test_cases = [
        ("", "empty token"),
        ("test-job-toke", "prefix of the secret"),
        ("test-job-token-", "secret with a suffix"),
        ("TEST-JOB-TOKEN", "different case"),
        (" test-job-token", "leading whitespace"),
    ];

    for (token, description) in test_cases {
        let response = app.trigger_job(token).await;

        assert_eq!(
            response.status(),
            StatusCode::FORBIDDEN,
            "The job did not reject a request with an {}",
            description
        );
        assert_json(&response);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"error": "Unauthorized"}));
    }

    assert_eq!(app.store.calls(), 0);
    assert_eq!(app.mailer.attempts(), 0);
}

#[tokio::test]
async fn missing_token_is_rejected_with_403() {
    let app = App::spawn(StoreBehaviour::Rows(FIVE_SUBSCRIBERS.to_vec()), vec![]).await;

    let response = app.get("/jobs/view-alerts").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"error": "Unauthorized"}));
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn undecodable_token_is_rejected_with_403() {
    let app = App::spawn(StoreBehaviour::Rows(FIVE_SUBSCRIBERS.to_vec()), vec![]).await;

    let response = app.get("/jobs/view-alerts?token=%FF%FE").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn subscriber_query_is_capped_by_the_configured_limit() {
    let app = App::spawn(StoreBehaviour::Rows(FIVE_SUBSCRIBERS.to_vec()), vec![]).await;

    app.trigger_job(TEST_TOKEN).await;

    assert_eq!(app.store.limits(), vec![SUBSCRIBER_LIMIT]);
}

#[tokio::test]
async fn stored_rows_with_invalid_emails_are_processed_but_not_sent() {
    let app = App::spawn(
        StoreBehaviour::Rows(vec!["first@example.com", "definitely-not-an-email"]),
        vec![],
    )
    .await;

    let response = app.trigger_job(TEST_TOKEN).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["stats"]["usersProcessed"], 2);
    assert_eq!(body["stats"]["emailsSent"], 1);
}

#[tokio::test]
async fn no_subscribers_is_still_a_successful_run() {
    let app = App::spawn(StoreBehaviour::Rows(vec![]), vec![]).await;

    let response = app.trigger_job(TEST_TOKEN).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["stats"],
        serde_json::json!({"usersProcessed": 0, "videosChecked": 0, "emailsSent": 0})
    );
}

#[tokio::test]
async fn store_failure_returns_a_generic_500() {
    let app = App::spawn(StoreBehaviour::Fail, vec![]).await;

    let response = app.trigger_job(TEST_TOKEN).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_json(&response);
    let body = response.text().await.unwrap();
    assert!(!body.contains("postgres"));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&body).unwrap(),
        serde_json::json!({"status": "error", "message": "Example error handler triggered"})
    );
    assert_eq!(app.mailer.attempts(), 0);
}

#[tokio::test]
async fn a_panic_in_the_run_returns_a_generic_500() {
    let app = App::spawn(StoreBehaviour::Panic, vec![]).await;

    let response = app.trigger_job(TEST_TOKEN).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text().await.unwrap();
    assert!(!body.contains("blew up"));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&body).unwrap(),
        serde_json::json!({"status": "error", "message": "Example error handler triggered"})
    );
}
