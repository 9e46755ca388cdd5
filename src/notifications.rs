use crate::configuration::NotificationSettings;
use crate::domain::{RunStats, Subscriber};
use crate::email_client::Mailer;

/// What happened to one subscriber row during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// `None` when the stored row had no usable address.
    pub recipient: Option<String>,
    pub outcome: DeliveryOutcome,
}

/// Sends the notification to every subscriber, one message at a time.
///
/// Every row counts as processed. A failed send is logged and the loop moves
/// on; only `emails_sent` tells the caller how many went out.
#[tracing::instrument(
    name = "Dispatching notifications",
    skip_all,
    fields(subscribers = subscribers.len())
)]
pub async fn dispatch_notifications(
    mailer: &dyn Mailer,
    notification: &NotificationSettings,
    subscribers: Vec<Result<Subscriber, anyhow::Error>>,
    stats: &mut RunStats,
) -> Vec<DeliveryReport> {
    let mut reports = Vec::with_capacity(subscribers.len());

    for subscriber in subscribers {
        stats.users_processed += 1;

        let subscriber = match subscriber {
            Ok(subscriber) => subscriber,
            Err(error) => {
                tracing::warn!(
                    error.cause_chain = ?error,
                    "Skipping a subscriber. Their stored contact details are invalid",
                );
                reports.push(DeliveryReport {
                    recipient: None,
                    outcome: DeliveryOutcome::Skipped,
                });
                continue;
            }
        };

        let outcome = match mailer
            .send_email(
                &subscriber.email,
                &notification.subject,
                &notification.html_body,
                &notification.text_body,
            )
            .await
        {
            Ok(()) => {
                stats.emails_sent += 1;
                tracing::info!(recipient = %subscriber.email, "Notification sent");
                DeliveryOutcome::Sent
            }
            Err(error) => {
                tracing::error!(
                    recipient = %subscriber.email,
                    error.cause_chain = ?error,
                    error.message = %error,
                    "Failed to send a notification",
                );
                DeliveryOutcome::Failed
            }
        };

        reports.push(DeliveryReport {
            recipient: Some(subscriber.email.to_string()),
            outcome,
        });
    }

    reports
}
