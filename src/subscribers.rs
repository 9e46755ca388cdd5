use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Subscriber, SubscriberEmail};

/// Read-only source of the subscribers a run notifies.
///
/// The outer error means the rows could not be read at all; an inner error is a
/// single row whose stored email does not validate.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn get_subscribers(
        &self,
        limit: i64,
    ) -> Result<Vec<Result<Subscriber, anyhow::Error>>, anyhow::Error>;
}

pub struct PgSubscriberStore {
    pool: PgPool,
}

impl PgSubscriberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    #[tracing::instrument(name = "Get subscribers", skip(self))]
    async fn get_subscribers(
        &self,
        limit: i64,
    ) -> Result<Vec<Result<Subscriber, anyhow::Error>>, anyhow::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT email FROM users LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch subscribers")?;

        Ok(rows.into_iter().map(|(email,)| parse_row(email)).collect())
    }
}

fn parse_row(email: String) -> Result<Subscriber, anyhow::Error> {
    match SubscriberEmail::parse(email) {
        Ok(email) => Ok(Subscriber { email }),
        Err(error) => Err(anyhow::anyhow!(error)),
    }
}
