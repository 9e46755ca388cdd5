use std::collections::hash_map::Entry;

use anyhow::Context;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;

use crate::domain::{VideoId, ViewCountMap};

/// Client for the `videos` endpoint of the YouTube Data API.
pub struct YoutubeClient {
    http_client: Client,
    base_url: Url,
    api_key: Secret<String>,
    batch_size: usize,
}

impl YoutubeClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        batch_size: usize,
    ) -> Result<Self, anyhow::Error> {
        anyhow::ensure!(batch_size > 0, "The statistics batch size must be at least 1");
        let base_url = Url::parse(&base_url)
            .with_context(|| format!("{} is not a valid statistics API url", base_url))?;

        Ok(Self {
            http_client: Client::new(),
            base_url,
            api_key,
            batch_size,
        })
    }

    /// Looks up view counts for `video_ids`, one request per `batch_size` ids.
    ///
    /// A chunk whose request or response is unusable is logged and skipped, so the
    /// returned map only covers the chunks that came back intact.
    #[tracing::instrument(
        name = "Fetching view counts",
        skip_all,
        fields(videos = video_ids.len(), batch_size = self.batch_size)
    )]
    pub async fn fetch_view_counts(&self, video_ids: &[VideoId]) -> ViewCountMap {
        let mut view_counts = ViewCountMap::new();
        if video_ids.is_empty() {
            return view_counts;
        }

        for (index, chunk) in video_ids.chunks(self.batch_size).enumerate() {
            match self.fetch_chunk(chunk).await {
                Ok(items) => {
                    let mut recorded = 0;
                    for (video_id, view_count) in items {
                        if let Entry::Vacant(entry) = view_counts.entry(video_id) {
                            entry.insert(view_count);
                            recorded += 1;
                        }
                    }
                    tracing::info!(
                        chunk = index,
                        requested = chunk.len(),
                        recorded,
                        "Fetched view counts for a chunk of videos",
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        chunk = index,
                        requested = chunk.len(),
                        error.cause_chain = ?error,
                        "Skipping a chunk of videos. Their statistics could not be fetched",
                    );
                }
            }
        }

        view_counts
    }

    async fn fetch_chunk(&self, chunk: &[VideoId]) -> Result<Vec<(VideoId, u64)>, anyhow::Error> {
        let ids = chunk
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(",");

        let body: Value = self
            .http_client
            .get(self.base_url.clone())
            .query(&[
                ("part", "statistics"),
                ("id", ids.as_str()),
                ("key", self.api_key.expose_secret().as_str()),
            ])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            // the request url carries the api key
            .map_err(reqwest::Error::without_url)
            .context("Statistics request failed")?
            .json::<Value>()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Statistics response is not valid JSON")?;

        parse_items(&body)
    }
}

fn parse_items(body: &Value) -> Result<Vec<(VideoId, u64)>, anyhow::Error> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .context("Statistics response has no items array")?;

    Ok(items.iter().filter_map(parse_item).collect())
}

fn parse_item(item: &Value) -> Option<(VideoId, u64)> {
    let video_id = VideoId::parse(item.get("id")?.as_str()?)?;
    let view_count = match item.get("statistics")?.get("viewCount")? {
        Value::String(count) => count.trim().parse().ok()?,
        Value::Number(count) => count.as_u64()?,
        _ => return None,
    };

    Some((video_id, view_count))
}
