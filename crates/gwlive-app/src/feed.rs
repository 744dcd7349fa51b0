// Upstream feed client.
//
// `FeedSource` is the seam between the fetch operations and the network; the
// live implementation is `HttpFeed`, tests swap in an in-memory source.

use async_trait::async_trait;
use gwlive_core::Gameweek;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::FeedConfig;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
}

/// Raw JSON payloads from the provider. Parsing happens downstream.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fixtures(&self, gw: Gameweek) -> Result<Value, FeedError>;

    async fn event_live(&self, gw: Gameweek) -> Result<Value, FeedError>;

    async fn bootstrap(&self) -> Result<Value, FeedError>;

    async fn entry_picks(&self, entry: u64, gw: Gameweek) -> Result<Value, FeedError>;
}

// ---------------------------------------------------------------------------
// HttpFeed
// ---------------------------------------------------------------------------

pub struct HttpFeed {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFeed {
    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            base_url: normalize_base(&config.base_url),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value, FeedError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status { url, status });
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fixtures(&self, gw: Gameweek) -> Result<Value, FeedError> {
        self.get_json(&fixtures_path(gw)).await
    }

    async fn event_live(&self, gw: Gameweek) -> Result<Value, FeedError> {
        self.get_json(&event_live_path(gw)).await
    }

    async fn bootstrap(&self) -> Result<Value, FeedError> {
        self.get_json(BOOTSTRAP_PATH).await
    }

    async fn entry_picks(&self, entry: u64, gw: Gameweek) -> Result<Value, FeedError> {
        self.get_json(&entry_picks_path(entry, gw)).await
    }
}

// ---------------------------------------------------------------------------
// Endpoint paths
// ---------------------------------------------------------------------------

const BOOTSTRAP_PATH: &str = "bootstrap-static/";

fn fixtures_path(gw: Gameweek) -> String {
    format!("fixtures/?event={}", gw.0)
}

fn event_live_path(gw: Gameweek) -> String {
    format!("event/{}/live/", gw.0)
}

fn entry_picks_path(entry: u64, gw: Gameweek) -> String {
    format!("entry/{entry}/event/{}/picks/", gw.0)
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> FeedConfig {
        FeedConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            user_agent: "gwlive-test".to_string(),
        }
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(fixtures_path(Gameweek(7)), "fixtures/?event=7");
        assert_eq!(event_live_path(Gameweek(7)), "event/7/live/");
        assert_eq!(entry_picks_path(123456, Gameweek(7)), "entry/123456/event/7/picks/");
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let feed = HttpFeed::from_config(&config("http://localhost:9000/api")).unwrap();
        assert_eq!(feed.url(BOOTSTRAP_PATH), "http://localhost:9000/api/bootstrap-static/");

        let feed = HttpFeed::from_config(&config("http://localhost:9000/api/")).unwrap();
        assert_eq!(feed.url(&event_live_path(Gameweek(3))), "http://localhost:9000/api/event/3/live/");
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        let feed = HttpFeed::from_config(&config("http://127.0.0.1:1/")).unwrap();
        let err = feed.bootstrap().await.unwrap_err();
        assert!(matches!(err, FeedError::Http(_)));
    }
}
