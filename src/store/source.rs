use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;

use crate::models::packet::{Page, PacketRecordDetail};
use crate::utils::error::FetchError;

/// The remote side of the store: a paginated listing plus on-demand detail
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `limit` records of `capture_id` starting at `offset`
    async fn fetch_page(
        &self,
        capture_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Page, FetchError>;

    /// Fetch the layered detail of one record
    async fn fetch_detail(
        &self,
        capture_id: &str,
        sequence_number: u64,
    ) -> Result<PacketRecordDetail, FetchError>;
}

/// `PageSource` over the listing server's REST API
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPageSource {
    /// Create a source for the server at `base_url` (e.g. `http://127.0.0.1:3000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, usize)],
    ) -> Result<T, FetchError> {
        debug!("GET {} {:?}", url, query);
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::ServerError {
                status: status.as_u16(),
                message: error_message(body),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Pull `message` out of a JSON error body, or keep the raw text
fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body)
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(
        &self,
        capture_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Page, FetchError> {
        let url = format!("{}/api/packets/{}", self.base_url, capture_id);
        self.get_json(url, &[("limit", limit), ("offset", offset)])
            .await
    }

    async fn fetch_detail(
        &self,
        capture_id: &str,
        sequence_number: u64,
    ) -> Result<PacketRecordDetail, FetchError> {
        let url = format!(
            "{}/api/packet/{}/{}",
            self.base_url, capture_id, sequence_number
        );
        self.get_json(url, &[]).await
    }
}
