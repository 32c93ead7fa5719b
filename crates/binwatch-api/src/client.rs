// Backend HTTP client
//
// Wraps `reqwest::Client` with `/api` URL construction and uniform
// response handling: non-2xx statuses become `Error::Api` carrying the
// backend's `detail` message, and bodies that fail to parse become
// `Error::Deserialization` with a truncated preview.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    ApiStatus, DashboardStats, DemoDataAck, Dustbin, MessageAck, Notification, SimulationAck,
};

const PREVIEW_LEN: usize = 200;

/// Async client for the dustbin fleet backend.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct BinwatchClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl BinwatchClient {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Parse `base_url` and create a client from it.
    pub fn from_url(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Self::new(Url::parse(base_url)?, transport)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/` health probe.
    pub async fn api_status(&self) -> Result<ApiStatus, Error> {
        self.get(self.endpoint(&[""])?).await
    }

    /// `GET /api/dustbins`
    pub async fn list_dustbins(&self) -> Result<Vec<Dustbin>, Error> {
        self.get(self.endpoint(&["dustbins"])?).await
    }

    /// `GET /api/dustbins/{id}`
    pub async fn get_dustbin(&self, id: &str) -> Result<Dustbin, Error> {
        self.get(self.endpoint(&["dustbins", id])?).await
    }

    /// `GET /api/notifications?limit=N&unread_only=B`
    ///
    /// The backend returns the list newest-first, already truncated.
    pub async fn list_notifications(
        &self,
        limit: u32,
        unread_only: bool,
    ) -> Result<Vec<Notification>, Error> {
        let mut url = self.endpoint(&["notifications"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("unread_only", if unread_only { "true" } else { "false" });
        self.get(url).await
    }

    /// `GET /api/dashboard/stats`
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, Error> {
        self.get(self.endpoint(&["dashboard", "stats"])?).await
    }

    /// `PUT /api/notifications/{id}/read`
    pub async fn mark_notification_read(&self, id: &str) -> Result<MessageAck, Error> {
        let url = self.endpoint(&["notifications", id, "read"])?;
        debug!("PUT {}", url);
        let resp = self.http.put(url).send().await.map_err(|e| self.classify(e))?;
        self.parse_response(resp).await
    }

    /// `POST /api/initialize-demo-data`: reseed the backend fleet.
    pub async fn initialize_demo_data(&self) -> Result<DemoDataAck, Error> {
        self.post(self.endpoint(&["initialize-demo-data"])?).await
    }

    /// `POST /api/simulate/iot-data`: perturb every device's telemetry.
    pub async fn simulate_iot_data(&self) -> Result<SimulationAck, Error> {
        self.post(self.endpoint(&["simulate", "iot-data"])?).await
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/api/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(|e| self.classify(e))?;
        self.parse_response(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.parse_response(resp).await
    }

    /// Separate client-side timeouts from other transport failures.
    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn parse_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// Pull `detail` out of a `{"detail": "..."}` error body, falling back to
/// a preview of whatever the backend sent.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| preview(body).to_owned())
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BinwatchClient {
        BinwatchClient::from_url(base, &TransportConfig::default()).unwrap()
    }

    #[test]
    fn endpoint_appends_api_prefix() {
        let c = client("http://localhost:8000");
        assert_eq!(
            c.endpoint(&["dustbins"]).unwrap().as_str(),
            "http://localhost:8000/api/dustbins"
        );
        assert_eq!(c.endpoint(&[""]).unwrap().as_str(), "http://localhost:8000/api/");
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_ids() {
        let c = client("http://bins.example/backend/");
        assert_eq!(
            c.endpoint(&["notifications", "a b", "read"]).unwrap().as_str(),
            "http://bins.example/backend/api/notifications/a%20b/read"
        );
    }

    #[test]
    fn error_detail_prefers_fastapi_detail() {
        assert_eq!(error_detail(r#"{"detail":"Dustbin not found"}"#), "Dustbin not found");
        assert_eq!(error_detail("Internal Server Error"), "Internal Server Error");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        assert_eq!(preview(&long).chars().count(), PREVIEW_LEN);
    }
}
