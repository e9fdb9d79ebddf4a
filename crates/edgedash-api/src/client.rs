// Async HTTP client for the Grafana HTTP management API.
//
// Auth: `Authorization: Bearer <service account token>`
// Paths are assembled from segments so user-controlled names (data source
// names, folder uids) are always percent-encoded.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{
    CreatedDatasource, DashboardUpsert, DashboardUpsertResponse, Datasource, Folder, Health,
    NewDatasource, NewFolder,
};
use crate::transport::TransportConfig;

// ── Error response shape from Grafana ────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Grafana HTTP API.
///
/// Every request carries the bearer token plus JSON `Content-Type` and
/// `Accept` headers. Non-2xx responses become [`Error::Api`] with the status
/// preserved, so callers can tell a 404 apart from every other failure.
pub struct GrafanaClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl GrafanaClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a bearer token and transport config.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::InvalidToken {
                message: format!("invalid Authorization header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Wrap a bare `reqwest::Client` for URL-building tests.
    #[cfg(test)]
    fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: 0,
        })
    }

    /// Parse the base URL and make sure it ends with `/`.
    ///
    /// Grafana may be served under a sub-path (`https://host/grafana`), so
    /// the existing path is kept and API segments are appended to it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        url.set_query(None);
        url.set_fragment(None);

        Ok(url)
    }

    /// The normalized Grafana base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("GET {url}");

        let resp = self.send(self.http.get(url)).await?;
        Self::handle_response(resp).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url).json(body)).await?;
        Self::handle_response(resp).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("PUT {url}");

        let resp = self.send(self.http.put(url).json(body)).await?;
        Self::handle_response(resp).await
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            trace!(status = status.as_u16(), body = %body, "response body");
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.message)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.clone()
                }
            });

        Error::Api {
            status: status.as_u16(),
            message,
            body: raw,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Health ───────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<Health, Error> {
        self.get(&["api", "health"]).await
    }

    // ── Folders ──────────────────────────────────────────────────────

    pub async fn get_folder(&self, uid: &str) -> Result<Folder, Error> {
        self.get(&["api", "folders", uid]).await
    }

    pub async fn create_folder(&self, body: &NewFolder) -> Result<Folder, Error> {
        self.post(&["api", "folders"], body).await
    }

    // ── Data sources ─────────────────────────────────────────────────

    pub async fn get_datasource_by_name(&self, name: &str) -> Result<Datasource, Error> {
        self.get(&["api", "datasources", "name", name]).await
    }

    pub async fn create_datasource(&self, body: &NewDatasource) -> Result<CreatedDatasource, Error> {
        self.post(&["api", "datasources"], body).await
    }

    // ── Dashboards ───────────────────────────────────────────────────

    pub async fn upsert_dashboard(
        &self,
        body: &DashboardUpsert,
    ) -> Result<DashboardUpsertResponse, Error> {
        self.post(&["api", "dashboards", "db"], body).await
    }
}
