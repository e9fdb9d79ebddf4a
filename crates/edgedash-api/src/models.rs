// Wire types for the Grafana endpoints edgedash talks to.
//
// Response types only model the fields we read; Grafana returns many more
// and serde ignores them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Folders ─────────────────────────────────────────────────────────

/// A folder as returned by `GET /api/folders/{uid}` and `POST /api/folders`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Folder {
    #[serde(default)]
    pub id: Option<i64>,
    pub uid: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Request body for `POST /api/folders`.
#[derive(Debug, Clone, Serialize)]
pub struct NewFolder {
    pub uid: String,
    pub title: String,
}

// ── Data sources ────────────────────────────────────────────────────

/// A data source as returned by `GET /api/datasources/name/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Datasource {
    #[serde(default)]
    pub id: Option<i64>,
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Request body for `POST /api/datasources`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDatasource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub access: String,
    pub url: String,
    pub is_default: bool,
    pub editable: bool,
    pub json_data: DatasourceJsonData,
    pub secure_json_data: SecureJsonData,
}

/// Non-secret data source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasourceJsonData {
    #[serde(rename = "httpHeaderName1")]
    pub http_header_name1: String,
    #[serde(rename = "tlsAuth")]
    pub tls_auth: bool,
    #[serde(rename = "tlsAuthWithCACert")]
    pub tls_auth_with_ca_cert: bool,
}

/// Secret data source settings. Grafana encrypts these at rest and never
/// returns them.
///
/// Certificate slots are skipped entirely when absent so Grafana never
/// receives empty placeholder material.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SecureJsonData {
    #[serde(rename = "httpHeaderValue1")]
    pub http_header_value1: String,
    #[serde(rename = "tlsCACert", skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<String>,
    #[serde(rename = "tlsClientCert", skip_serializing_if = "Option::is_none")]
    pub tls_client_cert: Option<String>,
    #[serde(rename = "tlsClientKey", skip_serializing_if = "Option::is_none")]
    pub tls_client_key: Option<String>,
}

impl fmt::Debug for SecureJsonData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |slot: &Option<String>| slot.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("SecureJsonData")
            .field("http_header_value1", &self.http_header_value1)
            .field("tls_ca_cert", &redact(&self.tls_ca_cert))
            .field("tls_client_cert", &redact(&self.tls_client_cert))
            .field("tls_client_key", &redact(&self.tls_client_key))
            .finish()
    }
}

/// Response of `POST /api/datasources`.
///
/// Recent Grafana versions nest the created data source under `datasource`;
/// some also echo a top-level `uid`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedDatasource {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub datasource: Option<Datasource>,
}

impl CreatedDatasource {
    /// The uid of the created data source, wherever Grafana put it.
    pub fn uid(&self) -> Option<&str> {
        self.datasource
            .as_ref()
            .map(|ds| ds.uid.as_str())
            .or(self.uid.as_deref())
    }
}

// ── Dashboards ──────────────────────────────────────────────────────

/// Request body for `POST /api/dashboards/db`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUpsert {
    pub dashboard: Map<String, Value>,
    pub folder_uid: String,
    pub message: String,
    pub overwrite: bool,
}

/// Response of `POST /api/dashboards/db`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DashboardUpsertResponse {
    #[serde(default)]
    pub id: Option<i64>,
    pub uid: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub slug: Option<String>,
}

// ── Health ──────────────────────────────────────────────────────────

/// Response of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Health {
    pub database: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
}
