//! Configuration for edgedash.
//!
//! Layered settings (defaults, TOML file, environment), certificate file
//! loading, validation, and translation into `edgedash_core` types. The CLI
//! adds flag overrides on top; core never sees anything from this crate
//! except the finished [`GrafanaConnection`] and [`ReconcileConfig`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map, Value},
};
use secrecy::SecretString;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use edgedash_core::{
    DEFAULT_TENANT_HEADER, DatasourceSettings, Edge, FailurePolicy, FolderSpec,
    GrafanaConnection, PemMaterial, ReconcileConfig, TlsMaterial, TlsVerification,
};

/// Settings also read from unprefixed environment variables (upper-cased)
/// for compatibility with the original deployment scripts.
pub const PLAIN_ENV_KEYS: [&str; 11] = [
    "grafana_url",
    "grafana_token",
    "edges",
    "folder_title",
    "folder_uid",
    "template_path",
    "datasource_prefix",
    "mimir_url",
    "ca_cert_path",
    "client_cert_path",
    "client_key_path",
];

/// String-valued settings. Their environment values are taken verbatim:
/// `DATASOURCE_PREFIX="Mimir - "` keeps its trailing space.
const STRING_KEYS: [&str; 14] = [
    "grafana_url",
    "grafana_token",
    "grafana_ca_cert",
    "edges",
    "folder_title",
    "folder_uid",
    "template_path",
    "datasource_prefix",
    "mimir_url",
    "tenant_header",
    "ca_cert_path",
    "client_cert_path",
    "client_key_path",
    "on_error",
];

/// Settings parsed from their environment value (booleans, numbers).
const TYPED_KEYS: [&str; 2] = ["timeout", "insecure"];

/// Prefix for every setting, including those without a plain variable.
pub const ENV_PREFIX: &str = "EDGEDASH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{field} is not set (set {env} or add it to the config file)")]
    Missing { field: String, env: String },

    #[error("cannot read {field} file {}: {source}", path.display())]
    CertRead {
        field: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn validation(field: &str, reason: impl fmt::Display) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.to_string(),
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Flat settings, one key per environment variable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Grafana base URL.
    pub grafana_url: Option<String>,

    /// Service account token. Never serialized.
    #[serde(default, skip_serializing)]
    pub grafana_token: Option<String>,

    /// CA bundle used to verify Grafana's own certificate.
    pub grafana_ca_cert: Option<PathBuf>,

    /// Skip verification of Grafana's certificate.
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Edges, comma separated or as a list.
    #[serde(default, deserialize_with = "deserialize_edges")]
    pub edges: Vec<String>,

    #[serde(default = "default_folder_title", deserialize_with = "lenient_string")]
    pub folder_title: String,

    #[serde(default = "default_folder_uid", deserialize_with = "lenient_string")]
    pub folder_uid: String,

    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,

    #[serde(default = "default_datasource_prefix")]
    pub datasource_prefix: String,

    /// Prometheus-compatible endpoint each data source proxies to.
    #[serde(default = "default_mimir_url")]
    pub mimir_url: String,

    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,

    pub ca_cert_path: Option<PathBuf>,
    pub client_cert_path: Option<PathBuf>,
    pub client_key_path: Option<PathBuf>,

    #[serde(default)]
    pub on_error: FailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grafana_url: None,
            grafana_token: None,
            grafana_ca_cert: None,
            insecure: false,
            timeout: default_timeout(),
            edges: Vec::new(),
            folder_title: default_folder_title(),
            folder_uid: default_folder_uid(),
            template_path: default_template_path(),
            datasource_prefix: default_datasource_prefix(),
            mimir_url: default_mimir_url(),
            tenant_header: default_tenant_header(),
            ca_cert_path: None,
            client_cert_path: None,
            client_key_path: None,
            on_error: FailurePolicy::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_folder_title() -> String {
    "Edges".into()
}
fn default_folder_uid() -> String {
    "edges-folder".into()
}
fn default_template_path() -> PathBuf {
    PathBuf::from("central/grafana/dashboards/edge-template.json")
}
fn default_datasource_prefix() -> String {
    "Mimir - ".into()
}
fn default_mimir_url() -> String {
    "https://mimir:9009/prometheus".into()
}
fn default_tenant_header() -> String {
    DEFAULT_TENANT_HEADER.into()
}

// ── Lenient deserializers ───────────────────────────────────────────
//
// Environment values go through figment's value parser, so `EDGES=42` or
// `FOLDER_UID=1234` arrive as numbers rather than strings.

struct ScalarString;

impl Visitor<'_> for ScalarString {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<String, E> {
        Ok(v.to_string())
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(ScalarString)
}

struct EdgeEntry(String);

impl<'de> Deserialize<'de> for EdgeEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarString).map(EdgeEntry)
    }
}

struct EdgeList;

impl<'de> Visitor<'de> for EdgeList {
    type Value = Vec<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a comma-separated string or a list of edges")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Vec<String>, E> {
        Ok(split_edges(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Vec<String>, E> {
        Ok(vec![v.to_string()])
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Vec<String>, E> {
        Ok(vec![v.to_string()])
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Vec<String>, E> {
        Ok(vec![v.to_string()])
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<String>, A::Error> {
        let mut out = Vec::new();
        while let Some(EdgeEntry(entry)) = seq.next_element()? {
            out.push(entry);
        }
        Ok(out)
    }
}

/// Split a comma-separated edge list, trimming entries and dropping blanks.
/// Order and duplicates are kept.
pub fn split_edges(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_owned)
        .collect()
}

fn deserialize_edges<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    deserializer.deserialize_any(EdgeList)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "edgedash", "edgedash").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("edgedash");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Environment variables for string settings, passed through unparsed.
///
/// figment's `Env` provider trims and type-sniffs values, which would turn a
/// `"Mimir - "` prefix into `"Mimir -"` and change every data source name.
struct RawEnv {
    prefix: &'static str,
    keys: &'static [&'static str],
}

impl RawEnv {
    fn var_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_ascii_uppercase())
    }
}

impl Provider for RawEnv {
    fn metadata(&self) -> Metadata {
        if self.prefix.is_empty() {
            Metadata::named("environment variable(s)")
        } else {
            Metadata::named(format!("`{}` environment variable(s)", self.prefix))
        }
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let mut dict = Dict::new();
        for key in self.keys {
            if let Ok(value) = std::env::var(self.var_name(key)) {
                dict.insert((*key).to_owned(), Value::from(value));
            }
        }
        Ok(Profile::Default.collect(dict))
    }
}

/// The layered provider stack: defaults, TOML file, plain env, prefixed env.
pub fn figment(file: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(file))
        .merge(RawEnv {
            prefix: "",
            keys: &PLAIN_ENV_KEYS,
        })
        .merge(Env::prefixed(ENV_PREFIX).only(&TYPED_KEYS))
        .merge(RawEnv {
            prefix: ENV_PREFIX,
            keys: &STRING_KEYS,
        })
}

/// Load settings from an explicit config file (which must exist) or from
/// the default location (which may be absent).
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = match explicit {
        Some(path) if !path.is_file() => {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Some(path) => path.to_path_buf(),
        None => config_path(),
    };
    Settings::from_figment(&figment(&path))
}

impl Settings {
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// Effective settings as TOML. The token is never included.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn token_configured(&self) -> bool {
        self.grafana_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Validate the Grafana endpoint settings and build a connection.
    pub fn connection(&self) -> Result<GrafanaConnection, ConfigError> {
        let raw_url = self
            .grafana_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "grafana_url".into(),
                env: "GRAFANA_URL".into(),
            })?;
        let url = parse_http_url("grafana_url", raw_url)?;

        let token = self
            .grafana_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "grafana_token".into(),
                env: "GRAFANA_TOKEN".into(),
            })?;

        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca) = self.grafana_ca_cert {
            TlsVerification::CustomCa(ca.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        if self.timeout == 0 {
            return Err(validation("timeout", "must be at least 1 second"));
        }

        Ok(GrafanaConnection {
            url,
            token: SecretString::from(token.to_owned()),
            tls,
            timeout: Duration::from_secs(self.timeout),
        })
    }

    /// Validated edges in configuration order.
    pub fn edge_list(&self) -> Result<Vec<Edge>, ConfigError> {
        Edge::from_entries(self.edges.iter().map(String::as_str))
            .map_err(|e| validation("edges", e))
    }

    /// Validate everything the reconciler needs and load certificate files.
    pub fn reconcile_config(&self) -> Result<ReconcileConfig, ConfigError> {
        let folder = FolderSpec::new(self.folder_uid.clone(), self.folder_title.clone())
            .map_err(|e| validation("folder_uid", e))?;
        let edges = self.edge_list()?;
        let proxy_url = parse_http_url("mimir_url", &self.mimir_url)?;

        if self.tenant_header.trim().is_empty() {
            return Err(validation("tenant_header", "must not be empty"));
        }

        let tls = TlsMaterial {
            ca_cert: read_pem("ca_cert_path", self.ca_cert_path.as_deref())?,
            client_cert: read_pem("client_cert_path", self.client_cert_path.as_deref())?,
            client_key: read_pem("client_key_path", self.client_key_path.as_deref())?,
        };

        Ok(ReconcileConfig {
            folder,
            edges,
            template_path: self.template_path.clone(),
            datasource: DatasourceSettings {
                name_prefix: self.datasource_prefix.clone(),
                proxy_url,
                tenant_header: self.tenant_header.trim().to_owned(),
                tls,
            },
            failure_policy: self.on_error,
        })
    }
}

fn parse_http_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| validation(field, format!("{raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(validation(
            field,
            format!("expected an http(s) URL, got scheme '{other}'"),
        )),
    }
}

/// Read one certificate slot. No path or an empty file means absent.
pub fn read_pem(field: &str, path: Option<&Path>) -> Result<Option<PemMaterial>, ConfigError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let pem = std::fs::read_to_string(path).map_err(|source| ConfigError::CertRead {
        field: field.into(),
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PemMaterial::new(pem))
}
