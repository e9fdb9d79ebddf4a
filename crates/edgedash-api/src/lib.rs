// edgedash-api: Async Rust client for the Grafana HTTP management API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::GrafanaClient;
pub use error::Error;
pub use models::{
    CreatedDatasource, DashboardUpsert, DashboardUpsertResponse, Datasource, DatasourceJsonData,
    Folder, Health, NewDatasource, NewFolder, SecureJsonData,
};
pub use transport::{TlsMode, TransportConfig};
