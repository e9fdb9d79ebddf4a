//! Reconciliation of Grafana resources for multi-tenant edge monitoring.
//!
//! This crate owns the business logic between `edgedash-api` and the CLI:
//!
//! - **[`Reconciler`]**: the orchestrator. Ensures the shared folder once,
//!   loads the dashboard template once, then walks the configured edges in
//!   order: data source first, dashboard second.
//!
//! - **[`ensure_exists`]**: the lookup-then-create routine shared by the
//!   folder and data source reconcilers. A 404 on lookup means "create"; any
//!   other error aborts without creating.
//!
//! - **Reconcilers**: [`ensure_folder`], [`ensure_datasource`],
//!   [`ensure_dashboard`]. Folders and data sources are created at most once
//!   per key and never modified afterwards; dashboards are overwritten on
//!   every run.
//!
//! - **[`DashboardTemplate`]**: token substitution (`${EDGE_NAME}`,
//!   `${DATASOURCE_UID}`, `${UID_SUFFIX}`) and decoding of the result.
//!
//! - **Configuration** ([`ReconcileConfig`], [`GrafanaConnection`]): built
//!   once by the caller and passed by reference. Core never reads the
//!   environment or config files.

pub mod config;
pub mod dashboard;
pub mod datasource;
pub mod ensure;
pub mod error;
pub mod folder;
pub mod reconciler;
pub mod report;
pub mod template;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    DEFAULT_TENANT_HEADER, DatasourceSettings, Edge, FailurePolicy, FolderSpec,
    GrafanaConnection, PemMaterial, ReconcileConfig, TlsMaterial, TlsVerification,
};
pub use dashboard::{DashboardOutcome, UID_SUFFIX_MAX_LEN, ensure_dashboard, uid_safe};
pub use datasource::{datasource_payload, ensure_datasource};
pub use ensure::{Ensured, ensure_exists};
pub use error::{CoreError, ResourceKind, TemplateError};
pub use folder::ensure_folder;
pub use reconciler::Reconciler;
pub use report::{Action, DashboardReport, DatasourceReport, EdgeReport, FolderReport, RunReport};
pub use template::{DashboardTemplate, TemplateValues};
