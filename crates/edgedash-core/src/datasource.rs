//! Per-edge data source reconciliation.
//!
//! Each edge gets one Prometheus data source named `prefix + edge` that
//! queries the shared Mimir endpoint with the edge as tenant header value.
//! A data source found under that name is returned as-is; manual edits to it
//! are never overwritten.

use tracing::info;

use edgedash_api::{DatasourceJsonData, GrafanaClient, NewDatasource, SecureJsonData};

use crate::config::{DatasourceSettings, Edge, PemMaterial};
use crate::ensure::{Ensured, ensure_exists};
use crate::error::{CoreError, ResourceKind};

const DATASOURCE_TYPE: &str = "prometheus";
const DATASOURCE_ACCESS: &str = "proxy";

/// Build the creation payload for an edge's data source.
///
/// Certificate fields are only emitted for material that is present.
pub fn datasource_payload(edge: &Edge, settings: &DatasourceSettings) -> NewDatasource {
    let tls = &settings.tls;
    let pem = |slot: &Option<PemMaterial>| slot.as_ref().map(|m| m.expose().to_owned());

    NewDatasource {
        name: settings.datasource_name(edge),
        kind: DATASOURCE_TYPE.into(),
        access: DATASOURCE_ACCESS.into(),
        url: settings.proxy_url.to_string(),
        is_default: false,
        editable: true,
        json_data: DatasourceJsonData {
            http_header_name1: settings.tenant_header.clone(),
            tls_auth: tls.tls_auth(),
            tls_auth_with_ca_cert: tls.tls_auth_with_ca_cert(),
        },
        secure_json_data: SecureJsonData {
            http_header_value1: edge.as_str().to_owned(),
            tls_ca_cert: pem(&tls.ca_cert),
            tls_client_cert: pem(&tls.client_cert),
            tls_client_key: pem(&tls.client_key),
        },
    }
}

/// Make sure the edge's data source exists and return its uid.
pub async fn ensure_datasource(
    client: &GrafanaClient,
    edge: &Edge,
    settings: &DatasourceSettings,
) -> Result<Ensured<String>, CoreError> {
    let name = settings.datasource_name(edge);
    let key = name.as_str();

    ensure_exists(
        ResourceKind::Datasource,
        key,
        move || async move {
            client.get_datasource_by_name(key).await.map(|ds| {
                info!(name = key, id = ?ds.id, uid = %ds.uid, "using existing datasource");
                ds.uid
            })
        },
        move || async move {
            let body = datasource_payload(edge, settings);
            let created = client
                .create_datasource(&body)
                .await
                .map_err(|source| CoreError::api(ResourceKind::Datasource, key, source))?;
            let uid = created
                .uid()
                .ok_or_else(|| CoreError::MissingUid {
                    kind: ResourceKind::Datasource,
                    key: key.to_owned(),
                })?
                .to_owned();
            info!(name = key, id = ?created.id, uid = %uid, "created datasource");
            Ok::<_, CoreError>(uid)
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::config::{DEFAULT_TENANT_HEADER, TlsMaterial};

    fn settings(tls: TlsMaterial) -> DatasourceSettings {
        DatasourceSettings {
            name_prefix: "Mimir - ".into(),
            proxy_url: Url::parse("https://mimir:9009/prometheus").unwrap(),
            tenant_header: DEFAULT_TENANT_HEADER.into(),
            tls,
        }
    }

    fn pem(s: &str) -> Option<PemMaterial> {
        PemMaterial::new(s.to_owned())
    }

    #[test]
    fn payload_without_certificates() {
        let edge = Edge::new("edge-a").unwrap();
        let body = serde_json::to_value(datasource_payload(&edge, &settings(TlsMaterial::default())))
            .unwrap();
        assert_eq!(
            body,
            json!({
                "name": "Mimir - edge-a",
                "type": "prometheus",
                "access": "proxy",
                "url": "https://mimir:9009/prometheus",
                "isDefault": false,
                "editable": true,
                "jsonData": {
                    "httpHeaderName1": "X-Scope-OrgID",
                    "tlsAuth": false,
                    "tlsAuthWithCACert": false
                },
                "secureJsonData": { "httpHeaderValue1": "edge-a" }
            })
        );
    }

    #[test]
    fn payload_with_full_mtls_material() {
        let edge = Edge::new("edge-b").unwrap();
        let tls = TlsMaterial {
            ca_cert: pem("CA"),
            client_cert: pem("CERT"),
            client_key: pem("KEY"),
        };
        let body = serde_json::to_value(datasource_payload(&edge, &settings(tls))).unwrap();
        assert_eq!(body["jsonData"]["tlsAuth"], json!(true));
        assert_eq!(body["jsonData"]["tlsAuthWithCACert"], json!(true));
        assert_eq!(
            body["secureJsonData"],
            json!({
                "httpHeaderValue1": "edge-b",
                "tlsCACert": "CA",
                "tlsClientCert": "CERT",
                "tlsClientKey": "KEY"
            })
        );
    }

    #[test]
    fn client_cert_without_key_does_not_enable_tls_auth() {
        let edge = Edge::new("edge-c").unwrap();
        let tls = TlsMaterial {
            ca_cert: None,
            client_cert: pem("CERT"),
            client_key: None,
        };
        let body = serde_json::to_value(datasource_payload(&edge, &settings(tls))).unwrap();
        assert_eq!(body["jsonData"]["tlsAuth"], json!(false));
        assert_eq!(body["jsonData"]["tlsAuthWithCACert"], json!(false));
        assert_eq!(
            body["secureJsonData"],
            json!({ "httpHeaderValue1": "edge-c", "tlsClientCert": "CERT" })
        );
    }

    #[test]
    fn ca_only_sets_ca_flag() {
        let edge = Edge::new("edge-d").unwrap();
        let tls = TlsMaterial {
            ca_cert: pem("CA"),
            client_cert: None,
            client_key: None,
        };
        let body = serde_json::to_value(datasource_payload(&edge, &settings(tls))).unwrap();
        assert_eq!(body["jsonData"]["tlsAuth"], json!(false));
        assert_eq!(body["jsonData"]["tlsAuthWithCACert"], json!(true));
        assert!(body["secureJsonData"].get("tlsClientKey").is_none());
    }
}
