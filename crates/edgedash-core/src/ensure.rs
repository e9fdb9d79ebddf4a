// Lookup-then-create, shared by every reconciler that keys a resource by a
// stable identifier.

use std::future::Future;

use tracing::info;

use crate::error::{CoreError, ResourceKind};

/// A resource that is known to exist after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensured<T> {
    pub value: T,
    /// `true` if this run created the resource.
    pub created: bool,
}

/// Make sure the resource identified by `key` exists.
///
/// `lookup` runs first. If it succeeds the existing value is returned
/// untouched. If it fails with a 404, `create` runs and its value is
/// returned. Any other lookup error is returned without attempting creation.
pub async fn ensure_exists<T, L, LFut, C, CFut>(
    kind: ResourceKind,
    key: &str,
    lookup: L,
    create: C,
) -> Result<Ensured<T>, CoreError>
where
    L: FnOnce() -> LFut,
    LFut: Future<Output = Result<T, edgedash_api::Error>>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = Result<T, CoreError>>,
{
    match lookup().await {
        Ok(value) => {
            info!(%kind, key, "already exists");
            Ok(Ensured {
                value,
                created: false,
            })
        }
        Err(err) if err.is_not_found() => {
            info!(%kind, key, "not found, creating");
            let value = create().await?;
            Ok(Ensured {
                value,
                created: true,
            })
        }
        Err(source) => Err(CoreError::api(kind, key, source)),
    }
}
