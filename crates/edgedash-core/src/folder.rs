// Folder reconciliation. The folder is created once and never updated:
// a folder found under the configured uid is accepted whatever its title.

use tracing::info;

use edgedash_api::{Folder, GrafanaClient, NewFolder};

use crate::config::FolderSpec;
use crate::ensure::{Ensured, ensure_exists};
use crate::error::{CoreError, ResourceKind};

pub async fn ensure_folder(
    client: &GrafanaClient,
    spec: &FolderSpec,
) -> Result<Ensured<Folder>, CoreError> {
    ensure_exists(
        ResourceKind::Folder,
        &spec.uid,
        move || client.get_folder(&spec.uid),
        move || async move {
            let body = NewFolder {
                uid: spec.uid.clone(),
                title: spec.title.clone(),
            };
            let folder = client
                .create_folder(&body)
                .await
                .map_err(|source| CoreError::api(ResourceKind::Folder, &spec.uid, source))?;
            info!(
                uid = %folder.uid,
                title = %folder.title,
                url = folder.url.as_deref().unwrap_or(""),
                "created folder"
            );
            Ok::<_, CoreError>(folder)
        },
    )
    .await
}
