use futures::future::{join_all, try_join_all};
use object_store::path::Path;
use object_store::{MultipartUpload, ObjectStore, PutPayload};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trends_core::config::StorageConfig;
use trends_core::{CoreError, Dataset, PublishError};
use uuid::Uuid;

/// Live key of the dataset with comment bodies.
pub const FULL_DATA_KEY: &str = "full-data.json";
/// Live key of the dataset with comments stripped.
pub const SMALL_DATA_KEY: &str = "small-data.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifact {
    pub key: String,
    pub bytes: usize,
}

#[derive(Debug, Clone)]
pub struct PublishReport {
    pub run_id: Uuid,
    pub artifacts: Vec<PublishedArtifact>,
}

struct Artifact {
    key: &'static str,
    body: Vec<u8>,
}

/// Writes the dataset artifacts to an object store.
///
/// Both artifacts are first uploaded under `{staging_prefix}/{run_id}/` and
/// only copied onto the live keys once both uploads finished, so a failed
/// upload leaves the previously published pair in place.
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    chunk_size: usize,
    staging_prefix: String,
}

impl Publisher {
    pub fn new(store: Arc<dyn ObjectStore>, config: &StorageConfig) -> Self {
        Self {
            store,
            chunk_size: config.multipart_chunk_bytes,
            staging_prefix: config.staging_prefix.clone(),
        }
    }

    pub async fn publish(&self, dataset: &Dataset) -> Result<PublishReport, CoreError> {
        let run_id = Uuid::new_v4();
        let artifacts = [
            Artifact {
                key: FULL_DATA_KEY,
                body: serde_json::to_vec(dataset)?,
            },
            Artifact {
                key: SMALL_DATA_KEY,
                body: serde_json::to_vec(&dataset.small())?,
            },
        ];

        let staged: Vec<Path> = artifacts
            .iter()
            .map(|artifact| self.staging_path(run_id, artifact.key))
            .collect();

        let results = join_all(
            artifacts
                .iter()
                .zip(&staged)
                .map(|(artifact, path)| self.stage(artifact, path)),
        )
        .await;

        let mut uploaded = Vec::with_capacity(staged.len());
        let mut failure = None;
        for (path, result) in staged.iter().zip(results) {
            match result {
                Ok(()) => uploaded.push(path.clone()),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(error) = failure {
            self.discard_staging(&uploaded).await;
            return Err(error);
        }
        info!(%run_id, "Staged artifacts");

        let promoted = try_join_all(
            artifacts
                .iter()
                .zip(&staged)
                .map(|(artifact, path)| self.promote(path, artifact.key)),
        )
        .await;
        self.discard_staging(&staged).await;
        promoted?;

        let artifacts: Vec<PublishedArtifact> = artifacts
            .iter()
            .map(|artifact| PublishedArtifact {
                key: artifact.key.to_string(),
                bytes: artifact.body.len(),
            })
            .collect();
        for artifact in &artifacts {
            info!(%run_id, key = %artifact.key, bytes = artifact.bytes, "Published artifact");
        }

        Ok(PublishReport { run_id, artifacts })
    }

    fn staging_path(&self, run_id: Uuid, key: &str) -> Path {
        Path::from(format!("{}/{}/{}", self.staging_prefix, run_id, key))
    }

    /// A failed upload is aborted so no orphaned parts stay behind.
    async fn stage(&self, artifact: &Artifact, path: &Path) -> Result<(), CoreError> {
        let upload_error = |e: object_store::Error| PublishError::Upload {
            key: path.to_string(),
            reason: e.to_string(),
        };

        let mut upload = self.store.put_multipart(path).await.map_err(upload_error)?;
        if let Err(e) = upload_parts(upload.as_mut(), &artifact.body, self.chunk_size).await {
            if let Err(abort_error) = upload.abort().await {
                warn!(path = %path, error = %abort_error, "Failed to abort multipart upload");
            }
            return Err(upload_error(e).into());
        }

        debug!(path = %path, bytes = artifact.body.len(), "Uploaded staged artifact");
        Ok(())
    }

    async fn promote(&self, staged: &Path, key: &str) -> Result<(), CoreError> {
        self.store
            .copy(staged, &Path::from(key))
            .await
            .map_err(|e| PublishError::Promote {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn discard_staging(&self, staged: &[Path]) {
        let results = join_all(staged.iter().map(|path| self.store.delete(path))).await;
        for (path, result) in staged.iter().zip(results) {
            if let Err(e) = result {
                warn!(path = %path, error = %e, "Failed to remove staged artifact");
            }
        }
    }
}

async fn upload_parts(
    upload: &mut dyn MultipartUpload,
    body: &[u8],
    chunk_size: usize,
) -> object_store::Result<()> {
    let parts: Vec<_> = body
        .chunks(chunk_size.max(1))
        .map(|chunk| upload.put_part(PutPayload::from(chunk.to_vec())))
        .collect();
    try_join_all(parts).await?;
    upload.complete().await?;
    Ok(())
}
