// src/pipeline/upload.rs

use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use crate::pipeline::RunScope;
use crate::storage::{ObjectStore, PutObject, StorageError};

#[derive(Debug, Error)]
#[error("uploading '{key}' to bucket '{bucket}': {source}")]
pub struct UploadError {
    pub bucket: String,
    pub key: String,
    #[source]
    pub source: StorageError,
}

/// Push the artifact to the backend under `key`.
///
/// Remote side effect only; nothing local is touched. Failures are logged
/// here and returned; nothing is retried.
pub async fn dispatch_upload<S: ObjectStore + ?Sized>(
    store: &S,
    scope: &RunScope,
    bucket: &str,
    key: &str,
    source: &Path,
    content_type: &str,
) -> Result<(), UploadError> {
    let request = PutObject {
        bucket,
        key,
        source,
        content_type,
    };

    match store.put_object(request).await {
        Ok(()) => {
            info!(
                run_id = %scope.run_id,
                task = %scope.task,
                bucket,
                object = key,
                content_type,
                "artifact uploaded"
            );
            Ok(())
        }
        Err(source) => {
            error!(
                run_id = %scope.run_id,
                task = %scope.task,
                bucket,
                object = key,
                error = %source,
                "failed to upload the file to object storage"
            );
            Err(UploadError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })
        }
    }
}
