// src/storage/mod.rs

//! Object storage backend abstraction.
//!
//! The pipeline talks to an [`ObjectStore`] instead of an S3 client. The
//! production implementation is [`S3Store`]; tests plug in a recording fake.
//! Only three operations exist: the tool never lists or reads the bucket.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use thiserror::Error;
use tracing::{info, warn};

pub mod s3;

pub use s3::S3Store;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket '{0}' does not exist and auto-creation is disabled")]
    BucketMissing(String),

    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl StorageError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        StorageError::Backend {
            operation,
            message: message.into(),
        }
    }
}

/// Boxed future returned by [`ObjectStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// One upload: the file at `source` becomes object `key` in `bucket`.
#[derive(Debug, Clone, Copy)]
pub struct PutObject<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub source: &'a Path,
    pub content_type: &'a str,
}

/// Trait abstracting the storage backend.
pub trait ObjectStore: Send + Sync + 'static {
    fn bucket_exists<'a>(&'a self, bucket: &'a str) -> StoreFuture<'a, bool>;

    fn create_bucket<'a>(&'a self, bucket: &'a str, region: &'a str) -> StoreFuture<'a, ()>;

    /// Stream the source file into the bucket, creating or overwriting the
    /// object and recording `content_type` as its metadata.
    fn put_object<'a>(&'a self, request: PutObject<'a>) -> StoreFuture<'a, ()>;
}

/// Make sure `bucket` exists before any job is scheduled.
pub async fn ensure_bucket<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
    region: &str,
    create_if_missing: bool,
) -> Result<(), StorageError> {
    if store.bucket_exists(bucket).await? {
        return Ok(());
    }

    if !create_if_missing {
        warn!(bucket, "bucket does not exist");
        return Err(StorageError::BucketMissing(bucket.to_string()));
    }

    store.create_bucket(bucket, region).await?;
    info!(bucket, region, "bucket was successfully created");
    Ok(())
}
