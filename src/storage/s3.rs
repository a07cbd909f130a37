// src/storage/s3.rs

//! S3 / MinIO backend built on `aws-sdk-s3`.

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tracing::debug;

use crate::config::StorageSettings;

use super::{ObjectStore, PutObject, StorageError, StoreFuture};

/// Region that must not be sent as a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// Real storage backend used in production.
///
/// Path-style addressing is forced so self-hosted endpoints (MinIO) work
/// without wildcard DNS.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(settings: &StorageSettings) -> Self {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "cronbackup-static",
        );

        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .endpoint_url(settings.endpoint_url())
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(config),
        }
    }
}

impl ObjectStore for S3Store {
    fn bucket_exists<'a>(&'a self, bucket: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            match self.client.head_bucket().bucket(bucket).send().await {
                Ok(_) => Ok(true),
                Err(err) => match err.as_service_error() {
                    Some(service) if service.is_not_found() => Ok(false),
                    _ => Err(StorageError::backend(
                        "head_bucket",
                        DisplayErrorContext(&err).to_string(),
                    )),
                },
            }
        })
    }

    fn create_bucket<'a>(&'a self, bucket: &'a str, region: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut request = self.client.create_bucket().bucket(bucket);
            if region != DEFAULT_REGION {
                request = request.create_bucket_configuration(
                    CreateBucketConfiguration::builder()
                        .location_constraint(BucketLocationConstraint::from(region))
                        .build(),
                );
            }

            request.send().await.map_err(|err| {
                StorageError::backend("create_bucket", DisplayErrorContext(&err).to_string())
            })?;
            Ok(())
        })
    }

    fn put_object<'a>(&'a self, request: PutObject<'a>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let body = ByteStream::from_path(request.source).await.map_err(|err| {
                StorageError::backend(
                    "put_object",
                    format!("opening {:?}: {}", request.source, err),
                )
            })?;

            let output = self
                .client
                .put_object()
                .bucket(request.bucket)
                .key(request.key)
                .content_type(request.content_type)
                .body(body)
                .send()
                .await
                .map_err(|err| {
                    StorageError::backend("put_object", DisplayErrorContext(&err).to_string())
                })?;

            debug!(
                bucket = request.bucket,
                key = request.key,
                etag = output.e_tag().unwrap_or_default(),
                "object stored"
            );
            Ok(())
        })
    }
}
