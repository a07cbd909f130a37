use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cronbackup::storage::{ObjectStore, PutObject, StorageError, StoreFuture};

/// One `put_object` call as seen by [`RecordingStore`].
///
/// The body is read during the call, since the run removes its workspace
/// right after uploading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub bucket: String,
    pub key: String,
    pub source: PathBuf,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// A fake object store that:
/// - tracks which buckets exist
/// - records every upload together with the uploaded bytes
/// - can be told to fail uploads
#[derive(Debug, Default)]
pub struct RecordingStore {
    buckets: Mutex<HashSet<String>>,
    created: Mutex<Vec<(String, String)>>,
    puts: Mutex<Vec<RecordedPut>>,
    fail_puts: AtomicBool,
    exists_calls: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where `bucket` already exists.
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::default();
        store.buckets.lock().unwrap().insert(bucket.to_string());
        store
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }

    /// `(bucket, region)` pairs passed to `create_bucket`.
    pub fn created(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }
}

impl ObjectStore for RecordingStore {
    fn bucket_exists<'a>(&'a self, bucket: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.buckets.lock().unwrap().contains(bucket))
        })
    }

    fn create_bucket<'a>(&'a self, bucket: &'a str, region: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.buckets.lock().unwrap().insert(bucket.to_string());
            self.created
                .lock()
                .unwrap()
                .push((bucket.to_string(), region.to_string()));
            Ok(())
        })
    }

    fn put_object<'a>(&'a self, request: PutObject<'a>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            if self.fail_puts.load(Ordering::SeqCst) {
                return Err(StorageError::backend("put_object", "injected failure"));
            }

            let body = std::fs::read(request.source)
                .map_err(|e| StorageError::backend("put_object", e.to_string()))?;

            self.puts.lock().unwrap().push(RecordedPut {
                bucket: request.bucket.to_string(),
                key: request.key.to_string(),
                source: request.source.to_path_buf(),
                content_type: request.content_type.to_string(),
                body,
            });
            Ok(())
        })
    }
}
