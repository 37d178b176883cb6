//! Typed client for Supabase object storage.
//!
//! Upload: `POST /storage/v1/object/{bucket}/{path}` with the raw bytes as
//! body. Public objects are served from
//! `/storage/v1/object/public/{bucket}/{path}`.
//!
//! Report images never overwrite (`x-upsert: false`); badge artwork is
//! re-imported in place with [`SupabaseStorage::with_upsert`].

use reqwest::header::CONTENT_TYPE;
use streetcred_rewards::{BlobError, BlobStore};

use crate::error::ClientError;
use crate::retry::{self, Retry};

const STORAGE_PREFIX: &str = "storage/v1/object";

/// Client for one storage bucket.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: url::Url,
    bucket: String,
    upsert: bool,
}

impl SupabaseStorage {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url, bucket: String) -> Self {
        Self {
            http,
            base_url,
            bucket,
            upsert: false,
        }
    }

    /// The same project and credentials, pointed at another bucket.
    pub fn for_bucket(&self, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..self.clone()
        }
    }

    /// Replace existing objects instead of rejecting the upload.
    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ClientError> {
        let endpoint = format!("POST /{STORAGE_PREFIX}/{}", self.bucket);
        let url = format!("{}/{STORAGE_PREFIX}/{}/{path}", self.base(), self.bucket);

        let resp = retry::send(Retry::ConnectOnly, || {
            self.http
                .post(&url)
                .header(CONTENT_TYPE, content_type)
                .header("x-upsert", if self.upsert { "true" } else { "false" })
                .body(bytes.clone())
                .send()
        })
        .await
        .map_err(|e| ClientError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                endpoint,
                status,
                body,
            });
        }
        Ok(())
    }
}

impl BlobStore for SupabaseStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        self.put_object(path, bytes, content_type)
            .await
            .map_err(|e| e.into_blob_error(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{STORAGE_PREFIX}/public/{}/{path}", self.base(), self.bucket)
    }
}
