use crate::keys::validate_key;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder, S3ConditionalPut};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutMode, PutOptions, PutPayload,
    Result as ObjectResult,
};

/// Credentials and addressing for an S3-compatible bucket
#[derive(Clone, Debug, Default)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Public URL prefix of the bucket, when served through a CDN or custom domain
    pub public_base_url: Option<String>,
}

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// Uploads use conditional puts so an existing object is never replaced.
    pub async fn new(settings: S3Settings) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(settings.region.clone())
            .with_bucket_name(settings.bucket.clone())
            .with_conditional_put(S3ConditionalPut::ETagMatch);

        if let (Some(key_id), Some(secret)) =
            (&settings.access_key_id, &settings.secret_access_key)
        {
            builder = builder
                .with_access_key_id(key_id.clone())
                .with_secret_access_key(secret.clone());
        }

        if let Some(ref endpoint) = settings.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let public_base_url = settings
            .public_base_url
            .clone()
            .unwrap_or_else(|| Self::default_base_url(&settings));

        Ok(S3Storage {
            store,
            bucket: settings.bucket,
            public_base_url,
        })
    }

    /// Default public URL prefix
    ///
    /// For AWS S3: https://{bucket}.s3.{region}.amazonaws.com
    /// For S3-compatible providers, path-style: {endpoint}/{bucket}
    fn default_base_url(settings: &S3Settings) -> String {
        if let Some(ref endpoint) = settings.endpoint_url {
            format!("{}/{}", endpoint.trim_end_matches('/'), settings.bucket)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com",
                settings.bucket, settings.region
            )
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_new(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> StorageResult<()> {
        validate_key(storage_key)?;

        let size = data.len() as u64;
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        attributes.insert(Attribute::CacheControl, cache_control.to_string().into());

        let options = PutOptions {
            mode: PutMode::Create,
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| match e {
            ObjectStoreError::AlreadyExists { .. } | ObjectStoreError::Precondition { .. } => {
                StorageError::AlreadyExists(storage_key.to_string())
            }
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(other.to_string())
            }
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        validate_key(storage_key)?;
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let stream = result
            .into_stream()
            .map(|chunk| chunk.map_err(|e| StorageError::DownloadFailed(e.to_string())));

        Ok(Box::pin(stream))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        validate_key(storage_key)?;
        let location = Path::from(storage_key.to_string());

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn health_check(&self) -> StorageResult<()> {
        // A missing marker object still proves the bucket is reachable.
        let marker = Path::from("cached/.health");
        match self.store.head(&marker).await {
            Ok(_) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn public_base_url(&self) -> Option<String> {
        Some(self.public_base_url.clone())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url_aws() {
        let settings = S3Settings {
            bucket: "trip-images".to_string(),
            region: "eu-west-1".to_string(),
            ..Default::default()
        };
        assert_eq!(
            S3Storage::default_base_url(&settings),
            "https://trip-images.s3.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_default_base_url_custom_endpoint() {
        let settings = S3Settings {
            bucket: "trip-images".to_string(),
            region: "auto".to_string(),
            endpoint_url: Some("http://localhost:9000/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            S3Storage::default_base_url(&settings),
            "http://localhost:9000/trip-images"
        );
    }

    #[tokio::test]
    async fn test_public_url_uses_configured_base() {
        let storage = S3Storage::new(S3Settings {
            bucket: "trip-images".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: Some("key".to_string()),
            secret_access_key: Some("secret".to_string()),
            public_base_url: Some("https://cdn.example.com/public".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(
            storage.public_url("cached/external/a.png").as_deref(),
            Some("https://cdn.example.com/public/cached/external/a.png")
        );
    }
}
