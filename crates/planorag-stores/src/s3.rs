//! AWS S3 object store.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use planorag_core::error::{ErrorCode, IngestError, IngestResult};
use planorag_core::traits::{ObjectStore, ObjectStoreConfig};

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

/// Lifetime of presigned GET URLs unless the caller picks another.
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// Virtual-hosted S3 URL of `key`.
pub fn s3_object_url(bucket: &str, region: &str, key: &str) -> String {
    append_key(&format!("https://{}.s3.{}.amazonaws.com", bucket, region), key)
}

/// Append `key` to `base`, percent-encoding each `/`-separated segment.
fn append_key(base: &str, key: &str) -> String {
    let mut parsed = match url::Url::parse(base) {
        Ok(parsed) => parsed,
        Err(_) => return format!("{}/{}", base.trim_end_matches('/'), key),
    };
    if let Ok(mut segments) = parsed.path_segments_mut() {
        segments.pop_if_empty().extend(key.split('/'));
    }
    parsed.to_string()
}

/// Object key of a URL produced by [`s3_object_url`] for `bucket`.
pub fn s3_key_from_url(bucket: &str, locator: &str) -> Option<String> {
    let parsed = url::Url::parse(locator).ok()?;
    let host = parsed.host_str()?;
    let rest = host.strip_prefix(bucket)?.strip_prefix(".s3")?;
    if !rest.ends_with(".amazonaws.com") {
        return None;
    }
    let segments = parsed
        .path_segments()?
        .map(|segment| urlencoding::decode(segment).ok().map(|s| s.into_owned()))
        .collect::<Option<Vec<_>>>()?;
    let key = segments.join("/");
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// S3 object store.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3ObjectStore {
    /// Create a new S3 store using the default AWS credential chain.
    pub async fn new(config: &ObjectStoreConfig) -> IngestResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(IngestError::Configuration("S3 bucket name required".to_string()));
        }

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint_url: config.endpoint_url.clone(),
        })
    }

    /// Create a store around an existing client.
    pub fn with_client(client: Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
            endpoint_url: None,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Time-limited GET URL for an object locator.
    ///
    /// Falls back to the locator itself when it does not belong to this
    /// bucket or signing fails.
    pub async fn presign_url(&self, locator: &str, expires_in: Duration) -> String {
        let key = match s3_key_from_url(&self.bucket, locator) {
            Some(key) => key,
            None => {
                warn!(locator = %locator, "Not an object of bucket {}; returning as is", self.bucket);
                return locator.to_string();
            }
        };

        let presigning = match PresigningConfig::expires_in(expires_in) {
            Ok(presigning) => presigning,
            Err(e) => {
                warn!(error = %e, "Invalid presign expiry");
                return locator.to_string();
            }
        };

        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
        {
            Ok(request) => request.uri().to_string(),
            Err(e) => {
                warn!(key = %key, "Failed to presign: {}", DisplayErrorContext(&e));
                locator.to_string()
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> IngestResult<()> {
        debug!(bucket = %self.bucket, key = %key, size = data.len(), "S3 put_object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| IngestError::Storage {
                message: format!("Failed to upload {}: {}", key, DisplayErrorContext(&e)),
                code: ErrorCode::StoUploadFailed,
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => {
                append_key(&format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket), key)
            }
            None => s3_object_url(&self.bucket, &self.region, key),
        }
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
