//! Amazon S3 store over `aws-sdk-s3`.
//!
//! SDK errors are folded into [`StoreError`] so the pipeline can report
//! whether a failure is worth retrying without knowing about the SDK:
//!
//! | SDK error | `StoreError` |
//! |---|---|
//! | `NoSuchKey` / `NotFound` | `NotFound` |
//! | `AccessDenied` / `Forbidden` | `AccessDenied` |
//! | timeout, dispatch failure, unreadable response, throttling codes, any 5xx status | `Transient` |
//! | anything else | `Permanent` |

use super::{FetchedObject, ObjectStore, StoreError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::debug;

/// Error codes S3 documents as safe to retry.
const TRANSIENT_CODES: &[&str] = &[
    "SlowDown",
    "InternalError",
    "ServiceUnavailable",
    "RequestTimeout",
    "RequestTimeTooSkewed",
    "Throttling",
];

pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS environment (region, credentials).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

fn classify<E>(err: SdkError<E, HttpResponse>, bucket: &str, key: &str) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            StoreError::Transient(message)
        }
        SdkError::ServiceError(ctx) => match ctx.err().code() {
            Some("NoSuchKey") | Some("NotFound") | Some("NoSuchBucket") => StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            Some("AccessDenied") | Some("Forbidden") => StoreError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            Some(code) if TRANSIENT_CODES.contains(&code) => StoreError::Transient(message),
            _ if ctx.raw().status().is_server_error() => StoreError::Transient(message),
            _ => StoreError::Permanent(message),
        },
        _ => StoreError::Permanent(message),
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<FetchedObject, StoreError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, bucket, key))?;

        let content_type = response.content_type().map(str::to_string);
        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Transient(format!("failed to read object body: {e}")))?
            .into_bytes();

        debug!(bucket, key, bytes = body.len(), "Fetched object");
        Ok(FetchedObject { body, content_type })
    }

    async fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let len = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(e, bucket, key))?;

        debug!(bucket, key, bytes = len, "Stored object");
        Ok(())
    }
}
