//! Trigger event model.
//!
//! The pipeline is triggered by an S3-style object-created notification:
//!
//! ```json
//! {
//!   "Records": [{
//!     "eventName": "ObjectCreated:Put",
//!     "s3": {
//!       "bucket": { "name": "photos" },
//!       "object": { "key": "summer+trip/sunset.jpg", "size": 48213 }
//!     }
//!   }]
//! }
//! ```
//!
//! Every field is optional at the serde level so that a structurally valid but
//! incomplete payload produces a precise [`EventError`] instead of a generic
//! JSON error. Object keys arrive URL-encoded with `+` for spaces and are
//! decoded before any naming rule sees them.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event contains no records")]
    NoRecords,
    #[error("event record is missing {0}")]
    MissingField(&'static str),
    #[error("object key is not valid URL encoding: {0}")]
    MalformedKey(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3Record>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Record {
    pub event_name: Option<String>,
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Entity {
    pub bucket: Option<BucketEntity>,
    pub object: Option<ObjectEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BucketEntity {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectEntity {
    pub key: Option<String>,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

/// The one object an invocation is about, with its key already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

impl S3Event {
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build an event for a single object, as S3 would deliver it.
    pub fn for_object(bucket: &str, key: &str) -> Self {
        S3Event {
            records: vec![S3Record {
                event_name: Some("ObjectCreated:Put".to_string()),
                s3: Some(S3Entity {
                    bucket: Some(BucketEntity {
                        name: Some(bucket.to_string()),
                    }),
                    object: Some(ObjectEntity {
                        key: Some(encode_key(key)),
                        size: None,
                        content_type: None,
                    }),
                }),
            }],
        }
    }

    /// Extract the object of the first record.
    ///
    /// Records after the first are not processed; callers log them.
    pub fn object(&self) -> Result<ObjectRef, EventError> {
        let record = self.records.first().ok_or(EventError::NoRecords)?;
        let s3 = record.s3.as_ref().ok_or(EventError::MissingField("s3"))?;

        let bucket = s3
            .bucket
            .as_ref()
            .and_then(|b| b.name.as_deref())
            .filter(|name| !name.is_empty())
            .ok_or(EventError::MissingField("s3.bucket.name"))?;

        let object = s3
            .object
            .as_ref()
            .ok_or(EventError::MissingField("s3.object"))?;
        let raw_key = object
            .key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(EventError::MissingField("s3.object.key"))?;

        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key: decode_key(raw_key)?,
            size: object.size,
            content_type: object.content_type.clone(),
        })
    }
}

/// Decode an S3 notification key: `+` is a space, the rest is percent-encoding.
pub fn decode_key(raw: &str) -> Result<String, EventError> {
    let with_spaces = raw.replace('+', " ");
    urlencoding::decode(&with_spaces)
        .map(|s| s.into_owned())
        .map_err(|_| EventError::MalformedKey(raw.to_string()))
}

/// Inverse of [`decode_key`]; keeps `/` readable.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).replace("%20", "+"))
        .collect::<Vec<_>>()
        .join("/")
}
