// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! S3 event notifications that announce new access-log objects.

use serde::Deserialize;
use tracing::{debug, error};

use crate::errors::ProcessError;
use crate::processor::{record_count, FileProcessor, FileReport};
use crate::util;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Object {
    /// Form-encoded object key, see [`util::decode_object_key`].
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Result of forwarding one object named in a notification.
#[derive(Debug)]
pub struct ObjectOutcome {
    pub bucket: String,
    pub key: String,
    pub result: Result<FileReport, ProcessError>,
}

impl ObjectOutcome {
    /// Record count, or `-1` if the file was aborted.
    pub fn record_count(&self) -> i64 {
        record_count(&self.result)
    }
}

/// Forwards every object in `event`, one after another.
pub async fn handle_event(processor: &FileProcessor, event: &S3Event) -> Vec<ObjectOutcome> {
    let mut outcomes = Vec::with_capacity(event.records.len());
    for record in &event.records {
        let bucket = record.s3.bucket.name.clone();
        let raw_key = &record.s3.object.key;
        debug!(
            "Received {} for s3://{}/{}",
            record.event_name.as_deref().unwrap_or("event"),
            bucket,
            raw_key
        );

        let (key, result) = match util::decode_object_key(raw_key) {
            Some(key) => {
                let result = processor.process_file(&bucket, &key).await;
                (key, result)
            }
            None => (
                raw_key.clone(),
                Err(ProcessError::InvalidKey(raw_key.clone())),
            ),
        };

        if let Err(e) = &result {
            error!("Failed to forward s3://{}/{}: {}", bucket, key, e);
        }
        outcomes.push(ObjectOutcome {
            bucket,
            key,
            result,
        });
    }
    outcomes
}
