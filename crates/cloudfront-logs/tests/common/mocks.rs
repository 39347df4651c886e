// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-ins for S3 and CloudWatch Logs

use bytes::Bytes;
use cloudfront_logs::{
    destination::{DeliveryToken, EventAppender, ObjectSource, StreamDescriptor, StreamDirectory},
    errors::{AppendError, DirectoryError, SourceError},
    sequencer::LogEvent,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Object store keyed by `(bucket, key)`
#[derive(Default)]
pub struct MemoryObjectSource {
    objects: Mutex<HashMap<(String, String), Bytes>>,
}

#[allow(dead_code)]
impl MemoryObjectSource {
    pub fn with_object(bucket: &str, key: &str, data: Bytes) -> Self {
        let source = Self::default();
        source.put(bucket, key, data);
        source
    }

    pub fn put(&self, bucket: &str, key: &str, data: Bytes) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data);
    }
}

#[async_trait::async_trait]
impl ObjectSource for MemoryObjectSource {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, SourceError> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct AppendCall {
    pub stream: String,
    pub token: String,
    pub events: Vec<LogEvent>,
    pub accepted: bool,
}

#[derive(Default)]
struct LogStreamState {
    token: Option<String>,
    events: Vec<LogEvent>,
}

#[derive(Default)]
struct LogGroupState {
    streams: HashMap<String, LogStreamState>,
    next_token: u64,
    forced_mismatches: u32,
    reject_appends: Option<AppendError>,
    describe_calls: u32,
    create_calls: u32,
    append_calls: Vec<AppendCall>,
}

impl LogGroupState {
    fn append(
        &mut self,
        stream: &str,
        events: &[LogEvent],
        token: &DeliveryToken,
    ) -> Result<Option<DeliveryToken>, AppendError> {
        if let Some(error) = self.reject_appends.clone() {
            return Err(error);
        }
        if self.forced_mismatches > 0 {
            self.forced_mismatches -= 1;
            return Err(AppendError::TokenMismatch(
                "The given sequenceToken is invalid".to_string(),
            ));
        }

        self.next_token += 1;
        let next_token = format!("{:056}", self.next_token);
        let Some(target) = self.streams.get_mut(stream) else {
            return Err(AppendError::Rejected(format!(
                "The specified log stream does not exist: {stream}"
            )));
        };
        let expected = target.token.as_deref().unwrap_or("0");
        if token.as_str() != expected {
            return Err(AppendError::TokenMismatch(format!(
                "The next expected sequenceToken is: {expected}"
            )));
        }
        target.events.extend_from_slice(events);
        target.token = Some(next_token.clone());
        Ok(Some(DeliveryToken::new(next_token)))
    }
}

/// One log group that enforces the sequence-token protocol like CloudWatch Logs.
///
/// Every append must carry the stream's current token (`"0"` for a stream never
/// written to). Stale-token rejections and hard failures can be injected.
#[derive(Default)]
pub struct MemoryLogGroup {
    state: Mutex<LogGroupState>,
}

#[allow(dead_code)]
impl MemoryLogGroup {
    pub fn with_stream(name: &str, token: Option<&str>) -> Self {
        let group = Self::default();
        group.state.lock().unwrap().streams.insert(
            name.to_string(),
            LogStreamState {
                token: token.map(str::to_string),
                events: Vec::new(),
            },
        );
        group
    }

    /// Rejects the next `count` appends with a stale-token error.
    pub fn force_mismatches(&self, count: u32) {
        self.state.lock().unwrap().forced_mismatches = count;
    }

    /// Fails every following append with `error`.
    pub fn reject_appends(&self, error: AppendError) {
        self.state.lock().unwrap().reject_appends = Some(error);
    }

    pub fn has_stream(&self, name: &str) -> bool {
        self.state.lock().unwrap().streams.contains_key(name)
    }

    pub fn stream_events(&self, name: &str) -> Vec<LogEvent> {
        self.state
            .lock()
            .unwrap()
            .streams
            .get(name)
            .map(|s| s.events.clone())
            .unwrap_or_default()
    }

    pub fn append_calls(&self) -> Vec<AppendCall> {
        self.state.lock().unwrap().append_calls.clone()
    }

    /// Sizes of the appends that were accepted, in call order.
    pub fn accepted_batch_sizes(&self) -> Vec<usize> {
        self.append_calls()
            .iter()
            .filter(|call| call.accepted)
            .map(|call| call.events.len())
            .collect()
    }

    pub fn describe_calls(&self) -> u32 {
        self.state.lock().unwrap().describe_calls
    }

    pub fn create_calls(&self) -> u32 {
        self.state.lock().unwrap().create_calls
    }
}

#[async_trait::async_trait]
impl StreamDirectory for MemoryLogGroup {
    async fn describe_stream(
        &self,
        _group: &str,
        name: &str,
    ) -> Result<Option<StreamDescriptor>, DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.describe_calls += 1;
        Ok(state.streams.get(name).map(|stream| StreamDescriptor {
            name: name.to_string(),
            upload_sequence_token: stream.token.clone(),
        }))
    }

    async fn create_stream(&self, _group: &str, name: &str) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        state.streams.entry(name.to_string()).or_default();
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventAppender for MemoryLogGroup {
    async fn append_events(
        &self,
        _group: &str,
        stream: &str,
        events: &[LogEvent],
        token: &DeliveryToken,
    ) -> Result<Option<DeliveryToken>, AppendError> {
        let mut state = self.state.lock().unwrap();
        let result = state.append(stream, events, token);
        state.append_calls.push(AppendCall {
            stream: stream.to_string(),
            token: token.to_string(),
            events: events.to_vec(),
            accepted: result.is_ok(),
        });
        result
    }
}
