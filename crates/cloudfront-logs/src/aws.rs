// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! S3 and CloudWatch Logs implementations of the collaborator traits.
//!
//! SDK failures are classified by their service error code:
//! - `InvalidSequenceTokenException` and `DataAlreadyAcceptedException` mean the
//!   token sent with `PutLogEvents` is stale and become [`AppendError::TokenMismatch`]
//! - `ResourceAlreadyExistsException` from `CreateLogStream` is success
//! - `NoSuchKey` from `GetObject` becomes [`SourceError::NotFound`]
//! - timeouts and dispatch failures are transport errors, everything else a rejection

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudwatchlogs::operation::put_log_events::PutLogEventsError;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use bytes::Bytes;
use tracing::debug;

use crate::config::ForwarderConfig;
use crate::destination::{
    select_stream, DeliveryToken, EventAppender, ObjectSource, StreamDescriptor, StreamDirectory,
};
use crate::errors::{AppendError, DirectoryError, SourceError};
use crate::sequencer::LogEvent;

const TOKEN_MISMATCH_CODES: [&str; 2] = [
    "InvalidSequenceTokenException",
    "DataAlreadyAcceptedException",
];
const ALREADY_EXISTS_CODE: &str = "ResourceAlreadyExistsException";
const NO_SUCH_KEY_CODE: &str = "NoSuchKey";

/// SDK clients sharing one loaded AWS configuration.
#[derive(Debug, Clone)]
pub struct AwsClients {
    pub s3: aws_sdk_s3::Client,
    pub logs: aws_sdk_cloudwatchlogs::Client,
}

impl AwsClients {
    /// Loads credentials and region from the default provider chain, applying
    /// the region and endpoint overrides from `config`.
    pub async fn from_config(config: &ForwarderConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        // Path-style addressing so custom endpoints don't need bucket DNS.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        AwsClients {
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            logs: aws_sdk_cloudwatchlogs::Client::new(&sdk_config),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3ObjectSource {
    client: aws_sdk_s3::Client,
}

impl S3ObjectSource {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectSource for S3ObjectSource {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, SourceError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.code() == Some(NO_SUCH_KEY_CODE) {
                    SourceError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    SourceError::Backend(format!("{}", aws_sdk_s3::error::DisplayErrorContext(&e)))
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| SourceError::Backend(format!("Failed to read object body: {e}")))?;
        let data = body.into_bytes();
        debug!("Downloaded s3://{}/{} ({} bytes)", bucket, key, data.len());
        Ok(data)
    }
}

#[derive(Debug, Clone)]
pub struct CloudWatchLogsDirectory {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogsDirectory {
    pub fn new(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StreamDirectory for CloudWatchLogsDirectory {
    async fn describe_stream(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<StreamDescriptor>, DirectoryError> {
        let output = self
            .client
            .describe_log_streams()
            .log_group_name(group)
            .log_stream_name_prefix(name)
            .send()
            .await
            .map_err(|e| DirectoryError::Describe(format!("{}", DisplayErrorContext(&e))))?;

        #[allow(deprecated)]
        let streams = output
            .log_streams()
            .iter()
            .filter_map(|stream| {
                Some(StreamDescriptor {
                    name: stream.log_stream_name()?.to_string(),
                    upload_sequence_token: stream.upload_sequence_token().map(str::to_string),
                })
            })
            .collect();
        Ok(select_stream(streams, name))
    }

    async fn create_stream(&self, group: &str, name: &str) -> Result<(), DirectoryError> {
        match self
            .client
            .create_log_stream()
            .log_group_name(group)
            .log_stream_name(name)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.code() == Some(ALREADY_EXISTS_CODE) => {
                debug!("Log stream {}/{} already exists", group, name);
                Ok(())
            }
            Err(e) => Err(DirectoryError::Create(format!("{}", DisplayErrorContext(&e)))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudWatchLogsAppender {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogsAppender {
    pub fn new(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventAppender for CloudWatchLogsAppender {
    async fn append_events(
        &self,
        group: &str,
        stream: &str,
        events: &[LogEvent],
        token: &DeliveryToken,
    ) -> Result<Option<DeliveryToken>, AppendError> {
        let log_events = events
            .iter()
            .map(|event| {
                InputLogEvent::builder()
                    .timestamp(event.timestamp)
                    .message(event.message.clone())
                    .build()
                    .map_err(|e| AppendError::Rejected(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        #[allow(deprecated)]
        let output = self
            .client
            .put_log_events()
            .log_group_name(group)
            .log_stream_name(stream)
            .set_log_events(Some(log_events))
            .set_sequence_token(sequence_token(token))
            .send()
            .await
            .map_err(|e| classify_put_log_events_error(&e))?;

        #[allow(deprecated)]
        let next_token = output.next_sequence_token().map(DeliveryToken::new);
        Ok(next_token)
    }
}

/// The token to send with `PutLogEvents`; a stream never written to takes none.
fn sequence_token(token: &DeliveryToken) -> Option<String> {
    if token.is_initial() {
        None
    } else {
        Some(token.as_str().to_string())
    }
}

fn classify_put_log_events_error(err: &SdkError<PutLogEventsError>) -> AppendError {
    let message = format!("{}", DisplayErrorContext(err));
    match err {
        SdkError::ServiceError(service_err) => {
            classify_service_error_code(service_err.err().code(), message)
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            AppendError::Transport(message)
        }
        _ => AppendError::Rejected(message),
    }
}

fn classify_service_error_code(code: Option<&str>, message: String) -> AppendError {
    match code {
        Some(code) if TOKEN_MISMATCH_CODES.contains(&code) => AppendError::TokenMismatch(message),
        Some("ServiceUnavailableException" | "ThrottlingException") => {
            AppendError::Transport(message)
        }
        _ => AppendError::Rejected(message),
    }
}
