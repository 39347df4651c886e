// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of sequenced batches under the stream's sequence-token protocol.
//!
//! Every append must carry the token returned by the previous append. A
//! [`PublishSession`] owns that token for one destination stream: it adopts the
//! token returned by each successful append, and when an append is rejected
//! because the token is stale it reloads the token from the stream descriptor
//! and sends the same events again, up to `retry_attempts` times per batch.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::aggregator::Batch;
use crate::destination::{select_stream, DeliveryToken, EventAppender, StreamDirectory};
use crate::errors::{AppendError, DirectoryError, PublishError};
use crate::sequencer::{self, LogEvent};

#[derive(Clone)]
pub struct Publisher {
    directory: Arc<dyn StreamDirectory>,
    appender: Arc<dyn EventAppender>,
    log_group: String,
    retry_attempts: u32,
}

pub struct PublisherConfig {
    pub directory: Arc<dyn StreamDirectory>,
    pub appender: Arc<dyn EventAppender>,
    pub log_group: String,
    pub retry_attempts: u32,
}

impl Publisher {
    pub fn new(config: PublisherConfig) -> Self {
        Publisher {
            directory: config.directory,
            appender: config.appender,
            log_group: config.log_group,
            retry_attempts: config.retry_attempts.max(1),
        }
    }

    pub fn log_group(&self) -> &str {
        &self.log_group
    }

    /// Makes sure `stream` exists and starts a session with its current token.
    pub async fn open(&self, stream: &str) -> Result<PublishSession, DirectoryError> {
        let descriptor = match self.describe(stream).await? {
            Some(descriptor) => descriptor,
            None => {
                info!("Creating log stream {}/{}", self.log_group, stream);
                self.directory.create_stream(&self.log_group, stream).await?;
                self.describe(stream)
                    .await?
                    .ok_or_else(|| DirectoryError::NotProvisioned {
                        group: self.log_group.clone(),
                        stream: stream.to_string(),
                    })?
            }
        };

        let token = descriptor.delivery_token();
        debug!(
            "Opened log stream {}/{} at sequence token {}",
            self.log_group, stream, token
        );
        Ok(PublishSession {
            publisher: self.clone(),
            stream: stream.to_string(),
            token,
        })
    }

    async fn describe(
        &self,
        stream: &str,
    ) -> Result<Option<crate::destination::StreamDescriptor>, DirectoryError> {
        let descriptor = self.directory.describe_stream(&self.log_group, stream).await?;
        Ok(descriptor.and_then(|d| select_stream(vec![d], stream)))
    }
}

/// Publishing state for one destination stream during one run.
pub struct PublishSession {
    publisher: Publisher,
    stream: String,
    token: DeliveryToken,
}

impl PublishSession {
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// The token the next append will be sent with.
    pub fn token(&self) -> &DeliveryToken {
        &self.token
    }

    /// Serializes and publishes a drained batch.
    pub async fn publish_batch(&mut self, batch: &Batch) -> Result<DeliveryToken, PublishError> {
        let events = sequencer::serialize(batch)?;
        self.publish(&events).await
    }

    /// Appends `events` with the current token, refreshing it on rejection.
    ///
    /// Returns the token to use for the next append. An empty slice is not sent.
    pub async fn publish(&mut self, events: &[LogEvent]) -> Result<DeliveryToken, PublishError> {
        if events.is_empty() {
            return Ok(self.token.clone());
        }

        let retry_attempts = self.publisher.retry_attempts;
        for attempt in 1..=retry_attempts {
            let result = self
                .publisher
                .appender
                .append_events(
                    &self.publisher.log_group,
                    &self.stream,
                    events,
                    &self.token,
                )
                .await;

            match result {
                Ok(next_token) => {
                    if let Some(next_token) = next_token {
                        self.token = next_token;
                    }
                    debug!(
                        "Sent {} log events to {}/{} (attempt {})",
                        events.len(),
                        self.publisher.log_group,
                        self.stream,
                        attempt
                    );
                    return Ok(self.token.clone());
                }
                Err(AppendError::TokenMismatch(reason)) => {
                    warn!(
                        "Invalid sequence token for {}/{} (attempt {}/{}): {}. Try to renew.",
                        self.publisher.log_group, self.stream, attempt, retry_attempts, reason
                    );
                    self.refresh_token().await?;
                }
                Err(e) => {
                    error!(
                        "Failed to send {} log events to {}/{}: {}",
                        events.len(),
                        self.publisher.log_group,
                        self.stream,
                        e
                    );
                    return Err(PublishError::Append(e));
                }
            }
        }

        Err(PublishError::RetriesExhausted {
            attempts: retry_attempts,
        })
    }

    async fn refresh_token(&mut self) -> Result<(), PublishError> {
        let descriptor = self
            .publisher
            .describe(&self.stream)
            .await
            .map_err(PublishError::Refresh)?;
        self.token = match descriptor {
            Some(descriptor) => descriptor.delivery_token(),
            None => DeliveryToken::initial(),
        };
        debug!("Renewed sequence token for {}: {}", self.stream, self.token);
        Ok(())
    }
}
