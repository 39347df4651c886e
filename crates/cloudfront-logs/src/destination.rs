// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Interfaces to the systems the forwarder reads from and writes to.
//!
//! The pipeline only talks to these traits; the AWS implementations live in
//! [`crate::aws`] and an on-disk object source in [`crate::local`].

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::constants::INITIAL_SEQUENCE_TOKEN;
use crate::errors::{AppendError, DirectoryError, SourceError};
use crate::sequencer::LogEvent;

/// The destination stream's expected next-write position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryToken(String);

impl DeliveryToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token for a stream that has never been written to.
    pub fn initial() -> Self {
        Self(INITIAL_SEQUENCE_TOKEN.to_string())
    }

    pub fn is_initial(&self) -> bool {
        self.0 == INITIAL_SEQUENCE_TOKEN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeliveryToken {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for DeliveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub name: String,
    pub upload_sequence_token: Option<String>,
}

impl StreamDescriptor {
    /// The stream's current token, or the initial token if it was never written to.
    pub fn delivery_token(&self) -> DeliveryToken {
        self.upload_sequence_token
            .as_deref()
            .map_or_else(DeliveryToken::initial, DeliveryToken::new)
    }
}

/// Picks the descriptor named exactly `name`.
///
/// Stream lookups are by prefix, so a lookup for `E123` may also return `E1234`.
pub fn select_stream(streams: Vec<StreamDescriptor>, name: &str) -> Option<StreamDescriptor> {
    streams.into_iter().find(|s| s.name == name)
}

/// Where raw, gzip-compressed log files are downloaded from.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, SourceError>;
}

/// Lookup and provisioning of destination streams.
#[async_trait]
pub trait StreamDirectory: Send + Sync {
    /// Returns the stream called `name`, if it exists.
    async fn describe_stream(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<StreamDescriptor>, DirectoryError>;

    /// Creates the stream. Creating a stream that already exists is not an error.
    async fn create_stream(&self, group: &str, name: &str) -> Result<(), DirectoryError>;
}

/// The token-guarded append API of the destination stream.
#[async_trait]
pub trait EventAppender: Send + Sync {
    /// Appends `events` in order and returns the token for the next append.
    async fn append_events(
        &self,
        group: &str,
        stream: &str,
        events: &[LogEvent],
        token: &DeliveryToken,
    ) -> Result<Option<DeliveryToken>, AppendError>;
}
