// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for every stage of the forwarding pipeline.

/// A single access-log line could not be turned into a record.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing column {index} ({field}): line has {columns} columns")]
    MissingColumn {
        field: &'static str,
        index: usize,
        columns: usize,
    },

    #[error("invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid response time '{0}'")]
    InvalidResponseTime(String),
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to encode record: {0}")]
pub struct SequenceError(#[from] pub serde_json::Error);

/// Fetching the raw log object failed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store error: {0}")]
    Backend(String),
}

/// Describing or provisioning the destination stream failed.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Failed to describe log streams: {0}")]
    Describe(String),

    #[error("Failed to create log stream: {0}")]
    Create(String),

    #[error("log stream {stream} in group {group} is missing after creation")]
    NotProvisioned { group: String, stream: String },
}

/// An append call was rejected or could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppendError {
    /// The sequence token sent with the call is no longer the stream's next position.
    #[error("sequence token rejected: {0}")]
    TokenMismatch(String),

    #[error("events rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("batch abandoned after {attempts} attempts with a stale sequence token")]
    RetriesExhausted { attempts: u32 },

    #[error("Failed to refresh sequence token: {0}")]
    Refresh(#[source] DirectoryError),

    #[error(transparent)]
    Append(AppendError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Terminal failure for one log file.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("cannot derive a distribution id from object key '{0}'")]
    InvalidKey(String),

    #[error("Failed to read input file: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to decompress input file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Error processing line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Failed to publish log events: {0}")]
    Publish(#[source] PublishError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
