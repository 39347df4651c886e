// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Number of parsed records that triggers a drain of the aggregate.
pub const BUFFER_SIZE: usize = 1_000;

/// Upper bound accepted for `buffer_size`; `PutLogEvents` takes at most this many events.
pub const MAX_BUFFER_SIZE: usize = 10_000;

/// Append attempts per batch before the batch is abandoned.
pub const RETRY_ATTEMPTS: u32 = 10;

pub const DEFAULT_LOG_GROUP: &str = "CloudFront";

/// Token used when the destination stream has never been written to.
pub const INITIAL_SEQUENCE_TOKEN: &str = "0";

/// Record count returned to the invocation glue when a file is aborted.
pub const ABORTED_RECORD_COUNT: i64 = -1;

pub const COMMENT_MARKER: char = '#';

pub const FIELD_SEPARATOR: char = '\t';

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
