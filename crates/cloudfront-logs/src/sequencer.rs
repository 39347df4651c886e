// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use crate::aggregator::Batch;
use crate::errors::SequenceError;
use crate::parser::Timestamp;

/// One entry of an append call: the record's timestamp and its JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    pub timestamp: Timestamp,
    pub message: String,
}

/// Encodes a drained batch, keeping its ascending timestamp order.
pub fn serialize(batch: &Batch) -> Result<Vec<LogEvent>, SequenceError> {
    batch
        .iter()
        .map(|(timestamp, record)| {
            Ok(LogEvent {
                timestamp: *timestamp,
                message: serde_json::to_string(record)?,
            })
        })
        .collect()
}
