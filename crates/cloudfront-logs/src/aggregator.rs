// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Groups parsed records by timestamp until a batch is due.
//!
//! Access-log lines are not guaranteed to be written in time order, while the
//! destination stream expects each append to be sorted by timestamp. Records
//! are therefore bucketed by their millisecond timestamp and only released as a
//! whole, in ascending key order, once [`Aggregator::is_full`] reports that the
//! configured batch size has been reached (or the input is exhausted).
//!
//! Within one timestamp the insertion order is kept. CloudFront timestamps have
//! second resolution, so records from the same second keep their file order.

use std::collections::BTreeMap;

use crate::constants;
use crate::parser::{ParsedRecord, Timestamp};

/// Records sorted by timestamp ascending, stable within a timestamp.
pub type Batch = Vec<(Timestamp, ParsedRecord)>;

#[derive(Debug, Clone)]
pub struct Aggregator {
    records: BTreeMap<Timestamp, Vec<ParsedRecord>>,
    size: usize,
    max_batch_entries_size: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Aggregator::new(constants::BUFFER_SIZE)
    }
}

impl Aggregator {
    #[must_use]
    pub fn new(max_batch_entries_size: usize) -> Self {
        Aggregator {
            records: BTreeMap::new(),
            size: 0,
            max_batch_entries_size,
        }
    }

    /// Appends `record` to the sequence kept for `timestamp`.
    ///
    /// Returns `true` once the aggregate holds a full batch and should be drained.
    pub fn insert(&mut self, timestamp: Timestamp, record: ParsedRecord) -> bool {
        self.records.entry(timestamp).or_default().push(record);
        self.size += 1;
        self.is_full()
    }

    /// Empties the aggregate and returns every record in timestamp order.
    pub fn drain(&mut self) -> Batch {
        let records = std::mem::take(&mut self.records);
        let mut batch = Vec::with_capacity(self.size);
        self.size = 0;
        for (timestamp, entries) in records {
            batch.extend(entries.into_iter().map(|record| (timestamp, record)));
        }
        batch
    }

    /// Total number of records across all timestamps.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size >= self.max_batch_entries_size
    }

    pub fn max_batch_entries_size(&self) -> usize {
        self.max_batch_entries_size
    }
}
