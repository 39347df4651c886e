// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards one gzip-compressed access-log object to its distribution's stream.

use std::io::{BufRead, BufReader};
use std::sync::Arc;

use flate2::read::MultiGzDecoder;
use tracing::{debug, error, info, warn};

use crate::aggregator::Aggregator;
use crate::config::ForwarderConfig;
use crate::constants::ABORTED_RECORD_COUNT;
use crate::destination::{EventAppender, ObjectSource, StreamDirectory};
use crate::errors::{ProcessError, PublishError};
use crate::parser::LineParser;
use crate::publisher::{PublishSession, Publisher, PublisherConfig};
use crate::util;

/// Outcome of a fully processed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub distribution_id: String,
    /// Records parsed from the file, comments excluded.
    pub records: usize,
    pub batches_published: usize,
    /// Batches dropped after every append attempt hit a stale token.
    pub abandoned_batches: usize,
    pub abandoned_records: usize,
}

pub struct FileProcessor {
    source: Arc<dyn ObjectSource>,
    publisher: Publisher,
    parser: LineParser,
    buffer_size: usize,
}

impl FileProcessor {
    pub fn new(
        config: &ForwarderConfig,
        source: Arc<dyn ObjectSource>,
        directory: Arc<dyn StreamDirectory>,
        appender: Arc<dyn EventAppender>,
    ) -> Self {
        let publisher = Publisher::new(PublisherConfig {
            directory,
            appender,
            log_group: config.log_group.clone(),
            retry_attempts: config.retry_attempts,
        });
        FileProcessor {
            source,
            publisher,
            parser: LineParser::default(),
            buffer_size: config.buffer_size.max(1),
        }
    }

    pub fn log_group(&self) -> &str {
        self.publisher.log_group()
    }

    /// Downloads `bucket/key`, parses every line and publishes the records in
    /// timestamp-sorted batches of at most `buffer_size` events.
    ///
    /// The first malformed line stops the file; batches published before it
    /// stay published.
    pub async fn process_file(&self, bucket: &str, key: &str) -> Result<FileReport, ProcessError> {
        let distribution_id =
            util::distribution_id(key).ok_or_else(|| ProcessError::InvalidKey(key.to_string()))?;
        debug!("Processing s3://{}/{} for distribution {}", bucket, key, distribution_id);

        let data = self.source.fetch(bucket, key).await?;
        let mut session = self.publisher.open(&distribution_id).await?;
        let mut aggregator = Aggregator::new(self.buffer_size);
        let mut report = FileReport {
            distribution_id,
            ..Default::default()
        };

        let reader = BufReader::new(MultiGzDecoder::new(data.as_ref()));
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                error!("Failed to decompress s3://{}/{}: {}", bucket, key, e);
                ProcessError::Read(e)
            })?;

            let parsed = self.parser.parse(&line).map_err(|source| {
                error!("Error processing line {} of s3://{}/{}: {}", index + 1, bucket, key, source);
                ProcessError::Parse {
                    line: index + 1,
                    source,
                }
            })?;
            let Some((timestamp, record)) = parsed else {
                continue;
            };

            report.records += 1;
            if aggregator.insert(timestamp, record) {
                flush(&mut aggregator, &mut session, &mut report).await?;
            }
        }
        flush(&mut aggregator, &mut session, &mut report).await?;

        info!(
            "Forwarded {} records from s3://{}/{} to {}/{} in {} batches",
            report.records,
            bucket,
            key,
            self.publisher.log_group(),
            report.distribution_id,
            report.batches_published
        );
        if report.abandoned_batches > 0 {
            warn!(
                "Dropped {} records in {} batches for {}",
                report.abandoned_records, report.abandoned_batches, report.distribution_id
            );
        }
        Ok(report)
    }
}

async fn flush(
    aggregator: &mut Aggregator,
    session: &mut PublishSession,
    report: &mut FileReport,
) -> Result<(), ProcessError> {
    if aggregator.is_empty() {
        return Ok(());
    }

    let batch = aggregator.drain();
    match session.publish_batch(&batch).await {
        Ok(_) => {
            report.batches_published += 1;
            Ok(())
        }
        Err(PublishError::RetriesExhausted { attempts }) => {
            warn!(
                "LOGS | Giving up on {} records for {} after {} attempts",
                batch.len(),
                session.stream(),
                attempts
            );
            report.abandoned_batches += 1;
            report.abandoned_records += batch.len();
            Ok(())
        }
        Err(e) => Err(ProcessError::Publish(e)),
    }
}

/// The number reported for a processed file: its record count, or `-1` if
/// the file was aborted.
pub fn record_count(result: &Result<FileReport, ProcessError>) -> i64 {
    match result {
        Ok(report) => i64::try_from(report.records).unwrap_or(i64::MAX),
        Err(_) => ABORTED_RECORD_COUNT,
    }
}
