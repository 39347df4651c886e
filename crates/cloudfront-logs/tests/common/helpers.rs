// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use super::mocks::{MemoryLogGroup, MemoryObjectSource};
use bytes::Bytes;
use cloudfront_logs::{config::ForwarderConfig, processor::FileProcessor};
use flate2::{write::GzEncoder, Compression};
use std::io::Write;
use std::sync::Arc;

pub const BUCKET: &str = "cdn-logs";
pub const DISTRIBUTION_ID: &str = "E2ABCDEF123456";
pub const KEY: &str = "prod/E2ABCDEF123456.2019-12-04-21.a1b2c3d4.gz";

pub const FILE_HEADER: [&str; 2] = [
    "#Version: 1.0",
    "#Fields: date time x-edge-location sc-bytes c-ip cs-method cs(Host) cs-uri-stem sc-status cs(Referer) cs(User-Agent) cs-uri-query cs(Cookie) x-edge-result-type x-edge-request-id x-host-header cs-protocol cs-bytes time-taken x-forwarded-for ssl-protocol ssl-cipher x-edge-response-result-type cs-protocol-version fle-status fle-encrypted-fields",
];

/// A tab-separated access-log line with realistic values in every column
pub fn log_line(time: &str, client_ip: &str) -> String {
    [
        "2019-12-04",
        time,
        "FRA56-P5",
        "2313",
        client_ip,
        "GET",
        "d111111abcdef8.cloudfront.net",
        "/index.html",
        "200",
        "-",
        "Mozilla/5.0%20(X11)",
        "-",
        "-",
        "Hit",
        "SOX4xwn4XV6Q4rgb7XiVGOHms_BGlTAC4KyHmureZmBNrjGdRLiNIQ==",
        "d111111abcdef8.cloudfront.net",
        "https",
        "187",
        "0.082",
        "-",
        "TLSv1.3",
        "TLS_AES_128_GCM_SHA256",
        "Hit",
        "HTTP/2.0",
        "-",
        "-",
    ]
    .join("\t")
}

/// `count` lines one second apart starting at 21:00:00, client ips `10.0.0.<n>`
pub fn log_lines(count: usize) -> Vec<String> {
    (0..count)
        .map(|n| {
            let time = format!("21:{:02}:{:02}", n / 60, n % 60);
            log_line(&time, &format!("10.0.0.{n}"))
        })
        .collect()
}

/// Gzip-compresses the lines the way CloudFront writes its log files
pub fn gzip_file(lines: &[String]) -> Bytes {
    let mut contents = FILE_HEADER.join("\n");
    for line in lines {
        contents.push('\n');
        contents.push_str(line);
    }
    contents.push('\n');

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(contents.as_bytes())
        .expect("Failed to compress test file");
    Bytes::from(encoder.finish().expect("Failed to finish gzip stream"))
}

pub fn config(buffer_size: usize) -> ForwarderConfig {
    ForwarderConfig {
        buffer_size,
        ..Default::default()
    }
}

pub fn processor(
    config: &ForwarderConfig,
    source: Arc<MemoryObjectSource>,
    logs: Arc<MemoryLogGroup>,
) -> FileProcessor {
    FileProcessor::new(config, source, logs.clone(), logs)
}

/// Client ips of the published events, in append order
pub fn published_client_ips(logs: &MemoryLogGroup) -> Vec<String> {
    logs.stream_events(DISTRIBUTION_ID)
        .iter()
        .map(|event| {
            let message: serde_json::Value =
                serde_json::from_str(&event.message).expect("event message is not JSON");
            message["client_ip"]
                .as_str()
                .expect("client_ip is not a string")
                .to_string()
        })
        .collect()
}
