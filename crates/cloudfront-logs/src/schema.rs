// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Column layout of CloudFront standard access logs.
//!
//! See <https://docs.aws.amazon.com/AmazonCloudFront/latest/DeveloperGuide/AccessLogs.html>.
//! Only the columns listed in a [`FieldSchema`] are read; everything else on the
//! line (host, cookie, request id, TLS details, ...) is never forwarded.

/// How a column contributes to the emitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `YYYY-MM-DD`, combined with [`FieldKind::Time`] into the event timestamp.
    Date,
    /// `HH:MM:SS`, combined with [`FieldKind::Date`] into the event timestamp.
    Time,
    /// Copied as-is under the column name.
    Verbatim,
    /// Fractional seconds converted to whole milliseconds under `output`.
    SecondsToMillis { output: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub index: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(name: &'static str, index: usize, kind: FieldKind) -> Self {
        Self { name, index, kind }
    }

    /// Key under which this column appears in the emitted record, if any.
    pub fn output_name(&self) -> Option<&'static str> {
        match self.kind {
            FieldKind::Date | FieldKind::Time => None,
            FieldKind::Verbatim => Some(self.name),
            FieldKind::SecondsToMillis { output } => Some(output),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub version: &'static str,
    pub fields: &'static [FieldSpec],
}

const V1_0_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("date", 0, FieldKind::Date),
    FieldSpec::new("time", 1, FieldKind::Time),
    FieldSpec::new("edge_location", 2, FieldKind::Verbatim),
    FieldSpec::new("bytes_sent", 3, FieldKind::Verbatim),
    FieldSpec::new("client_ip", 4, FieldKind::Verbatim),
    FieldSpec::new("http_method", 5, FieldKind::Verbatim),
    FieldSpec::new("query_path", 7, FieldKind::Verbatim),
    FieldSpec::new("status_code", 8, FieldKind::Verbatim),
    FieldSpec::new("referer", 9, FieldKind::Verbatim),
    FieldSpec::new("user_agent", 10, FieldKind::Verbatim),
    FieldSpec::new("query_string", 11, FieldKind::Verbatim),
    FieldSpec::new("edge_result_type", 13, FieldKind::Verbatim),
    FieldSpec::new("server_name", 15, FieldKind::Verbatim),
    FieldSpec::new("protocol", 16, FieldKind::Verbatim),
    FieldSpec::new("bytes_received", 17, FieldKind::Verbatim),
    FieldSpec::new(
        "response_time_seconds",
        18,
        FieldKind::SecondsToMillis {
            output: "response_time_milliseconds",
        },
    ),
    FieldSpec::new("protocol_version", 23, FieldKind::Verbatim),
];

impl FieldSchema {
    /// CloudFront standard log file format, `#Version: 1.0`.
    pub const V1_0: FieldSchema = FieldSchema {
        version: "1.0",
        fields: V1_0_FIELDS,
    };

    pub fn date(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.kind == FieldKind::Date)
    }

    pub fn time(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.kind == FieldKind::Time)
    }

    /// Columns that end up in the emitted record, in schema order.
    pub fn output_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.output_name().is_some())
    }

    /// Number of columns a line needs for every schema index to resolve.
    pub fn min_columns(&self) -> usize {
        self.fields.iter().map(|f| f.index + 1).max().unwrap_or(0)
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::V1_0
    }
}
