// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns one raw access-log line into a typed record.

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::constants::{COMMENT_MARKER, FIELD_SEPARATOR, TIMESTAMP_FORMAT};
use crate::errors::ParseError;
use crate::schema::{FieldKind, FieldSchema, FieldSpec};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

/// Output fields of one log line, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    fields: Vec<(&'static str, FieldValue)>,
}

impl ParsedRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (*key, value))
    }

    fn push(&mut self, name: &'static str, value: FieldValue) {
        self.fields.push((name, value));
    }
}

impl Serialize for ParsedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineParser {
    schema: FieldSchema,
}

impl LineParser {
    pub fn new(schema: FieldSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Parses a single line.
    ///
    /// Returns `Ok(None)` for comment lines (`#Version:`, `#Fields:`, ...), which
    /// carry file metadata and never produce a record.
    pub fn parse(&self, line: &str) -> Result<Option<(Timestamp, ParsedRecord)>, ParseError> {
        if line.starts_with(COMMENT_MARKER) {
            return Ok(None);
        }

        let columns: Vec<&str> = line
            .trim_end_matches(['\r', '\n'])
            .split(FIELD_SEPARATOR)
            .collect();

        let mut date = None;
        let mut time = None;
        let mut record = ParsedRecord {
            fields: Vec::with_capacity(self.schema.fields.len()),
        };

        for spec in self.schema.fields {
            let value = column(&columns, spec)?;
            match spec.kind {
                FieldKind::Date => date = Some(value),
                FieldKind::Time => time = Some(value),
                FieldKind::Verbatim => {
                    record.push(spec.name, FieldValue::Text(value.to_string()));
                }
                FieldKind::SecondsToMillis { output } => {
                    record.push(output, FieldValue::Integer(seconds_to_millis(value)?));
                }
            }
        }

        let timestamp = parse_timestamp(date.unwrap_or_default(), time.unwrap_or_default())?;
        Ok(Some((timestamp, record)))
    }
}

/// Parses a line with the default [`FieldSchema::V1_0`] layout.
pub fn parse(line: &str) -> Result<Option<(Timestamp, ParsedRecord)>, ParseError> {
    LineParser::default().parse(line)
}

fn column<'a>(columns: &[&'a str], spec: &FieldSpec) -> Result<&'a str, ParseError> {
    columns
        .get(spec.index)
        .copied()
        .ok_or(ParseError::MissingColumn {
            field: spec.name,
            index: spec.index,
            columns: columns.len(),
        })
}

/// Interprets `date time` as a UTC wall-clock time with second resolution.
pub fn parse_timestamp(date: &str, time: &str) -> Result<Timestamp, ParseError> {
    let value = format!("{date} {time}");
    match NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT) {
        Ok(datetime) => Ok(datetime.and_utc().timestamp_millis()),
        Err(source) => Err(ParseError::InvalidTimestamp { value, source }),
    }
}

/// Converts fractional seconds to milliseconds, rounding half away from zero.
pub fn seconds_to_millis(value: &str) -> Result<i64, ParseError> {
    let seconds = value
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidResponseTime(value.to_string()))?;
    if !seconds.is_finite() {
        return Err(ParseError::InvalidResponseTime(value.to_string()));
    }
    Ok((seconds * 1000.0).round() as i64)
}
