// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Permissive timestamp parsing, normalized to UTC.
//!
//! Accepted inputs, tried in order:
//!
//! - RFC 3339, e.g. `2023-01-25T10:00:00-05:00`
//! - ISO 8601 date-times with a `T` or space separator, optional fractional seconds and an optional
//!   `Z`, `±HH:MM`, `±HHMM` or `±HH` offset, e.g. `2023-01-25 15:00:00.123`
//! - the same with minute precision, e.g. `2023-01-25T15:00`
//! - slash-separated dates, e.g. `2023/01/25 15:00:00`
//! - bare dates, e.g. `2023-01-25`, taken as midnight
//! - RFC 2822, e.g. `Wed, 25 Jan 2023 10:00:00 -0500`
//!
//! A value without an offset is read as UTC wall-clock time; a value with one is converted to UTC.

use apache_avro::types::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parses `text` into an absolute instant.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }

    // chrono's offset specifiers do not take `Z`, so treat it as an explicit UTC suffix
    let naive_text = match text.strip_suffix(['Z', 'z']) {
        Some(stripped) => stripped.trim_end(),
        None => {
            for format in OFFSET_FORMATS {
                if let Ok(instant) = DateTime::parse_from_str(text, format) {
                    return Some(instant.with_timezone(&Utc));
                }
            }
            if let Ok(instant) = DateTime::parse_from_rfc2822(text) {
                return Some(instant.with_timezone(&Utc));
            }
            text
        }
    };

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_text, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive_text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Unit an instant is stored in, as declared by the schema's logical type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimestampPrecision {
    Millis,
    Micros,
    Nanos,
    /// A plain `long` holding epoch milliseconds.
    LongMillis,
}

impl TimestampPrecision {
    /// Encodes `instant` as time since the Unix epoch, or `None` when it overflows the unit.
    pub fn value(self, instant: &DateTime<Utc>) -> Option<Value> {
        match self {
            TimestampPrecision::Millis => Some(Value::TimestampMillis(instant.timestamp_millis())),
            TimestampPrecision::Micros => Some(Value::TimestampMicros(instant.timestamp_micros())),
            TimestampPrecision::Nanos => instant.timestamp_nanos_opt().map(Value::TimestampNanos),
            TimestampPrecision::LongMillis => Some(Value::Long(instant.timestamp_millis())),
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            TimestampPrecision::Millis | TimestampPrecision::LongMillis => "milliseconds",
            TimestampPrecision::Micros => "microseconds",
            TimestampPrecision::Nanos => "nanoseconds",
        }
    }
}
