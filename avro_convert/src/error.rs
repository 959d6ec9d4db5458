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

//! Errors raised while loading the schema, transforming input lines, or writing the output file.

use std::{error::Error as _, fmt, path::PathBuf};

/// Errors encountered while converting JSON events to Avro.
///
/// Use [`details`](Self::details) to inspect the precise failure or [`kind`](Self::kind) to
/// classify it.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }

    /// Which stage of the conversion failed.
    pub fn kind(&self) -> ErrorKind {
        self.details.kind()
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

/// Coarse classification of a failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// The schema file could not be read, parsed, or does not describe an event record.
    Schema,
    /// An input line could not be read, parsed, or coerced.
    Input,
    /// The destination could not be created, written, or finalized.
    Output,
}

#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum Details {
    #[error("Failed to read schema file {path:?}: {source}")]
    ReadSchema {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema file {path:?}: {source}")]
    ParseSchema {
        path: PathBuf,
        #[source]
        source: apache_avro::Error,
    },

    #[error("Schema must be a record, got: {0:?}")]
    NotARecord(apache_avro::schema::SchemaKind),

    #[error("Schema has no field named `{0}`")]
    MissingSchemaField(&'static str),

    #[error("Schema declares field `{0}`, which event records do not carry")]
    UnknownSchemaField(String),

    #[error("Schema field `{field}` has unsupported type {kind:?}; expected {expected}")]
    UnsupportedFieldType {
        field: &'static str,
        kind: apache_avro::schema::SchemaKind,
        expected: &'static str,
    },

    #[error("Decimal schema for `{field}` has scale {scale} greater than precision {precision}")]
    DecimalScale {
        field: &'static str,
        precision: usize,
        scale: usize,
    },

    #[error("Failed to open input file {path:?}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read line {line} of input: {source}")]
    ReadLine {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {source}")]
    ParseJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line}: field `{field}` must be a string or a number, got: {value}")]
    NotNumeric {
        line: usize,
        field: &'static str,
        value: serde_json::Value,
    },

    #[error("Line {line}: invalid timestamp {value:?}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("Line {line}: timestamp {value:?} cannot be represented in {unit}")]
    TimestampOutOfRange {
        line: usize,
        value: String,
        unit: &'static str,
    },

    #[error("Line {line}: field `{field}` is not a valid integer: {value:?}")]
    InvalidInteger {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: field `{field}` is not a valid decimal: {value:?}")]
    InvalidDecimal {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: field `{field}` value {value:?} does not fit the schema's {target}")]
    OutOfRange {
        line: usize,
        field: &'static str,
        value: String,
        target: String,
    },

    #[error("Cannot write to {path:?}: {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set up the Avro writer: {0}")]
    CreateWriter(#[source] apache_avro::Error),

    #[error("Failed to write record from line {line}: {source}")]
    WriteRecord {
        line: usize,
        #[source]
        source: apache_avro::Error,
    },

    #[error("Failed to finalize Avro container: {0}")]
    Finalize(#[source] apache_avro::Error),

    #[error("Failed to flush output file {path:?}: {source}")]
    SyncOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move output into place at {path:?}: {source}")]
    PersistOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Details {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Details::ReadSchema { .. }
            | Details::ParseSchema { .. }
            | Details::NotARecord(_)
            | Details::MissingSchemaField(_)
            | Details::UnknownSchemaField(_)
            | Details::UnsupportedFieldType { .. }
            | Details::DecimalScale { .. } => ErrorKind::Schema,
            Details::OpenInput { .. }
            | Details::ReadLine { .. }
            | Details::ParseJson { .. }
            | Details::NotNumeric { .. }
            | Details::InvalidTimestamp { .. }
            | Details::TimestampOutOfRange { .. }
            | Details::InvalidInteger { .. }
            | Details::InvalidDecimal { .. }
            | Details::OutOfRange { .. } => ErrorKind::Input,
            Details::CreateOutput { .. }
            | Details::CreateWriter(_)
            | Details::WriteRecord { .. }
            | Details::Finalize(_)
            | Details::SyncOutput { .. }
            | Details::PersistOutput { .. } => ErrorKind::Output,
        }
    }
}

impl fmt::Debug for Details {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut msg = self.to_string();
        if let Some(e) = self.source() {
            msg.extend([": ", &e.to_string()]);
        }
        write!(f, "{msg}")
    }
}
