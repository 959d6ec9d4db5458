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

//! Converts newline-delimited JSON event records into an
//! **[Apache Avro](https://avro.apache.org/)** object container file.
//!
//! Each input line is one JSON object with the fields `eventType`, `eventId`, `timestamp`,
//! `userId`, `itemsInCart` and `totalValue`. Lines are coerced to the types the schema declares
//! and written, in input order, to a single container file:
//!
//! - `timestamp` is parsed permissively and normalized to UTC ([`timestamp`])
//! - `itemsInCart` is parsed from text as an integer
//! - `totalValue` is parsed from text as an exact decimal and stored as cents, as a `decimal`, or
//!   as a `big-decimal`, depending on the schema ([`money`])
//!
//! # Example
//!
//! ```no_run
//! use avro_convert::{ConvertOptions, Strategy, convert};
//!
//! let options = ConvertOptions::builder().strategy(Strategy::Batch).build();
//! let summary = convert("event.avsc", "events.json", "events.avro", &options)?;
//! println!("wrote {} records", summary.records);
//! # Ok::<(), avro_convert::Error>(())
//! ```
//!
//! The `convert` binary wraps the same call:
//!
//! ```bash
//! convert event.avsc events.json events.avro
//! ```
//!
//! # Features
//!
//! - `snappy`: enable support for the Snappy codec
//! - `zstandard`: enable support for the Zstandard codec
//! - `bzip`: enable support for the Bzip2 codec
//! - `xz`: enable support for the Xz codec

pub mod convert;
pub mod error;
pub mod event;
pub mod money;
pub mod schema;
pub mod timestamp;

pub use apache_avro::{Codec, Schema};
pub use convert::{
    ConvertOptions, ConvertSummary, Strategy, convert, transform_lines, write_records,
};
pub use error::{Error, ErrorKind};
pub use event::{EventRecord, RecordTransformer};
pub use schema::{EventLayout, load_schema};

/// A convenience type alias for `Result`s with `Error`s.
pub type ConvertResult<T> = Result<T, Error>;

#[cfg(test)]
pub(crate) type TestResult = anyhow::Result<()>;
