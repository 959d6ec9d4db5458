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

//! Driving a whole conversion: schema file + JSON lines in, Avro object container file out.
//!
//! The container is written to a temporary file next to the destination and renamed into place
//! only once every record has been appended and the file has been flushed and synced. A failure on
//! any line therefore leaves no file at the destination, whichever [`Strategy`] is used.

use crate::{ConvertResult, error::Details, event::RecordTransformer, schema::load_schema};
use apache_avro::{Codec, Schema, Writer, types::Value};
use log::{debug, info, warn};
use std::{
    ffi::OsString,
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

/// How input lines are fed to the Avro writer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Strategy {
    /// Each line is transformed and appended as soon as it is read.
    #[default]
    Streaming,
    /// Every line is transformed into memory first, then all records are written at once.
    Batch,
}

/// Settings for [`convert`].
#[derive(Clone, Copy, Debug, bon::Builder)]
pub struct ConvertOptions {
    /// Block compression codec.
    #[builder(default = Codec::Null)]
    codec: Codec,
    #[builder(default)]
    strategy: Strategy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConvertOptions {
    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

/// Outcome of a successful conversion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConvertSummary {
    /// Number of records written, equal to the number of non-blank input lines.
    pub records: usize,
}

/// Converts the newline-delimited JSON file at `json_path` into an Avro container at `avro_path`.
pub fn convert(
    schema_path: impl AsRef<Path>,
    json_path: impl AsRef<Path>,
    avro_path: impl AsRef<Path>,
    options: &ConvertOptions,
) -> ConvertResult<ConvertSummary> {
    let (json_path, avro_path) = (json_path.as_ref(), avro_path.as_ref());
    debug!("options: {options:?}");

    let schema = load_schema(schema_path)?;
    let transformer = RecordTransformer::from_schema(&schema)?;

    let input = File::open(json_path).map_err(|source| Details::OpenInput {
        path: json_path.to_path_buf(),
        source,
    })?;
    let lines = transform_lines(BufReader::new(input), &transformer);

    let mut staging = staging_file(avro_path)?;
    info!("writing output to {}", avro_path.display());

    let written = match options.strategy {
        Strategy::Streaming => write_records(
            &schema,
            lines,
            BufWriter::new(staging.as_file_mut()),
            options.codec,
        ),
        Strategy::Batch => match lines.collect::<ConvertResult<Vec<_>>>() {
            Ok(records) => {
                debug!("transformed {} records", records.len());
                write_records(
                    &schema,
                    records.into_iter().map(Ok),
                    BufWriter::new(staging.as_file_mut()),
                    options.codec,
                )
            }
            Err(err) => Err(err),
        },
    };
    let finished = written
        .and_then(|(records, buffered)| finish_buffer(buffered, avro_path).map(|_| records));
    let records = match finished {
        Ok(records) => records,
        Err(err) => {
            warn!(
                "conversion failed, discarding partial output {}",
                staging.path().display()
            );
            return Err(err);
        }
    };

    staging
        .as_file()
        .sync_all()
        .map_err(|source| Details::SyncOutput {
            path: avro_path.to_path_buf(),
            source,
        })?;
    staging
        .persist(avro_path)
        .map_err(|err| Details::PersistOutput {
            path: avro_path.to_path_buf(),
            source: err.error,
        })?;

    info!("wrote {records} records to {}", avro_path.display());
    Ok(ConvertSummary { records })
}

/// Transforms every non-blank line of `input`, pairing each record with its 1-based line number.
pub fn transform_lines<'a, R>(
    input: R,
    transformer: &'a RecordTransformer,
) -> impl Iterator<Item = ConvertResult<(usize, Value)>> + 'a
where
    R: BufRead + 'a,
{
    input
        .lines()
        .enumerate()
        .filter_map(move |(index, line)| {
            let line_number = index + 1;
            match line {
                Err(source) => Some(Err(Details::ReadLine {
                    line: line_number,
                    source,
                }
                .into())),
                Ok(text) if text.trim().is_empty() => None,
                Ok(text) => Some(
                    transformer
                        .transform(&text, line_number)
                        .map(|record| (line_number, record)),
                ),
            }
        })
}

/// Appends `records` to a new Avro container written into `writer`, in iteration order.
///
/// Stops at the first error. On success the container is complete (header, data blocks, and sync
/// markers all written) and the inner writer is handed back together with the record count.
pub fn write_records<W, I>(
    schema: &Schema,
    records: I,
    writer: W,
    codec: Codec,
) -> ConvertResult<(usize, W)>
where
    W: Write,
    I: IntoIterator<Item = ConvertResult<(usize, Value)>>,
{
    let mut avro = Writer::with_codec(schema, writer, codec);
    let mut count = 0;
    for record in records {
        let (line, value) = record?;
        avro.append(value)
            .map_err(|source| Details::WriteRecord { line, source })?;
        count += 1;
    }
    let writer = avro.into_inner().map_err(Details::Finalize)?;
    Ok((count, writer))
}

fn finish_buffer<W: Write>(buffered: BufWriter<W>, path: &Path) -> ConvertResult<()> {
    buffered
        .into_inner()
        .map(|_| ())
        .map_err(|err| {
            Details::SyncOutput {
                path: path.to_path_buf(),
                source: err.into_error(),
            }
            .into()
        })
}

/// Creates the staging file next to `avro_path`.
///
/// A new file gets the same mode `File::create` would give it (0o666 less the umask). When
/// `avro_path` already exists its permissions are carried over to the replacement.
fn staging_file(avro_path: &Path) -> ConvertResult<tempfile::NamedTempFile> {
    let create_error = |source: std::io::Error| Details::CreateOutput {
        path: avro_path.to_path_buf(),
        source,
    };
    let dir = match avro_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut prefix = OsString::from(".");
    if let Some(name) = avro_path.file_name() {
        prefix.push(name);
    }
    prefix.push(".");

    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let staging = builder.tempfile_in(dir).map_err(create_error)?;

    let existing = fs::metadata(avro_path).ok().filter(|metadata| metadata.is_file());
    if let Some(existing) = existing {
        debug!("keeping permissions of {}", avro_path.display());
        staging
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(create_error)?;
    }
    Ok(staging)
}
