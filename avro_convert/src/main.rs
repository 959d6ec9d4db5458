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

use avro_convert::{Codec, ConvertOptions, Strategy, convert};
use clap::Parser;
use std::{path::PathBuf, process::ExitCode, str::FromStr};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "convert",
    version,
    about = "Convert newline-delimited JSON event records into an Avro file"
)]
struct Cli {
    /// Avro schema (.avsc) describing the event record
    #[arg(value_name = "SCHEMA_FILE")]
    schema: PathBuf,

    /// Newline-delimited JSON input, one event per line
    #[arg(value_name = "JSON_FILE")]
    input: PathBuf,

    /// Destination Avro object container file
    #[arg(value_name = "AVRO_FILE")]
    output: PathBuf,

    /// Block compression codec
    #[arg(long, default_value = "null", value_parser = parse_codec)]
    codec: Codec,

    /// Write each record as it is read, or transform everything before writing
    #[arg(long, default_value = "streaming")]
    strategy: Strategy,
}

fn parse_codec(name: &str) -> Result<Codec, String> {
    Codec::from_str(name).map_err(|_| format!("unknown or disabled codec `{name}`"))
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = ConvertOptions::builder()
        .codec(cli.codec)
        .strategy(cli.strategy)
        .build();

    match convert(&cli.schema, &cli.input, &cli.output, &options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
