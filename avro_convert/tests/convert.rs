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

mod common;

use apache_avro::{Decimal, Reader, types::Value};
use avro_convert::{Codec, ConvertOptions, ErrorKind, Strategy, convert};
use bigdecimal::BigDecimal;
use common::{TestResult, fixture};
use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::{fs::File, io::BufReader, path::Path, str::FromStr};

const EVENT_IDS: [&str; 3] = [
    "6c3a1f0e-0d5e-4a53-9a53-2a3c1c6f6b01",
    "6c3a1f0e-0d5e-4a53-9a53-2a3c1c6f6b02",
    "6c3a1f0e-0d5e-4a53-9a53-2a3c1c6f6b03",
];

// 2023-01-25T15:00:00Z, the same instant, and 2023-01-25T15:30:00.250Z
const MILLIS: [i64; 3] = [1_674_658_800_000, 1_674_658_800_000, 1_674_660_600_250];

fn read_back(path: &Path) -> anyhow::Result<Vec<Value>> {
    let reader = Reader::new(BufReader::new(File::open(path)?))?;
    Ok(reader.collect::<Result<Vec<_>, _>>()?)
}

fn record(index: usize, timestamp: Value, items_in_cart: Value, total_value: Value) -> Value {
    let event_type = ["addToCart", "updateCart", "checkoutComplete"][index];
    let user_id = ["user-1", "user-1", "user-2"][index];
    Value::Record(vec![
        ("eventType".to_string(), Value::String(event_type.to_string())),
        ("eventId".to_string(), Value::String(EVENT_IDS[index].to_string())),
        ("timestamp".to_string(), timestamp),
        ("userId".to_string(), Value::String(user_id.to_string())),
        ("itemsInCart".to_string(), items_in_cart),
        ("totalValue".to_string(), total_value),
    ])
}

fn convert_fixture(schema: &str, options: &ConvertOptions) -> anyhow::Result<Vec<Value>> {
    let dir = tempfile::tempdir()?;
    let avro_path = dir.path().join("events.avro");
    let summary = convert(fixture(schema), fixture("events.json"), &avro_path, options)?;
    let records = read_back(&avro_path)?;
    assert_eq!(summary.records, records.len());
    Ok(records)
}

#[rstest]
#[case(Strategy::Streaming, "null")]
#[case(Strategy::Batch, "null")]
#[case(Strategy::Streaming, "deflate")]
#[case(Strategy::Batch, "deflate")]
fn cents_round_trip(#[case] strategy: Strategy, #[case] codec: &str) -> TestResult {
    let options = ConvertOptions::builder()
        .strategy(strategy)
        .codec(Codec::from_str(codec).map_err(|_| anyhow::anyhow!("unknown codec {codec}"))?)
        .build();
    let records = convert_fixture("event_cents.avsc", &options)?;

    let items = [3, 1, 2];
    let cents = [2000, 1998, 1250];
    let expected: Vec<Value> = (0..3)
        .map(|i| {
            record(
                i,
                Value::TimestampMillis(MILLIS[i]),
                Value::Int(items[i]),
                Value::Long(cents[i]),
            )
        })
        .collect();
    assert_eq!(records, expected);
    Ok(())
}

#[test]
fn decimal_round_trip() -> TestResult {
    let records = convert_fixture("event_decimal.avsc", &ConvertOptions::default())?;

    let items = [3, 1, 2];
    let unscaled = [2000, 1998, 1250];
    let expected: Vec<Value> = (0..3)
        .map(|i| {
            record(
                i,
                Value::TimestampMicros(MILLIS[i] * 1000),
                Value::Long(items[i]),
                Value::Decimal(Decimal::from(
                    BigInt::from(unscaled[i]).to_signed_bytes_be(),
                )),
            )
        })
        .collect();
    assert_eq!(records, expected);
    Ok(())
}

#[test]
fn fixed_decimal_round_trip() -> TestResult {
    let records = convert_fixture("event_fixed_decimal.avsc", &ConvertOptions::default())?;

    let items = [3, 1, 2];
    let unscaled = [2000, 1998, 1250];
    let expected: Vec<Value> = (0..3)
        .map(|i| {
            record(
                i,
                Value::TimestampMillis(MILLIS[i]),
                Value::Int(items[i]),
                Value::Decimal(Decimal::from(
                    BigInt::from(unscaled[i]).to_signed_bytes_be(),
                )),
            )
        })
        .collect();
    assert_eq!(records, expected);

    // read back sign-extended to the full width of the fixed
    let Value::Record(fields) = &records[0] else {
        panic!("Expected a record, got {:?}", records[0]);
    };
    let Value::Decimal(total) = &fields[5].1 else {
        panic!("Expected a decimal, got {:?}", fields[5].1);
    };
    assert_eq!(
        Vec::<u8>::try_from(total)?,
        vec![0, 0, 0, 0, 0, 0, 0x07, 0xd0]
    );
    Ok(())
}

#[rstest]
#[case(Strategy::Streaming)]
#[case(Strategy::Batch)]
fn fixed_decimal_too_large_aborts(#[case] strategy: Strategy) -> TestResult {
    let dir = tempfile::tempdir()?;
    let avro_path = dir.path().join("events.avro");
    let options = ConvertOptions::builder().strategy(strategy).build();

    let err = convert(
        fixture("event_fixed_decimal.avsc"),
        fixture("events_too_large.json"),
        &avro_path,
        &options,
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Input);
    let message = err.to_string();
    assert!(message.starts_with("Line 2:"), "{message}");
    assert!(message.contains("decimal(10, 2) in 8 bytes"), "{message}");
    assert!(!avro_path.exists());
    Ok(())
}

#[test]
fn nanos_round_trip() -> TestResult {
    let records = convert_fixture("event_nanos.avsc", &ConvertOptions::default())?;

    let items = [3, 1, 2];
    let cents = [2000, 1998, 1250];
    let expected: Vec<Value> = (0..3)
        .map(|i| {
            record(
                i,
                Value::TimestampNanos(MILLIS[i] * 1_000_000),
                Value::Int(items[i]),
                Value::Long(cents[i]),
            )
        })
        .collect();
    assert_eq!(records, expected);
    Ok(())
}

#[test]
fn big_decimal_round_trip() -> TestResult {
    let records = convert_fixture("event_big_decimal.avsc", &ConvertOptions::default())?;
    assert_eq!(records.len(), 3);

    let totals = ["19.995", "19.985", "12.5"];
    for (i, value) in records.iter().enumerate() {
        let Value::Record(fields) = value else {
            panic!("Expected a record, got {value:?}");
        };
        let (name, total) = &fields[5];
        assert_eq!(name, "totalValue");
        assert_eq!(total, &Value::BigDecimal(BigDecimal::from_str(totals[i])?));
    }
    Ok(())
}

#[rstest]
#[case(Strategy::Streaming)]
#[case(Strategy::Batch)]
fn missing_event_id_aborts(#[case] strategy: Strategy) -> TestResult {
    let dir = tempfile::tempdir()?;
    let avro_path = dir.path().join("events.avro");
    let options = ConvertOptions::builder().strategy(strategy).build();

    let err = convert(
        fixture("event_cents.avsc"),
        fixture("events_missing_id.json"),
        &avro_path,
        &options,
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Input);
    let message = err.to_string();
    assert!(message.starts_with("Line 2:"), "{message}");
    assert!(message.contains("eventId"), "{message}");
    assert!(!avro_path.exists());
    Ok(())
}

#[test]
fn existing_output_is_replaced() -> TestResult {
    let dir = tempfile::tempdir()?;
    let avro_path = dir.path().join("events.avro");
    std::fs::write(&avro_path, b"stale")?;

    convert(
        fixture("event_cents.avsc"),
        fixture("events.json"),
        &avro_path,
        &ConvertOptions::default(),
    )?;
    assert_eq!(read_back(&avro_path)?.len(), 3);
    Ok(())
}

#[test]
fn schema_errors() -> TestResult {
    let dir = tempfile::tempdir()?;
    let avro_path = dir.path().join("events.avro");

    let err = convert(
        fixture("no_such_schema.avsc"),
        fixture("events.json"),
        &avro_path,
        &ConvertOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);

    // a JSON document that is not an Avro schema
    let err = convert(
        fixture("events.json"),
        fixture("events.json"),
        &avro_path,
        &ConvertOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(!avro_path.exists());
    Ok(())
}
