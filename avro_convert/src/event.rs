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

//! Turning one line of JSON into an Avro event record.

use crate::{
    ConvertResult,
    error::Details,
    money::parse_decimal,
    schema::{EventField, EventLayout, ITEMS_IN_CART, TOTAL_VALUE},
    timestamp::parse_timestamp,
};
use apache_avro::{Schema, types::Value};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use log::trace;
use serde::Deserialize;

/// An input line as it appears on disk.
///
/// Numeric fields stay as JSON values so that both `"19.99"` and `19.99` reach the decimal parser
/// as text; `serde_json` is built with `arbitrary_precision`, which keeps a number's source digits.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    event_type: String,
    event_id: String,
    timestamp: String,
    user_id: String,
    items_in_cart: serde_json::Value,
    total_value: serde_json::Value,
}

/// A fully coerced event.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub event_type: String,
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub items_in_cart: i64,
    pub total_value: BigDecimal,
}

impl EventRecord {
    /// Parses and coerces one JSON object. `line` is 1-based and only used for diagnostics.
    pub fn parse(json: &str, line: usize) -> ConvertResult<Self> {
        let raw: RawEvent =
            serde_json::from_str(json).map_err(|source| Details::ParseJson { line, source })?;

        let timestamp =
            parse_timestamp(&raw.timestamp).ok_or_else(|| Details::InvalidTimestamp {
                line,
                value: raw.timestamp.clone(),
            })?;

        let items_text = numeric_text(raw.items_in_cart, ITEMS_IN_CART, line)?;
        let items_in_cart =
            items_text
                .trim()
                .parse::<i64>()
                .map_err(|_| Details::InvalidInteger {
                    line,
                    field: ITEMS_IN_CART,
                    value: items_text.clone(),
                })?;

        let total_text = numeric_text(raw.total_value, TOTAL_VALUE, line)?;
        let total_value = parse_decimal(&total_text).ok_or_else(|| Details::InvalidDecimal {
            line,
            field: TOTAL_VALUE,
            value: total_text.clone(),
        })?;

        Ok(Self {
            event_type: raw.event_type,
            event_id: raw.event_id,
            timestamp,
            user_id: raw.user_id,
            items_in_cart,
            total_value,
        })
    }

    /// Builds the Avro record, with fields in the order `layout` declares them.
    pub fn to_value(&self, layout: &EventLayout, line: usize) -> ConvertResult<Value> {
        let mut fields = Vec::with_capacity(layout.order().len());
        for field in layout.order() {
            let value = match field {
                EventField::EventType => Value::String(self.event_type.clone()),
                EventField::EventId => Value::String(self.event_id.clone()),
                EventField::UserId => Value::String(self.user_id.clone()),
                EventField::Timestamp => {
                    let precision = layout.timestamp();
                    precision.value(&self.timestamp).ok_or_else(|| {
                        Details::TimestampOutOfRange {
                            line,
                            value: self.timestamp.to_rfc3339(),
                            unit: precision.unit(),
                        }
                    })?
                }
                EventField::ItemsInCart => {
                    let width = layout.items_in_cart();
                    width
                        .value(self.items_in_cart)
                        .ok_or_else(|| Details::OutOfRange {
                            line,
                            field: ITEMS_IN_CART,
                            value: self.items_in_cart.to_string(),
                            target: width.name().to_string(),
                        })?
                }
                EventField::TotalValue => {
                    let policy = layout.total_value();
                    policy
                        .value(&self.total_value)
                        .ok_or_else(|| Details::OutOfRange {
                            line,
                            field: TOTAL_VALUE,
                            value: self.total_value.to_string(),
                            target: policy.describe(),
                        })?
                }
            };
            fields.push((field.name().to_string(), value));
        }
        Ok(Value::Record(fields))
    }
}

fn numeric_text(
    value: serde_json::Value,
    field: &'static str,
    line: usize,
) -> ConvertResult<String> {
    match value {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        value => Err(Details::NotNumeric { line, field, value }.into()),
    }
}

/// Converts input lines into records shaped for one schema.
#[derive(Clone, Debug)]
pub struct RecordTransformer {
    layout: EventLayout,
}

impl RecordTransformer {
    pub fn new(layout: EventLayout) -> Self {
        Self { layout }
    }

    pub fn from_schema(schema: &Schema) -> ConvertResult<Self> {
        EventLayout::from_schema(schema).map(Self::new)
    }

    pub fn layout(&self) -> &EventLayout {
        &self.layout
    }

    /// Transforms one JSON line. Pure: nothing is retained between calls.
    pub fn transform(&self, json: &str, line: usize) -> ConvertResult<Value> {
        let record = EventRecord::parse(json, line)?;
        trace!("line {line}: {record:?}");
        record.to_value(&self.layout, line)
    }
}
