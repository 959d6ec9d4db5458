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

//! Loading the event schema and deriving how each event field is encoded.

use crate::{
    ConvertResult,
    error::Details,
    money::MonetaryPolicy,
    timestamp::TimestampPrecision,
};
use apache_avro::{
    Schema,
    schema::{DecimalSchema, RecordSchema, SchemaKind},
    types::Value,
};
use log::debug;
use std::{fs, path::Path};

pub const EVENT_TYPE: &str = "eventType";
pub const EVENT_ID: &str = "eventId";
pub const TIMESTAMP: &str = "timestamp";
pub const USER_ID: &str = "userId";
pub const ITEMS_IN_CART: &str = "itemsInCart";
pub const TOTAL_VALUE: &str = "totalValue";

/// Reads and parses an Avro schema definition file.
pub fn load_schema(path: impl AsRef<Path>) -> ConvertResult<Schema> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Details::ReadSchema {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = Schema::parse_str(&text).map_err(|source| Details::ParseSchema {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("schema: {}", schema.canonical_form());
    Ok(schema)
}

/// Width of an Avro integral type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntegerWidth {
    Int,
    Long,
}

impl IntegerWidth {
    /// Wraps `value` in the matching Avro value, or `None` if it does not fit.
    pub fn value(self, value: i64) -> Option<Value> {
        match self {
            IntegerWidth::Int => i32::try_from(value).ok().map(Value::Int),
            IntegerWidth::Long => Some(Value::Long(value)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntegerWidth::Int => "int",
            IntegerWidth::Long => "long",
        }
    }
}

/// One of the six fields an event record carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventField {
    EventType,
    EventId,
    Timestamp,
    UserId,
    ItemsInCart,
    TotalValue,
}

impl EventField {
    pub const ALL: [EventField; 6] = [
        EventField::EventType,
        EventField::EventId,
        EventField::Timestamp,
        EventField::UserId,
        EventField::ItemsInCart,
        EventField::TotalValue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventField::EventType => EVENT_TYPE,
            EventField::EventId => EVENT_ID,
            EventField::Timestamp => TIMESTAMP,
            EventField::UserId => USER_ID,
            EventField::ItemsInCart => ITEMS_IN_CART,
            EventField::TotalValue => TOTAL_VALUE,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

/// How an event record maps onto a particular record schema.
///
/// The monetary representation is decided here, once per schema: a `long` or `int`
/// `totalValue` holds cents, a `decimal` holds the value re-scaled to the schema's
/// scale, and a `big-decimal` holds it unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct EventLayout {
    order: Vec<EventField>,
    timestamp: TimestampPrecision,
    items_in_cart: IntegerWidth,
    total_value: MonetaryPolicy,
}

impl EventLayout {
    pub fn from_schema(schema: &Schema) -> ConvertResult<Self> {
        let Schema::Record(record) = schema else {
            return Err(Details::NotARecord(SchemaKind::from(schema)).into());
        };

        let order = record
            .fields
            .iter()
            .map(|schema_field| {
                EventField::from_name(&schema_field.name)
                    .ok_or_else(|| Details::UnknownSchemaField(schema_field.name.clone()).into())
            })
            .collect::<ConvertResult<Vec<_>>>()?;

        for field in [EventField::EventType, EventField::EventId] {
            string_field(record, field)?;
        }
        let timestamp = timestamp_precision(record)?;
        string_field(record, EventField::UserId)?;
        let items_in_cart = items_width(record)?;
        let total_value = monetary_policy(record)?;

        Ok(Self {
            order,
            timestamp,
            items_in_cart,
            total_value,
        })
    }

    /// Fields in the order the schema declares them.
    pub fn order(&self) -> &[EventField] {
        &self.order
    }

    pub fn timestamp(&self) -> TimestampPrecision {
        self.timestamp
    }

    pub fn items_in_cart(&self) -> IntegerWidth {
        self.items_in_cart
    }

    pub fn total_value(&self) -> &MonetaryPolicy {
        &self.total_value
    }
}

fn field_schema(record: &RecordSchema, field: EventField) -> ConvertResult<&Schema> {
    record
        .fields
        .iter()
        .find(|schema_field| schema_field.name == field.name())
        .map(|schema_field| &schema_field.schema)
        .ok_or_else(|| Details::MissingSchemaField(field.name()).into())
}

fn string_field(record: &RecordSchema, field: EventField) -> ConvertResult<()> {
    match field_schema(record, field)? {
        Schema::String => Ok(()),
        other => Err(unsupported(field, other, "string")),
    }
}

fn timestamp_precision(record: &RecordSchema) -> ConvertResult<TimestampPrecision> {
    match field_schema(record, EventField::Timestamp)? {
        Schema::TimestampMillis => Ok(TimestampPrecision::Millis),
        Schema::TimestampMicros => Ok(TimestampPrecision::Micros),
        Schema::TimestampNanos => Ok(TimestampPrecision::Nanos),
        Schema::Long => Ok(TimestampPrecision::LongMillis),
        other => Err(unsupported(
            EventField::Timestamp,
            other,
            "timestamp-millis, timestamp-micros, timestamp-nanos or long",
        )),
    }
}

fn items_width(record: &RecordSchema) -> ConvertResult<IntegerWidth> {
    match field_schema(record, EventField::ItemsInCart)? {
        Schema::Int => Ok(IntegerWidth::Int),
        Schema::Long => Ok(IntegerWidth::Long),
        other => Err(unsupported(EventField::ItemsInCart, other, "int or long")),
    }
}

fn monetary_policy(record: &RecordSchema) -> ConvertResult<MonetaryPolicy> {
    let total_value = field_schema(record, EventField::TotalValue)?;
    match total_value {
        Schema::Long => Ok(MonetaryPolicy::Cents(IntegerWidth::Long)),
        Schema::Int => Ok(MonetaryPolicy::Cents(IntegerWidth::Int)),
        Schema::Decimal(DecimalSchema {
            precision, scale, ..
        }) => {
            if scale > precision {
                return Err(Details::DecimalScale {
                    field: TOTAL_VALUE,
                    precision: *precision,
                    scale: *scale,
                }
                .into());
            }
            Ok(MonetaryPolicy::Decimal {
                precision: *precision,
                scale: *scale,
                size: fixed_size(total_value),
            })
        }
        Schema::BigDecimal => Ok(MonetaryPolicy::BigDecimal),
        other => Err(unsupported(
            EventField::TotalValue,
            other,
            "long, int, decimal or big-decimal",
        )),
    }
}

/// Byte width of a `fixed`-backed decimal, read from the schema's JSON form.
fn fixed_size(decimal: &Schema) -> Option<usize> {
    let json = serde_json::to_value(decimal).ok()?;
    match json.get("type")?.as_str()? {
        "fixed" => usize::try_from(json.get("size")?.as_u64()?).ok(),
        _ => None,
    }
}

fn unsupported(field: EventField, schema: &Schema, expected: &'static str) -> crate::Error {
    Details::UnsupportedFieldType {
        field: field.name(),
        kind: SchemaKind::from(schema),
        expected,
    }
    .into()
}
