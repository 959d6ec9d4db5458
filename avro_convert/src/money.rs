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

//! Exact decimal handling for monetary amounts.

use crate::schema::IntegerWidth;
use apache_avro::{Decimal, types::Value};
use bigdecimal::{BigDecimal, RoundingMode, Zero};
use num_bigint::BigInt;
use std::str::FromStr;

/// Number of fractional digits kept when an amount is stored as an integer.
pub const CENTS_SCALE: i64 = 2;

/// Digits left of the decimal point that can still fit in an `i64` count of cents.
const MAX_CENTS_INTEGER_DIGITS: i64 = 19;

/// Parses decimal text without going through binary floating point.
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text.trim()).ok()
}

/// Scales `amount` by 100 and rounds half-to-even, yielding whole cents.
///
/// Returns `None` when the amount has more than 19 integer digits.
pub fn to_cents(amount: &BigDecimal) -> Option<BigInt> {
    let (cents, _) =
        rescale(amount, CENTS_SCALE, MAX_CENTS_INTEGER_DIGITS)?.into_bigint_and_exponent();
    Some(cents)
}

/// Rounds `amount` half-to-even to `scale`, refusing amounts with more than
/// `max_integer_digits` digits before the decimal point.
///
/// The digit count is read off the unscaled value and exponent, so an input
/// like `1e2000000000` is rejected without materializing its digits.
fn rescale(amount: &BigDecimal, scale: i64, max_integer_digits: i64) -> Option<BigDecimal> {
    if amount.is_zero() {
        return Some(BigDecimal::new(BigInt::zero(), scale));
    }
    let digits = i64::try_from(amount.digits()).ok()?;
    let integer_digits = digits.checked_sub(amount.fractional_digit_count())?;
    if integer_digits > max_integer_digits {
        return None;
    }
    Some(amount.with_scale_round(scale, RoundingMode::HalfEven))
}

/// The representation a schema chose for a monetary amount.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MonetaryPolicy {
    /// Integer count of cents.
    Cents(IntegerWidth),
    /// The `decimal` logical type; amounts are re-scaled to `scale` with half-to-even rounding.
    ///
    /// `size` is the byte width of the backing `fixed`, `None` when backed by `bytes`.
    Decimal {
        precision: usize,
        scale: usize,
        size: Option<usize>,
    },
    /// The `big-decimal` logical type; amounts are stored exactly as parsed.
    BigDecimal,
}

impl MonetaryPolicy {
    /// Encodes `amount`, or returns `None` when it does not fit the representation.
    pub fn value(&self, amount: &BigDecimal) -> Option<Value> {
        match self {
            MonetaryPolicy::Cents(width) => {
                let cents = i64::try_from(&to_cents(amount)?).ok()?;
                width.value(cents)
            }
            MonetaryPolicy::Decimal {
                precision,
                scale,
                size,
            } => {
                let integer_digits = i64::try_from(precision.checked_sub(*scale)?).ok()?;
                let rescaled = rescale(amount, i64::try_from(*scale).ok()?, integer_digits)?;
                if rescaled.digits() > *precision as u64 {
                    return None;
                }
                let (unscaled, _) = rescaled.into_bigint_and_exponent();
                let bytes = unscaled.to_signed_bytes_be();
                if size.is_some_and(|size| bytes.len() > size) {
                    return None;
                }
                Some(Value::Decimal(Decimal::from(bytes)))
            }
            MonetaryPolicy::BigDecimal => Some(Value::BigDecimal(amount.clone())),
        }
    }

    /// Human readable target, used in range errors.
    pub fn describe(&self) -> String {
        match self {
            MonetaryPolicy::Cents(width) => format!("{} cents", width.name()),
            MonetaryPolicy::Decimal {
                precision,
                scale,
                size: None,
            } => format!("decimal({precision}, {scale})"),
            MonetaryPolicy::Decimal {
                precision,
                scale,
                size: Some(size),
            } => format!("decimal({precision}, {scale}) in {size} bytes"),
            MonetaryPolicy::BigDecimal => "big-decimal".to_string(),
        }
    }
}
