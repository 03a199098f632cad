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
use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::exec::expr::CastError;

pub const MAX_FSP: i8 = 6;
const NANOS_PER_SEC: i64 = 1_000_000_000;
/// MySQL TIME range: +-838:59:59.
const MAX_DURATION_LITERAL: i64 = 838_59_59;

pub fn check_fsp(fsp: i8) -> Result<(), CastError> {
    if (0..=MAX_FSP).contains(&fsp) {
        return Ok(());
    }
    Err(CastError::InvalidPrecision {
        detail: format!("fractional seconds precision {fsp} out of range 0..={MAX_FSP}"),
    })
}

/// Standardize a numeric date/datetime literal into full
/// YYYYMMDDHHMMSS form, expanding two-digit years (70..99 -> 19xx,
/// 00..69 -> 20xx). None means the literal is not a date.
fn standardize_datetime_literal(value: i64) -> Option<i64> {
    const YY_PART_YEAR: i64 = 70;
    if value <= 0 {
        return None;
    }
    if value >= 10000101000000 {
        if value > 99999999999999 {
            return None;
        }
        return Some(value);
    }
    if value < 101 {
        return None;
    }
    if value <= (YY_PART_YEAR - 1) * 10000 + 1231 {
        return Some((value + 20000000) * 1000000);
    }
    if value < YY_PART_YEAR * 10000 + 101 {
        return None;
    }
    if value <= 991231 {
        return Some((value + 19000000) * 1000000);
    }
    if value < 10000101 {
        return None;
    }
    if value <= 99991231 {
        return Some(value * 1000000);
    }
    if value < 101000000 {
        return None;
    }
    if value <= (YY_PART_YEAR - 1) * 10000000000 + 1231235959 {
        return Some(value + 20000000000000);
    }
    if value < YY_PART_YEAR * 10000000000 + 101000000 {
        return None;
    }
    if value <= 991231235959 {
        return Some(value + 19000000000000);
    }
    Some(value)
}

/// A DATETIME value. Storage is a plain calendar datetime; fractional-second
/// precision is an attribute of the destination type, not of the value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(NaiveDateTime);

impl Time {
    pub fn new(dt: NaiveDateTime) -> Self {
        Self(dt)
    }

    pub fn from_parts(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        nanos: u32,
    ) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
        Some(Self(date.and_time(time)))
    }

    /// Decodes a numeric literal (YYMMDD, YYYYMMDD, YYMMDDHHMMSS,
    /// YYYYMMDDHHMMSS) into a datetime.
    pub fn from_datetime_literal(value: i64) -> Option<Self> {
        let standardized = standardize_datetime_literal(value)?;
        let date_part = standardized / 1_000_000;
        let time_part = standardized % 1_000_000;

        let year = (date_part / 10_000) as i32;
        let month = ((date_part / 100) % 100) as u32;
        let day = (date_part % 100) as u32;
        let hour = (time_part / 10_000) as u32;
        let minute = ((time_part / 100) % 100) as u32;
        let second = (time_part % 100) as u32;

        Self::from_parts(year, month, day, hour, minute, second, 0)
    }

    pub fn inner(&self) -> NaiveDateTime {
        self.0
    }

    /// Time-of-day component as nanoseconds of elapsed time.
    pub fn to_duration(&self) -> i64 {
        let t = self.0.time();
        (t.num_seconds_from_midnight() as i64) * NANOS_PER_SEC + t.nanosecond() as i64
    }
}

/// Interprets an HHMMSS-encoded integer as elapsed time in nanoseconds.
/// Magnitudes beyond 838:59:59 are `Overflow`; encodings with minute or
/// second digits >= 60 are `MalformedInput`. Both route through the
/// overflow policy at the call sites.
pub fn number_to_duration(value: i64, fsp: i8) -> Result<i64, CastError> {
    check_fsp(fsp)?;
    let overflow = || CastError::Overflow {
        value: value.to_string(),
        target: "TIME",
    };
    let (sign, abs) = if value < 0 {
        (-1, value.checked_neg().ok_or_else(overflow)?)
    } else {
        (1, value)
    };
    if abs > MAX_DURATION_LITERAL {
        return Err(overflow());
    }
    let hour = abs / 10_000;
    let minute = (abs / 100) % 100;
    let second = abs % 100;
    if minute >= 60 || second >= 60 {
        return Err(CastError::MalformedInput {
            value: value.to_string(),
            target: "TIME",
        });
    }
    Ok(sign * (hour * 3600 + minute * 60 + second) * NANOS_PER_SEC)
}

/// Rounds a duration (nanoseconds) half-up to `fsp` fractional digits.
pub fn round_frac(nanos: i64, fsp: i8) -> Result<i64, CastError> {
    check_fsp(fsp)?;
    let unit = 10i64.pow(9 - fsp as u32);
    let half = unit / 2;
    let shifted = if nanos >= 0 {
        nanos.checked_add(half)
    } else {
        nanos.checked_sub(half)
    }
    .ok_or_else(|| CastError::Overflow {
        value: nanos.to_string(),
        target: "TIME",
    })?;
    Ok(shifted / unit * unit)
}

/// Renders a duration as `[-]HH:MM:SS[.ffffff]` with `fsp` fractional
/// digits.
pub fn format_duration(nanos: i64, fsp: i8) -> String {
    let negative = nanos < 0;
    let abs = nanos.unsigned_abs();
    let secs = abs / NANOS_PER_SEC as u64;
    let frac = abs % NANOS_PER_SEC as u64;
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    );
    if fsp > 0 {
        let digits = frac / 10u64.pow(9 - fsp as u32);
        let _ = write!(out, ".{digits:0>width$}", width = fsp as usize);
    }
    out
}
