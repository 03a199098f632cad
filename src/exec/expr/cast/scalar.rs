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

//! Single-value cast bodies. Each converts one non-null source row into the
//! destination: fixed-width destinations are written in place (the fallback
//! adapter has already resized them and merged source nulls), var-len
//! destinations get exactly one appended row. Soft failures route through
//! `EvalContext::handle_overflow` and then null or clamp the row per
//! conversion family.

use serde_json::Value as JsonValue;

use crate::common::datetime::{self, Time};
use crate::common::decimal::Decimal;
use crate::exec::chunk::Column;
use crate::exec::expr::{CastError, CastSignature, EvalContext};

pub(super) fn cast_int_as_int(
    _ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let mut v = source.i64s()[row];
    if sig.in_union && sig.to_attrs.unsigned && v < 0 {
        v = 0;
    }
    result.i64s_mut()[row] = v;
    Ok(())
}

pub(super) fn cast_int_as_real(
    _ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let v = source.i64s()[row];
    result.f64s_mut()[row] = if !sig.to_attrs.unsigned && !sig.from_attrs.unsigned {
        v as f64
    } else if sig.in_union && v < 0 {
        0.0
    } else {
        v as u64 as f64
    };
    Ok(())
}

pub(super) fn cast_real_as_real(
    _ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let mut v = source.f64s()[row];
    if sig.in_union && sig.to_attrs.unsigned && v < 0.0 {
        v = 0.0;
    }
    result.f64s_mut()[row] = v;
    Ok(())
}

pub(super) fn cast_decimal_as_real(
    ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let d = source.decimals()[row];
    if sig.in_union && sig.to_attrs.unsigned && d.is_negative() {
        result.f64s_mut()[row] = 0.0;
        return Ok(());
    }
    match d.to_f64() {
        Ok(v) => result.f64s_mut()[row] = v,
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.set_null(row, true);
        }
    }
    Ok(())
}

pub(super) fn cast_int_as_duration(
    ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    datetime::check_fsp(sig.to_attrs.fsp)?;
    match datetime::number_to_duration(source.i64s()[row], sig.to_attrs.fsp) {
        Ok(d) => result.durations_mut()[row] = d,
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.set_null(row, true);
        }
    }
    Ok(())
}

pub(super) fn cast_time_as_duration(
    _ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    datetime::check_fsp(sig.to_attrs.fsp)?;
    let d = datetime::round_frac(source.times()[row].to_duration(), sig.to_attrs.fsp)?;
    result.durations_mut()[row] = d;
    Ok(())
}

pub(super) fn cast_decimal_as_int(
    ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let d = source.decimals()[row];
    if sig.in_union && sig.to_attrs.unsigned && d.is_negative() {
        result.i64s_mut()[row] = 0;
        return Ok(());
    }
    match d.round_to_i64() {
        Ok(v) => result.i64s_mut()[row] = v,
        Err(err) => {
            ctx.handle_overflow(err)?;
            // out-of-range integers clamp to the type boundary rather than
            // nulling the row
            result.i64s_mut()[row] = match (d.is_negative(), sig.to_attrs.unsigned) {
                (true, true) => 0,
                (true, false) => i64::MIN,
                (false, true) => u64::MAX as i64,
                (false, false) => i64::MAX,
            };
        }
    }
    Ok(())
}

pub(super) fn cast_duration_as_int(
    _ctx: &mut EvalContext,
    _sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    // round to whole seconds first, then re-encode as HHMMSS
    let nanos = datetime::round_frac(source.durations()[row], 0)?;
    let negative = nanos < 0;
    let secs = nanos.unsigned_abs() as i64 / 1_000_000_000;
    let encoded = (secs / 3600) * 10_000 + ((secs / 60) % 60) * 100 + secs % 60;
    result.i64s_mut()[row] = if negative { -encoded } else { encoded };
    Ok(())
}

pub(super) fn cast_int_as_time(
    ctx: &mut EvalContext,
    _sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let v = source.i64s()[row];
    match Time::from_datetime_literal(v) {
        Some(t) => result.times_mut()[row] = t,
        None => {
            ctx.handle_overflow(CastError::MalformedInput {
                value: v.to_string(),
                target: "DATETIME",
            })?;
            result.set_null(row, true);
        }
    }
    Ok(())
}

pub(super) fn cast_real_as_decimal(
    ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let v = source.f64s()[row];
    if sig.in_union && sig.to_attrs.unsigned && v < 0.0 {
        result.decimals_mut()[row] = Decimal::ZERO;
        return Ok(());
    }
    match Decimal::from_f64_with_scale(v, sig.to_attrs.scale) {
        Ok(d) => result.decimals_mut()[row] = d,
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.set_null(row, true);
        }
    }
    Ok(())
}

pub(super) fn cast_string_as_int(
    ctx: &mut EvalContext,
    _sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let s = match source.str_at(row) {
        Ok(s) => s,
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.set_null(row, true);
            return Ok(());
        }
    };
    let (v, err) = parse_i64_prefix(s);
    if let Some(err) = err {
        // truncation keeps the parsed prefix instead of nulling
        ctx.handle_overflow(err)?;
    }
    result.i64s_mut()[row] = v;
    Ok(())
}

pub(super) fn cast_string_as_real(
    ctx: &mut EvalContext,
    _sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let s = match source.str_at(row) {
        Ok(s) => s,
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.set_null(row, true);
            return Ok(());
        }
    };
    let (v, err) = parse_f64_prefix(s);
    if let Some(err) = err {
        ctx.handle_overflow(err)?;
    }
    result.f64s_mut()[row] = v;
    Ok(())
}

pub(super) fn cast_string_as_decimal(
    ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let s = match source.str_at(row) {
        Ok(s) => s,
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.set_null(row, true);
            return Ok(());
        }
    };
    let parsed = Decimal::parse(s).and_then(|d| {
        if sig.to_attrs.precision > 0 {
            d.rescale(sig.to_attrs.scale)
        } else {
            Ok(d)
        }
    });
    match parsed {
        Ok(d) => result.decimals_mut()[row] = d,
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.set_null(row, true);
        }
    }
    Ok(())
}

pub(super) fn cast_int_as_string(
    _ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let v = source.i64s()[row];
    if sig.from_attrs.unsigned {
        result.append_str(&(v as u64).to_string());
    } else {
        result.append_str(&v.to_string());
    }
    Ok(())
}

pub(super) fn cast_real_as_string(
    _ctx: &mut EvalContext,
    _sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    result.append_str(&format_real(source.f64s()[row]));
    Ok(())
}

pub(super) fn cast_decimal_as_string(
    _ctx: &mut EvalContext,
    _sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    result.append_str(&source.decimals()[row].to_string());
    Ok(())
}

pub(super) fn cast_duration_as_string(
    _ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    datetime::check_fsp(sig.to_attrs.fsp)?;
    result.append_str(&datetime::format_duration(
        source.durations()[row],
        sig.to_attrs.fsp,
    ));
    Ok(())
}

pub(super) fn cast_int_as_json(
    _ctx: &mut EvalContext,
    sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let v = source.i64s()[row];
    let json = if sig.from_attrs.unsigned {
        JsonValue::from(v as u64)
    } else {
        JsonValue::from(v)
    };
    result.append_json(&json);
    Ok(())
}

pub(super) fn cast_string_as_json(
    ctx: &mut EvalContext,
    _sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let s = match source.str_at(row) {
        Ok(s) => s,
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.append_null();
            return Ok(());
        }
    };
    match serde_json::from_str::<JsonValue>(s) {
        Ok(v) => result.append_json(&v),
        Err(_) => {
            ctx.handle_overflow(CastError::MalformedInput {
                value: s.to_string(),
                target: "JSON",
            })?;
            result.append_null();
        }
    }
    Ok(())
}

pub(super) fn cast_json_as_string(
    ctx: &mut EvalContext,
    _sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    match source.json_at(row) {
        // scalar strings are unquoted; everything else keeps JSON text form
        Ok(JsonValue::String(s)) => result.append_str(&s),
        Ok(v) => result.append_json(&v),
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.append_null();
        }
    }
    Ok(())
}

pub(super) fn cast_json_as_int(
    ctx: &mut EvalContext,
    _sig: &CastSignature,
    source: &Column,
    row: usize,
    result: &mut Column,
) -> Result<(), CastError> {
    let value = match source.json_at(row) {
        Ok(v) => v,
        Err(err) => {
            ctx.handle_overflow(err)?;
            result.set_null(row, true);
            return Ok(());
        }
    };
    match value {
        JsonValue::Null => result.set_null(row, true),
        JsonValue::Bool(v) => result.i64s_mut()[row] = i64::from(v),
        JsonValue::Number(n) => {
            if let Some(v) = n.as_i64() {
                result.i64s_mut()[row] = v;
            } else {
                let v = n.as_f64().unwrap_or(f64::NAN);
                if v.is_finite() && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                    result.i64s_mut()[row] = v.trunc() as i64;
                } else {
                    ctx.handle_overflow(CastError::Overflow {
                        value: n.to_string(),
                        target: "BIGINT",
                    })?;
                    result.i64s_mut()[row] = if v < 0.0 { i64::MIN } else { i64::MAX };
                }
            }
        }
        JsonValue::String(s) => {
            let (v, err) = parse_i64_prefix(&s);
            if let Some(err) = err {
                ctx.handle_overflow(err)?;
            }
            result.i64s_mut()[row] = v;
        }
        other => {
            ctx.handle_overflow(CastError::MalformedInput {
                value: other.to_string(),
                target: "BIGINT",
            })?;
            result.i64s_mut()[row] = 0;
        }
    }
    Ok(())
}

/// Parses a leading integer out of `s`. Returns the parsed (possibly
/// clamped) value plus the truncation/overflow error when the whole string
/// was not consumed; callers route the error through the policy and keep the
/// value.
fn parse_i64_prefix(s: &str) -> (i64, Option<CastError>) {
    let trimmed = s.trim();
    let bytes = trimmed.as_bytes();
    let mut idx = 0;
    let mut negative = false;
    if idx < bytes.len() && (bytes[idx] == b'+' || bytes[idx] == b'-') {
        negative = bytes[idx] == b'-';
        idx += 1;
    }
    let digits_start = idx;
    let mut magnitude: i128 = 0;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        if magnitude <= u64::MAX as i128 {
            magnitude = magnitude * 10 + (bytes[idx] - b'0') as i128;
        }
        idx += 1;
    }
    if idx == digits_start {
        return (
            0,
            Some(CastError::MalformedInput {
                value: s.to_string(),
                target: "BIGINT",
            }),
        );
    }
    let signed = if negative { -magnitude } else { magnitude };
    if signed > i64::MAX as i128 || signed < i64::MIN as i128 {
        let clamped = if negative { i64::MIN } else { i64::MAX };
        return (
            clamped,
            Some(CastError::Overflow {
                value: trimmed.to_string(),
                target: "BIGINT",
            }),
        );
    }
    if idx != bytes.len() {
        return (
            signed as i64,
            Some(CastError::MalformedInput {
                value: s.to_string(),
                target: "BIGINT",
            }),
        );
    }
    (signed as i64, None)
}

fn parse_f64_prefix(s: &str) -> (f64, Option<CastError>) {
    let trimmed = s.trim();
    let end = float_prefix_len(trimmed);
    if end == 0 {
        return (
            0.0,
            Some(CastError::MalformedInput {
                value: s.to_string(),
                target: "DOUBLE",
            }),
        );
    }
    let v: f64 = trimmed[..end].parse().unwrap_or(0.0);
    if v.is_infinite() {
        // magnitudes past the double range clamp to the boundary
        let clamped = if v.is_sign_negative() {
            -f64::MAX
        } else {
            f64::MAX
        };
        return (
            clamped,
            Some(CastError::Overflow {
                value: trimmed.to_string(),
                target: "DOUBLE",
            }),
        );
    }
    if end != trimmed.len() {
        return (
            v,
            Some(CastError::MalformedInput {
                value: s.to_string(),
                target: "DOUBLE",
            }),
        );
    }
    (v, None)
}

/// Byte length of the longest numeric prefix: `[+-]digits[.digits][eE[+-]digits]`.
fn float_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut idx = 0;
    if idx < bytes.len() && (bytes[idx] == b'+' || bytes[idx] == b'-') {
        idx += 1;
    }
    let mut saw_digit = false;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
        saw_digit = true;
    }
    if idx < bytes.len() && bytes[idx] == b'.' {
        idx += 1;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
            saw_digit = true;
        }
    }
    if !saw_digit {
        return 0;
    }
    if idx < bytes.len() && (bytes[idx] == b'e' || bytes[idx] == b'E') {
        let mut exp = idx + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let mut saw_exp_digit = false;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
            saw_exp_digit = true;
        }
        if saw_exp_digit {
            idx = exp;
        }
    }
    idx
}

/// MySQL-compatible double rendering: shortest round-trip form with a bare
/// `0` for zero and a `+`-signed exponent.
fn format_real(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-inf".to_string()
        } else {
            "inf".to_string()
        };
    }
    let mut buf = ryu::Buffer::new();
    let formatted = buf.format(value);
    let stripped = formatted.strip_suffix(".0").unwrap_or(formatted);
    if let Some(exp_pos) = stripped.find('e') {
        let mut out = String::with_capacity(stripped.len() + 1);
        out.push_str(&stripped[..=exp_pos]);
        match stripped.as_bytes().get(exp_pos + 1) {
            Some(b'+') | Some(b'-') => out.push_str(&stripped[exp_pos + 1..]),
            _ => {
                out.push('+');
                out.push_str(&stripped[exp_pos + 1..]);
            }
        }
        out
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_i64_prefix() {
        assert_eq!(parse_i64_prefix(" 42 "), (42, None));
        assert_eq!(parse_i64_prefix("-7"), (-7, None));
        let (v, err) = parse_i64_prefix("123abc");
        assert_eq!(v, 123);
        assert!(matches!(err, Some(CastError::MalformedInput { .. })));
        let (v, err) = parse_i64_prefix("99999999999999999999");
        assert_eq!(v, i64::MAX);
        assert!(matches!(err, Some(CastError::Overflow { .. })));
        let (v, err) = parse_i64_prefix("x");
        assert_eq!(v, 0);
        assert!(err.is_some());
    }

    #[test]
    fn test_parse_f64_prefix() {
        assert_eq!(parse_f64_prefix("1.5e2"), (150.0, None));
        let (v, err) = parse_f64_prefix("2.5kg");
        assert_eq!(v, 2.5);
        assert!(err.is_some());
        let (v, err) = parse_f64_prefix("1e999");
        assert_eq!(v, f64::MAX);
        assert!(matches!(err, Some(CastError::Overflow { .. })));
        // a dangling exponent marker is not part of the number
        let (v, err) = parse_f64_prefix("3e");
        assert_eq!(v, 3.0);
        assert!(err.is_some());
    }

    #[test]
    fn test_format_real() {
        assert_eq!(format_real(0.0), "0");
        assert_eq!(format_real(-1.5), "-1.5");
        assert_eq!(format_real(3.0), "3");
        assert_eq!(format_real(1e20), "1e+20");
        assert_eq!(format_real(f64::NAN), "nan");
    }
}
