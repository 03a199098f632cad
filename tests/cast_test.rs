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
//! Integration tests for CAST evaluation.
//!
//! Every cast runs through the expression arena against a one-column chunk,
//! the way the evaluator drives it. Tests cover null propagation, the
//! strict/non-strict overflow policy, UNION clamping, unsigned
//! reinterpretation, and agreement between the vectorized and row-at-a-time
//! paths.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use veccast::{
    BufferPool, CastError, CastSignature, CastWarning, Chunk, Column, Decimal, EvalContext,
    ExprArena, ExprId, ExprNode, LogicalType, Time, cast,
};

const NANOS_PER_SEC: i64 = 1_000_000_000;

fn int_column(values: &[Option<i64>]) -> Column {
    let mut col = Column::new(LogicalType::Int);
    col.resize(values.len(), false);
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) => col.i64s_mut()[i] = *v,
            None => col.set_null(i, true),
        }
    }
    col
}

fn real_column(values: &[Option<f64>]) -> Column {
    let mut col = Column::new(LogicalType::Real);
    col.resize(values.len(), false);
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) => col.f64s_mut()[i] = *v,
            None => col.set_null(i, true),
        }
    }
    col
}

fn decimal_column(values: &[Option<Decimal>]) -> Column {
    let mut col = Column::new(LogicalType::Decimal);
    col.resize(values.len(), false);
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) => col.decimals_mut()[i] = *v,
            None => col.set_null(i, true),
        }
    }
    col
}

fn duration_column(values: &[Option<i64>]) -> Column {
    let mut col = Column::new(LogicalType::Duration);
    col.resize(values.len(), false);
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) => col.durations_mut()[i] = *v,
            None => col.set_null(i, true),
        }
    }
    col
}

fn time_column(values: &[Option<Time>]) -> Column {
    let mut col = Column::new(LogicalType::DateTime);
    col.resize(values.len(), false);
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) => col.times_mut()[i] = *v,
            None => col.set_null(i, true),
        }
    }
    col
}

fn string_column(values: &[Option<&str>]) -> Column {
    let mut col = Column::new(LogicalType::String);
    for v in values {
        match v {
            Some(s) => col.append_str(s),
            None => col.append_null(),
        }
    }
    col
}

fn json_column(values: &[Option<serde_json::Value>]) -> Column {
    let mut col = Column::new(LogicalType::Json);
    for v in values {
        match v {
            Some(v) => col.append_json(v),
            None => col.append_null(),
        }
    }
    col
}

fn eval_into(
    arena: &ExprArena,
    ctx: &mut EvalContext,
    pool: &BufferPool,
    id: ExprId,
    chunk: &Chunk,
    out: &mut Column,
) -> Result<(), CastError> {
    match out.logical_type() {
        LogicalType::Int => arena.eval_int(ctx, pool, id, chunk, out),
        LogicalType::Real => arena.eval_real(ctx, pool, id, chunk, out),
        LogicalType::Decimal => arena.eval_decimal(ctx, pool, id, chunk, out),
        LogicalType::String => arena.eval_string(ctx, pool, id, chunk, out),
        LogicalType::DateTime => arena.eval_time(ctx, pool, id, chunk, out),
        LogicalType::Duration => arena.eval_duration(ctx, pool, id, chunk, out),
        LogicalType::Json => arena.eval_json(ctx, pool, id, chunk, out),
    }
}

/// Casts `input` (as column 0 of a chunk) with the signature produced by
/// `make_sig`, returning the eval result, the output column, and the
/// warnings recorded along the way. Also asserts that no pooled buffer
/// leaks, on the success and the error path alike.
fn run_cast(
    input: Column,
    make_sig: impl FnOnce(ExprId) -> CastSignature,
    strict: bool,
) -> (Result<(), CastError>, Column, Vec<CastWarning>) {
    let from = input.logical_type();
    let mut arena = ExprArena::default();
    let child = arena.push_typed(ExprNode::ColumnRef(0), from);
    let sig = make_sig(child);
    let to = sig.to;
    let id = arena.push(ExprNode::Cast(sig));
    let chunk = Chunk::new(vec![input]);
    let mut ctx = EvalContext::new(strict);
    let pool = BufferPool::new();
    let mut out = Column::new(to);
    let res = eval_into(&arena, &mut ctx, &pool, id, &chunk, &mut out);
    assert_eq!(pool.in_use(), 0, "pooled buffer leaked");
    (res, out, ctx.take_warnings())
}

/// Like `run_cast` but forces the row-at-a-time path.
fn run_cast_fallback(
    input: Column,
    make_sig: impl FnOnce(ExprId) -> CastSignature,
    strict: bool,
) -> (Result<(), CastError>, Column, Vec<CastWarning>) {
    let from = input.logical_type();
    let mut arena = ExprArena::default();
    let child = arena.push_typed(ExprNode::ColumnRef(0), from);
    let sig = make_sig(child);
    let to = sig.to;
    let chunk = Chunk::new(vec![input]);
    let mut ctx = EvalContext::new(strict);
    let pool = BufferPool::new();
    let mut out = Column::new(to);
    let res = cast::evaluate_fallback(&mut ctx, &pool, &arena, &sig, &chunk, &mut out);
    assert_eq!(pool.in_use(), 0, "pooled buffer leaked");
    (res, out, ctx.take_warnings())
}

#[test]
fn test_null_propagation_through_vectorized_path() {
    let input = int_column(&[Some(1), None, Some(3), None]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Int, LogicalType::Real, child),
        false,
    );
    res.unwrap();
    assert!(warnings.is_empty());
    assert_eq!(out.num_rows(), 4);
    assert_eq!(out.f64s()[0], 1.0);
    assert!(out.is_null(1));
    assert_eq!(out.f64s()[2], 3.0);
    assert!(out.is_null(3));
}

#[test]
fn test_int_as_real_unsigned_reinterprets_sign_bit() {
    let input = int_column(&[Some(-1), Some(7)]);
    let (res, out, _) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Int, LogicalType::Real, child)
                .source_unsigned()
                .unsigned()
        },
        false,
    );
    res.unwrap();
    assert_eq!(out.f64s()[0], u64::MAX as f64);
    assert_eq!(out.f64s()[1], 7.0);
}

#[test]
fn test_union_clamps_negative_int_to_zero() {
    let input = int_column(&[Some(-5), Some(5), None]);
    let (res, out, warnings) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Int, LogicalType::Int, child)
                .unsigned()
                .in_union()
        },
        false,
    );
    res.unwrap();
    // clamping is silent; not an overflow
    assert!(warnings.is_empty());
    assert_eq!(out.i64s()[0], 0);
    assert_eq!(out.i64s()[1], 5);
    assert!(out.is_null(2));
}

#[test]
fn test_union_clamps_negative_real_to_zero() {
    let input = real_column(&[Some(-2.5), Some(2.5)]);
    let (res, out, _) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Real, LogicalType::Real, child)
                .unsigned()
                .in_union()
        },
        false,
    );
    res.unwrap();
    assert_eq!(out.f64s()[0], 0.0);
    assert_eq!(out.f64s()[1], 2.5);
}

#[test]
fn test_decimal_as_real_overflow_degrades_to_warning() {
    // 1e100: representable as a decimal, far beyond what the conversion
    // can expand exactly
    let huge = Decimal::new(1, -100);
    let input = decimal_column(&[Some(huge), Some(Decimal::new(25, 1))]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Decimal, LogicalType::Real, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("out of range"));
    assert!(out.is_null(0));
    assert_eq!(out.f64s()[1], 2.5);
}

#[test]
fn test_decimal_as_real_overflow_aborts_in_strict_mode() {
    let huge = Decimal::new(1, -100);
    let input = decimal_column(&[Some(huge)]);
    let (res, _, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Decimal, LogicalType::Real, child),
        true,
    );
    assert!(matches!(res, Err(CastError::Overflow { .. })));
    assert!(warnings.is_empty());
}

#[test]
fn test_decimal_union_clamp_checked_before_conversion() {
    // a negative out-of-range magnitude: the clamp must win, so no
    // overflow is ever reported
    let huge_negative = Decimal::new(-1, -100);
    let input = decimal_column(&[Some(huge_negative)]);
    let (res, out, warnings) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Decimal, LogicalType::Real, child)
                .unsigned()
                .in_union()
        },
        false,
    );
    res.unwrap();
    assert!(warnings.is_empty());
    assert_eq!(out.f64s()[0], 0.0);
}

#[test]
fn test_int_as_duration_policy() {
    let input = int_column(&[
        Some(8385959),  // max TIME
        Some(8386000),  // beyond range
        Some(1070),     // minute digits 70
        Some(-123059),
    ]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Int, LogicalType::Duration, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 2);
    assert_eq!(
        out.durations()[0],
        (838 * 3600 + 59 * 60 + 59) * NANOS_PER_SEC
    );
    assert!(out.is_null(1));
    assert!(out.is_null(2));
    assert_eq!(
        out.durations()[3],
        -(12 * 3600 + 30 * 60 + 59) * NANOS_PER_SEC
    );
}

#[test]
fn test_int_as_duration_strict_mode_aborts() {
    let input = int_column(&[Some(8386000)]);
    let (res, _, _) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Int, LogicalType::Duration, child),
        true,
    );
    assert!(matches!(res, Err(CastError::Overflow { .. })));
}

#[test]
fn test_time_as_duration_rounds_half_up() {
    let t1 = Time::from_parts(2023, 1, 1, 12, 34, 56, 500_000_000).unwrap();
    let t2 = Time::from_parts(2023, 1, 1, 12, 34, 59, 500_000_000).unwrap();
    let t3 = Time::from_parts(2023, 1, 1, 12, 34, 56, 499_999_999).unwrap();
    let input = time_column(&[Some(t1), Some(t2), Some(t3)]);
    let (res, out, warnings) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::DateTime, LogicalType::Duration, child).with_fsp(0)
        },
        false,
    );
    res.unwrap();
    assert!(warnings.is_empty());
    assert_eq!(out.durations()[0], (12 * 3600 + 34 * 60 + 57) * NANOS_PER_SEC);
    // carry across the minute boundary
    assert_eq!(out.durations()[1], (12 * 3600 + 35 * 60) * NANOS_PER_SEC);
    assert_eq!(out.durations()[2], (12 * 3600 + 34 * 60 + 56) * NANOS_PER_SEC);

    // rounding an already-rounded duration is a no-op
    for row in 0..out.num_rows() {
        let rounded = veccast::common::datetime::round_frac(out.durations()[row], 0).unwrap();
        assert_eq!(rounded, out.durations()[row]);
    }
}

#[test]
fn test_time_as_duration_keeps_fraction_at_higher_fsp() {
    let t = Time::from_parts(2023, 1, 1, 0, 0, 1, 123_456_789).unwrap();
    let input = time_column(&[Some(t)]);
    let (res, out, _) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::DateTime, LogicalType::Duration, child).with_fsp(3)
        },
        false,
    );
    res.unwrap();
    assert_eq!(out.durations()[0], NANOS_PER_SEC + 123_000_000);
}

#[test]
fn test_invalid_fsp_is_fatal_even_when_not_strict() {
    let input = int_column(&[Some(1)]);
    let (res, _, warnings) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Int, LogicalType::Duration, child).with_fsp(7)
        },
        false,
    );
    assert!(matches!(res, Err(CastError::InvalidPrecision { .. })));
    assert!(warnings.is_empty());
}

#[test]
fn test_decimal_as_int_rounds_and_clamps() {
    let input = decimal_column(&[
        Some(Decimal::new(25, 1)),   // 2.5 -> 3
        Some(Decimal::new(-25, 1)),  // -2.5 -> -3
        Some(Decimal::new(1, -30)),  // 1e30 -> clamp
    ]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Decimal, LogicalType::Int, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(out.i64s()[0], 3);
    assert_eq!(out.i64s()[1], -3);
    assert_eq!(out.i64s()[2], i64::MAX);
    assert!(!out.is_null(2));
}

#[test]
fn test_decimal_as_unsigned_int_clamps_low_to_zero() {
    let input = decimal_column(&[Some(Decimal::new(-1, -30))]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Decimal, LogicalType::Int, child).unsigned(),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(out.i64s()[0], 0);
}

#[test]
fn test_duration_as_int_reencodes_hhmmss() {
    let input = duration_column(&[
        Some((12 * 3600 + 34 * 60 + 59) * NANOS_PER_SEC + 500_000_000),
        Some(-(1 * 3600 + 2 * 60 + 3) * NANOS_PER_SEC),
    ]);
    let (res, out, _) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Duration, LogicalType::Int, child),
        false,
    );
    res.unwrap();
    // 12:34:59.5 rounds to 12:35:00
    assert_eq!(out.i64s()[0], 123500);
    assert_eq!(out.i64s()[1], -10203);
}

#[test]
fn test_int_as_datetime_literal_forms() {
    let input = int_column(&[
        Some(20230102123456),
        Some(691231),  // two-digit year, 69 -> 2069
        Some(701231),  // two-digit year, 70 -> 1970
        Some(0),       // not a date
    ]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Int, LogicalType::DateTime, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        out.times()[0],
        Time::from_parts(2023, 1, 2, 12, 34, 56, 0).unwrap()
    );
    assert_eq!(
        out.times()[1],
        Time::from_parts(2069, 12, 31, 0, 0, 0, 0).unwrap()
    );
    assert_eq!(
        out.times()[2],
        Time::from_parts(1970, 12, 31, 0, 0, 0, 0).unwrap()
    );
    assert!(out.is_null(3));
}

#[test]
fn test_real_as_decimal_half_up() {
    let input = real_column(&[Some(2.5), Some(-2.5), Some(1.25)]);
    let (res, out, _) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Real, LogicalType::Decimal, child)
                .with_precision_scale(10, 0)
        },
        false,
    );
    res.unwrap();
    assert_eq!(out.decimals()[0], Decimal::new(3, 0));
    assert_eq!(out.decimals()[1], Decimal::new(-3, 0));
    assert_eq!(out.decimals()[2], Decimal::new(1, 0));
}

#[test]
fn test_real_as_decimal_union_clamp() {
    let input = real_column(&[Some(-1.5)]);
    let (res, out, warnings) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Real, LogicalType::Decimal, child)
                .unsigned()
                .in_union()
        },
        false,
    );
    res.unwrap();
    assert!(warnings.is_empty());
    assert_eq!(out.decimals()[0], Decimal::ZERO);
}

#[test]
fn test_string_as_int_truncates_with_warning() {
    let input = string_column(&[
        Some(" 42 "),
        Some("123abc"),
        Some("abc"),
        Some("99999999999999999999"),
        None,
    ]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::String, LogicalType::Int, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 3);
    assert_eq!(out.i64s()[0], 42);
    // the parsed prefix is kept, the row is not nulled
    assert_eq!(out.i64s()[1], 123);
    assert!(!out.is_null(1));
    assert_eq!(out.i64s()[2], 0);
    assert_eq!(out.i64s()[3], i64::MAX);
    assert!(out.is_null(4));
}

#[test]
fn test_string_as_int_strict_mode_aborts() {
    let input = string_column(&[Some("abc")]);
    let (res, _, _) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::String, LogicalType::Int, child),
        true,
    );
    assert!(matches!(res, Err(CastError::MalformedInput { .. })));
}

#[test]
fn test_invalid_utf8_string_degrades_to_warning() {
    let mut col = Column::new(LogicalType::String);
    col.append_bytes(&[0xff, 0xfe]);
    col.append_str("7");
    let (res, out, warnings) = run_cast(
        col,
        |child| CastSignature::new(LogicalType::String, LogicalType::Int, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(out.is_null(0));
    assert_eq!(out.i64s()[1], 7);
}

#[test]
fn test_invalid_utf8_string_aborts_in_strict_mode() {
    let mut col = Column::new(LogicalType::String);
    col.append_bytes(&[0xff, 0xfe]);
    let (res, _, _) = run_cast(
        col,
        |child| CastSignature::new(LogicalType::String, LogicalType::Int, child),
        true,
    );
    assert!(matches!(res, Err(CastError::MalformedInput { .. })));
}

#[test]
fn test_unparsable_json_payload_degrades_to_warning() {
    // a JSON column whose stored bytes are not a valid document
    let mut col = Column::new(LogicalType::Json);
    col.append_str("not json");
    col.append_json(&json!(5));
    let (res, out, warnings) = run_cast(
        col,
        |child| CastSignature::new(LogicalType::Json, LogicalType::String, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(out.is_null(0));
    assert_eq!(out.str_at(1).unwrap(), "5");

    // same policy on a fixed-width destination
    let mut col = Column::new(LogicalType::Json);
    col.append_str("not json");
    col.append_json(&json!(5));
    let (res, out, warnings) = run_cast(
        col,
        |child| CastSignature::new(LogicalType::Json, LogicalType::Int, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(out.is_null(0));
    assert_eq!(out.i64s()[1], 5);
}

#[test]
fn test_string_as_real_clamps_huge_magnitudes() {
    let input = string_column(&[Some("1.5e2"), Some("1e999"), Some("2.5kg")]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::String, LogicalType::Real, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 2);
    assert_eq!(out.f64s()[0], 150.0);
    assert_eq!(out.f64s()[1], f64::MAX);
    assert_eq!(out.f64s()[2], 2.5);
}

#[test]
fn test_string_as_decimal_rescales_to_target() {
    let input = string_column(&[Some("3.14159"), Some("oops")]);
    let (res, out, warnings) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::String, LogicalType::Decimal, child)
                .with_precision_scale(10, 2)
        },
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(out.decimals()[0], Decimal::new(314, 2));
    assert!(out.is_null(1));
}

#[test]
fn test_numeric_to_string_rendering() {
    let input = int_column(&[Some(-1), Some(42)]);
    let (res, out, _) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Int, LogicalType::String, child).source_unsigned()
        },
        false,
    );
    res.unwrap();
    assert_eq!(out.str_at(0).unwrap(), "18446744073709551615");
    assert_eq!(out.str_at(1).unwrap(), "42");

    let input = real_column(&[Some(3.0), Some(0.0), Some(-1.5), Some(1e20)]);
    let (res, out, _) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Real, LogicalType::String, child),
        false,
    );
    res.unwrap();
    assert_eq!(out.str_at(0).unwrap(), "3");
    assert_eq!(out.str_at(1).unwrap(), "0");
    assert_eq!(out.str_at(2).unwrap(), "-1.5");
    assert_eq!(out.str_at(3).unwrap(), "1e+20");

    let input = decimal_column(&[Some(Decimal::new(-1234, 2))]);
    let (res, out, _) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Decimal, LogicalType::String, child),
        false,
    );
    res.unwrap();
    assert_eq!(out.str_at(0).unwrap(), "-12.34");
}

#[test]
fn test_duration_as_string_honors_fsp() {
    let input = duration_column(&[
        Some((8 * 3600 + 1 * 60 + 2) * NANOS_PER_SEC + 500_000_000),
        Some(-(90 * 60) * NANOS_PER_SEC),
    ]);
    let (res, out, _) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Duration, LogicalType::String, child).with_fsp(2)
        },
        false,
    );
    res.unwrap();
    assert_eq!(out.str_at(0).unwrap(), "08:01:02.50");
    assert_eq!(out.str_at(1).unwrap(), "-01:30:00.00");
}

#[test]
fn test_json_family() {
    // int -> json, unsigned source widens through u64
    let input = int_column(&[Some(-1), Some(3)]);
    let (res, out, _) = run_cast(
        input,
        |child| {
            CastSignature::new(LogicalType::Int, LogicalType::Json, child).source_unsigned()
        },
        false,
    );
    res.unwrap();
    assert_eq!(out.json_at(0).unwrap(), json!(18446744073709551615u64));
    assert_eq!(out.json_at(1).unwrap(), json!(3));

    // string -> json: invalid documents null the row under non-strict mode
    let input = string_column(&[Some(r#"{"a": 1}"#), Some("not json"), None]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::String, LogicalType::Json, child),
        false,
    );
    res.unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(out.json_at(0).unwrap(), json!({"a": 1}));
    assert!(out.is_null(1));
    assert!(out.is_null(2));

    // json -> string: scalar strings unquote, documents keep text form
    let input = json_column(&[
        Some(json!("hello")),
        Some(json!([1, 2])),
        Some(json!(true)),
    ]);
    let (res, out, _) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Json, LogicalType::String, child),
        false,
    );
    res.unwrap();
    assert_eq!(out.str_at(0).unwrap(), "hello");
    assert_eq!(out.str_at(1).unwrap(), "[1,2]");
    assert_eq!(out.str_at(2).unwrap(), "true");
}

#[test]
fn test_json_as_int_by_scalar_kind() {
    let input = json_column(&[
        Some(json!(42)),
        Some(json!(true)),
        Some(json!("17x")),
        Some(json!(2.9)),
        Some(json!(null)),
        Some(json!([1])),
    ]);
    let (res, out, warnings) = run_cast(
        input,
        |child| CastSignature::new(LogicalType::Json, LogicalType::Int, child),
        false,
    );
    res.unwrap();
    assert_eq!(out.i64s()[0], 42);
    assert_eq!(out.i64s()[1], 1);
    assert_eq!(out.i64s()[2], 17);
    assert_eq!(out.i64s()[3], 2);
    assert!(out.is_null(4));
    assert_eq!(out.i64s()[5], 0);
    // "17x" truncation and the array row
    assert_eq!(warnings.len(), 2);
}

fn assert_columns_agree(a: &Column, b: &Column) {
    assert_eq!(a.num_rows(), b.num_rows());
    for row in 0..a.num_rows() {
        assert_eq!(a.is_null(row), b.is_null(row), "null mask differs at {row}");
        if a.is_null(row) {
            continue;
        }
        match a.logical_type() {
            LogicalType::Int => assert_eq!(a.i64s()[row], b.i64s()[row], "row {row}"),
            LogicalType::Real => assert_eq!(a.f64s()[row], b.f64s()[row], "row {row}"),
            LogicalType::Duration => {
                assert_eq!(a.durations()[row], b.durations()[row], "row {row}")
            }
            other => panic!("unexpected comparison type {other:?}"),
        }
    }
}

/// The vectorized bodies are optimizations of the single-value casts; both
/// paths must agree on values, null bits and recorded warnings.
#[test]
fn test_vectorized_and_fallback_paths_agree() {
    let mut rng = StdRng::seed_from_u64(0x5eed_cafe);
    let rows: Vec<Option<i64>> = (0..512)
        .map(|_| {
            if rng.gen_bool(0.1) {
                None
            } else {
                // spans valid HHMMSS encodings, malformed ones, and
                // out-of-range magnitudes
                Some(rng.gen_range(-10_000_000..10_000_000))
            }
        })
        .collect();

    let signatures: Vec<fn(ExprId) -> CastSignature> = vec![
        |child| {
            CastSignature::new(LogicalType::Int, LogicalType::Int, child)
                .unsigned()
                .in_union()
        },
        |child| CastSignature::new(LogicalType::Int, LogicalType::Real, child).source_unsigned(),
        |child| CastSignature::new(LogicalType::Int, LogicalType::Duration, child),
    ];

    for make_sig in signatures {
        let (vec_res, vec_out, vec_warnings) = run_cast(int_column(&rows), make_sig, false);
        let (row_res, row_out, row_warnings) =
            run_cast_fallback(int_column(&rows), make_sig, false);
        vec_res.unwrap();
        row_res.unwrap();
        assert_columns_agree(&vec_out, &row_out);
        assert_eq!(vec_warnings, row_warnings);
    }

    let real_rows: Vec<Option<f64>> = (0..512)
        .map(|_| {
            if rng.gen_bool(0.1) {
                None
            } else {
                Some(rng.gen_range(-1000.0..1000.0))
            }
        })
        .collect();
    let make_sig = |child| {
        CastSignature::new(LogicalType::Real, LogicalType::Real, child)
            .unsigned()
            .in_union()
    };
    let (vec_res, vec_out, vec_warnings) = run_cast(real_column(&real_rows), make_sig, false);
    let (row_res, row_out, row_warnings) =
        run_cast_fallback(real_column(&real_rows), make_sig, false);
    vec_res.unwrap();
    row_res.unwrap();
    assert_columns_agree(&vec_out, &row_out);
    assert_eq!(vec_warnings, row_warnings);

    // random times of day with fractional seconds, so the fsp-0 rounding
    // (including the carry past :59.5) is exercised on both paths
    let time_rows: Vec<Option<Time>> = (0..512)
        .map(|_| {
            if rng.gen_bool(0.1) {
                None
            } else {
                Time::from_parts(
                    2023,
                    6,
                    15,
                    rng.gen_range(0..24),
                    rng.gen_range(0..60),
                    rng.gen_range(0..60),
                    rng.gen_range(0..1_000_000_000),
                )
            }
        })
        .collect();
    let make_sig = |child| {
        CastSignature::new(LogicalType::DateTime, LogicalType::Duration, child).with_fsp(0)
    };
    let (vec_res, vec_out, vec_warnings) = run_cast(time_column(&time_rows), make_sig, false);
    let (row_res, row_out, row_warnings) =
        run_cast_fallback(time_column(&time_rows), make_sig, false);
    vec_res.unwrap();
    row_res.unwrap();
    assert_columns_agree(&vec_out, &row_out);
    assert_eq!(vec_warnings, row_warnings);
}

#[test]
fn test_vectorized_and_fallback_agree_on_decimal_overflow() {
    let rows = vec![
        Some(Decimal::new(1, -100)),
        Some(Decimal::new(-3125, 3)),
        None,
        Some(Decimal::ZERO),
    ];
    let make_sig =
        |child| CastSignature::new(LogicalType::Decimal, LogicalType::Real, child);
    let (vec_res, vec_out, vec_warnings) = run_cast(decimal_column(&rows), make_sig, false);
    let (row_res, row_out, row_warnings) =
        run_cast_fallback(decimal_column(&rows), make_sig, false);
    vec_res.unwrap();
    row_res.unwrap();
    assert_columns_agree(&vec_out, &row_out);
    assert_eq!(vec_warnings, row_warnings);
}

#[test]
fn test_result_column_is_reusable_across_batches() {
    // second batch is shorter; the result must shrink with it
    let mut arena = ExprArena::default();
    let child = arena.push_typed(ExprNode::ColumnRef(0), LogicalType::Int);
    let id = arena.push(ExprNode::Cast(CastSignature::new(
        LogicalType::Int,
        LogicalType::Real,
        child,
    )));
    let pool = BufferPool::new();
    let mut ctx = EvalContext::new(false);
    let mut out = Column::new(LogicalType::Real);

    let first = Chunk::new(vec![int_column(&[Some(1), Some(2), Some(3)])]);
    arena
        .eval_real(&mut ctx, &pool, id, &first, &mut out)
        .unwrap();
    assert_eq!(out.num_rows(), 3);

    let second = Chunk::new(vec![int_column(&[None, Some(9)])]);
    arena
        .eval_real(&mut ctx, &pool, id, &second, &mut out)
        .unwrap();
    assert_eq!(out.num_rows(), 2);
    assert!(out.is_null(0));
    assert_eq!(out.f64s()[1], 9.0);
    assert_eq!(pool.in_use(), 0);
}
