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

//! Vectorized cast bodies. Each one materializes its source through the
//! buffer pool (or straight into the destination when the types line up),
//! merges the source null mask once, then converts element-wise, consulting
//! the overflow policy and the UNION-unsigned rule where the family calls
//! for them.

use crate::common::datetime;
use crate::exec::chunk::{Chunk, Column, LogicalType};
use crate::exec::expr::buffer_pool::BufferPool;
use crate::exec::expr::{CastError, CastSignature, EvalContext, ExprArena};

pub(super) fn cast_int_as_int(
    ctx: &mut EvalContext,
    pool: &BufferPool,
    arena: &ExprArena,
    sig: &CastSignature,
    input: &Chunk,
    result: &mut Column,
) -> Result<(), CastError> {
    arena.eval_int(ctx, pool, sig.child, input, result)?;
    if sig.in_union && sig.to_attrs.unsigned {
        // the null mask already came from the child, so the clamp loop can
        // run over the raw values without consulting it
        for v in result.i64s_mut() {
            if *v < 0 {
                *v = 0;
            }
        }
    }
    Ok(())
}

pub(super) fn cast_int_as_real(
    ctx: &mut EvalContext,
    pool: &BufferPool,
    arena: &ExprArena,
    sig: &CastSignature,
    input: &Chunk,
    result: &mut Column,
) -> Result<(), CastError> {
    let n = input.num_rows();
    let mut buf = pool.get(LogicalType::Int, n);
    arena.eval_int(ctx, pool, sig.child, input, &mut buf)?;

    result.resize(n, false);
    result.merge_nulls(&buf);

    let unsigned_dst = sig.to_attrs.unsigned;
    let unsigned_src = sig.from_attrs.unsigned;
    for i in 0..n {
        if buf.is_null(i) {
            continue;
        }
        let v = buf.i64s()[i];
        result.f64s_mut()[i] = if !unsigned_dst && !unsigned_src {
            v as f64
        } else if sig.in_union && v < 0 {
            0.0
        } else {
            // int-to-float differs from uint-to-float once the sign bit is
            // set: reinterpret the pattern as unsigned before widening
            v as u64 as f64
        };
    }
    Ok(())
}

pub(super) fn cast_real_as_real(
    ctx: &mut EvalContext,
    pool: &BufferPool,
    arena: &ExprArena,
    sig: &CastSignature,
    input: &Chunk,
    result: &mut Column,
) -> Result<(), CastError> {
    arena.eval_real(ctx, pool, sig.child, input, result)?;
    if !(sig.in_union && sig.to_attrs.unsigned) {
        return Ok(());
    }
    let n = input.num_rows();
    for i in 0..n {
        if result.is_null(i) {
            continue;
        }
        if result.f64s()[i] < 0.0 {
            result.f64s_mut()[i] = 0.0;
        }
    }
    Ok(())
}

pub(super) fn cast_decimal_as_real(
    ctx: &mut EvalContext,
    pool: &BufferPool,
    arena: &ExprArena,
    sig: &CastSignature,
    input: &Chunk,
    result: &mut Column,
) -> Result<(), CastError> {
    let n = input.num_rows();
    let mut buf = pool.get(LogicalType::Decimal, n);
    arena.eval_decimal(ctx, pool, sig.child, input, &mut buf)?;

    result.resize(n, false);
    result.merge_nulls(&buf);

    let in_union_and_unsigned = sig.in_union && sig.to_attrs.unsigned;
    for i in 0..n {
        if result.is_null(i) {
            continue;
        }
        let d = buf.decimals()[i];
        // the UNION clamp is checked before the lossy conversion is even
        // attempted; a clamped row can never surface an overflow error
        if in_union_and_unsigned && d.is_negative() {
            result.f64s_mut()[i] = 0.0;
            continue;
        }
        match d.to_f64() {
            Ok(v) => result.f64s_mut()[i] = v,
            Err(err) => {
                ctx.handle_overflow(err)?;
                result.set_null(i, true);
            }
        }
    }
    Ok(())
}

pub(super) fn cast_int_as_duration(
    ctx: &mut EvalContext,
    pool: &BufferPool,
    arena: &ExprArena,
    sig: &CastSignature,
    input: &Chunk,
    result: &mut Column,
) -> Result<(), CastError> {
    let n = input.num_rows();
    let mut buf = pool.get(LogicalType::Int, n);
    arena.eval_int(ctx, pool, sig.child, input, &mut buf)?;

    result.resize(n, false);
    result.merge_nulls(&buf);

    let fsp = sig.to_attrs.fsp;
    datetime::check_fsp(fsp)?;
    for i in 0..n {
        if result.is_null(i) {
            continue;
        }
        match datetime::number_to_duration(buf.i64s()[i], fsp) {
            Ok(d) => result.durations_mut()[i] = d,
            Err(err) => {
                ctx.handle_overflow(err)?;
                result.set_null(i, true);
            }
        }
    }
    Ok(())
}

pub(super) fn cast_time_as_duration(
    ctx: &mut EvalContext,
    pool: &BufferPool,
    arena: &ExprArena,
    sig: &CastSignature,
    input: &Chunk,
    result: &mut Column,
) -> Result<(), CastError> {
    let n = input.num_rows();
    let mut buf = pool.get(LogicalType::DateTime, n);
    arena.eval_time(ctx, pool, sig.child, input, &mut buf)?;

    result.resize(n, false);
    result.merge_nulls(&buf);

    let fsp = sig.to_attrs.fsp;
    datetime::check_fsp(fsp)?;
    for i in 0..n {
        if result.is_null(i) {
            continue;
        }
        // rounding errors here are always fatal, never degraded to warnings
        let d = datetime::round_frac(buf.times()[i].to_duration(), fsp)?;
        result.durations_mut()[i] = d;
    }
    Ok(())
}
