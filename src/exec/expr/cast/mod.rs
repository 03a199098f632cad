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
mod fallback;
mod scalar;
mod vec_casts;

use crate::exec::chunk::{Chunk, Column, LogicalType};
use crate::exec::expr::buffer_pool::BufferPool;
use crate::exec::expr::{CastError, EvalContext, ExprArena, ExprId};

/// Destination (or source) type attributes carried by a cast signature.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldAttrs {
    pub unsigned: bool,
    /// Decimal precision; 0 means "keep the value's natural scale".
    pub precision: u8,
    pub scale: i8,
    /// Fractional-second precision for temporal destinations.
    pub fsp: i8,
}

/// Plan-time-bound cast descriptor: immutable after plan compilation,
/// consulted on every batch evaluation. The child expression is shared with
/// the rest of the tree through the arena.
#[derive(Clone, Debug)]
pub struct CastSignature {
    pub from: LogicalType,
    pub to: LogicalType,
    pub from_attrs: FieldAttrs,
    pub to_attrs: FieldAttrs,
    /// The cast's immediate operand arose from a UNION branch: negative
    /// values headed for an unsigned destination clamp to zero instead of
    /// being reinterpreted.
    pub in_union: bool,
    pub child: ExprId,
}

impl CastSignature {
    pub fn new(from: LogicalType, to: LogicalType, child: ExprId) -> Self {
        Self {
            from,
            to,
            from_attrs: FieldAttrs::default(),
            to_attrs: FieldAttrs::default(),
            in_union: false,
            child,
        }
    }

    pub fn unsigned(mut self) -> Self {
        self.to_attrs.unsigned = true;
        self
    }

    pub fn source_unsigned(mut self) -> Self {
        self.from_attrs.unsigned = true;
        self
    }

    pub fn in_union(mut self) -> Self {
        self.in_union = true;
        self
    }

    pub fn with_fsp(mut self, fsp: i8) -> Self {
        self.to_attrs.fsp = fsp;
        self
    }

    pub fn with_precision_scale(mut self, precision: u8, scale: i8) -> Self {
        self.to_attrs.precision = precision;
        self.to_attrs.scale = scale;
        self
    }
}

/// A batch cast over one (source, destination) pair.
pub type VecCastFn = fn(
    &mut EvalContext,
    &BufferPool,
    &ExprArena,
    &CastSignature,
    &Chunk,
    &mut Column,
) -> Result<(), CastError>;

/// A single-value cast: converts `source[row]` (never null) into the
/// destination, either writing in place (fixed-width, already resized) or
/// appending exactly one row (var-len).
pub type ScalarCastFn =
    fn(&mut EvalContext, &CastSignature, &Column, usize, &mut Column) -> Result<(), CastError>;

/// One dispatch entry per ordered type pair. The pair space is closed, so
/// this is a plain match table rather than trait objects; pairs without a
/// vectorized body run the scalar cast row at a time through the fallback
/// adapter with identical semantics.
#[derive(Copy, Clone)]
pub enum CastFn {
    Vectorized(VecCastFn),
    ScalarFallback(ScalarCastFn),
}

pub fn lookup(from: LogicalType, to: LogicalType) -> Option<CastFn> {
    use LogicalType::*;
    match (from, to) {
        (Int, Int) => Some(CastFn::Vectorized(vec_casts::cast_int_as_int)),
        (Int, Real) => Some(CastFn::Vectorized(vec_casts::cast_int_as_real)),
        (Real, Real) => Some(CastFn::Vectorized(vec_casts::cast_real_as_real)),
        (Decimal, Real) => Some(CastFn::Vectorized(vec_casts::cast_decimal_as_real)),
        (Int, Duration) => Some(CastFn::Vectorized(vec_casts::cast_int_as_duration)),
        (DateTime, Duration) => Some(CastFn::Vectorized(vec_casts::cast_time_as_duration)),
        _ => scalar_lookup(from, to).map(CastFn::ScalarFallback),
    }
}

/// Single-value implementations. Every registered pair has one: pairs
/// without a vectorized body use it through the fallback adapter, and
/// vectorized pairs keep theirs as the semantic reference the batch body
/// must reproduce bit for bit.
pub fn scalar_lookup(from: LogicalType, to: LogicalType) -> Option<ScalarCastFn> {
    use LogicalType::*;
    let f: ScalarCastFn = match (from, to) {
        (Int, Int) => scalar::cast_int_as_int,
        (Int, Real) => scalar::cast_int_as_real,
        (Real, Real) => scalar::cast_real_as_real,
        (Decimal, Real) => scalar::cast_decimal_as_real,
        (Int, Duration) => scalar::cast_int_as_duration,
        (DateTime, Duration) => scalar::cast_time_as_duration,
        (Decimal, Int) => scalar::cast_decimal_as_int,
        (Duration, Int) => scalar::cast_duration_as_int,
        (Int, DateTime) => scalar::cast_int_as_time,
        (Real, Decimal) => scalar::cast_real_as_decimal,
        (String, Int) => scalar::cast_string_as_int,
        (String, Real) => scalar::cast_string_as_real,
        (String, Decimal) => scalar::cast_string_as_decimal,
        (Int, String) => scalar::cast_int_as_string,
        (Real, String) => scalar::cast_real_as_string,
        (Decimal, String) => scalar::cast_decimal_as_string,
        (Duration, String) => scalar::cast_duration_as_string,
        (Int, Json) => scalar::cast_int_as_json,
        (String, Json) => scalar::cast_string_as_json,
        (Json, String) => scalar::cast_json_as_string,
        (Json, Int) => scalar::cast_json_as_int,
        _ => return None,
    };
    Some(f)
}

/// Capability query used by planning/telemetry.
pub fn has_vectorized_implementation(sig: &CastSignature) -> bool {
    matches!(lookup(sig.from, sig.to), Some(CastFn::Vectorized(_)))
}

/// Entry point for the expression evaluator. `result` must be pre-typed for
/// `sig.to` but not necessarily sized. On success every row has a value or a
/// null bit consistent with (source null) OR (conversion failure under a
/// null-producing policy); on error the destination is unspecified and must
/// not be read.
pub fn evaluate(
    ctx: &mut EvalContext,
    pool: &BufferPool,
    arena: &ExprArena,
    sig: &CastSignature,
    input: &Chunk,
    result: &mut Column,
) -> Result<(), CastError> {
    debug_assert_eq!(result.logical_type(), sig.to);
    match lookup(sig.from, sig.to) {
        Some(CastFn::Vectorized(f)) => f(ctx, pool, arena, sig, input, result),
        Some(CastFn::ScalarFallback(f)) => {
            fallback::eval_rows(ctx, pool, arena, sig, input, result, f)
        }
        None => Err(CastError::Unimplemented {
            from: sig.from,
            to: sig.to,
        }),
    }
}

/// Forces the row-at-a-time path for any registered pair, including ones
/// with a vectorized body. The vectorized path is only an optimization of
/// this one; both must agree on values, null bits and recorded warnings.
pub fn evaluate_fallback(
    ctx: &mut EvalContext,
    pool: &BufferPool,
    arena: &ExprArena,
    sig: &CastSignature,
    input: &Chunk,
    result: &mut Column,
) -> Result<(), CastError> {
    debug_assert_eq!(result.logical_type(), sig.to);
    let f = scalar_lookup(sig.from, sig.to).ok_or(CastError::Unimplemented {
        from: sig.from,
        to: sig.to,
    })?;
    fallback::eval_rows(ctx, pool, arena, sig, input, result, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::expr::{ExprNode, LiteralValue};

    fn int_literal(arena: &mut ExprArena) -> ExprId {
        arena.push(ExprNode::Literal(LiteralValue::Int(0)))
    }

    #[test]
    fn test_capability_query() {
        let mut arena = ExprArena::default();
        let child = int_literal(&mut arena);
        let vectorized = CastSignature::new(LogicalType::Int, LogicalType::Real, child);
        assert!(has_vectorized_implementation(&vectorized));
        let fallback_only = CastSignature::new(LogicalType::Int, LogicalType::String, child);
        assert!(!has_vectorized_implementation(&fallback_only));
    }

    #[test]
    fn test_unregistered_pair_is_unimplemented() {
        let mut arena = ExprArena::default();
        let child = int_literal(&mut arena);
        let sig = CastSignature::new(LogicalType::Json, LogicalType::Duration, child);
        let mut ctx = EvalContext::new(false);
        let pool = BufferPool::new();
        let input = Chunk::with_rows(1);
        let mut out = Column::new(LogicalType::Duration);
        let err = evaluate(&mut ctx, &pool, &arena, &sig, &input, &mut out).unwrap_err();
        assert_eq!(
            err,
            CastError::Unimplemented {
                from: LogicalType::Json,
                to: LogicalType::Duration,
            }
        );
        assert!(!err.is_recoverable());
    }
}
