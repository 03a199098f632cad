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
pub mod buffer_pool;
pub mod cast;
mod error;
mod eval_ctx;

pub use cast::{CastSignature, FieldAttrs};
pub use error::CastError;
pub use eval_ctx::{CastWarning, EvalContext};

use serde_json::Value as JsonValue;

use crate::common::datetime::Time;
use crate::common::decimal::Decimal;
use crate::exec::chunk::{Chunk, Column, LogicalType};
use buffer_pool::BufferPool;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExprId(pub usize);

#[derive(Clone, Debug)]
pub enum LiteralValue {
    Null,
    Int(i64),
    Real(f64),
    Decimal(Decimal),
    Utf8(String),
    DateTime(Time),
    /// Elapsed time as nanoseconds.
    Duration(i64),
    Json(JsonValue),
}

impl LiteralValue {
    fn logical_type(&self) -> Option<LogicalType> {
        match self {
            LiteralValue::Null => None,
            LiteralValue::Int(_) => Some(LogicalType::Int),
            LiteralValue::Real(_) => Some(LogicalType::Real),
            LiteralValue::Decimal(_) => Some(LogicalType::Decimal),
            LiteralValue::Utf8(_) => Some(LogicalType::String),
            LiteralValue::DateTime(_) => Some(LogicalType::DateTime),
            LiteralValue::Duration(_) => Some(LogicalType::Duration),
            LiteralValue::Json(_) => Some(LogicalType::Json),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ExprNode {
    /// Column reference by position in the input chunk.
    ColumnRef(usize),
    Literal(LiteralValue),
    Cast(CastSignature),
}

/// Arena-allocated expression nodes. A `CastSignature` owns its child only
/// as an `ExprId` into this arena, shared with the rest of the tree.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    nodes: Vec<ExprNode>,
    types: Vec<LogicalType>,
}

impl ExprArena {
    pub fn push_typed(&mut self, node: ExprNode, tp: LogicalType) -> ExprId {
        let id = ExprId(self.nodes.len());
        self.nodes.push(node);
        self.types.push(tp);
        id
    }

    /// Pushes a node whose logical type is implied by the node itself
    /// (non-null literals and casts). `ColumnRef` and null literals need
    /// `push_typed`.
    pub fn push(&mut self, node: ExprNode) -> ExprId {
        let tp = match &node {
            ExprNode::Literal(v) => v
                .logical_type()
                .unwrap_or_else(|| panic!("null literal needs push_typed")),
            ExprNode::Cast(sig) => sig.to,
            ExprNode::ColumnRef(_) => panic!("column ref needs push_typed"),
        };
        self.push_typed(node, tp)
    }

    pub fn node(&self, id: ExprId) -> &ExprNode {
        &self.nodes[id.0]
    }

    pub fn logical_type(&self, id: ExprId) -> LogicalType {
        self.types[id.0]
    }

    pub fn eval_int(
        &self,
        ctx: &mut EvalContext,
        pool: &BufferPool,
        id: ExprId,
        chunk: &Chunk,
        result: &mut Column,
    ) -> Result<(), CastError> {
        self.eval_source(ctx, pool, LogicalType::Int, id, chunk, result)
    }

    pub fn eval_real(
        &self,
        ctx: &mut EvalContext,
        pool: &BufferPool,
        id: ExprId,
        chunk: &Chunk,
        result: &mut Column,
    ) -> Result<(), CastError> {
        self.eval_source(ctx, pool, LogicalType::Real, id, chunk, result)
    }

    pub fn eval_decimal(
        &self,
        ctx: &mut EvalContext,
        pool: &BufferPool,
        id: ExprId,
        chunk: &Chunk,
        result: &mut Column,
    ) -> Result<(), CastError> {
        self.eval_source(ctx, pool, LogicalType::Decimal, id, chunk, result)
    }

    pub fn eval_string(
        &self,
        ctx: &mut EvalContext,
        pool: &BufferPool,
        id: ExprId,
        chunk: &Chunk,
        result: &mut Column,
    ) -> Result<(), CastError> {
        self.eval_source(ctx, pool, LogicalType::String, id, chunk, result)
    }

    pub fn eval_time(
        &self,
        ctx: &mut EvalContext,
        pool: &BufferPool,
        id: ExprId,
        chunk: &Chunk,
        result: &mut Column,
    ) -> Result<(), CastError> {
        self.eval_source(ctx, pool, LogicalType::DateTime, id, chunk, result)
    }

    pub fn eval_duration(
        &self,
        ctx: &mut EvalContext,
        pool: &BufferPool,
        id: ExprId,
        chunk: &Chunk,
        result: &mut Column,
    ) -> Result<(), CastError> {
        self.eval_source(ctx, pool, LogicalType::Duration, id, chunk, result)
    }

    pub fn eval_json(
        &self,
        ctx: &mut EvalContext,
        pool: &BufferPool,
        id: ExprId,
        chunk: &Chunk,
        result: &mut Column,
    ) -> Result<(), CastError> {
        self.eval_source(ctx, pool, LogicalType::Json, id, chunk, result)
    }

    /// Evaluates `id` into `result`, which must be typed for `want`.
    pub(crate) fn eval_source(
        &self,
        ctx: &mut EvalContext,
        pool: &BufferPool,
        want: LogicalType,
        id: ExprId,
        chunk: &Chunk,
        result: &mut Column,
    ) -> Result<(), CastError> {
        debug_assert_eq!(self.logical_type(id), want);
        debug_assert_eq!(result.logical_type(), want);
        match &self.nodes[id.0] {
            ExprNode::ColumnRef(idx) => {
                let src = chunk.column(*idx);
                debug_assert_eq!(src.logical_type(), want);
                result.copy_from(src);
                Ok(())
            }
            ExprNode::Literal(v) => {
                fill_literal(v, chunk.num_rows(), result);
                Ok(())
            }
            ExprNode::Cast(sig) => {
                debug_assert_eq!(sig.to, want);
                cast::evaluate(ctx, pool, self, sig, chunk, result)
            }
        }
    }
}

fn fill_literal(value: &LiteralValue, n: usize, result: &mut Column) {
    if result.logical_type().is_var_len() {
        result.reset();
        for _ in 0..n {
            match value {
                LiteralValue::Null => result.append_null(),
                LiteralValue::Utf8(s) => result.append_str(s),
                LiteralValue::Json(v) => result.append_json(v),
                other => panic!("literal {other:?} cannot fill {:?}", result.logical_type()),
            }
        }
        return;
    }

    result.resize(n, false);
    match value {
        LiteralValue::Null => {
            for i in 0..n {
                result.set_null(i, true);
            }
        }
        LiteralValue::Int(v) => result.i64s_mut().fill(*v),
        LiteralValue::Real(v) => result.f64s_mut().fill(*v),
        LiteralValue::Decimal(v) => result.decimals_mut().fill(*v),
        LiteralValue::DateTime(v) => result.times_mut().fill(*v),
        LiteralValue::Duration(v) => result.durations_mut().fill(*v),
        other => panic!("literal {other:?} cannot fill {:?}", result.logical_type()),
    }
}
