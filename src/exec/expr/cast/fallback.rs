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

//! Row-at-a-time adapter. Evaluates the child into a pooled buffer once,
//! then drives a single-value cast body over every non-null row. Var-len
//! destinations are rebuilt in row order; fixed-width destinations are sized
//! up front and inherit the child's null mask.

use crate::exec::chunk::{Chunk, Column};
use crate::exec::expr::buffer_pool::BufferPool;
use crate::exec::expr::cast::{CastSignature, ScalarCastFn};
use crate::exec::expr::{CastError, EvalContext, ExprArena};

pub(super) fn eval_rows(
    ctx: &mut EvalContext,
    pool: &BufferPool,
    arena: &ExprArena,
    sig: &CastSignature,
    input: &Chunk,
    result: &mut Column,
    f: ScalarCastFn,
) -> Result<(), CastError> {
    let n = input.num_rows();
    let mut buf = pool.get(sig.from, n);
    arena.eval_source(ctx, pool, sig.from, sig.child, input, &mut buf)?;

    if result.logical_type().is_var_len() {
        result.reset();
        for row in 0..n {
            if buf.is_null(row) {
                result.append_null();
            } else {
                f(ctx, sig, &buf, row, result)?;
            }
        }
    } else {
        result.resize(n, false);
        result.merge_nulls(&buf);
        for row in 0..n {
            if buf.is_null(row) {
                continue;
            }
            f(ctx, sig, &buf, row, result)?;
        }
    }
    Ok(())
}
