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
use std::fmt;

use crate::exec::chunk::LogicalType;

/// Errors produced by cast evaluation.
///
/// `Overflow` and `MalformedInput` are data-dependent and may degrade to
/// warnings under non-strict mode (see `EvalContext::handle_overflow`).
/// `InvalidPrecision` and `Unimplemented` indicate a structurally invalid
/// plan and always abort the batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CastError {
    Overflow {
        value: String,
        target: &'static str,
    },
    MalformedInput {
        value: String,
        target: &'static str,
    },
    InvalidPrecision {
        detail: String,
    },
    Unimplemented {
        from: LogicalType,
        to: LogicalType,
    },
}

impl CastError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CastError::Overflow { .. } | CastError::MalformedInput { .. }
        )
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastError::Overflow { value, target } => {
                write!(f, "value {value} is out of range for type {target}")
            }
            CastError::MalformedInput { value, target } => {
                write!(f, "incorrect {target} value: '{value}'")
            }
            CastError::InvalidPrecision { detail } => {
                write!(f, "invalid precision: {detail}")
            }
            CastError::Unimplemented { from, to } => {
                write!(
                    f,
                    "cast from {} to {} has no registered implementation",
                    from.name(),
                    to.name()
                )
            }
        }
    }
}

impl std::error::Error for CastError {}
