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
use tracing::debug;

use crate::common::app_config::VeccastConfig;
use crate::exec::expr::CastError;

/// A conversion warning recorded under non-strict mode, surfaced to the
/// session layer after the batch completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastWarning {
    pub message: String,
}

/// Per-evaluation execution state: the strict/non-strict mode flag and the
/// warning collector. Threaded by mutable reference into every handler call;
/// there is deliberately no process-wide instance, so concurrent batch
/// evaluations cannot interfere.
#[derive(Debug, Default)]
pub struct EvalContext {
    strict: bool,
    warnings: Vec<CastWarning>,
}

impl EvalContext {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            warnings: Vec::new(),
        }
    }

    pub fn from_config(cfg: &VeccastConfig) -> Self {
        Self::new(cfg.execution.strict_mode)
    }

    pub fn strict_mode(&self) -> bool {
        self.strict
    }

    /// Routes a conversion error through the overflow/truncation policy.
    /// Strict mode (and any non-recoverable error) propagates; otherwise the
    /// error is recorded as a warning and the caller decides whether the row
    /// is nulled or clamped per its conversion family.
    pub fn handle_overflow(&mut self, err: CastError) -> Result<(), CastError> {
        if self.strict || !err.is_recoverable() {
            return Err(err);
        }
        debug!(error = %err, "cast error degraded to warning");
        self.warnings.push(CastWarning {
            message: err.to_string(),
        });
        Ok(())
    }

    pub fn warnings(&self) -> &[CastWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<CastWarning> {
        std::mem::take(&mut self.warnings)
    }
}
