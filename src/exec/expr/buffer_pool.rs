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
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use crate::exec::chunk::{Column, LogicalType};

/// Scratch-column pool scoped to one evaluation context, keyed by logical
/// type. Pools are never shared across concurrently executing contexts, so
/// interior mutability is single-threaded (`RefCell`/`Cell`).
#[derive(Default)]
pub struct BufferPool {
    free: RefCell<HashMap<LogicalType, Vec<Column>>>,
    in_use: Cell<usize>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows a buffer for `n` rows. Fixed-width buffers come back resized
    /// with nulls cleared; var-len buffers come back reset for appending.
    /// The guard returns the buffer to the pool on drop, so release happens
    /// on every exit path, including early error returns.
    pub fn get(&self, tp: LogicalType, n: usize) -> BufferGuard<'_> {
        let mut col = self
            .free
            .borrow_mut()
            .entry(tp)
            .or_default()
            .pop()
            .unwrap_or_else(|| Column::new(tp));
        if tp.is_var_len() {
            col.reset();
        } else {
            col.resize(n, false);
        }
        self.in_use.set(self.in_use.get() + 1);
        BufferGuard {
            pool: self,
            col: Some(col),
        }
    }

    /// Count of buffers currently checked out.
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    fn put(&self, col: Column) {
        self.in_use.set(self.in_use.get() - 1);
        self.free
            .borrow_mut()
            .entry(col.logical_type())
            .or_default()
            .push(col);
    }
}

pub struct BufferGuard<'a> {
    pool: &'a BufferPool,
    col: Option<Column>,
}

impl Deref for BufferGuard<'_> {
    type Target = Column;

    fn deref(&self) -> &Column {
        self.col.as_ref().expect("buffer held until drop")
    }
}

impl DerefMut for BufferGuard<'_> {
    fn deref_mut(&mut self) -> &mut Column {
        self.col.as_mut().expect("buffer held until drop")
    }
}

impl Drop for BufferGuard<'_> {
    fn drop(&mut self) {
        if let Some(col) = self.col.take() {
            self.pool.put(col);
        }
    }
}
