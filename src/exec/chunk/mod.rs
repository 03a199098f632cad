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
use arrow_buffer::BooleanBufferBuilder;
use serde_json::Value as JsonValue;

use crate::common::datetime::Time;
use crate::common::decimal::Decimal;
use crate::exec::expr::CastError;

/// SQL-level value categories, independent of physical storage width.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LogicalType {
    Int,
    Real,
    Decimal,
    String,
    DateTime,
    Duration,
    Json,
}

impl LogicalType {
    /// Var-len types live in a byte store with an offset index and follow
    /// the append discipline; everything else is a fixed-width store that
    /// is resized up front.
    pub fn is_var_len(self) -> bool {
        matches!(self, LogicalType::String | LogicalType::Json)
    }

    pub fn name(self) -> &'static str {
        match self {
            LogicalType::Int => "BIGINT",
            LogicalType::Real => "DOUBLE",
            LogicalType::Decimal => "DECIMAL",
            LogicalType::String => "VARCHAR",
            LogicalType::DateTime => "DATETIME",
            LogicalType::Duration => "TIME",
            LogicalType::Json => "JSON",
        }
    }
}

#[derive(Debug)]
enum ColumnData {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Decimal(Vec<Decimal>),
    /// Elapsed time as nanoseconds.
    Duration(Vec<i64>),
    DateTime(Vec<Time>),
    /// Var-len store shared by VARCHAR and JSON (JSON rows are serialized
    /// text). `offsets` always starts with 0 and has `num_rows + 1` entries.
    Bytes { data: Vec<u8>, offsets: Vec<usize> },
}

/// A batch-scoped container for one field over `n` rows: a logical type tag,
/// a null bitmap (1 = null) and exactly one typed backing store.
///
/// Invariant: backing store length and bitmap length both equal `n` after
/// any resize; a column is never read before being sized to the batch's row
/// count. `set_null` and `merge_nulls` are the only bitmap mutations cast
/// handlers are allowed to perform.
#[derive(Debug)]
pub struct Column {
    tp: LogicalType,
    nulls: BooleanBufferBuilder,
    data: ColumnData,
}

impl Column {
    pub fn new(tp: LogicalType) -> Self {
        let data = match tp {
            LogicalType::Int => ColumnData::Int64(Vec::new()),
            LogicalType::Real => ColumnData::Float64(Vec::new()),
            LogicalType::Decimal => ColumnData::Decimal(Vec::new()),
            LogicalType::Duration => ColumnData::Duration(Vec::new()),
            LogicalType::DateTime => ColumnData::DateTime(Vec::new()),
            LogicalType::String | LogicalType::Json => ColumnData::Bytes {
                data: Vec::new(),
                offsets: vec![0],
            },
        };
        Self {
            tp,
            nulls: BooleanBufferBuilder::new(0),
            data,
        }
    }

    pub fn logical_type(&self) -> LogicalType {
        self.tp
    }

    pub fn num_rows(&self) -> usize {
        match &self.data {
            ColumnData::Int64(v) | ColumnData::Duration(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Decimal(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
            ColumnData::Bytes { offsets, .. } => offsets.len() - 1,
        }
    }

    /// Resizes a fixed-width column to `n` rows. When `preserve` is false,
    /// values are zeroed and all null bits are cleared.
    pub fn resize(&mut self, n: usize, preserve: bool) {
        match &mut self.data {
            ColumnData::Int64(v) | ColumnData::Duration(v) => {
                if !preserve {
                    v.clear();
                }
                v.resize(n, 0);
            }
            ColumnData::Float64(v) => {
                if !preserve {
                    v.clear();
                }
                v.resize(n, 0.0);
            }
            ColumnData::Decimal(v) => {
                if !preserve {
                    v.clear();
                }
                v.resize(n, Decimal::ZERO);
            }
            ColumnData::DateTime(v) => {
                if !preserve {
                    v.clear();
                }
                v.resize(n, Time::default());
            }
            ColumnData::Bytes { .. } => {
                panic!("resize on var-len column; use reset + append")
            }
        }
        if preserve {
            self.nulls.resize(n);
        } else {
            self.nulls.truncate(0);
            self.nulls.append_n(n, false);
        }
    }

    /// Clears all rows, keeping allocations for reuse.
    pub fn reset(&mut self) {
        match &mut self.data {
            ColumnData::Int64(v) | ColumnData::Duration(v) => v.clear(),
            ColumnData::Float64(v) => v.clear(),
            ColumnData::Decimal(v) => v.clear(),
            ColumnData::DateTime(v) => v.clear(),
            ColumnData::Bytes { data, offsets } => {
                data.clear();
                offsets.truncate(1);
            }
        }
        self.nulls.truncate(0);
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.nulls.get_bit(row)
    }

    pub fn set_null(&mut self, row: usize, is_null: bool) {
        self.nulls.set_bit(row, is_null);
    }

    /// Marks every row that is null in `other` as null here. Word-wise over
    /// the two bitmaps; rows not null in `other` keep their current bit.
    pub fn merge_nulls(&mut self, other: &Column) {
        debug_assert_eq!(self.num_rows(), other.num_rows());
        let src = other.nulls.as_slice();
        for (d, s) in self.nulls.as_slice_mut().iter_mut().zip(src) {
            *d |= *s;
        }
    }

    pub fn i64s(&self) -> &[i64] {
        match &self.data {
            ColumnData::Int64(v) => v,
            other => panic!("expected BIGINT backing store, got {other:?}"),
        }
    }

    pub fn i64s_mut(&mut self) -> &mut [i64] {
        match &mut self.data {
            ColumnData::Int64(v) => v,
            other => panic!("expected BIGINT backing store, got {other:?}"),
        }
    }

    pub fn f64s(&self) -> &[f64] {
        match &self.data {
            ColumnData::Float64(v) => v,
            other => panic!("expected DOUBLE backing store, got {other:?}"),
        }
    }

    pub fn f64s_mut(&mut self) -> &mut [f64] {
        match &mut self.data {
            ColumnData::Float64(v) => v,
            other => panic!("expected DOUBLE backing store, got {other:?}"),
        }
    }

    pub fn decimals(&self) -> &[Decimal] {
        match &self.data {
            ColumnData::Decimal(v) => v,
            other => panic!("expected DECIMAL backing store, got {other:?}"),
        }
    }

    pub fn decimals_mut(&mut self) -> &mut [Decimal] {
        match &mut self.data {
            ColumnData::Decimal(v) => v,
            other => panic!("expected DECIMAL backing store, got {other:?}"),
        }
    }

    /// Durations as nanoseconds.
    pub fn durations(&self) -> &[i64] {
        match &self.data {
            ColumnData::Duration(v) => v,
            other => panic!("expected TIME backing store, got {other:?}"),
        }
    }

    pub fn durations_mut(&mut self) -> &mut [i64] {
        match &mut self.data {
            ColumnData::Duration(v) => v,
            other => panic!("expected TIME backing store, got {other:?}"),
        }
    }

    pub fn times(&self) -> &[Time] {
        match &self.data {
            ColumnData::DateTime(v) => v,
            other => panic!("expected DATETIME backing store, got {other:?}"),
        }
    }

    pub fn times_mut(&mut self) -> &mut [Time] {
        match &mut self.data {
            ColumnData::DateTime(v) => v,
            other => panic!("expected DATETIME backing store, got {other:?}"),
        }
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) {
        match &mut self.data {
            ColumnData::Bytes { data, offsets } => {
                data.extend_from_slice(bytes);
                offsets.push(data.len());
            }
            other => panic!("append_bytes on fixed-width column {other:?}"),
        }
        self.nulls.append(false);
    }

    pub fn append_str(&mut self, s: &str) {
        self.append_bytes(s.as_bytes());
    }

    pub fn append_json(&mut self, value: &JsonValue) {
        self.append_str(&value.to_string());
    }

    /// Appends a null row to a var-len column (fixed-width columns mark
    /// nulls post-hoc via `set_null` after `resize`).
    pub fn append_null(&mut self) {
        match &mut self.data {
            ColumnData::Bytes { data, offsets } => {
                offsets.push(data.len());
            }
            other => panic!("append_null on fixed-width column {other:?}"),
        }
        self.nulls.append(true);
    }

    pub fn bytes_at(&self, row: usize) -> &[u8] {
        match &self.data {
            ColumnData::Bytes { data, offsets } => &data[offsets[row]..offsets[row + 1]],
            other => panic!("bytes_at on fixed-width column {other:?}"),
        }
    }

    pub fn str_at(&self, row: usize) -> Result<&str, CastError> {
        std::str::from_utf8(self.bytes_at(row)).map_err(|_| CastError::MalformedInput {
            value: format!("<invalid utf8 at row {row}>"),
            target: "VARCHAR",
        })
    }

    pub fn json_at(&self, row: usize) -> Result<JsonValue, CastError> {
        serde_json::from_slice(self.bytes_at(row)).map_err(|_| CastError::MalformedInput {
            value: String::from_utf8_lossy(self.bytes_at(row)).into_owned(),
            target: "JSON",
        })
    }

    /// Materializes `other` into this column, replacing all rows. Both
    /// columns must share a logical type.
    pub fn copy_from(&mut self, other: &Column) {
        debug_assert_eq!(self.tp, other.tp);
        match (&mut self.data, &other.data) {
            (ColumnData::Int64(d), ColumnData::Int64(s))
            | (ColumnData::Duration(d), ColumnData::Duration(s)) => {
                d.clear();
                d.extend_from_slice(s);
            }
            (ColumnData::Float64(d), ColumnData::Float64(s)) => {
                d.clear();
                d.extend_from_slice(s);
            }
            (ColumnData::Decimal(d), ColumnData::Decimal(s)) => {
                d.clear();
                d.extend_from_slice(s);
            }
            (ColumnData::DateTime(d), ColumnData::DateTime(s)) => {
                d.clear();
                d.extend_from_slice(s);
            }
            (
                ColumnData::Bytes { data, offsets },
                ColumnData::Bytes {
                    data: src_data,
                    offsets: src_offsets,
                },
            ) => {
                data.clear();
                data.extend_from_slice(src_data);
                offsets.clear();
                offsets.extend_from_slice(src_offsets);
            }
            (d, s) => panic!("column store mismatch: {d:?} vs {s:?}"),
        }
        self.nulls.truncate(0);
        self.nulls
            .append_packed_range(0..other.num_rows(), other.nulls.as_slice());
    }
}

impl Clone for Column {
    fn clone(&self) -> Self {
        let mut out = Column::new(self.tp);
        out.copy_from(self);
        out
    }
}

/// A batch of rows evaluated together.
#[derive(Debug, Default, Clone)]
pub struct Chunk {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Chunk {
    pub fn new(columns: Vec<Column>) -> Self {
        let num_rows = columns.first().map_or(0, Column::num_rows);
        debug_assert!(columns.iter().all(|c| c.num_rows() == num_rows));
        Self { columns, num_rows }
    }

    /// A chunk with no columns but a definite row count, for expressions
    /// that reference no input column (literals, casts of literals).
    pub fn with_rows(num_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            num_rows,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn column(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}
