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

use crate::error::Error;

/// Typed slot access to the state of a quantiles sketch, plus a growth operation.
///
/// The item slots form the combined buffer: `2k` base buffer slots followed by the
/// levels in increasing order, each exactly `k` slots. The bit pattern and the base
/// buffer count are never stored; [`DoublesSketch`](super::DoublesSketch) derives them
/// from `k` and `n`.
pub trait StorageBackend {
    /// Returns the resolution parameter k.
    fn k(&self) -> u16;

    /// Returns the number of items seen.
    fn n(&self) -> u64;

    /// Sets the number of items seen, maintaining any empty marker the backend keeps.
    fn set_n(&mut self, n: u64);

    fn min_value(&self) -> f64;

    fn set_min_value(&mut self, value: f64);

    fn max_value(&self) -> f64;

    fn set_max_value(&mut self, value: f64);

    /// Number of item slots currently available in the combined buffer.
    fn item_capacity(&self) -> usize;

    fn set_item(&mut self, index: usize, value: f64);

    /// Copies `dst.len()` items starting at slot `start` into `dst`.
    fn read_items(&self, start: usize, dst: &mut [f64]);

    /// Copies `src` into the slots starting at `start`.
    fn write_items(&mut self, start: usize, src: &[f64]);

    /// Grows the combined buffer to exactly `item_capacity` slots, keeping all
    /// existing content.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Capacity`](crate::error::ErrorKind::Capacity) if the
    /// request cannot be satisfied, in which case the storage is unchanged.
    fn grow(&mut self, item_capacity: usize) -> Result<(), Error>;

    /// Returns to the empty state without releasing capacity.
    fn clear(&mut self);

    /// Returns true if the underlying storage is marked read-only.
    fn is_read_only(&self) -> bool {
        false
    }
}

/// Storage kept in plain fields and a `Vec<f64>`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeapStorage {
    k: u16,
    n: u64,
    min_value: f64,
    max_value: f64,
    items: Vec<f64>,
}

impl HeapStorage {
    pub(crate) fn new(k: u16) -> Self {
        Self {
            k,
            n: 0,
            min_value: f64::NAN,
            max_value: f64::NAN,
            items: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        k: u16,
        n: u64,
        min_value: f64,
        max_value: f64,
        items: Vec<f64>,
    ) -> Self {
        Self {
            k,
            n,
            min_value,
            max_value,
            items,
        }
    }
}

impl StorageBackend for HeapStorage {
    fn k(&self) -> u16 {
        self.k
    }

    fn n(&self) -> u64 {
        self.n
    }

    fn set_n(&mut self, n: u64) {
        self.n = n;
    }

    fn min_value(&self) -> f64 {
        self.min_value
    }

    fn set_min_value(&mut self, value: f64) {
        self.min_value = value;
    }

    fn max_value(&self) -> f64 {
        self.max_value
    }

    fn set_max_value(&mut self, value: f64) {
        self.max_value = value;
    }

    fn item_capacity(&self) -> usize {
        self.items.len()
    }

    fn set_item(&mut self, index: usize, value: f64) {
        self.items[index] = value;
    }

    fn read_items(&self, start: usize, dst: &mut [f64]) {
        dst.copy_from_slice(&self.items[start..start + dst.len()]);
    }

    fn write_items(&mut self, start: usize, src: &[f64]) {
        self.items[start..start + src.len()].copy_from_slice(src);
    }

    fn grow(&mut self, item_capacity: usize) -> Result<(), Error> {
        let current = self.items.len();
        if item_capacity <= current {
            return Ok(());
        }
        self.items
            .try_reserve_exact(item_capacity - current)
            .map_err(|err| {
                Error::capacity(format!("failed to grow heap storage: {err}"))
                    .with_context("item_capacity", item_capacity)
            })?;
        self.items.resize(item_capacity, 0.0);
        Ok(())
    }

    fn clear(&mut self) {
        self.n = 0;
        self.min_value = f64::NAN;
        self.max_value = f64::NAN;
    }
}
