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

//! Mergeable quantiles sketch built from a base buffer and binary-weighted levels.
//!
//! New items land unsorted in a base buffer of `2k` slots. When it fills up it is
//! sorted, downsampled to `k` items and carried into the levels the way a binary
//! counter increments: level i holds `k` sorted items that each stand for `2^(i + 1)`
//! observations (twice the relative weight of the level below), and the set of
//! populated levels is always the binary representation of `n / 2k`. The normalized rank error is roughly `O(1/k)`.
//!
//! The sketch state can live on the heap ([`HeapStorage`]) or in a growable byte region
//! with a fixed binary layout ([`RegionStorage`]). Both sit behind the same
//! [`StorageBackend`] trait, so [`DoublesSketch`] behaves identically over either.
//!
//! # Usage
//!
//! ```rust
//! # use sliding_quantiles::quantiles::DoublesSketch;
//! let mut sketch = DoublesSketch::new(128).unwrap();
//! for i in 0..1000 {
//!     sketch.update(i as f64).unwrap();
//! }
//! let median = sketch.quantile(0.5).unwrap();
//! assert!((median - 500.0).abs() < 1000.0 * sketch.normalized_rank_error(false));
//! ```

mod helper;
mod region;
mod serialization;
mod sketch;
mod sorted_view;
mod storage;

pub use self::helper::compute_bit_pattern;
pub use self::helper::required_item_capacity;
pub use self::helper::updatable_storage_bytes;
pub use self::region::HeapRegionAllocator;
pub use self::region::RegionAllocator;
pub use self::region::RegionStorage;
pub use self::sketch::DoublesSketch;
pub use self::storage::HeapStorage;
pub use self::storage::StorageBackend;

/// Default value of parameter k.
pub const DEFAULT_K: u16 = 128;
/// Minimum value of parameter k.
pub const MIN_K: u16 = 2;
/// Maximum value of parameter k.
pub const MAX_K: u16 = 1 << 15;
