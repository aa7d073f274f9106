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

use super::helper::check_k;
use super::helper::compute_base_buffer_count;
use super::helper::compute_bit_pattern;
use super::helper::compute_num_levels_needed;
use super::helper::lowest_zero_bit_starting_at;
use super::helper::merge_sorted_into;
use super::helper::normalized_rank_error;
use super::helper::required_item_capacity;
use super::helper::zip_into;
use super::helper::zip_offset;
use super::region::HeapRegionAllocator;
use super::region::RegionAllocator;
use super::region::RegionStorage;
use super::region::validate_region;
use super::serialization::COMBINED_BUFFER;
use super::serialization::FLAG_EMPTY;
use super::serialization::N_LONG;
use super::serialization::PREAMBLE_LONGS;
use super::serialization::SERIAL_VERSION;
use super::sorted_view::SortedView;
use super::storage::HeapStorage;
use super::storage::StorageBackend;
use crate::codec::Family;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;

/// Quantiles sketch over `f64` values built from a base buffer and binary-weighted levels.
///
/// The sketch is generic over where its state lives: [`HeapStorage`] keeps it in plain
/// fields, [`RegionStorage`] keeps it in a byte region with a fixed binary layout that
/// can be handed to another process and wrapped without copying.
///
/// See the [quantiles module level documentation](crate::quantiles) for more.
#[derive(Debug, Clone)]
pub struct DoublesSketch<S: StorageBackend = HeapStorage> {
    storage: S,
    read_only: bool,
}

impl DoublesSketch<HeapStorage> {
    /// Creates a new empty sketch on the heap.
    ///
    /// # Errors
    ///
    /// Returns a validation error if k is not a power of two in [MIN_K, MAX_K].
    ///
    /// # Examples
    ///
    /// ```
    /// # use sliding_quantiles::quantiles::DoublesSketch;
    /// let sketch = DoublesSketch::new(128).unwrap();
    /// assert_eq!(sketch.k(), 128);
    /// assert!(sketch.is_empty());
    /// ```
    pub fn new(k: u16) -> Result<Self, Error> {
        check_k(k)?;
        Ok(Self::from_storage(HeapStorage::new(k)))
    }

    /// Copies a sketch region image onto the heap.
    ///
    /// The image is validated the same way [`DoublesSketch::wrap`] validates a region.
    pub fn heapify(bytes: &[u8]) -> Result<Self, Error> {
        let k = validate_region(bytes)?;
        if bytes.len() < COMBINED_BUFFER {
            return Ok(Self::from_storage(HeapStorage::new(k)));
        }

        let mut cursor = SketchSlice::new(&bytes[N_LONG..]);
        let n = cursor
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("n"))?;
        let min_value = cursor
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("min"))?;
        let max_value = cursor
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("max"))?;

        let capacity = required_item_capacity(k, n);
        let available = ((bytes.len() - COMBINED_BUFFER) >> 3).min(capacity);
        let mut items = vec![0.0; capacity];
        cursor
            .read_f64_slice_le(&mut items[..available])
            .map_err(|_| Error::insufficient_data("combined buffer"))?;

        let (min_value, max_value) = if n == 0 {
            (f64::NAN, f64::NAN)
        } else {
            (min_value, max_value)
        };
        Ok(Self::from_storage(HeapStorage::from_parts(
            k, n, min_value, max_value, items,
        )))
    }
}

impl<A: RegionAllocator> DoublesSketch<RegionStorage<A>> {
    /// Creates a new empty sketch inside `region`.
    ///
    /// The region must hold at least the 8 byte preamble. It grows through `allocator`
    /// as items arrive.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sliding_quantiles::quantiles::DoublesSketch;
    /// # use sliding_quantiles::quantiles::HeapRegionAllocator;
    /// let mut sketch =
    ///     DoublesSketch::new_in_region(16, vec![0u8; 8], HeapRegionAllocator::new()).unwrap();
    /// sketch.update(1.0).unwrap();
    /// assert_eq!(sketch.storage().capacity_bytes(), 32 + 2 * 16 * 8);
    /// ```
    pub fn new_in_region(k: u16, region: Vec<u8>, allocator: A) -> Result<Self, Error> {
        let storage = RegionStorage::initialize(k, region, allocator)?;
        Ok(Self::from_storage(storage))
    }

    /// Wraps an existing sketch region without copying it.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Format`](crate::error::ErrorKind::Format) if the region
    /// preamble is malformed or the region is too small for its own content.
    pub fn wrap(region: Vec<u8>, allocator: A) -> Result<Self, Error> {
        let storage = RegionStorage::wrap(region, allocator)?;
        Ok(Self::from_storage(storage))
    }

    /// Wraps an existing sketch region for queries only.
    ///
    /// Any mutation of the returned sketch fails with a validation error.
    pub fn wrap_read_only(region: Vec<u8>, allocator: A) -> Result<Self, Error> {
        let storage = RegionStorage::wrap(region, allocator)?;
        Ok(Self {
            storage,
            read_only: true,
        })
    }
}

impl DoublesSketch<RegionStorage<HeapRegionAllocator>> {
    /// Wraps a region image produced by [`DoublesSketch::to_bytes`], growing on the heap.
    pub fn wrap_bytes(bytes: Vec<u8>) -> Result<Self, Error> {
        Self::wrap(bytes, HeapRegionAllocator::new())
    }
}

impl<S: StorageBackend> DoublesSketch<S> {
    fn from_storage(storage: S) -> Self {
        Self {
            storage,
            read_only: false,
        }
    }

    /// Returns parameter k used to configure this sketch.
    pub fn k(&self) -> u16 {
        self.storage.k()
    }

    /// Returns the number of items seen.
    pub fn n(&self) -> u64 {
        self.storage.n()
    }

    /// Returns true if the sketch has not seen any data.
    pub fn is_empty(&self) -> bool {
        self.n() == 0
    }

    /// Returns the minimum item seen, or NaN if the sketch is empty.
    pub fn min_value(&self) -> f64 {
        if self.is_empty() {
            f64::NAN
        } else {
            self.storage.min_value()
        }
    }

    /// Returns the maximum item seen, or NaN if the sketch is empty.
    pub fn max_value(&self) -> f64 {
        if self.is_empty() {
            f64::NAN
        } else {
            self.storage.max_value()
        }
    }

    /// Returns the level occupancy pattern: bit i is set iff level i is populated.
    ///
    /// Always derived from k and n, never stored.
    pub fn bit_pattern(&self) -> u64 {
        compute_bit_pattern(self.k(), self.n())
    }

    /// Returns the number of items in the base buffer.
    pub fn base_buffer_count(&self) -> usize {
        compute_base_buffer_count(self.k(), self.n())
    }

    /// Returns the number of levels spanned by the bit pattern, populated or not.
    pub fn num_levels(&self) -> usize {
        compute_num_levels_needed(self.k(), self.n())
    }

    /// Returns the number of retained items.
    pub fn num_retained(&self) -> usize {
        self.base_buffer_count() + self.bit_pattern().count_ones() as usize * self.k() as usize
    }

    /// Returns true if at least one compaction has happened.
    pub fn is_estimation_mode(&self) -> bool {
        self.bit_pattern() > 0
    }

    /// Returns true if the sketch rejects mutations.
    pub fn is_read_only(&self) -> bool {
        self.read_only || self.storage.is_read_only()
    }

    /// Returns normalized rank error for the configured k.
    pub fn normalized_rank_error(&self, pmf: bool) -> f64 {
        normalized_rank_error(self.k(), pmf)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Updates the sketch with a new item.
    ///
    /// NaN values are ignored. Any storage growth happens before the item is written,
    /// so a failed growth leaves the sketch unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Capacity`](crate::error::ErrorKind::Capacity) if the storage
    /// cannot grow, or a validation error if the sketch is read-only.
    pub fn update(&mut self, value: f64) -> Result<(), Error> {
        self.check_writable()?;
        if value.is_nan() {
            return Ok(());
        }

        let k = self.k();
        let n = self.n();
        let new_base_count = compute_base_buffer_count(k, n) + 1;
        let required = required_item_capacity(k, n + 1);
        let needed = if new_base_count == 2 * k as usize {
            required
        } else {
            new_base_count
        };
        if needed > self.storage.item_capacity() {
            self.storage.grow(required)?;
        }
        self.internal_update(value)
    }

    /// Merges another sketch with the same k into this one. `other` is not modified.
    ///
    /// Capacity for the combined item count is reserved before anything is written.
    pub fn merge<T: StorageBackend>(&mut self, other: &DoublesSketch<T>) -> Result<(), Error> {
        self.check_writable()?;
        if other.is_empty() {
            return Ok(());
        }
        if other.k() != self.k() {
            return Err(Error::validation("cannot merge sketches with different k")
                .with_context("k", self.k())
                .with_context("other_k", other.k()));
        }

        let k = self.k();
        let n_final = self.n() + other.n();
        self.ensure_item_capacity(required_item_capacity(k, n_final))?;

        let mut base = vec![0.0; other.base_buffer_count()];
        other.storage.read_items(0, &mut base);
        for value in base {
            self.internal_update(value)?;
        }

        let mut bit_pattern = self.bit_pattern();
        let mut src_bit_pattern = other.bit_pattern();
        let mut carry = vec![0.0; k as usize];
        let mut level = 0usize;
        while src_bit_pattern != 0 {
            if src_bit_pattern & 1 != 0 {
                other.storage.read_items(level_start(k, level), &mut carry);
                bit_pattern = self.propagate_carry(level, &mut carry, bit_pattern);
            }
            src_bit_pattern >>= 1;
            level += 1;
        }

        let min_value = self.min_value().min(other.min_value());
        let max_value = self.max_value().max(other.max_value());
        self.storage.set_n(n_final);
        self.storage.set_min_value(min_value);
        self.storage.set_max_value(max_value);
        self.check_bit_pattern(bit_pattern)
    }

    /// Returns the approximate quantile for the given normalized rank.
    pub fn quantile(&self, rank: f64) -> Result<f64, Error> {
        let quantiles = self.quantiles(&[rank])?;
        Ok(quantiles[0])
    }

    /// Returns approximate quantiles for the given normalized ranks.
    ///
    /// Ranks must lie in [0.0, 1.0] and be non-decreasing. The results are
    /// non-decreasing as well. Rank 0 returns the minimum and rank 1 the maximum.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EmptyState`](crate::error::ErrorKind::EmptyState) if the
    /// sketch is empty, or a validation error for illegal ranks.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sliding_quantiles::quantiles::DoublesSketch;
    /// let mut sketch = DoublesSketch::new(16).unwrap();
    /// for i in 1..=10 {
    ///     sketch.update(i as f64).unwrap();
    /// }
    /// let q = sketch.quantiles(&[0.0, 0.5, 1.0]).unwrap();
    /// assert_eq!(q, vec![1.0, 6.0, 10.0]);
    /// ```
    pub fn quantiles(&self, ranks: &[f64]) -> Result<Vec<f64>, Error> {
        self.check_not_empty()?;
        check_ranks(ranks)?;

        let view = self.sorted_view();
        let min_value = self.min_value();
        let max_value = self.max_value();
        Ok(ranks
            .iter()
            .map(|&rank| {
                if rank == 0.0 {
                    min_value
                } else if rank == 1.0 {
                    max_value
                } else {
                    view.quantile(rank)
                }
            })
            .collect())
    }

    /// Returns the approximate fraction of items strictly less than `value`.
    pub fn rank(&self, value: f64) -> Result<f64, Error> {
        self.check_not_empty()?;
        if value.is_nan() {
            return Err(Error::validation("rank of NaN is undefined"));
        }
        Ok(self.sorted_view().rank(value))
    }

    /// Returns the approximate CDF at the given split points, plus a final 1.0.
    pub fn cdf(&self, split_points: &[f64]) -> Result<Vec<f64>, Error> {
        self.check_not_empty()?;
        check_split_points(split_points)?;
        Ok(self.sorted_view().cdf(split_points))
    }

    /// Returns the approximate PMF over the intervals defined by the split points.
    pub fn pmf(&self, split_points: &[f64]) -> Result<Vec<f64>, Error> {
        self.check_not_empty()?;
        check_split_points(split_points)?;
        Ok(self.sorted_view().pmf(split_points))
    }

    /// Returns to the empty state. Storage capacity is retained.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.check_writable()?;
        self.storage.clear();
        Ok(())
    }

    /// Serializes the sketch into an updatable region image.
    ///
    /// The image can be wrapped with [`DoublesSketch::wrap`] or copied back onto the
    /// heap with [`DoublesSketch::heapify`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let k = self.k();
        let n = self.n();
        let capacity = required_item_capacity(k, n);
        let size = COMBINED_BUFFER + (capacity << 3);
        let mut bytes = SketchBytes::with_capacity(size);

        bytes.write_u8(PREAMBLE_LONGS);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(Family::QUANTILES.id);
        bytes.write_u8(if n == 0 { FLAG_EMPTY } else { 0 });
        bytes.write_u16_le(k);
        bytes.write_u16_le(0);
        bytes.write_u64_le(n);
        bytes.write_f64_le(self.min_value());
        bytes.write_f64_le(self.max_value());

        let mut items = vec![0.0; capacity.min(self.storage.item_capacity())];
        self.storage.read_items(0, &mut items);
        bytes.write_f64_slice_le(&items);
        bytes.pad_to(size);
        bytes.into_bytes()
    }

    fn check_writable(&self) -> Result<(), Error> {
        if self.is_read_only() {
            return Err(Error::validation("sketch is read-only"));
        }
        Ok(())
    }

    fn check_not_empty(&self) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::empty_state("operation is undefined for an empty sketch"));
        }
        Ok(())
    }

    fn ensure_item_capacity(&mut self, item_capacity: usize) -> Result<(), Error> {
        if item_capacity > self.storage.item_capacity() {
            self.storage.grow(item_capacity)?;
        }
        Ok(())
    }

    // Callers guarantee the combined buffer can absorb the item and any compaction.
    fn internal_update(&mut self, value: f64) -> Result<(), Error> {
        let k = self.k();
        let n = self.n();
        let base_count = compute_base_buffer_count(k, n);

        if n == 0 {
            self.storage.set_min_value(value);
            self.storage.set_max_value(value);
        } else {
            if value > self.storage.max_value() {
                self.storage.set_max_value(value);
            }
            if value < self.storage.min_value() {
                self.storage.set_min_value(value);
            }
        }
        self.storage.set_item(base_count, value);

        let new_n = n + 1;
        if base_count + 1 < 2 * k as usize {
            self.storage.set_n(new_n);
            return Ok(());
        }

        let bit_pattern = compute_bit_pattern(k, n);
        let mut base = vec![0.0; 2 * k as usize];
        self.storage.read_items(0, &mut base);
        base.sort_by(f64::total_cmp);

        let mut carry = vec![0.0; k as usize];
        zip_into(&base, zip_offset(bit_pattern, 0), &mut carry);
        let new_bit_pattern = self.propagate_carry(0, &mut carry, bit_pattern);
        self.storage.set_n(new_n);
        self.check_bit_pattern(new_bit_pattern)
    }

    /// Ripple-carries a sorted run of k items into the levels, starting at
    /// `starting_level`, and returns the new bit pattern.
    ///
    /// Every populated level on the way is merged with the carry and downsampled back
    /// to k items; the first unpopulated level absorbs the result.
    fn propagate_carry(&mut self, starting_level: usize, carry: &mut [f64], bit_pattern: u64) -> u64 {
        let k = self.k();
        let ending_level = lowest_zero_bit_starting_at(bit_pattern, starting_level);

        let mut level_items = vec![0.0; k as usize];
        let mut scratch = vec![0.0; 2 * k as usize];
        for level in starting_level..ending_level {
            debug_assert!(bit_pattern & (1u64 << level) != 0);
            self.storage.read_items(level_start(k, level), &mut level_items);
            merge_sorted_into(&level_items, carry, &mut scratch);
            zip_into(&scratch, zip_offset(bit_pattern, level + 1), carry);
        }
        self.storage.write_items(level_start(k, ending_level), carry);

        bit_pattern + (1u64 << starting_level)
    }

    fn check_bit_pattern(&self, bit_pattern: u64) -> Result<(), Error> {
        let expected = self.bit_pattern();
        if bit_pattern != expected {
            return Err(Error::internal("level occupancy does not match item count")
                .with_context("bit_pattern", format!("{bit_pattern:#b}"))
                .with_context("expected", format!("{expected:#b}"))
                .with_context("n", self.n()));
        }
        Ok(())
    }

    fn sorted_view(&self) -> SortedView {
        let k = self.k();
        let mut base = vec![0.0; self.base_buffer_count()];
        self.storage.read_items(0, &mut base);

        let bit_pattern = self.bit_pattern();
        let levels: Vec<(usize, Vec<f64>)> = (0..self.num_levels())
            .filter(|level| bit_pattern & (1u64 << level) != 0)
            .map(|level| {
                let mut items = vec![0.0; k as usize];
                self.storage.read_items(level_start(k, level), &mut items);
                (level, items)
            })
            .collect();

        let view = SortedView::new(
            &base,
            levels.iter().map(|(level, items)| (*level, items.as_slice())),
        );
        debug_assert_eq!(view.total_weight(), self.n(), "sorted view weight must equal n");
        view
    }
}

fn level_start(k: u16, level: usize) -> usize {
    (2 + level) * k as usize
}

fn check_ranks(ranks: &[f64]) -> Result<(), Error> {
    let mut previous = 0.0;
    for &rank in ranks {
        if !(0.0..=1.0).contains(&rank) {
            return Err(Error::validation("rank must be in [0.0, 1.0]").with_context("rank", rank));
        }
        if rank < previous {
            return Err(Error::validation("ranks must be non-decreasing").with_context("rank", rank));
        }
        previous = rank;
    }
    Ok(())
}

fn check_split_points(split_points: &[f64]) -> Result<(), Error> {
    if split_points.iter().any(|value| value.is_nan()) {
        return Err(Error::validation("split_points must not contain NaN values"));
    }
    if split_points.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(Error::validation(
            "split_points must be unique and monotonically increasing",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagate_carry_ripples_into_first_free_level() {
        let mut sketch = DoublesSketch::new(2).unwrap();
        // 4 items fill the base buffer once (bit pattern 1)
        for value in [4.0, 3.0, 2.0, 1.0] {
            sketch.update(value).unwrap();
        }
        assert_eq!(sketch.bit_pattern(), 0b1);
        for value in [8.0, 7.0, 6.0, 5.0] {
            sketch.update(value).unwrap();
        }
        // second overflow carries level 0 into level 1
        assert_eq!(sketch.bit_pattern(), 0b10);
        assert_eq!(sketch.num_retained(), 2);
        assert_eq!(sketch.storage().item_capacity(), level_start(2, 2));
    }

    #[test]
    fn test_check_ranks() {
        assert!(check_ranks(&[0.0, 0.5, 0.5, 1.0]).is_ok());
        assert!(check_ranks(&[0.5, 0.1]).is_err());
        assert!(check_ranks(&[1.5]).is_err());
        assert!(check_ranks(&[f64::NAN]).is_err());
    }
}
