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

use super::MAX_K;
use super::MIN_K;
use super::serialization::COMBINED_BUFFER;
use super::serialization::EMPTY_SIZE_BYTES;
use crate::error::Error;

/// Checks that k is a power of two in [MIN_K, MAX_K].
pub fn check_k(k: u16) -> Result<(), Error> {
    if !(MIN_K..=MAX_K).contains(&k) || !k.is_power_of_two() {
        return Err(Error::validation(format!(
            "k must be a power of two in [{MIN_K}, {MAX_K}], got {k}"
        ))
        .with_context("k", k));
    }
    Ok(())
}

/// Returns the occupancy pattern of the levels for a sketch with the given k and n.
///
/// Bit i is set iff level i is populated. Level occupancy mirrors a binary counter of
/// completed base buffer overflows.
pub fn compute_bit_pattern(k: u16, n: u64) -> u64 {
    n / (2 * k as u64)
}

/// Number of items currently held in the base buffer.
pub fn compute_base_buffer_count(k: u16, n: u64) -> usize {
    (n % (2 * k as u64)) as usize
}

pub fn compute_num_levels_needed(k: u16, n: u64) -> usize {
    (u64::BITS - compute_bit_pattern(k, n).leading_zeros()) as usize
}

/// Item capacity of the combined buffer needed to hold n items.
pub fn required_item_capacity(k: u16, n: u64) -> usize {
    let k = k as usize;
    let num_levels = compute_num_levels_needed(k as u16, n);
    if num_levels == 0 {
        2 * k
    } else {
        (2 + num_levels) * k
    }
}

/// Minimum region size in bytes of an updatable sketch with the given k and n.
pub fn updatable_storage_bytes(k: u16, n: u64) -> usize {
    if n == 0 {
        return EMPTY_SIZE_BYTES;
    }
    if n <= k as u64 {
        let ceil = (n as usize).next_power_of_two().max(2 * MIN_K as usize);
        return COMBINED_BUFFER + (ceil << 3);
    }
    COMBINED_BUFFER + (required_item_capacity(k, n) << 3)
}

/// Returns the index of the lowest zero bit at or above `starting_bit`.
pub fn lowest_zero_bit_starting_at(bits: u64, starting_bit: usize) -> usize {
    let mut pos = starting_bit;
    while (bits >> pos) & 1 != 0 {
        pos += 1;
    }
    pos
}

/// Offset used when downsampling a carry into `level`.
///
/// Consecutive carries into the same level alternate between keeping the even and the
/// odd positions, which keeps the rank error unbiased while staying deterministic.
pub fn zip_offset(bit_pattern: u64, level: usize) -> usize {
    if level >= u64::BITS as usize {
        return 0;
    }
    ((bit_pattern >> level) & 1) as usize
}

/// Keeps every other item of a sorted 2k input, starting at `offset`.
pub fn zip_into(input: &[f64], offset: usize, output: &mut [f64]) {
    debug_assert_eq!(input.len(), 2 * output.len(), "zip input must be twice the output");
    for (out, idx) in output.iter_mut().zip((offset..input.len()).step_by(2)) {
        *out = input[idx];
    }
}

/// Merges two sorted slices into `output`, whose length must equal the sum of both.
pub fn merge_sorted_into(left: &[f64], right: &[f64], output: &mut [f64]) {
    debug_assert_eq!(output.len(), left.len() + right.len());
    let (mut l, mut r) = (0usize, 0usize);
    for out in output.iter_mut() {
        if r >= right.len() || (l < left.len() && left[l] < right[r]) {
            *out = left[l];
            l += 1;
        } else {
            *out = right[r];
            r += 1;
        }
    }
}

pub fn normalized_rank_error(k: u16, pmf: bool) -> f64 {
    let k = k as f64;
    if pmf {
        1.854 / k.powf(0.9657)
    } else {
        1.576 / k.powf(0.9726)
    }
}
