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

use googletest::assert_that;
use googletest::prelude::near;
use proptest::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sliding_quantiles::error::ErrorKind;
use sliding_quantiles::quantiles::DoublesSketch;
use sliding_quantiles::quantiles::StorageBackend;
use sliding_quantiles::quantiles::compute_bit_pattern;
use sliding_quantiles::quantiles::required_item_capacity;

fn sketch_of(k: u16, values: impl IntoIterator<Item = f64>) -> DoublesSketch {
    let mut sketch = DoublesSketch::new(k).unwrap();
    for value in values {
        sketch.update(value).unwrap();
    }
    sketch
}

#[test]
fn test_empty() {
    let sketch = DoublesSketch::new(128).unwrap();
    assert!(sketch.is_empty());
    assert!(!sketch.is_estimation_mode());
    assert_eq!(sketch.n(), 0);
    assert_eq!(sketch.num_retained(), 0);
    assert!(sketch.min_value().is_nan());
    assert!(sketch.max_value().is_nan());
    assert_eq!(sketch.quantile(0.5).unwrap_err().kind(), ErrorKind::EmptyState);
    assert_eq!(sketch.rank(0.0).unwrap_err().kind(), ErrorKind::EmptyState);
    assert_eq!(sketch.cdf(&[0.0]).unwrap_err().kind(), ErrorKind::EmptyState);
    assert_eq!(sketch.pmf(&[0.0]).unwrap_err().kind(), ErrorKind::EmptyState);
}

#[test]
fn test_invalid_k() {
    for k in [0, 1, 3, 100, 32769] {
        let err = DoublesSketch::new(k).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "k = {k}");
    }
    assert!(DoublesSketch::new(2).is_ok());
    assert!(DoublesSketch::new(1 << 15).is_ok());
}

#[test]
fn test_one_value() {
    let sketch = sketch_of(128, [1.0]);
    assert_eq!(sketch.n(), 1);
    assert_eq!(sketch.min_value(), 1.0);
    assert_eq!(sketch.max_value(), 1.0);
    assert_eq!(sketch.quantile(0.0).unwrap(), 1.0);
    assert_eq!(sketch.quantile(0.5).unwrap(), 1.0);
    assert_eq!(sketch.quantile(1.0).unwrap(), 1.0);
    assert_eq!(sketch.rank(1.0).unwrap(), 0.0);
    assert_eq!(sketch.rank(1.5).unwrap(), 1.0);
}

#[test]
fn test_nan_is_ignored() {
    let sketch = sketch_of(16, [1.0, f64::NAN, 2.0]);
    assert_eq!(sketch.n(), 2);
    assert_eq!(sketch.max_value(), 2.0);
}

#[test]
fn test_two_full_base_buffers() {
    // k = 4: the base buffer holds 8 items, so 16 items fill level 1 and nothing else
    let sketch = sketch_of(4, (1..=16).map(f64::from));
    assert_eq!(sketch.n(), 16);
    assert_eq!(sketch.bit_pattern(), 0b10);
    assert_eq!(sketch.base_buffer_count(), 0);
    assert_eq!(sketch.num_levels(), 2);
    assert_eq!(sketch.num_retained(), 4);
    assert!(sketch.is_estimation_mode());
    assert_eq!(sketch.min_value(), 1.0);
    assert_eq!(sketch.max_value(), 16.0);
}

#[test]
fn test_quantiles_are_monotonic() {
    let mut rng = SmallRng::seed_from_u64(0xC0FFEE);
    let sketch = sketch_of(32, (0..10_000).map(|_| rng.random::<f64>() * 1000.0));
    let ranks: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();
    let quantiles = sketch.quantiles(&ranks).unwrap();
    assert!(quantiles.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(quantiles[0], sketch.min_value());
    assert_eq!(quantiles[100], sketch.max_value());
}

#[test]
fn test_rank_accuracy() {
    const N: usize = 100_000;
    let sketch = sketch_of(128, (0..N).map(|i| i as f64));
    let epsilon = sketch.normalized_rank_error(false);
    for rank in [0.01, 0.1, 0.25, 0.5, 0.75, 0.9, 0.99] {
        let quantile = sketch.quantile(rank).unwrap();
        let true_rank = quantile / N as f64;
        assert_that!(true_rank, near(rank, 2.0 * epsilon));
    }
}

#[test]
fn test_merge_accuracy() {
    const N: usize = 20_000;
    let mut rng = SmallRng::seed_from_u64(42);
    for trial in 0..5 {
        let values: Vec<f64> = (0..N).map(|_| rng.random_range(0.0..1.0)).collect();
        let split = rng.random_range(1..N);

        let mut left = sketch_of(64, values[..split].iter().copied());
        let right = sketch_of(64, values[split..].iter().copied());
        left.merge(&right).unwrap();

        assert_eq!(left.n(), N as u64, "trial {trial}");
        assert_eq!(left.bit_pattern(), compute_bit_pattern(64, N as u64));
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(left.min_value(), sorted[0]);
        assert_eq!(left.max_value(), sorted[N - 1]);

        let epsilon = left.normalized_rank_error(false);
        for rank in [0.1, 0.5, 0.9] {
            let quantile = left.quantile(rank).unwrap();
            let true_rank = sorted.partition_point(|&v| v < quantile) as f64 / N as f64;
            assert_that!(true_rank, near(rank, 3.0 * epsilon));
        }
    }
}

#[test]
fn test_levels_weigh_twice_the_base_buffer() {
    // one zipped level of 128 items plus a base buffer of 128 items
    let sketch = sketch_of(128, (0..384).map(f64::from));
    assert_eq!(sketch.bit_pattern(), 1);
    assert_eq!(sketch.base_buffer_count(), 128);

    let epsilon = sketch.normalized_rank_error(false);
    assert_that!(sketch.rank(192.0).unwrap(), near(0.5, epsilon));
    assert_that!(sketch.rank(256.0).unwrap(), near(2.0 / 3.0, 1e-12));
    assert_that!(sketch.quantile(0.5).unwrap(), near(192.0, 384.0 * epsilon));
    let cdf = sketch.cdf(&[128.0, 256.0]).unwrap();
    assert_that!(cdf[0], near(1.0 / 3.0, 1e-12));
    assert_that!(cdf[1], near(2.0 / 3.0, 1e-12));

    let small = sketch_of(4, (1..=12).map(f64::from));
    assert_eq!(small.quantile(0.5).unwrap(), 7.0);
    assert_that!(small.rank(9.0).unwrap(), near(8.0 / 12.0, 1e-12));
}

#[test]
fn test_merge_with_partial_base_buffers() {
    let mut left = sketch_of(64, (0..200).map(f64::from));
    let right = sketch_of(64, (200..300).map(f64::from));
    left.merge(&right).unwrap();
    assert_eq!(left.n(), 300);

    let epsilon = left.normalized_rank_error(false);
    assert_that!(left.quantile(0.5).unwrap(), near(150.0, 300.0 * 2.0 * epsilon));
    assert_that!(left.rank(150.0).unwrap(), near(0.5, 2.0 * epsilon));
    assert_eq!(left.cdf(&[]).unwrap(), vec![1.0]);
}

#[test]
fn test_merge_into_empty_and_with_empty() {
    let source = sketch_of(16, (0..1000).map(f64::from));
    let mut target = DoublesSketch::new(16).unwrap();
    target.merge(&source).unwrap();
    assert_eq!(target.n(), 1000);
    assert_eq!(target.bit_pattern(), source.bit_pattern());
    assert_eq!(target.min_value(), 0.0);
    assert_eq!(target.max_value(), 999.0);

    let empty = DoublesSketch::new(16).unwrap();
    target.merge(&empty).unwrap();
    assert_eq!(target.n(), 1000);
}

#[test]
fn test_merge_rejects_different_k() {
    let mut left = sketch_of(16, [1.0]);
    let right = sketch_of(32, [2.0]);
    let err = left.merge(&right).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(left.n(), 1);
}

#[test]
fn test_reset() {
    let mut sketch = sketch_of(8, (0..500).map(f64::from));
    sketch.reset().unwrap();
    assert!(sketch.is_empty());
    assert_eq!(sketch.quantiles(&[0.5]).unwrap_err().kind(), ErrorKind::EmptyState);

    sketch.update(7.5).unwrap();
    assert_eq!(sketch.quantiles(&[0.5]).unwrap(), vec![7.5]);
    assert_eq!(sketch.min_value(), 7.5);
    assert_eq!(sketch.max_value(), 7.5);
}

#[test]
fn test_invalid_queries() {
    let sketch = sketch_of(16, [1.0, 2.0, 3.0]);
    assert_eq!(sketch.quantile(-0.1).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(sketch.quantile(1.1).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(sketch.quantiles(&[0.6, 0.4]).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(sketch.rank(f64::NAN).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(sketch.cdf(&[2.0, 1.0]).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(sketch.pmf(&[f64::NAN]).unwrap_err().kind(), ErrorKind::Validation);
}

#[test]
fn test_cdf_and_pmf() {
    let sketch = sketch_of(16, (1..=10).map(f64::from));
    assert_eq!(sketch.cdf(&[3.0, 8.0]).unwrap(), vec![0.2, 0.7, 1.0]);
    let pmf = sketch.pmf(&[3.0, 8.0]).unwrap();
    assert_that!(pmf[0], near(0.2, 1e-12));
    assert_that!(pmf[1], near(0.5, 1e-12));
    assert_that!(pmf[2], near(0.3, 1e-12));
}

#[test]
fn test_storage_grows_to_required_capacity() {
    let mut sketch = DoublesSketch::new(8).unwrap();
    for i in 0..1000u64 {
        sketch.update(i as f64).unwrap();
        assert_eq!(
            sketch.storage().item_capacity(),
            required_item_capacity(8, i + 1)
        );
    }
}

proptest! {
    #[test]
    fn property_test_bit_pattern_tracks_n(k_exp in 1u32..8, n in 0u64..5000) {
        let k = 1u16 << k_exp;
        let sketch = sketch_of(k, (0..n).map(|i| i as f64));
        prop_assert_eq!(sketch.n(), n);
        prop_assert_eq!(sketch.bit_pattern(), n / (2 * k as u64));
        prop_assert_eq!(sketch.base_buffer_count() as u64, n % (2 * k as u64));
        prop_assert_eq!(
            sketch.num_retained() as u64,
            n % (2 * k as u64) + (n / (2 * k as u64)).count_ones() as u64 * k as u64
        );
    }
}
