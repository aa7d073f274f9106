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

use sliding_quantiles::error::ErrorKind;
use sliding_quantiles::quantiles::DoublesSketch;
use sliding_quantiles::quantiles::HeapRegionAllocator;
use sliding_quantiles::quantiles::StorageBackend;
use sliding_quantiles::quantiles::updatable_storage_bytes;

const VALUES: [f64; 10] = [5.0, 3.0, 8.0, 1.0, 9.0, 2.0, 7.0, 4.0, 6.0, 0.0];

fn heap_sketch(k: u16, values: &[f64]) -> DoublesSketch {
    let mut sketch = DoublesSketch::new(k).unwrap();
    for &value in values {
        sketch.update(value).unwrap();
    }
    sketch
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

fn read_f64(bytes: &[u8], offset: usize) -> f64 {
    f64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

#[test]
fn test_region_layout() {
    let bytes = heap_sketch(4, &VALUES).to_bytes();
    // n = 10 with k = 4 populates level 0, so the combined buffer spans 3k items
    assert_eq!(bytes.len(), 32 + 12 * 8);
    assert_eq!(bytes[0], 2, "preamble longs");
    assert_eq!(bytes[1], 3, "serial version");
    assert_eq!(bytes[2], 8, "family");
    assert_eq!(bytes[3], 0, "flags");
    assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 4);
    assert_eq!(read_u64(&bytes, 8), 10);
    assert_eq!(read_f64(&bytes, 16), 0.0);
    assert_eq!(read_f64(&bytes, 24), 9.0);
}

#[test]
fn test_empty_region_layout() {
    let bytes = DoublesSketch::new(16).unwrap().to_bytes();
    assert_eq!(bytes[3], 1 << 2, "empty flag");
    assert_eq!(read_u64(&bytes, 8), 0);

    let mut sketch = DoublesSketch::wrap_bytes(bytes).unwrap();
    assert!(sketch.is_empty());
    sketch.update(3.0).unwrap();
    assert_eq!(sketch.n(), 1);
    assert_eq!(sketch.storage().as_bytes()[3] & (1 << 2), 0);
}

#[test]
fn test_round_trip_through_region() {
    let heap = heap_sketch(4, &VALUES);
    let median = heap.quantile(0.5).unwrap();

    let wrapped = DoublesSketch::wrap_bytes(heap.to_bytes()).unwrap();
    assert_eq!(wrapped.n(), 10);
    assert_eq!(wrapped.k(), 4);
    assert_eq!(wrapped.bit_pattern(), heap.bit_pattern());
    assert_eq!(wrapped.min_value(), 0.0);
    assert_eq!(wrapped.max_value(), 9.0);
    assert_eq!(wrapped.quantile(0.5).unwrap(), median);

    let heapified = DoublesSketch::heapify(wrapped.storage().as_bytes()).unwrap();
    assert_eq!(heapified.n(), 10);
    assert_eq!(heapified.quantile(0.5).unwrap(), median);
    assert_eq!(
        heapified.quantiles(&[0.0, 0.25, 0.75, 1.0]).unwrap(),
        heap.quantiles(&[0.0, 0.25, 0.75, 1.0]).unwrap()
    );
}

#[test]
fn test_region_sketch_matches_heap_sketch() {
    let mut region =
        DoublesSketch::new_in_region(8, vec![0u8; 8], HeapRegionAllocator::new()).unwrap();
    let mut heap = DoublesSketch::new(8).unwrap();
    for i in 0..2000 {
        let value = ((i * 7919) % 2000) as f64;
        region.update(value).unwrap();
        heap.update(value).unwrap();
    }
    assert_eq!(region.n(), heap.n());
    assert_eq!(region.bit_pattern(), heap.bit_pattern());
    let ranks = [0.0, 0.1, 0.5, 0.9, 1.0];
    assert_eq!(region.quantiles(&ranks).unwrap(), heap.quantiles(&ranks).unwrap());
    assert_eq!(region.to_bytes(), heap.to_bytes());
}

#[test]
fn test_growth_requests_exact_size() {
    let mut sketch =
        DoublesSketch::new_in_region(16, vec![0u8; 8], HeapRegionAllocator::new()).unwrap();
    assert_eq!(sketch.storage().capacity_bytes(), 8);

    sketch.update(1.0).unwrap();
    assert_eq!(sketch.storage().capacity_bytes(), 32 + 32 * 8);

    for i in 1..31 {
        sketch.update(i as f64).unwrap();
    }
    assert_eq!(sketch.storage().capacity_bytes(), 32 + 32 * 8);

    // the 32nd item overflows the base buffer into level 0
    sketch.update(31.0).unwrap();
    assert_eq!(sketch.storage().capacity_bytes(), 32 + 48 * 8);
    assert_eq!(sketch.bit_pattern(), 1);
}

#[test]
fn test_refused_growth_leaves_sketch_unchanged() {
    let allocator = HeapRegionAllocator::with_limit(32 + 32 * 8);
    let mut sketch = DoublesSketch::new_in_region(16, vec![0u8; 8], allocator).unwrap();
    for i in 0..31 {
        sketch.update(i as f64).unwrap();
    }
    let before = sketch.storage().as_bytes().to_vec();

    let err = sketch.update(100.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capacity);
    assert_eq!(sketch.storage().as_bytes(), before.as_slice());
    assert_eq!(sketch.n(), 31);
    assert_eq!(sketch.min_value(), 0.0);
    assert_eq!(sketch.max_value(), 30.0);

    let other = heap_sketch(16, &[1000.0, 2000.0]);
    let err = sketch.merge(&other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capacity);
    assert_eq!(sketch.storage().as_bytes(), before.as_slice());
}

#[test]
fn test_too_small_initial_region() {
    let err = DoublesSketch::new_in_region(16, vec![0u8; 4], HeapRegionAllocator::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capacity);
}

#[test]
fn test_wrap_rejects_malformed_regions() {
    let good = heap_sketch(4, &VALUES).to_bytes();
    assert!(DoublesSketch::wrap_bytes(good.clone()).is_ok());

    let mutations: Vec<(&str, Box<dyn Fn(&mut Vec<u8>)>)> = vec![
        ("truncated preamble", Box::new(|b| b.truncate(4))),
        ("truncated items", Box::new(|b| b.truncate(64))),
        ("preamble longs", Box::new(|b| b[0] = 3)),
        ("zero preamble longs", Box::new(|b| b[0] = 0)),
        ("serial version", Box::new(|b| b[1] = 2)),
        ("family", Box::new(|b| b[2] = 7)),
        ("big endian", Box::new(|b| b[3] |= 1)),
        ("compact", Box::new(|b| b[3] |= 1 << 3)),
        ("ordered", Box::new(|b| b[3] |= 1 << 4)),
        ("empty with items", Box::new(|b| b[3] |= 1 << 2)),
        ("k not a power of two", Box::new(|b| b[4] = 3)),
        ("k zero", Box::new(|b| b[4] = 0)),
    ];
    for (name, mutate) in mutations {
        let mut bad = good.clone();
        mutate(&mut bad);
        let snapshot = bad.clone();

        let err = DoublesSketch::heapify(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "{name}: {err}");
        assert_eq!(bad, snapshot, "{name}");

        let err = DoublesSketch::wrap_bytes(bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "{name}: {err}");
    }
}

#[test]
fn test_wrap_accepts_minimal_region() {
    let sketch = heap_sketch(16, &[1.0, 2.0, 3.0]);
    let mut bytes = sketch.to_bytes();
    let minimal = updatable_storage_bytes(16, 3);
    assert_eq!(minimal, 32 + 4 * 8);
    bytes.truncate(minimal);

    let mut wrapped = DoublesSketch::wrap_bytes(bytes).unwrap();
    assert_eq!(wrapped.quantiles(&[0.0, 1.0]).unwrap(), vec![1.0, 3.0]);
    wrapped.update(4.0).unwrap();
    wrapped.update(5.0).unwrap();
    assert_eq!(wrapped.n(), 5);
    assert_eq!(wrapped.storage().capacity_bytes(), 32 + 32 * 8);
}

#[test]
fn test_read_only_rejects_mutation() {
    let bytes = heap_sketch(4, &VALUES).to_bytes();
    let mut sketch = DoublesSketch::wrap_read_only(bytes.clone(), HeapRegionAllocator::new())
        .unwrap();
    assert!(sketch.is_read_only());
    assert_eq!(sketch.quantile(1.0).unwrap(), 9.0);

    assert_eq!(sketch.update(1.0).unwrap_err().kind(), ErrorKind::Validation);
    let other = heap_sketch(4, &[1.0]);
    assert_eq!(sketch.merge(&other).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(sketch.reset().unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(sketch.storage().as_bytes(), bytes.as_slice());
}

#[test]
fn test_read_only_flag_in_region() {
    let mut bytes = heap_sketch(4, &VALUES).to_bytes();
    bytes[3] |= 1 << 1;
    let mut sketch = DoublesSketch::wrap_bytes(bytes).unwrap();
    assert!(sketch.is_read_only());
    assert_eq!(sketch.update(1.0).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(sketch.n(), 10);
}

#[test]
fn test_merge_across_storage_kinds() {
    let mut region =
        DoublesSketch::new_in_region(8, vec![0u8; 8], HeapRegionAllocator::new()).unwrap();
    let heap = heap_sketch(8, &(0..100).map(f64::from).collect::<Vec<_>>());
    region.merge(&heap).unwrap();
    assert_eq!(region.n(), 100);
    assert_eq!(region.min_value(), 0.0);
    assert_eq!(region.max_value(), 99.0);

    let mut other_heap = DoublesSketch::new(8).unwrap();
    other_heap.merge(&region).unwrap();
    assert_eq!(other_heap.n(), 100);
    assert_eq!(other_heap.quantile(0.5).unwrap(), region.quantile(0.5).unwrap());

    let bytes = region.into_storage().into_bytes();
    assert_eq!(read_u64(&bytes, 8), 100);
}
