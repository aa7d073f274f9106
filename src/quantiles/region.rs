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

use byteorder::ByteOrder;
use byteorder::LittleEndian;

use super::helper::check_k;
use super::helper::updatable_storage_bytes;
use super::serialization::COMBINED_BUFFER;
use super::serialization::EMPTY_SIZE_BYTES;
use super::serialization::FAMILY_BYTE;
use super::serialization::FLAG_BIG_ENDIAN;
use super::serialization::FLAG_COMPACT;
use super::serialization::FLAG_EMPTY;
use super::serialization::FLAG_ORDERED;
use super::serialization::FLAG_READ_ONLY;
use super::serialization::FLAGS_BYTE;
use super::serialization::K_SHORT;
use super::serialization::MAX_DOUBLE;
use super::serialization::MIN_DOUBLE;
use super::serialization::N_LONG;
use super::serialization::PREAMBLE_LONGS;
use super::serialization::PREAMBLE_LONGS_BYTE;
use super::serialization::SERIAL_VERSION;
use super::serialization::SERIAL_VERSION_BYTE;
use super::storage::StorageBackend;
use crate::codec::Family;
use crate::error::Error;

/// Supplies fresh regions when a [`RegionStorage`] needs to grow.
pub trait RegionAllocator {
    /// Returns a zeroed region of exactly `size_bytes` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Capacity`](crate::error::ErrorKind::Capacity) if the
    /// request cannot be satisfied.
    fn request(&mut self, size_bytes: usize) -> Result<Vec<u8>, Error>;
}

/// Allocates regions on the heap, optionally refusing requests above a byte limit.
#[derive(Debug, Clone, Default)]
pub struct HeapRegionAllocator {
    limit: Option<usize>,
}

impl HeapRegionAllocator {
    /// Creates an allocator without a size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator that refuses any region larger than `limit_bytes`.
    pub fn with_limit(limit_bytes: usize) -> Self {
        Self {
            limit: Some(limit_bytes),
        }
    }
}

impl RegionAllocator for HeapRegionAllocator {
    fn request(&mut self, size_bytes: usize) -> Result<Vec<u8>, Error> {
        if let Some(limit) = self.limit {
            if size_bytes > limit {
                return Err(Error::capacity("region request exceeds allocator limit")
                    .with_context("requested", size_bytes)
                    .with_context("limit", limit));
            }
        }
        let mut region = Vec::new();
        region.try_reserve_exact(size_bytes).map_err(|err| {
            Error::capacity(format!("failed to allocate region: {err}"))
                .with_context("requested", size_bytes)
        })?;
        region.resize(size_bytes, 0);
        Ok(region)
    }
}

/// Storage kept in a byte region using the quantiles sketch binary layout.
///
/// The region is exclusively owned. Growth requests a new region from the allocator,
/// copies every existing byte, and drops the old region.
#[derive(Debug)]
pub struct RegionStorage<A: RegionAllocator = HeapRegionAllocator> {
    region: Vec<u8>,
    allocator: A,
    k: u16,
}

impl<A: RegionAllocator> RegionStorage<A> {
    /// Writes an empty sketch preamble into `region` and takes ownership of it.
    ///
    /// The n, min and max fields are only written if the region is large enough to
    /// hold them; otherwise they are initialized on the first growth.
    ///
    /// # Errors
    ///
    /// Returns a validation error if k is illegal, or a capacity error if the region
    /// cannot hold an empty preamble.
    pub fn initialize(k: u16, mut region: Vec<u8>, allocator: A) -> Result<Self, Error> {
        check_k(k)?;
        if region.len() < EMPTY_SIZE_BYTES {
            return Err(
                Error::capacity("region too small to hold an empty sketch")
                    .with_context("capacity", region.len())
                    .with_context("required", EMPTY_SIZE_BYTES),
            );
        }

        region[..EMPTY_SIZE_BYTES].fill(0);
        region[PREAMBLE_LONGS_BYTE] = PREAMBLE_LONGS;
        region[SERIAL_VERSION_BYTE] = SERIAL_VERSION;
        region[FAMILY_BYTE] = Family::QUANTILES.id;
        region[FLAGS_BYTE] = FLAG_EMPTY;
        LittleEndian::write_u16(&mut region[K_SHORT..K_SHORT + 2], k);

        let mut storage = Self {
            region,
            allocator,
            k,
        };
        storage.clear_header_fields();
        Ok(storage)
    }

    /// Attaches to an existing region without copying.
    ///
    /// The whole preamble is validated before the storage is created, so a rejected
    /// region is returned to nobody and never modified.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Format`](crate::error::ErrorKind::Format) if the preamble is
    /// malformed or the region is too small for the sketch it describes.
    pub fn wrap(region: Vec<u8>, allocator: A) -> Result<Self, Error> {
        let k = validate_region(&region)?;
        Ok(Self {
            region,
            allocator,
            k,
        })
    }

    /// Returns the region size in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.region.len()
    }

    /// Returns the raw region.
    pub fn as_bytes(&self) -> &[u8] {
        &self.region
    }

    /// Consumes the storage and returns the raw region.
    pub fn into_bytes(self) -> Vec<u8> {
        self.region
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    fn flags(&self) -> u8 {
        self.region[FLAGS_BYTE]
    }

    fn has_header_fields(&self) -> bool {
        self.region.len() >= COMBINED_BUFFER
    }

    fn clear_header_fields(&mut self) {
        if self.has_header_fields() {
            LittleEndian::write_u64(&mut self.region[N_LONG..N_LONG + 8], 0);
            LittleEndian::write_f64(&mut self.region[MIN_DOUBLE..MIN_DOUBLE + 8], f64::NAN);
            LittleEndian::write_f64(&mut self.region[MAX_DOUBLE..MAX_DOUBLE + 8], f64::NAN);
        }
    }

    fn item_offset(index: usize) -> usize {
        COMBINED_BUFFER + (index << 3)
    }
}

impl<A: RegionAllocator> StorageBackend for RegionStorage<A> {
    fn k(&self) -> u16 {
        self.k
    }

    fn n(&self) -> u64 {
        if self.has_header_fields() {
            LittleEndian::read_u64(&self.region[N_LONG..N_LONG + 8])
        } else {
            0
        }
    }

    fn set_n(&mut self, n: u64) {
        debug_assert!(self.has_header_fields(), "region has no room for n");
        LittleEndian::write_u64(&mut self.region[N_LONG..N_LONG + 8], n);
        let flags = self.flags();
        self.region[FLAGS_BYTE] = if n == 0 {
            flags | FLAG_EMPTY
        } else {
            flags & !FLAG_EMPTY
        };
    }

    fn min_value(&self) -> f64 {
        if self.has_header_fields() {
            LittleEndian::read_f64(&self.region[MIN_DOUBLE..MIN_DOUBLE + 8])
        } else {
            f64::NAN
        }
    }

    fn set_min_value(&mut self, value: f64) {
        debug_assert!(self.has_header_fields(), "region has no room for min");
        LittleEndian::write_f64(&mut self.region[MIN_DOUBLE..MIN_DOUBLE + 8], value);
    }

    fn max_value(&self) -> f64 {
        if self.has_header_fields() {
            LittleEndian::read_f64(&self.region[MAX_DOUBLE..MAX_DOUBLE + 8])
        } else {
            f64::NAN
        }
    }

    fn set_max_value(&mut self, value: f64) {
        debug_assert!(self.has_header_fields(), "region has no room for max");
        LittleEndian::write_f64(&mut self.region[MAX_DOUBLE..MAX_DOUBLE + 8], value);
    }

    fn item_capacity(&self) -> usize {
        self.region.len().saturating_sub(COMBINED_BUFFER) >> 3
    }

    fn set_item(&mut self, index: usize, value: f64) {
        let offset = Self::item_offset(index);
        LittleEndian::write_f64(&mut self.region[offset..offset + 8], value);
    }

    fn read_items(&self, start: usize, dst: &mut [f64]) {
        let offset = Self::item_offset(start);
        LittleEndian::read_f64_into(&self.region[offset..offset + (dst.len() << 3)], dst);
    }

    fn write_items(&mut self, start: usize, src: &[f64]) {
        let offset = Self::item_offset(start);
        LittleEndian::write_f64_into(src, &mut self.region[offset..offset + (src.len() << 3)]);
    }

    fn grow(&mut self, item_capacity: usize) -> Result<(), Error> {
        let need_bytes = COMBINED_BUFFER + (item_capacity << 3);
        let committed = self.region.len();
        if need_bytes <= committed {
            return Ok(());
        }

        let mut grown = self.allocator.request(need_bytes)?;
        if grown.len() < need_bytes {
            return Err(Error::capacity("allocator returned a short region")
                .with_context("requested", need_bytes)
                .with_context("returned", grown.len()));
        }
        grown[..committed].copy_from_slice(&self.region);
        let had_header_fields = self.has_header_fields();
        self.region = grown;
        if !had_header_fields {
            self.clear_header_fields();
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.region[FLAGS_BYTE] = self.flags() | FLAG_EMPTY;
        self.clear_header_fields();
    }

    fn is_read_only(&self) -> bool {
        self.flags() & FLAG_READ_ONLY != 0
    }
}

/// Validates a region preamble and returns its k.
pub(crate) fn validate_region(region: &[u8]) -> Result<u16, Error> {
    if region.len() < EMPTY_SIZE_BYTES {
        return Err(Error::insufficient_data("preamble").with_context("capacity", region.len()));
    }

    let preamble_longs = region[PREAMBLE_LONGS_BYTE];
    let serial_version = region[SERIAL_VERSION_BYTE];
    let family_id = region[FAMILY_BYTE];
    let flags = region[FLAGS_BYTE];
    let k = LittleEndian::read_u16(&region[K_SHORT..K_SHORT + 2]);

    let family = Family::QUANTILES;
    if !(family.min_pre_longs..=family.max_pre_longs).contains(&preamble_longs) {
        return Err(Error::invalid_preamble_longs(PREAMBLE_LONGS, preamble_longs));
    }
    family.validate_id(family_id)?;
    if serial_version != SERIAL_VERSION {
        return Err(Error::unsupported_serial_version(
            SERIAL_VERSION,
            serial_version,
        ));
    }
    if flags & (FLAG_BIG_ENDIAN | FLAG_COMPACT | FLAG_ORDERED) != 0 {
        return Err(Error::format(format!(
            "only little-endian updatable regions can be wrapped, flags: {flags:#04x}"
        )));
    }
    check_k(k).map_err(|err| Error::format(err.message()))?;

    let is_empty = flags & FLAG_EMPTY != 0;
    let stored_n = if region.len() >= COMBINED_BUFFER {
        LittleEndian::read_u64(&region[N_LONG..N_LONG + 8])
    } else {
        0
    };
    if is_empty != (stored_n == 0) {
        return Err(
            Error::format("empty flag is inconsistent with n")
                .with_context("empty", is_empty)
                .with_context("n", stored_n),
        );
    }

    let required = updatable_storage_bytes(k, stored_n);
    if region.len() < required {
        return Err(Error::format("region too small for the sketch it describes")
            .with_context("capacity", region.len())
            .with_context("required", required));
    }
    Ok(k)
}
