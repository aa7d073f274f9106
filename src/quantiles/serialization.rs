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

//! Binary layout constants for quantiles sketch regions.
//!
//! The first 8 bytes are the preamble. Regions large enough to hold a combined
//! buffer also carry n, min and max, followed by the combined buffer itself.

/// Preamble size in longs of an updatable region.
pub const PREAMBLE_LONGS: u8 = 2;
/// Serialization version of updatable regions.
pub const SERIAL_VERSION: u8 = 3;

/// Flag indicating a big-endian region. Never written, rejected on wrap.
pub const FLAG_BIG_ENDIAN: u8 = 1 << 0;
/// Flag indicating the region must not be mutated.
pub const FLAG_READ_ONLY: u8 = 1 << 1;
/// Flag indicating the sketch is empty.
pub const FLAG_EMPTY: u8 = 1 << 2;
/// Flag indicating a compact layout. Never written, rejected on wrap.
pub const FLAG_COMPACT: u8 = 1 << 3;
/// Flag indicating an ordered compact layout. Never written, rejected on wrap.
pub const FLAG_ORDERED: u8 = 1 << 4;

pub const PREAMBLE_LONGS_BYTE: usize = 0;
pub const SERIAL_VERSION_BYTE: usize = 1;
pub const FAMILY_BYTE: usize = 2;
pub const FLAGS_BYTE: usize = 3;
pub const K_SHORT: usize = 4;
pub const N_LONG: usize = 8;
pub const MIN_DOUBLE: usize = 16;
pub const MAX_DOUBLE: usize = 24;
/// Start of the combined buffer (base buffer followed by the levels).
pub const COMBINED_BUFFER: usize = 32;

/// Size of an empty region holding only the preamble.
pub const EMPTY_SIZE_BYTES: usize = 8;
