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

//! Sliding-window quantile monitoring.
//!
//! This crate keeps approximate quantiles and moment summaries of the most recent panes
//! of a stream, and answers threshold questions over them:
//!
//! * [`quantiles`]: a mergeable classic quantiles sketch that runs on the heap or inside
//!   a caller-managed byte region using the DataSketches binary layout.
//! * [`moments`]: power-sum summaries that can be added and subtracted.
//! * [`window`]: a ring of panes with an incrementally maintained aggregate.
//! * [`cascade`]: tiered "is the quantile above T?" checks with per-tier statistics.
//!
//! # Usage
//!
//! ```rust
//! # use sliding_quantiles::window::WindowConfig;
//! # use sliding_quantiles::window::WindowManager;
//! let mut window = WindowManager::new(WindowConfig::new(32, 3)).unwrap();
//! for pane in 0..5 {
//!     let chunk: Vec<f64> = (0..100).map(|i| (pane * 100 + i) as f64).collect();
//!     window.push(&chunk).unwrap();
//! }
//! let median = window.aggregate().quantiles(&[0.5]).unwrap()[0];
//! assert!((300.0..=400.0).contains(&median));
//! ```

pub mod cascade;
pub mod codec;
pub mod error;
pub mod moments;
pub mod quantiles;
pub mod window;
