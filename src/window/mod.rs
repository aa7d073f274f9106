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

//! Sliding-window maintenance over panes of a stream.
//!
//! The stream is cut into equal-size chunks called panes. A window covers the `W` most
//! recent panes; each slide evicts the oldest pane and absorbs the next chunk. Every
//! pane keeps its own quantiles sketch plus a [`MomentSummary`](crate::moments::MomentSummary),
//! and the [`WindowManager`] keeps a window-level aggregate of both.
//!
//! Power sums of the aggregate are maintained incrementally: subtract the evicted pane,
//! add the new one. The extremes are rescanned across the current panes because
//! removing an extremal pane can expose a different extreme. Repeated incremental
//! updates accumulate floating-point drift relative to a from-scratch recomputation;
//! no correction is applied.
//!
//! # Usage
//!
//! ```rust
//! # use sliding_quantiles::window::WindowConfig;
//! # use sliding_quantiles::window::WindowManager;
//! let config = WindowConfig::new(16, 2);
//! let mut window = WindowManager::new(config).unwrap();
//! window.push(&[1.0, 2.0, 3.0]).unwrap();
//! window.push(&[4.0, 5.0, 6.0]).unwrap();
//! assert_eq!(window.summary().count(), 6.0);
//!
//! window.push(&[7.0, 8.0, 9.0]).unwrap();
//! assert_eq!(window.summary().count(), 6.0);
//! assert_eq!(window.summary().min(), 4.0);
//! ```

mod config;
mod manager;
mod pane;

pub use self::config::WindowConfig;
pub use self::manager::WindowAggregate;
pub use self::manager::WindowManager;
pub use self::manager::WindowState;
pub use self::pane::Pane;
