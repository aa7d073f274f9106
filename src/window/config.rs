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
use crate::moments::DEFAULT_NUM_MOMENTS;
use crate::quantiles::DEFAULT_K;
use crate::quantiles::MAX_K;
use crate::quantiles::MIN_K;

/// Parameters of a [`WindowManager`](super::WindowManager).
///
/// # Examples
///
/// ```
/// use sliding_quantiles::window::WindowConfig;
///
/// let config = WindowConfig::new(64, 12)
///     .with_num_moments(7)
///     .with_track_quantiles(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowConfig {
    /// Resolution of every pane sketch.
    pub k: u16,
    /// Number of panes covered by the window.
    pub window_size: usize,
    /// Number of power sums kept per pane, including the count.
    pub num_moments: usize,
    /// Whether the window keeps an aggregate quantiles sketch next to the power sums.
    ///
    /// Sketches cannot be subtracted, so the aggregate sketch is rebuilt from all panes
    /// on every slide.
    pub track_quantiles: bool,
}

impl WindowConfig {
    pub fn new(k: u16, window_size: usize) -> Self {
        Self {
            k,
            window_size,
            num_moments: DEFAULT_NUM_MOMENTS,
            track_quantiles: true,
        }
    }

    pub fn with_num_moments(mut self, num_moments: usize) -> Self {
        self.num_moments = num_moments;
        self
    }

    pub fn with_track_quantiles(mut self, track_quantiles: bool) -> Self {
        self.track_quantiles = track_quantiles;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns a validation error if k is not a power of two in [MIN_K, MAX_K], the
    /// window is empty, or fewer than 2 power sums are requested.
    pub fn validate(&self) -> Result<(), Error> {
        if !(MIN_K..=MAX_K).contains(&self.k) || !self.k.is_power_of_two() {
            return Err(Error::validation(format!(
                "k must be a power of two in [{MIN_K}, {MAX_K}], got {}",
                self.k
            )));
        }
        if self.window_size == 0 {
            return Err(Error::validation("window_size must be at least 1"));
        }
        if self.num_moments < 2 {
            return Err(Error::validation(format!(
                "num_moments must be at least 2, got {}",
                self.num_moments
            )));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new(DEFAULT_K, 1)
    }
}
