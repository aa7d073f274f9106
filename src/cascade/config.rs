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

use super::Tier;
use crate::error::Error;

/// Which cascade tiers are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageConfig {
    pub naive: bool,
    pub markov: bool,
    pub moment_bound: bool,
    pub maxent: bool,
}

impl StageConfig {
    /// Every tier enabled.
    pub const fn all() -> Self {
        Self {
            naive: true,
            markov: true,
            moment_bound: true,
            maxent: true,
        }
    }

    /// Every tier disabled; each check falls back to the min/max midpoint.
    pub const fn none() -> Self {
        Self {
            naive: false,
            markov: false,
            moment_bound: false,
            maxent: false,
        }
    }

    pub fn with(mut self, tier: Tier, enabled: bool) -> Self {
        match tier {
            Tier::Naive => self.naive = enabled,
            Tier::Markov => self.markov = enabled,
            Tier::MomentBound => self.moment_bound = enabled,
            Tier::MaxEnt => self.maxent = enabled,
        }
        self
    }

    pub fn is_enabled(&self, tier: Tier) -> bool {
        match tier {
            Tier::Naive => self.naive,
            Tier::Markov => self.markov,
            Tier::MomentBound => self.moment_bound,
            Tier::MaxEnt => self.maxent,
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::all()
    }
}

/// Target of an [`AlertCascade`](super::AlertCascade): alert when the `quantile`-th
/// quantile is at or above `threshold`.
///
/// # Examples
///
/// ```
/// use sliding_quantiles::cascade::CascadeConfig;
/// use sliding_quantiles::cascade::StageConfig;
/// use sliding_quantiles::cascade::Tier;
///
/// let config = CascadeConfig::new(0.99, 250.0)
///     .with_stages(StageConfig::all().with(Tier::MaxEnt, false));
/// assert!(config.validate().is_ok());
/// assert!(CascadeConfig::new(1.5, 250.0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CascadeConfig {
    pub quantile: f64,
    pub threshold: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stages: StageConfig,
}

impl CascadeConfig {
    pub fn new(quantile: f64, threshold: f64) -> Self {
        Self {
            quantile,
            threshold,
            stages: StageConfig::default(),
        }
    }

    pub fn with_stages(mut self, stages: StageConfig) -> Self {
        self.stages = stages;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.quantile) {
            return Err(Error::validation("quantile must be in [0.0, 1.0]")
                .with_context("quantile", self.quantile));
        }
        if !self.threshold.is_finite() {
            return Err(Error::validation("threshold must be finite")
                .with_context("threshold", self.threshold));
        }
        Ok(())
    }
}
