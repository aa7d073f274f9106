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

use std::time::Duration;

use super::Tier;

/// Counters of a single cascade tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierStats {
    /// Checks that reached and evaluated this tier.
    pub entered: u64,
    /// Checks this tier answered conclusively.
    pub decided: u64,
    /// Checks aborted by a solver error in this tier.
    pub failed: u64,
    /// Time spent evaluating this tier.
    pub elapsed: Duration,
}

impl TierStats {
    /// Checks handed on to later tiers.
    pub fn passed_through(&self) -> u64 {
        self.entered - self.decided - self.failed
    }

    /// Checks evaluated per second of time spent in this tier.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.entered as f64 / secs
        } else {
            0.0
        }
    }
}

/// Counters collected by an [`AlertCascade`](super::AlertCascade).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeStats {
    pub(crate) checks: u64,
    pub(crate) alerts: u64,
    pub(crate) fallbacks: u64,
    pub(crate) elapsed: Duration,
    pub(crate) tiers: [TierStats; 4],
}

impl CascadeStats {
    /// Number of checks that entered the cascade, including failed ones.
    pub fn checks(&self) -> u64 {
        self.checks
    }

    /// Number of checks that raised an alert.
    pub fn alerts(&self) -> u64 {
        self.alerts
    }

    /// Number of checks no enabled tier could answer.
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }

    /// Total time spent in the cascade.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn tier(&self, tier: Tier) -> &TierStats {
        &self.tiers[tier.index()]
    }

    pub(crate) fn tier_mut(&mut self, tier: Tier) -> &mut TierStats {
        &mut self.tiers[tier.index()]
    }

    /// Checks per second over the whole cascade.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.checks as f64 / secs
        } else {
            0.0
        }
    }
}
