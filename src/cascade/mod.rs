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

//! Tiered threshold checks over a window's moment summary.
//!
//! An [`AlertCascade`] answers "is the q-th quantile at or above threshold T?" by trying
//! increasingly expensive tiers and stopping at the first conclusive one:
//!
//! 1. [`Tier::Naive`] decides from min and max alone.
//! 2. [`Tier::Markov`] applies Markov's inequality using only the first power sum.
//! 3. [`Tier::MomentBound`] asks a [`MomentSolver`] for a bound from all power sums.
//! 4. [`Tier::MaxEnt`] asks the solver for a full distribution reconstruction.
//!
//! Every tier can be turned off independently. If no enabled tier is conclusive, the
//! midpoint of the tightest known interval decides. Per-tier pass-through counts and
//! elapsed time are collected in [`CascadeStats`].

mod alerter;
mod config;
mod solver;
mod stats;

pub use self::alerter::AlertCascade;
pub use self::alerter::CascadeOutcome;
pub use self::alerter::Verdict;
pub use self::config::CascadeConfig;
pub use self::config::StageConfig;
pub use self::solver::MomentSolver;
pub use self::solver::QuantileBound;
pub use self::solver::Reconstruction;
pub use self::stats::CascadeStats;
pub use self::stats::TierStats;

/// One stage of the cascade, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Naive,
    Markov,
    MomentBound,
    MaxEnt,
}

impl Tier {
    /// All tiers in evaluation order.
    pub const ALL: [Tier; 4] = [Tier::Naive, Tier::Markov, Tier::MomentBound, Tier::MaxEnt];

    pub const fn name(self) -> &'static str {
        match self {
            Tier::Naive => "naive",
            Tier::Markov => "markov",
            Tier::MomentBound => "moment_bound",
            Tier::MaxEnt => "maxent",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Tier::Naive => 0,
            Tier::Markov => 1,
            Tier::MomentBound => 2,
            Tier::MaxEnt => 3,
        }
    }
}
