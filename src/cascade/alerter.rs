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

use std::time::Instant;

use tracing::trace;

use super::CascadeConfig;
use super::CascadeStats;
use super::MomentSolver;
use super::QuantileBound;
use super::Tier;
use crate::error::Error;
use crate::moments::MomentSummary;
use crate::window::WindowManager;

/// What a single tier concluded about the quantile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The quantile is at or above the threshold.
    Above,
    /// The quantile is below the threshold.
    Below,
    /// The tier could not tell.
    Inconclusive,
}

/// Result of a full cascade check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeOutcome {
    /// Whether the quantile was judged at or above the threshold.
    pub alert: bool,
    /// The tier that decided, or `None` when every enabled tier was inconclusive.
    pub decided_by: Option<Tier>,
    /// Tightest interval known to contain the quantile when the check finished.
    pub interval: QuantileBound,
}

/// Runs the tiered threshold check against moment summaries.
///
/// # Examples
///
/// ```
/// use sliding_quantiles::cascade::AlertCascade;
/// use sliding_quantiles::cascade::CascadeConfig;
/// use sliding_quantiles::cascade::MomentSolver;
/// use sliding_quantiles::cascade::QuantileBound;
/// use sliding_quantiles::cascade::Reconstruction;
/// use sliding_quantiles::cascade::Tier;
/// use sliding_quantiles::error::Error;
/// use sliding_quantiles::moments::MomentSummary;
///
/// struct Unbounded;
///
/// impl MomentSolver for Unbounded {
///     fn estimate_bound(&mut self, _: &[f64], min: f64, max: f64, _: f64) -> Result<QuantileBound, Error> {
///         Ok(QuantileBound { lower: min, upper: max })
///     }
///
///     fn reconstruct(&mut self, _: &[f64], _: f64, _: f64) -> Result<Box<dyn Reconstruction>, Error> {
///         unimplemented!()
///     }
/// }
///
/// let summary = MomentSummary::from_values(4, &[10.0, 11.0, 12.0]);
/// let mut cascade = AlertCascade::new(CascadeConfig::new(0.5, 100.0), Unbounded).unwrap();
/// let outcome = cascade.check(&summary).unwrap();
/// assert!(!outcome.alert);
/// assert_eq!(outcome.decided_by, Some(Tier::Naive));
/// ```
#[derive(Debug)]
pub struct AlertCascade<M> {
    config: CascadeConfig,
    solver: M,
    stats: CascadeStats,
}

impl<M: MomentSolver> AlertCascade<M> {
    /// Creates a cascade after validating `config`.
    pub fn new(config: CascadeConfig, solver: M) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            solver,
            stats: CascadeStats::default(),
        })
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    pub fn solver(&self) -> &M {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut M {
        &mut self.solver
    }

    pub fn stats(&self) -> &CascadeStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CascadeStats::default();
    }

    /// Checks the aggregate summary of a window.
    pub fn check_window(&mut self, window: &WindowManager) -> Result<CascadeOutcome, Error> {
        self.check(window.summary())
    }

    /// Decides whether the configured quantile of `summary` is at or above the threshold.
    ///
    /// # Errors
    ///
    /// Returns an empty-state error if `summary` holds no values. Solver errors are
    /// propagated unchanged.
    pub fn check(&mut self, summary: &MomentSummary) -> Result<CascadeOutcome, Error> {
        if summary.is_empty() {
            return Err(Error::empty_state("cannot check an empty summary"));
        }

        let started = Instant::now();
        self.stats.checks += 1;

        let quantile = self.config.quantile;
        let threshold = self.config.threshold;
        let min = summary.min();
        let max = summary.max();
        let mut interval = QuantileBound {
            lower: min,
            upper: max,
        };
        let mut decided = None;

        for tier in Tier::ALL {
            if !self.config.stages.is_enabled(tier) {
                continue;
            }

            let tier_started = Instant::now();
            self.stats.tier_mut(tier).entered += 1;
            let verdict = self.evaluate(tier, summary, &mut interval);
            let tier_stats = self.stats.tier_mut(tier);
            tier_stats.elapsed += tier_started.elapsed();
            let verdict = match verdict {
                Ok(verdict) => verdict,
                Err(err) => {
                    tier_stats.failed += 1;
                    self.stats.elapsed += started.elapsed();
                    return Err(err);
                }
            };
            if verdict != Verdict::Inconclusive {
                tier_stats.decided += 1;
                decided = Some((tier, verdict));
                break;
            }
        }

        let (decided_by, alert) = match decided {
            Some((tier, verdict)) => (Some(tier), verdict == Verdict::Above),
            None => {
                self.stats.fallbacks += 1;
                let midpoint = interval.lower + (interval.upper - interval.lower) / 2.0;
                (None, midpoint >= threshold)
            }
        };
        if alert {
            self.stats.alerts += 1;
        }
        self.stats.elapsed += started.elapsed();

        trace!(
            tier = decided_by.map_or("fallback", Tier::name),
            alert,
            quantile,
            threshold,
            "Cascade check finished."
        );
        Ok(CascadeOutcome {
            alert,
            decided_by,
            interval,
        })
    }

    // Runs one tier. Solver tiers narrow `interval` to what they learned.
    fn evaluate(
        &mut self,
        tier: Tier,
        summary: &MomentSummary,
        interval: &mut QuantileBound,
    ) -> Result<Verdict, Error> {
        let quantile = self.config.quantile;
        let threshold = self.config.threshold;
        let min = summary.min();
        let max = summary.max();
        let verdict = match tier {
            Tier::Naive => naive_verdict(min, max, threshold),
            Tier::Markov => markov_verdict(summary, quantile, threshold),
            Tier::MomentBound => {
                let bound = self
                    .solver
                    .estimate_bound(summary.power_sums(), min, max, quantile)?;
                interval.lower = interval.lower.max(bound.lower);
                interval.upper = interval.upper.min(bound.upper);
                bound_verdict(bound, threshold)
            }
            Tier::MaxEnt => {
                let reconstruction = self.solver.reconstruct(summary.power_sums(), min, max)?;
                let estimate = reconstruction.quantile(quantile);
                *interval = QuantileBound {
                    lower: estimate,
                    upper: estimate,
                };
                if estimate >= threshold {
                    Verdict::Above
                } else {
                    Verdict::Below
                }
            }
        };
        Ok(verdict)
    }
}

fn naive_verdict(min: f64, max: f64, threshold: f64) -> Verdict {
    if threshold <= min {
        Verdict::Above
    } else if threshold > max {
        Verdict::Below
    } else {
        Verdict::Inconclusive
    }
}

// Markov's inequality on X - min bounds the mass at or above the threshold, and on
// max - X bounds the mass below it.
fn markov_verdict(summary: &MomentSummary, quantile: f64, threshold: f64) -> Verdict {
    let min = summary.min();
    let max = summary.max();
    let mean = summary.mean();

    if threshold > min {
        let mass_at_or_above = (mean - min) / (threshold - min);
        if mass_at_or_above < 1.0 - quantile {
            return Verdict::Below;
        }
    }
    if threshold < max {
        let mass_below = (max - mean) / (max - threshold);
        if mass_below < quantile {
            return Verdict::Above;
        }
    }
    Verdict::Inconclusive
}

fn bound_verdict(bound: QuantileBound, threshold: f64) -> Verdict {
    if bound.lower >= threshold {
        Verdict::Above
    } else if bound.upper < threshold {
        Verdict::Below
    } else {
        Verdict::Inconclusive
    }
}
