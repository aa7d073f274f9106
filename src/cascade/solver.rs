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

/// Bounds on a quantile derived from a power-sum vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileBound {
    pub lower: f64,
    pub upper: f64,
}

/// A distribution reconstructed from moments.
pub trait Reconstruction {
    /// Returns the value at quantile `q` of the reconstructed distribution.
    fn quantile(&self, q: f64) -> f64;
}

/// Turns power sums into quantile information.
///
/// The algorithm behind it is not part of this crate; the cascade only relies on this
/// call contract. `power_sums[i]` is `Σ xⁱ` over the summarized values, `min` and `max`
/// bound their range.
pub trait MomentSolver {
    /// Returns a lower and upper bound on the value at quantile `quantile`.
    fn estimate_bound(
        &mut self,
        power_sums: &[f64],
        min: f64,
        max: f64,
        quantile: f64,
    ) -> Result<QuantileBound, Error>;

    /// Reconstructs the whole distribution. This is the most expensive mode.
    fn reconstruct(
        &mut self,
        power_sums: &[f64],
        min: f64,
        max: f64,
    ) -> Result<Box<dyn Reconstruction>, Error>;
}

impl<M: MomentSolver + ?Sized> MomentSolver for Box<M> {
    fn estimate_bound(
        &mut self,
        power_sums: &[f64],
        min: f64,
        max: f64,
        quantile: f64,
    ) -> Result<QuantileBound, Error> {
        (**self).estimate_bound(power_sums, min, max, quantile)
    }

    fn reconstruct(
        &mut self,
        power_sums: &[f64],
        min: f64,
        max: f64,
    ) -> Result<Box<dyn Reconstruction>, Error> {
        (**self).reconstruct(power_sums, min, max)
    }
}
