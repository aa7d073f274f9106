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

/// Summary of a set of values: extremes plus the power sums `Σ xⁱ` for `i` in
/// `0..num_moments`.
///
/// `power_sums()[0]` is the count and `power_sums()[1]` the plain sum. `log_min` and
/// `log_max` are the natural logarithms of the extremes, or NaN when the extreme is
/// not positive.
///
/// # Examples
///
/// ```
/// # use sliding_quantiles::moments::MomentSummary;
/// let summary = MomentSummary::from_values(3, &[1.0, 2.0, 3.0]);
/// assert_eq!(summary.power_sums(), &[3.0, 6.0, 14.0]);
/// assert_eq!(summary.min(), 1.0);
/// assert_eq!(summary.max(), 3.0);
/// assert_eq!(summary.mean(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MomentSummary {
    min: f64,
    max: f64,
    log_min: f64,
    log_max: f64,
    power_sums: Vec<f64>,
}

impl MomentSummary {
    /// Creates an empty summary keeping `num_moments` power sums.
    ///
    /// # Panics
    ///
    /// Panics if `num_moments` is less than 2; the count and the plain sum are always kept.
    pub fn new(num_moments: usize) -> Self {
        assert!(num_moments >= 2, "num_moments must be at least 2, got {num_moments}");
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            log_min: f64::NAN,
            log_max: f64::NAN,
            power_sums: vec![0.0; num_moments],
        }
    }

    pub fn from_values(num_moments: usize, values: &[f64]) -> Self {
        let mut summary = Self::new(num_moments);
        summary.add_all(values);
        summary
    }

    /// Adds a value. NaN values are ignored.
    pub fn add(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        if value < self.min {
            self.min = value;
            self.log_min = positive_ln(value);
        }
        if value > self.max {
            self.max = value;
            self.log_max = positive_ln(value);
        }

        let mut power = 1.0;
        for sum in self.power_sums.iter_mut() {
            *sum += power;
            power *= value;
        }
    }

    pub fn add_all(&mut self, values: &[f64]) {
        for &value in values {
            self.add(value);
        }
    }

    /// Returns to the empty state, keeping the number of power sums.
    pub fn clear(&mut self) {
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
        self.log_min = f64::NAN;
        self.log_max = f64::NAN;
        self.power_sums.fill(0.0);
    }

    pub fn num_moments(&self) -> usize {
        self.power_sums.len()
    }

    /// Returns the number of values summarized.
    pub fn count(&self) -> f64 {
        self.power_sums[0]
    }

    pub fn is_empty(&self) -> bool {
        self.count() <= 0.0
    }

    /// Returns the minimum value, or NaN if the summary is empty.
    pub fn min(&self) -> f64 {
        if self.is_empty() { f64::NAN } else { self.min }
    }

    /// Returns the maximum value, or NaN if the summary is empty.
    pub fn max(&self) -> f64 {
        if self.is_empty() { f64::NAN } else { self.max }
    }

    pub fn log_min(&self) -> f64 {
        self.log_min
    }

    pub fn log_max(&self) -> f64 {
        self.log_max
    }

    /// Returns the mean, or NaN if the summary is empty.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            f64::NAN
        } else {
            self.power_sums[1] / self.power_sums[0]
        }
    }

    pub fn power_sums(&self) -> &[f64] {
        &self.power_sums
    }

    /// Adds the power sums of `other` elementwise. Extremes are left untouched.
    pub fn add_sums(&mut self, other: &MomentSummary) -> Result<(), Error> {
        self.check_same_shape(other)?;
        for (sum, other) in self.power_sums.iter_mut().zip(&other.power_sums) {
            *sum += other;
        }
        Ok(())
    }

    /// Subtracts the power sums of `other` elementwise. Extremes are left untouched.
    pub fn subtract_sums(&mut self, other: &MomentSummary) -> Result<(), Error> {
        self.check_same_shape(other)?;
        for (sum, other) in self.power_sums.iter_mut().zip(&other.power_sums) {
            *sum -= other;
        }
        Ok(())
    }

    /// Recomputes min, max, log-min and log-max as the extremes across `summaries`.
    ///
    /// Empty summaries do not contribute.
    pub fn set_extremes_from<'a>(&mut self, summaries: impl IntoIterator<Item = &'a MomentSummary>) {
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
        self.log_min = f64::NAN;
        self.log_max = f64::NAN;
        for summary in summaries.into_iter().filter(|summary| !summary.is_empty()) {
            self.min = self.min.min(summary.min);
            self.max = self.max.max(summary.max);
            // f64::min/max skip NaN operands
            self.log_min = self.log_min.min(summary.log_min);
            self.log_max = self.log_max.max(summary.log_max);
        }
        if self.min <= 0.0 {
            self.log_min = f64::NAN;
        }
    }

    /// Returns true if every field of `other` is within relative tolerance `rel_tol`.
    pub fn approx_eq(&self, other: &MomentSummary, rel_tol: f64) -> bool {
        self.power_sums.len() == other.power_sums.len()
            && approx_eq(self.min(), other.min(), rel_tol)
            && approx_eq(self.max(), other.max(), rel_tol)
            && approx_eq(self.log_min, other.log_min, rel_tol)
            && approx_eq(self.log_max, other.log_max, rel_tol)
            && self
                .power_sums
                .iter()
                .zip(&other.power_sums)
                .all(|(a, b)| approx_eq(*a, *b, rel_tol))
    }

    fn check_same_shape(&self, other: &MomentSummary) -> Result<(), Error> {
        if self.power_sums.len() != other.power_sums.len() {
            return Err(Error::validation("power sum vectors differ in length")
                .with_context("len", self.power_sums.len())
                .with_context("other_len", other.power_sums.len()));
        }
        Ok(())
    }
}

fn positive_ln(value: f64) -> f64 {
    if value > 0.0 { value.ln() } else { f64::NAN }
}

fn approx_eq(a: f64, b: f64, rel_tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    if a == b {
        return true;
    }
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_is_ignored() {
        let mut summary = MomentSummary::new(4);
        summary.add(f64::NAN);
        assert!(summary.is_empty());
        assert!(summary.min().is_nan());
        summary.add(2.0);
        assert_eq!(summary.power_sums(), &[1.0, 2.0, 4.0, 8.0]);
    }

    #[test]
    fn test_log_extremes() {
        let summary = MomentSummary::from_values(2, &[-1.0, 4.0]);
        assert!(summary.log_min().is_nan());
        assert_eq!(summary.log_max(), 4.0f64.ln());

        let summary = MomentSummary::from_values(2, &[1.0, 4.0]);
        assert_eq!(summary.log_min(), 0.0);
    }

    #[test]
    fn test_add_then_subtract_sums() {
        let mut total = MomentSummary::from_values(3, &[1.0, 2.0]);
        let other = MomentSummary::from_values(3, &[3.0]);
        total.add_sums(&other).unwrap();
        assert_eq!(total.power_sums(), &[3.0, 6.0, 14.0]);
        total.subtract_sums(&other).unwrap();
        assert_eq!(total.power_sums(), &[2.0, 3.0, 5.0]);

        let wrong = MomentSummary::new(4);
        assert!(total.add_sums(&wrong).is_err());
    }

    #[test]
    fn test_extremes_skip_empty() {
        let a = MomentSummary::from_values(2, &[3.0, 5.0]);
        let b = MomentSummary::new(2);
        let c = MomentSummary::from_values(2, &[0.5, 4.0]);
        let mut window = MomentSummary::new(2);
        window.set_extremes_from([&a, &b, &c]);
        assert_eq!(window.min, 0.5);
        assert_eq!(window.max, 5.0);
        assert_eq!(window.log_min(), 0.5f64.ln());
        assert_eq!(window.log_max(), 5.0f64.ln());
    }
}
