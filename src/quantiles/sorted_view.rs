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

#[derive(Debug, Clone)]
pub(crate) struct SortedView {
    entries: Vec<Entry>,
    total_weight: u64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    item: f64,
    // cumulative weight up to and including this entry
    weight: u64,
}

impl SortedView {
    /// Builds the weighted view of a base buffer (weight 1) and the populated levels,
    /// given as `(level index, items)` pairs.
    ///
    /// Level 0 holds the survivors of a zipped 2k base buffer, so an item at level i
    /// weighs `2^(i + 1)`.
    pub fn new<'a>(base_buffer: &[f64], levels: impl IntoIterator<Item = (usize, &'a [f64])>) -> Self {
        let mut entries: Vec<Entry> = base_buffer
            .iter()
            .map(|&item| Entry { item, weight: 1 })
            .collect();
        for (level, items) in levels {
            let weight = 1u64 << (level + 1);
            entries.extend(items.iter().map(|&item| Entry { item, weight }));
        }

        entries.sort_by(|a, b| a.item.total_cmp(&b.item));
        let mut total_weight = 0u64;
        for entry in &mut entries {
            total_weight += entry.weight;
            entry.weight = total_weight;
        }
        Self {
            entries,
            total_weight,
        }
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Returns the item whose cumulative weight interval contains `floor(rank * n)`.
    pub fn quantile(&self, rank: f64) -> f64 {
        let n = self.total_weight;
        let pos = ((rank * n as f64).floor() as u64).min(n.saturating_sub(1));
        let idx = self.entries.partition_point(|entry| entry.weight <= pos);
        let idx = idx.min(self.entries.len() - 1);
        self.entries[idx].item
    }

    /// Returns the fraction of weight held by items strictly less than `item`.
    pub fn rank(&self, item: f64) -> f64 {
        let idx = self.entries.partition_point(|entry| entry.item < item);
        if idx == 0 {
            return 0.0;
        }
        self.entries[idx - 1].weight as f64 / self.total_weight as f64
    }

    pub fn cdf(&self, split_points: &[f64]) -> Vec<f64> {
        let mut ranks: Vec<f64> = split_points.iter().map(|&item| self.rank(item)).collect();
        ranks.push(1.0);
        ranks
    }

    pub fn pmf(&self, split_points: &[f64]) -> Vec<f64> {
        let mut buckets = self.cdf(split_points);
        for i in (1..buckets.len()).rev() {
            buckets[i] -= buckets[i - 1];
        }
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_quantile() {
        // level 0 items weigh 2, base buffer items weigh 1
        let view = SortedView::new(&[0.0, 6.0], [(0usize, &[1.0, 3.0, 5.0, 8.0][..])]);
        assert_eq!(view.total_weight(), 10);
        assert_eq!(view.quantile(0.0), 0.0);
        assert_eq!(view.quantile(0.1), 1.0);
        assert_eq!(view.quantile(0.5), 5.0);
        assert_eq!(view.quantile(0.7), 6.0);
        assert_eq!(view.quantile(1.0), 8.0);
    }

    #[test]
    fn test_rank_and_pmf() {
        let view = SortedView::new(&[1.0, 2.0, 3.0, 4.0], std::iter::empty());
        assert_eq!(view.rank(0.5), 0.0);
        assert_eq!(view.rank(2.0), 0.25);
        assert_eq!(view.rank(2.5), 0.5);
        assert_eq!(view.pmf(&[2.5]), vec![0.5, 0.5]);
    }
}
