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

use tracing::debug;
use tracing::trace;

use super::config::WindowConfig;
use super::pane::Pane;
use crate::error::Error;
use crate::moments::MomentSummary;
use crate::quantiles::DoublesSketch;

/// Lifecycle of a [`WindowManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Fewer than `window_size` panes have been filled.
    Building,
    /// The window is full and an aggregate is maintained.
    SteadyState,
}

/// Summary of the union of the panes currently in the window.
#[derive(Debug, Clone)]
pub struct WindowAggregate {
    summary: MomentSummary,
    sketch: Option<DoublesSketch>,
}

impl WindowAggregate {
    pub fn summary(&self) -> &MomentSummary {
        &self.summary
    }

    /// Returns the aggregate quantiles sketch, if the window tracks one.
    pub fn sketch(&self) -> Option<&DoublesSketch> {
        self.sketch.as_ref()
    }

    /// Returns approximate quantiles of the whole window.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the window does not track quantiles, and the
    /// usual sketch errors otherwise.
    pub fn quantiles(&self, ranks: &[f64]) -> Result<Vec<f64>, Error> {
        match &self.sketch {
            Some(sketch) => sketch.quantiles(ranks),
            None => Err(Error::validation(
                "window was configured without quantile tracking",
            )),
        }
    }
}

/// Maintains a window-level aggregate over a ring of panes.
///
/// A slide is a single `&mut self` call, so no reader can observe the aggregate while
/// it is half updated. The only fallible work (ingesting the incoming chunk) happens
/// before the aggregate is touched; if it fails, the window is unchanged.
#[derive(Debug)]
pub struct WindowManager {
    config: WindowConfig,
    panes: Vec<Pane>,
    // index of the oldest pane in the ring
    oldest: usize,
    // recycled storage of the last evicted pane
    spare_pane: Option<Pane>,
    // recycled storage of the previous aggregate sketch
    spare_sketch: Option<DoublesSketch>,
    aggregate: WindowAggregate,
    state: WindowState,
    slides: u64,
}

impl WindowManager {
    /// Creates an empty window in the [`WindowState::Building`] state.
    pub fn new(config: WindowConfig) -> Result<Self, Error> {
        config.validate()?;
        let summary = MomentSummary::new(config.num_moments);
        let sketch = if config.track_quantiles {
            Some(DoublesSketch::new(config.k)?)
        } else {
            None
        };
        Ok(Self {
            panes: Vec::with_capacity(config.window_size),
            oldest: 0,
            spare_pane: None,
            spare_sketch: None,
            aggregate: WindowAggregate { summary, sketch },
            state: WindowState::Building,
            slides: 0,
            config,
        })
    }

    /// Creates a window and pushes every chunk in order.
    pub fn from_chunks<'a>(
        config: WindowConfig,
        chunks: impl IntoIterator<Item = &'a [f64]>,
    ) -> Result<Self, Error> {
        let mut window = Self::new(config)?;
        for chunk in chunks {
            window.push(chunk)?;
        }
        Ok(window)
    }

    /// Adds the next chunk: fills a pane while building, slides once full.
    pub fn push(&mut self, chunk: &[f64]) -> Result<(), Error> {
        match self.state {
            WindowState::Building => self.push_pane(chunk),
            WindowState::SteadyState => self.slide(chunk),
        }
    }

    /// Fills the next pane while the window is building.
    ///
    /// When the last pane is filled, the aggregate is built from all panes and the
    /// window enters [`WindowState::SteadyState`].
    pub fn push_pane(&mut self, chunk: &[f64]) -> Result<(), Error> {
        if self.state != WindowState::Building {
            return Err(Error::validation("window is full, use slide instead"));
        }

        let pane = Pane::build(self.config.k, self.config.num_moments, chunk)?;
        self.panes.push(pane);
        if self.panes.len() < self.config.window_size {
            return Ok(());
        }

        let mut summary = MomentSummary::new(self.config.num_moments);
        for pane in &self.panes {
            summary.add_sums(pane.summary())?;
        }
        summary.set_extremes_from(self.panes.iter().map(Pane::summary));

        if let Some(sketch) = &mut self.aggregate.sketch {
            for pane in &self.panes {
                sketch.merge(pane.sketch())?;
            }
        }
        self.aggregate.summary = summary;
        self.state = WindowState::SteadyState;
        debug!(
            window_size = self.config.window_size,
            count = self.aggregate.summary.count(),
            "Window filled."
        );
        Ok(())
    }

    /// Evicts the oldest pane and absorbs `chunk` as the newest one.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the window is still building. Errors from
    /// ingesting the chunk leave the window unchanged.
    pub fn slide(&mut self, chunk: &[f64]) -> Result<(), Error> {
        if self.state != WindowState::SteadyState {
            return Err(Error::validation("window is still building, use push_pane instead"));
        }

        let mut incoming = match self.spare_pane.take() {
            Some(pane) => pane,
            None => Pane::new(self.config.k, self.config.num_moments)?,
        };
        incoming.rebuild(chunk)?;
        let rebuilt_sketch = self.rebuild_sketch(&incoming)?;

        let summary = &mut self.aggregate.summary;
        // the evicted pane leaves before the new one enters
        summary.subtract_sums(self.panes[self.oldest].summary())?;
        let evicted = std::mem::replace(&mut self.panes[self.oldest], incoming);
        self.spare_pane = Some(evicted);
        summary.add_sums(self.panes[self.oldest].summary())?;
        self.oldest = (self.oldest + 1) % self.panes.len();
        summary.set_extremes_from(self.panes.iter().map(Pane::summary));

        if let Some(sketch) = rebuilt_sketch {
            self.spare_sketch = self.aggregate.sketch.replace(sketch);
        }
        self.slides += 1;
        trace!(
            slides = self.slides,
            count = self.aggregate.summary.count(),
            "Window slid."
        );
        Ok(())
    }

    // Merges every pane except the oldest, then the incoming one, into a recycled sketch.
    fn rebuild_sketch(&mut self, incoming: &Pane) -> Result<Option<DoublesSketch>, Error> {
        if !self.config.track_quantiles {
            return Ok(None);
        }
        let mut sketch = match self.spare_sketch.take() {
            Some(sketch) => sketch,
            None => DoublesSketch::new(self.config.k)?,
        };
        sketch.reset()?;
        let len = self.panes.len();
        for offset in 1..len {
            sketch.merge(self.panes[(self.oldest + offset) % len].sketch())?;
        }
        sketch.merge(incoming.sketch())?;
        Ok(Some(sketch))
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn aggregate(&self) -> &WindowAggregate {
        &self.aggregate
    }

    /// Shortcut for `aggregate().summary()`.
    pub fn summary(&self) -> &MomentSummary {
        &self.aggregate.summary
    }

    /// Returns the panes from oldest to newest.
    pub fn panes(&self) -> impl Iterator<Item = &Pane> {
        let (newer, older) = self.panes.split_at(self.oldest);
        older.iter().chain(newer.iter())
    }

    pub fn num_panes(&self) -> usize {
        self.panes.len()
    }

    /// Returns the number of slides performed since the window filled.
    pub fn slides(&self) -> u64 {
        self.slides
    }

    /// Sums every pane summary from scratch, in pane order.
    ///
    /// Useful to measure the drift of the incrementally maintained aggregate.
    pub fn recompute_summary(&self) -> Result<MomentSummary, Error> {
        let mut summary = MomentSummary::new(self.config.num_moments);
        for pane in self.panes() {
            summary.add_sums(pane.summary())?;
        }
        summary.set_extremes_from(self.panes.iter().map(Pane::summary));
        Ok(summary)
    }
}
