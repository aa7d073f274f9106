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
use crate::moments::MomentSummary;
use crate::quantiles::DoublesSketch;

/// One chunk of the stream: its quantiles sketch and its cached moment summary.
#[derive(Debug, Clone)]
pub struct Pane {
    sketch: DoublesSketch,
    summary: MomentSummary,
}

impl Pane {
    pub(crate) fn new(k: u16, num_moments: usize) -> Result<Self, Error> {
        Ok(Self {
            sketch: DoublesSketch::new(k)?,
            summary: MomentSummary::new(num_moments),
        })
    }

    pub(crate) fn build(k: u16, num_moments: usize, chunk: &[f64]) -> Result<Self, Error> {
        let mut pane = Self::new(k, num_moments)?;
        pane.rebuild(chunk)?;
        Ok(pane)
    }

    /// Clears the pane, keeping its storage, and ingests `chunk`.
    pub(crate) fn rebuild(&mut self, chunk: &[f64]) -> Result<(), Error> {
        self.sketch.reset()?;
        self.summary.clear();
        for &value in chunk {
            self.sketch.update(value)?;
        }
        self.summary.add_all(chunk);
        Ok(())
    }

    pub fn sketch(&self) -> &DoublesSketch {
        &self.sketch
    }

    pub fn summary(&self) -> &MomentSummary {
        &self.summary
    }
}
