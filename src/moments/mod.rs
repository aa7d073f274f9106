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

//! Power-sum summaries of a set of values.
//!
//! A [`MomentSummary`] keeps the count, the power sums `Σ xⁱ`, and the extremes of a
//! set of values. Power sums add and subtract elementwise, which is what makes
//! sliding-window maintenance cheap; the extremes do not, and must be rescanned.

mod summary;

pub use self::summary::MomentSummary;

/// Default number of power sums kept, including the count.
pub const DEFAULT_NUM_MOMENTS: usize = 11;
