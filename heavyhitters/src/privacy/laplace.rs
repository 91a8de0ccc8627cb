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

use rand::Rng;
use rand::distr::Distribution;

use crate::common::random::open_unit;
use crate::error::Error;

/// The Laplace distribution centred at zero.
///
/// Samples by inverting the CDF at a uniform draw from the open interval `(0, 1)`, consuming
/// exactly one 64-bit output of the generator per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laplace {
    scale: f64,
}

impl Laplace {
    /// Creates a distribution with the given scale.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) unless
    /// `scale` is positive and finite.
    pub fn new(scale: f64) -> Result<Self, Error> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::config("laplace scale must be positive and finite")
                .with_context("scale", scale));
        }
        Ok(Self { scale })
    }

    /// Returns the scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Distribution<f64> for Laplace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let centred = open_unit(rng) - 0.5;
        if centred < 0.0 {
            self.scale * (1.0 + 2.0 * centred).ln()
        } else {
            -self.scale * (1.0 - 2.0 * centred).ln()
        }
    }
}
