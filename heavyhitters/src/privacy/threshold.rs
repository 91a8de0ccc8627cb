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
use tracing::debug;

use crate::error::Error;
use crate::iblt::DecodedEntry;
use crate::privacy::Laplace;
use crate::privacy::PublishedResult;

/// Privacy budget of one release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrivacyParams {
    eps: f64,
    delta: f64,
}

impl PrivacyParams {
    /// Creates privacy parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) unless
    /// `eps` is positive and finite and `delta` lies in the open interval `(0, 1)`.
    pub fn new(eps: f64, delta: f64) -> Result<Self, Error> {
        if !(eps.is_finite() && eps > 0.0) {
            return Err(Error::config("eps must be positive and finite").with_context("eps", eps));
        }
        if !(delta > 0.0 && delta < 1.0) {
            return Err(Error::config("delta must be in (0, 1)").with_context("delta", delta));
        }
        Ok(Self { eps, delta })
    }

    /// Returns epsilon.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Returns delta.
    pub fn delta(&self) -> f64 {
        self.delta
    }
}

/// Laplace noise followed by a threshold on the noised count.
///
/// For a fixed sequence of uniform draws, raising `eps` never removes an entry with a count of
/// at least one from the release: both the noise and the margin above 1 shrink with the same
/// factor `max_words_per_user / eps`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaplaceThreshold {
    params: PrivacyParams,
    max_words_per_user: usize,
    noise: Laplace,
    threshold: f64,
}

impl LaplaceThreshold {
    /// Creates the mechanism for clients contributing at most `max_words_per_user` words.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if
    /// `max_words_per_user` is zero.
    pub fn new(params: PrivacyParams, max_words_per_user: usize) -> Result<Self, Error> {
        if max_words_per_user == 0 {
            return Err(Error::config("max_words_per_user must be at least 1"));
        }
        let sensitivity = max_words_per_user as f64;
        let scale = sensitivity / params.eps();
        let threshold = 1.0 + scale * (sensitivity / (2.0 * params.delta())).ln();
        Ok(Self {
            params,
            max_words_per_user,
            noise: Laplace::new(scale)?,
            threshold,
        })
    }

    /// Returns the privacy parameters.
    pub fn params(&self) -> PrivacyParams {
        self.params
    }

    /// Returns the per-client contribution bound.
    pub fn max_words_per_user(&self) -> usize {
        self.max_words_per_user
    }

    /// Returns the Laplace scale `max_words_per_user / eps`.
    pub fn scale(&self) -> f64 {
        self.noise.scale()
    }

    /// Returns the release threshold `tau`.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Noises every entry and keeps those reaching the threshold.
    ///
    /// Draws exactly one sample per entry, in the order of `entries`.
    pub fn publish<R: Rng + ?Sized>(
        &self,
        entries: &[DecodedEntry],
        rng: &mut R,
    ) -> PublishedResult {
        let mut published = PublishedResult::default();
        for entry in entries {
            let noised = entry.count() as f64 + self.noise.sample(rng);
            if noised >= self.threshold {
                published.insert(entry.item().to_vec(), noised);
            }
        }
        debug!(
            candidates = entries.len(),
            published = published.len(),
            threshold = self.threshold,
            "released noised heavy hitters"
        );
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_params_validation() {
        assert!(PrivacyParams::new(1.0, 0.5).is_ok());
        let invalid = [
            (0.0, 0.1),
            (-1.0, 0.1),
            (f64::INFINITY, 0.1),
            (1.0, 0.0),
            (1.0, 1.0),
        ];
        for (eps, delta) in invalid {
            let err = PrivacyParams::new(eps, delta).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        }
        assert!(PrivacyParams::new(1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_scale_and_threshold() {
        let params = PrivacyParams::new(20.0, 0.01).unwrap();
        let mechanism = LaplaceThreshold::new(params, 8).unwrap();
        assert!((mechanism.scale() - 0.4).abs() < 1e-12);
        let expected = 1.0 + 0.4 * 400f64.ln();
        assert!((mechanism.threshold() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_words_rejected() {
        let params = PrivacyParams::new(1.0, 0.1).unwrap();
        assert!(LaplaceThreshold::new(params, 0).is_err());
    }
}
