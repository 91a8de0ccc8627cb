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

//! Shared random utilities for sketches.
//!
//! Noise generation takes any [`rand::Rng`]. [`XorShift64`] is a small deterministic
//! generator whose output stream does not depend on the version of `rand`, which makes noised
//! results reproducible under a fixed seed.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rand::RngCore;

const ZERO_SEED_REPLACEMENT: u64 = 0x9e3779b97f4a7c15;

/// Xorshift-based random generator for sketch operations.
///
/// # Examples
///
/// ```
/// use heavyhitters::common::random::XorShift64;
/// use rand::RngCore;
///
/// let mut a = XorShift64::seeded(7);
/// let mut b = XorShift64::seeded(7);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new generator using the provided seed.
    ///
    /// The seed is scrambled first, so small or similar seeds still start from well mixed
    /// states.
    pub fn seeded(seed: u64) -> Self {
        let state = splitmix64(seed);
        let state = if state == 0 { ZERO_SEED_REPLACEMENT } else { state };
        Self { state }
    }
}

impl Default for XorShift64 {
    fn default() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Self::seeded(nanos as u64 ^ u64::from(std::process::id()))
    }
}

impl RngCore for XorShift64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut chunks = dst.chunks_exact_mut(8);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&self.next_u64().to_le_bytes());
        }
        let rest = chunks.into_remainder();
        if !rest.is_empty() {
            let bytes = self.next_u64().to_le_bytes();
            rest.copy_from_slice(&bytes[..rest.len()]);
        }
    }
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Draws a uniform sample from the open interval `(0, 1)`.
///
/// Uses the top 53 bits of one 64-bit output, offset by half a step so that neither bound
/// is ever returned.
#[inline]
pub(crate) fn open_unit<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
    ((rng.next_u64() >> 11) as f64 + 0.5) * SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sequence() {
        let mut rng = XorShift64::seeded(1);
        assert_eq!(rng.next_u64(), 8247328468710148152);
        assert_eq!(rng.next_u64(), 15170175812956362920);

        let mut zero = XorShift64::seeded(0);
        assert_eq!(zero.next_u64(), 7377219508542733812);
    }

    #[test]
    fn test_default_is_usable() {
        let mut rng = XorShift64::default();
        assert_ne!(rng.state, 0);
        let first = rng.next_u64();
        assert_ne!(first, rng.next_u64());
        let u = open_unit(&mut rng);
        assert!(u > 0.0 && u < 1.0);
    }

    #[test]
    fn test_open_unit_bounds() {
        let mut rng = XorShift64::seeded(42);
        for _ in 0..10_000 {
            let u = open_unit(&mut rng);
            assert!(u > 0.0 && u < 1.0);
        }
    }

    #[test]
    fn test_fill_bytes_matches_next_u64() {
        let mut a = XorShift64::seeded(99);
        let mut b = XorShift64::seeded(99);
        let mut buf = [0u8; 12];
        a.fill_bytes(&mut buf);
        assert_eq!(&buf[..8], &b.next_u64().to_le_bytes());
        assert_eq!(&buf[8..], &b.next_u64().to_le_bytes()[..4]);
    }
}
