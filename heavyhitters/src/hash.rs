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

//! Hashing utilities for sketch cell indexing and key checksums.

/// The seed used by default for all sketch hash functions.
pub const DEFAULT_UPDATE_SEED: u64 = 9001;

/// Salt mixed into the seed of the key checksum hash so that it is independent of the
/// index hashes.
const CHECKSUM_SALT: u64 = 0x5bd1_e995_d6e8_feb8;

/// Returns the two 64-bit halves of MurmurHash3 x64-128 of `bytes`.
#[inline]
pub(crate) fn murmur128(bytes: &[u8], seed: u64) -> (u64, u64) {
    // mur3 takes a 32-bit seed; fold the 64-bit seed into it.
    let folded = (seed ^ (seed >> 32)) as u32;
    mur3::murmurhash3_x64_128(bytes, folded)
}

/// Returns the checksum hash of `bytes`, used to verify that a cell holds a single key.
#[inline]
pub(crate) fn checksum_hash(bytes: &[u8], seed: u64) -> u64 {
    let (h1, h2) = murmur128(bytes, fmix64(seed ^ CHECKSUM_SALT));
    h1 ^ h2.rotate_left(29)
}

/// Maps a 64-bit hash uniformly onto `[0, n)`.
#[inline]
pub(crate) fn reduce(hash: u64, n: usize) -> usize {
    ((u128::from(hash) * n as u128) >> 64) as usize
}

#[inline]
pub(crate) fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^ (k >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur_matches_reference_vectors() {
        let key = "The quick brown fox jumps over the lazy dog";
        let (h1, h2) = murmur128(key.as_bytes(), 0);
        assert_eq!(h1, 0xe34bbc7bbc071b6c);
        assert_eq!(h2, 0x7a433ca9c49a9347);
    }

    #[test]
    fn test_reduce_stays_in_range() {
        for n in [1usize, 2, 3, 17, 100, 1 << 20] {
            for hash in [0u64, 1, u64::MAX / 3, u64::MAX - 1, u64::MAX] {
                assert!(reduce(hash, n) < n);
            }
        }
        assert_eq!(reduce(0, 10), 0);
        assert_eq!(reduce(u64::MAX, 10), 9);
    }

    #[test]
    fn test_checksum_hash_differs_from_index_hash() {
        let bytes = b"apple";
        let (h1, _) = murmur128(bytes, DEFAULT_UPDATE_SEED);
        assert_ne!(checksum_hash(bytes, DEFAULT_UPDATE_SEED), h1);
        assert_eq!(
            checksum_hash(bytes, DEFAULT_UPDATE_SEED),
            checksum_hash(bytes, DEFAULT_UPDATE_SEED)
        );
    }
}
