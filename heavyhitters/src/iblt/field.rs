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

//! Arithmetic in the prime field GF(2^61 - 1).
//!
//! Key sums and checksums of a cell are field elements, so a cell holding `c` copies of one
//! key can be divided back to the key by the inverse of `c`.

pub(super) const MODULUS: u64 = (1 << 61) - 1;

#[inline]
pub(super) fn add(a: u64, b: u64) -> u64 {
    debug_assert!(a < MODULUS && b < MODULUS);
    let sum = a + b;
    if sum >= MODULUS { sum - MODULUS } else { sum }
}

#[inline]
pub(super) fn mul(a: u64, b: u64) -> u64 {
    let product = u128::from(a) * u128::from(b);
    // 2^61 = 1 (mod p), so fold the high bits onto the low bits.
    let folded = ((product as u64) & MODULUS) + (product >> 61) as u64;
    let folded = (folded & MODULUS) + (folded >> 61);
    if folded >= MODULUS {
        folded - MODULUS
    } else {
        folded
    }
}

#[inline]
pub(super) fn from_i64(value: i64) -> u64 {
    value.rem_euclid(MODULUS as i64) as u64
}

#[inline]
pub(super) fn from_hash(hash: u64) -> u64 {
    hash % MODULUS
}

pub(super) fn pow(mut base: u64, mut exp: u64) -> u64 {
    let mut acc = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul(acc, base);
        }
        base = mul(base, base);
        exp >>= 1;
    }
    acc
}

/// Returns the multiplicative inverse of a non-zero element.
#[inline]
pub(super) fn inv(a: u64) -> u64 {
    debug_assert!(a != 0, "zero has no inverse");
    pow(a, MODULUS - 2)
}
