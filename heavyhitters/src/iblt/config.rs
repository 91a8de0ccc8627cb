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
use crate::hash::checksum_hash;
use crate::hash::murmur128;
use crate::hash::reduce;
use crate::iblt::IbltBuilder;
use crate::iblt::field;
use crate::iblt::key;

/// Hash configuration of an IBLT.
///
/// The cell array is split into `num_hashes` contiguous partitions and hash function `i`
/// selects one cell inside partition `i`. The cells of one item are therefore pairwise
/// distinct. Every encoder and the decoder of one computation must share the same value;
/// a configuration cannot be changed once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IbltConfig {
    capacity: usize,
    num_hashes: usize,
    max_string_length: usize,
    seed: u64,
}

impl IbltConfig {
    pub(super) fn new(
        capacity: usize,
        num_hashes: usize,
        max_string_length: usize,
        seed: u64,
    ) -> Self {
        Self {
            capacity,
            num_hashes,
            max_string_length,
            seed,
        }
    }

    /// Returns a builder with default parameters.
    pub fn builder() -> IbltBuilder {
        IbltBuilder::default()
    }

    /// Returns the number of cells.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of cells each item maps to.
    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Returns the maximum item length in bytes.
    pub fn max_string_length(&self) -> usize {
        self.max_string_length
    }

    /// Returns the hash seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the cell indices of `item`, one per hash function, in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use heavyhitters::iblt::IbltConfig;
    ///
    /// let config = IbltConfig::builder().capacity(30).num_hashes(3).build().unwrap();
    /// let indices = config.cell_indices(b"apple");
    /// assert_eq!(indices.len(), 3);
    /// assert!(indices[0] < 10 && (10..20).contains(&indices[1]) && indices[2] >= 20);
    /// ```
    pub fn cell_indices(&self, item: &[u8]) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.num_hashes);
        self.fill_cell_indices(item, &mut out);
        out
    }

    /// Returns an error unless `other` is the same configuration.
    pub fn ensure_compatible(&self, other: &IbltConfig) -> Result<(), Error> {
        if self.capacity != other.capacity {
            return Err(Error::incompatible("capacity", self.capacity, other.capacity));
        }
        if self.num_hashes != other.num_hashes {
            return Err(Error::incompatible("num_hashes", self.num_hashes, other.num_hashes));
        }
        if self.max_string_length != other.max_string_length {
            return Err(Error::incompatible(
                "max_string_length",
                self.max_string_length,
                other.max_string_length,
            ));
        }
        if self.seed != other.seed {
            return Err(Error::incompatible("seed", self.seed, other.seed));
        }
        Ok(())
    }

    /// Number of field words in the key-sum of one cell.
    pub(super) fn words_per_key(&self) -> usize {
        key::words_per_key(self.max_string_length)
    }

    pub(super) fn fill_cell_indices(&self, item: &[u8], out: &mut Vec<usize>) {
        out.clear();
        let (h1, h2) = murmur128(item, self.seed);
        for i in 0..self.num_hashes {
            let start = i * self.capacity / self.num_hashes;
            let end = (i + 1) * self.capacity / self.num_hashes;
            // Kirsch-Mitzenmacher double hashing: h1 + i * h2
            let hash = h1.wrapping_add((i as u64).wrapping_mul(h2));
            out.push(start + reduce(hash, end - start));
        }
    }

    /// Checksum of `item` as a field element.
    pub(super) fn key_checksum(&self, item: &[u8]) -> u64 {
        field::from_hash(checksum_hash(item, self.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_distinct_and_partitioned() {
        let config = IbltConfig::new(50, 3, 20, 7);
        for word in ["a", "b", "c", "apple", "banana", "a much longer word"] {
            let indices = config.cell_indices(word.as_bytes());
            assert_eq!(indices.len(), 3);
            assert!(indices[0] < 16);
            assert!((16..33).contains(&indices[1]));
            assert!((33..50).contains(&indices[2]));
        }
    }

    #[test]
    fn test_indices_are_deterministic() {
        let config = IbltConfig::new(1000, 4, 10, 1);
        assert_eq!(config.cell_indices(b"cat"), config.cell_indices(b"cat"));
        let reseeded = IbltConfig::new(1000, 4, 10, 2);
        assert_ne!(config.cell_indices(b"cat"), reseeded.cell_indices(b"cat"));
    }

    #[test]
    fn test_single_cell_table() {
        let config = IbltConfig::new(1, 1, 4, 0);
        assert_eq!(config.cell_indices(b"x"), vec![0]);
    }

    #[test]
    fn test_ensure_compatible() {
        let config = IbltConfig::new(100, 3, 10, 9001);
        assert!(config.ensure_compatible(&config).is_ok());
        let err = config
            .ensure_compatible(&IbltConfig::new(101, 3, 10, 9001))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IncompatibleSketch);
        assert_eq!(err.context("expected"), Some("100"));
        assert_eq!(err.context("actual"), Some("101"));
    }
}
