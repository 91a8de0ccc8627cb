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
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::iblt::IbltConfig;
use crate::iblt::IbltSketch;
use crate::iblt::key;
use crate::iblt::serialization::CELL_HEADER_BYTES;

const DEFAULT_CAPACITY: usize = 1000;
const DEFAULT_NUM_HASHES: usize = 3;
const DEFAULT_MAX_STRING_LENGTH: usize = 10;

/// Upper bound on the memory held by the cells of one sketch.
const MAX_SKETCH_BYTES: usize = 1 << 30;

/// Builder for the hash configuration shared by every IBLT of one computation.
///
/// # Examples
///
/// ```
/// use heavyhitters::iblt::IbltConfig;
///
/// let config = IbltConfig::builder()
///     .capacity(100)
///     .num_hashes(3)
///     .max_string_length(20)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.capacity(), 100);
/// assert_eq!(config.num_hashes(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct IbltBuilder {
    capacity: usize,
    num_hashes: usize,
    max_string_length: usize,
    seed: u64,
}

impl Default for IbltBuilder {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            num_hashes: DEFAULT_NUM_HASHES,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            seed: DEFAULT_UPDATE_SEED,
        }
    }
}

impl IbltBuilder {
    /// Sets the number of cells of the table.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of cells each item is inserted into.
    pub fn num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    /// Sets the maximum length in bytes of an item.
    pub fn max_string_length(mut self, max_string_length: usize) -> Self {
        self.max_string_length = max_string_length;
        self
    }

    /// Sets the hash seed.
    ///
    /// Sketches built with different seeds are incompatible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if
    /// `capacity`, `num_hashes` or `max_string_length` is zero, if `num_hashes` exceeds
    /// `capacity`, if a parameter does not fit the serialized form, or if the cells would take
    /// more than 1 GiB.
    pub fn build(self) -> Result<IbltConfig, Error> {
        if self.capacity == 0 {
            return Err(Error::config("capacity must be at least 1"));
        }
        if self.num_hashes == 0 {
            return Err(Error::config("num_hashes must be at least 1"));
        }
        if self.max_string_length == 0 {
            return Err(Error::config("max_string_length must be at least 1"));
        }
        if self.num_hashes > self.capacity {
            return Err(Error::config("num_hashes must not exceed capacity")
                .with_context("num_hashes", self.num_hashes)
                .with_context("capacity", self.capacity));
        }
        if self.capacity > u32::MAX as usize {
            return Err(Error::config("capacity must not exceed u32::MAX")
                .with_context("capacity", self.capacity));
        }
        if self.num_hashes > u16::MAX as usize {
            return Err(Error::config("num_hashes must not exceed u16::MAX")
                .with_context("num_hashes", self.num_hashes));
        }
        if self.max_string_length > u32::MAX as usize {
            return Err(Error::config("max_string_length must not exceed u32::MAX")
                .with_context("max_string_length", self.max_string_length));
        }
        let fits = cell_bytes(self.max_string_length)
            .and_then(|bytes| bytes.checked_mul(self.capacity))
            .is_some_and(|bytes| bytes <= MAX_SKETCH_BYTES);
        if !fits {
            return Err(Error::config("sketch cells must not exceed 1 GiB")
                .with_context("capacity", self.capacity)
                .with_context("max_string_length", self.max_string_length));
        }
        Ok(IbltConfig::new(
            self.capacity,
            self.num_hashes,
            self.max_string_length,
            self.seed,
        ))
    }

    /// Builds the configuration and returns an empty sketch using it.
    pub fn build_sketch(self) -> Result<IbltSketch, Error> {
        self.build().map(IbltSketch::new)
    }
}

/// Bytes taken by one cell, or `None` on overflow.
fn cell_bytes(max_string_length: usize) -> Option<usize> {
    key::words_per_key(max_string_length)
        .checked_mul(8)?
        .checked_add(CELL_HEADER_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_build_sketch_uses_config() {
        let sketch = IbltBuilder::default().capacity(12).build_sketch().unwrap();
        assert!(sketch.is_empty());
        assert_eq!(sketch.capacity(), 12);
        assert_eq!(sketch.config().seed(), DEFAULT_UPDATE_SEED);
    }

    #[test]
    fn test_rejects_oversized_cells() {
        let err = IbltBuilder::default()
            .capacity(u32::MAX as usize)
            .max_string_length(u32::MAX as usize)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context("capacity"), Some("4294967295"));

        // 10-byte keys take two words, so 40 bytes per cell.
        let max_cells = MAX_SKETCH_BYTES / 40;
        assert!(IbltBuilder::default().capacity(max_cells).build().is_ok());
        assert!(IbltBuilder::default().capacity(max_cells + 1).build().is_err());
    }

    #[test]
    fn test_cell_bytes_overflow() {
        assert_eq!(cell_bytes(10), Some(40));
        assert_eq!(cell_bytes(usize::MAX), None);
    }
}
