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

use rayon::prelude::*;

use crate::codec::Family;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::ensure_preamble_longs_in;
use crate::codec::ensure_serial_version_is;
use crate::codec::insufficient_data;
use crate::error::Error;
use crate::iblt::IbltConfig;
use crate::iblt::field;
use crate::iblt::key;
use crate::iblt::serialization::*;

/// An Invertible Bloom Lookup Table over byte-string keys.
///
/// Every cell holds a key sum, a signed count and a checksum. Inserting an item adds its
/// encoded key, its count and its checksum to each of its `num_hashes` cells. All fields combine
/// by addition, so [`merge`](Self::merge) is commutative and associative, and the union of
/// many sketches does not depend on the order they are merged in.
///
/// # Examples
///
/// ```
/// use heavyhitters::iblt::IbltConfig;
/// use heavyhitters::iblt::IbltSketch;
///
/// let config = IbltConfig::builder().capacity(100).build().unwrap();
/// let mut left = IbltSketch::new(config);
/// let mut right = IbltSketch::new(config);
/// left.insert("apple").unwrap();
/// right.insert("apple").unwrap();
/// right.insert("pear").unwrap();
///
/// left.merge(&right).unwrap();
/// let decoded = left.decode();
/// assert!(decoded.is_complete());
/// assert_eq!(decoded.count_of(b"apple"), Some(2));
/// assert_eq!(decoded.count_of(b"pear"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbltSketch {
    config: IbltConfig,
    /// Signed number of insertions per cell
    counts: Vec<i64>,
    /// Sum of `count * checksum(key)` per cell
    checksums: Vec<u64>,
    /// Sum of `count * key` per cell, `words_per_key` words per cell
    key_sums: Vec<u64>,
}

/// Read-only view of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell<'a> {
    /// Signed number of insertions mapped to the cell.
    pub count: i64,
    /// Field sum of the key checksums.
    pub checksum: u64,
    /// Field sums of the key words.
    pub key_sum: &'a [u64],
}

impl IbltSketch {
    /// Creates an empty sketch.
    pub fn new(config: IbltConfig) -> Self {
        let capacity = config.capacity();
        Self {
            config,
            counts: vec![0; capacity],
            checksums: vec![0; capacity],
            key_sums: vec![0; capacity * config.words_per_key()],
        }
    }

    /// Returns the hash configuration.
    pub fn config(&self) -> &IbltConfig {
        &self.config
    }

    /// Returns the number of cells.
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// Returns true if every field of every cell is zero.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
            && self.checksums.iter().all(|&c| c == 0)
            && self.key_sums.iter().all(|&w| w == 0)
    }

    /// Returns a view of the cell at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub fn cell(&self, index: usize) -> Cell<'_> {
        let width = self.config.words_per_key();
        Cell {
            count: self.counts[index],
            checksum: self.checksums[index],
            key_sum: &self.key_sums[index * width..(index + 1) * width],
        }
    }

    /// Inserts one occurrence of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ItemTooLong`](crate::error::ErrorKind::ItemTooLong) if the item is
    /// longer than `max_string_length`.
    pub fn insert(&mut self, item: impl AsRef<[u8]>) -> Result<(), Error> {
        self.insert_with_count(item, 1)
    }

    /// Inserts `count` occurrences of `item`. A negative count deletes occurrences.
    pub fn insert_with_count(&mut self, item: impl AsRef<[u8]>, count: i64) -> Result<(), Error> {
        let item = item.as_ref();
        if item.len() > self.config.max_string_length() {
            return Err(Error::item_too_long(
                item.len(),
                self.config.max_string_length(),
            ));
        }
        self.insert_unchecked(item, count);
        Ok(())
    }

    /// Inserts an item whose length has already been checked.
    pub(crate) fn insert_unchecked(&mut self, item: &[u8], count: i64) {
        debug_assert!(item.len() <= self.config.max_string_length());
        if count == 0 {
            return;
        }
        let mut words = vec![0u64; self.config.words_per_key()];
        key::encode_key(item, &mut words);
        let checksum = self.config.key_checksum(item);
        let indices = self.config.cell_indices(item);
        self.apply(&indices, &words, checksum, count);
    }

    /// Merges another sketch into this one by field-wise addition.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IncompatibleSketch`](crate::error::ErrorKind::IncompatibleSketch)
    /// if the configurations differ. This sketch is left unchanged in that case.
    pub fn merge(&mut self, other: &IbltSketch) -> Result<(), Error> {
        self.config.ensure_compatible(&other.config)?;
        for (count, other) in self.counts.iter_mut().zip(&other.counts) {
            *count = count.wrapping_add(*other);
        }
        for (sum, other) in self.checksums.iter_mut().zip(&other.checksums) {
            *sum = field::add(*sum, *other);
        }
        for (sum, other) in self.key_sums.iter_mut().zip(&other.key_sums) {
            *sum = field::add(*sum, *other);
        }
        Ok(())
    }

    /// Merges a collection of sketches with a parallel tree reduction.
    ///
    /// Returns an empty sketch for `config` when `sketches` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IncompatibleSketch`](crate::error::ErrorKind::IncompatibleSketch)
    /// if any sketch does not use `config`.
    pub fn merge_all(config: IbltConfig, sketches: &[IbltSketch]) -> Result<IbltSketch, Error> {
        sketches
            .par_iter()
            .try_fold(
                || IbltSketch::new(config),
                |mut acc: IbltSketch, sketch: &IbltSketch| -> Result<IbltSketch, Error> {
                    acc.merge(sketch)?;
                    Ok(acc)
                },
            )
            .try_reduce(
                || IbltSketch::new(config),
                |mut left, right| {
                    left.merge(&right)?;
                    Ok(left)
                },
            )
    }

    /// Adds `count` copies of an encoded key to the given cells.
    pub(super) fn apply(&mut self, indices: &[usize], words: &[u64], checksum: u64, count: i64) {
        let width = self.config.words_per_key();
        let weight = field::from_i64(count);
        let weighted_checksum = field::mul(weight, checksum);
        for &index in indices {
            self.counts[index] = self.counts[index].wrapping_add(count);
            self.checksums[index] = field::add(self.checksums[index], weighted_checksum);
            let sums = &mut self.key_sums[index * width..(index + 1) * width];
            for (sum, &word) in sums.iter_mut().zip(words) {
                *sum = field::add(*sum, field::mul(weight, word));
            }
        }
    }

    pub(super) fn is_cell_empty(&self, index: usize) -> bool {
        let cell = self.cell(index);
        cell.count == 0 && cell.checksum == 0 && cell.key_sum.iter().all(|&w| w == 0)
    }

    /// Serializes this sketch into a byte vector.
    ///
    /// # Examples
    ///
    /// ```
    /// use heavyhitters::iblt::IbltConfig;
    /// use heavyhitters::iblt::IbltSketch;
    ///
    /// let config = IbltConfig::builder().capacity(20).build().unwrap();
    /// let mut sketch = IbltSketch::new(config);
    /// sketch.insert("word").unwrap();
    ///
    /// let bytes = sketch.serialize();
    /// let restored = IbltSketch::deserialize(&bytes).unwrap();
    /// assert_eq!(sketch, restored);
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let is_empty = self.is_empty();
        let preamble_bytes = PREAMBLE_LONGS as usize * 8;
        let cell_bytes = CELL_HEADER_BYTES + self.config.words_per_key() * 8;
        let total = if is_empty {
            preamble_bytes
        } else {
            preamble_bytes + self.capacity() * cell_bytes
        };

        let mut bytes = SketchBytes::with_capacity(total);
        bytes.write_u8(PREAMBLE_LONGS);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(Family::IBLT.id);
        bytes.write_u8(if is_empty { EMPTY_FLAG_MASK } else { 0 });
        bytes.write_u16_le(self.config.num_hashes() as u16);
        bytes.write_u16_le(0); // unused
        bytes.write_u32_le(self.capacity() as u32);
        bytes.write_u32_le(self.config.max_string_length() as u32);
        bytes.write_u64_le(self.config.seed());

        if !is_empty {
            for index in 0..self.capacity() {
                let cell = self.cell(index);
                bytes.write_i64_le(cell.count);
                bytes.write_u64_le(cell.checksum);
                for &word in cell.key_sum {
                    bytes.write_u64_le(word);
                }
            }
        }
        bytes.into_bytes()
    }

    /// Deserializes a sketch from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InsufficientData`](crate::error::ErrorKind::InsufficientData) if
    /// the bytes end early, and
    /// [`ErrorKind::MalformedDeserializeData`](crate::error::ErrorKind::MalformedDeserializeData)
    /// if the preamble or a cell value is invalid.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let preamble_longs = cursor
            .read_u8()
            .map_err(insufficient_data("preamble_longs"))?;
        let serial_version = cursor
            .read_u8()
            .map_err(insufficient_data("serial_version"))?;
        let family_id = cursor.read_u8().map_err(insufficient_data("family_id"))?;
        let flags = cursor.read_u8().map_err(insufficient_data("flags"))?;
        let num_hashes = cursor
            .read_u16_le()
            .map_err(insufficient_data("num_hashes"))?;
        let _unused = cursor.read_u16_le().map_err(insufficient_data("unused"))?;
        let capacity = cursor
            .read_u32_le()
            .map_err(insufficient_data("capacity"))?;
        let max_string_length = cursor
            .read_u32_le()
            .map_err(insufficient_data("max_string_length"))?;
        let seed = cursor.read_u64_le().map_err(insufficient_data("seed"))?;

        Family::IBLT.validate_id(family_id)?;
        ensure_serial_version_is(SERIAL_VERSION, serial_version)?;
        ensure_preamble_longs_in(
            &[Family::IBLT.min_pre_longs, Family::IBLT.max_pre_longs],
            preamble_longs,
        )?;

        let config = IbltConfig::builder()
            .capacity(capacity as usize)
            .num_hashes(num_hashes as usize)
            .max_string_length(max_string_length as usize)
            .seed(seed)
            .build()
            .map_err(|err| {
                Error::deserial(format!("invalid sketch parameters: {}", err.message()))
            })?;
        if flags & EMPTY_FLAG_MASK != 0 {
            return Ok(IbltSketch::new(config));
        }

        // The builder bounds the cell bytes, so this cannot overflow.
        let width = config.words_per_key();
        let expected = config.capacity() * (CELL_HEADER_BYTES + width * 8);
        if cursor.remaining() < expected {
            return Err(Error::insufficient_data("cells")
                .with_context("expected", expected)
                .with_context("actual", cursor.remaining()));
        }
        let mut sketch = IbltSketch::new(config);
        for index in 0..sketch.capacity() {
            sketch.counts[index] = cursor.read_i64_le().map_err(insufficient_data("count"))?;
            sketch.checksums[index] = read_field(&mut cursor, "checksum")?;
            for word in 0..width {
                sketch.key_sums[index * width + word] = read_field(&mut cursor, "key_sum")?;
            }
        }
        Ok(sketch)
    }
}

fn read_field(cursor: &mut SketchSlice<'_>, tag: &'static str) -> Result<u64, Error> {
    let value = cursor.read_u64_le().map_err(insufficient_data(tag))?;
    if value >= field::MODULUS {
        return Err(Error::deserial(format!("{tag} value {value} is not a field element")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn config(capacity: usize) -> IbltConfig {
        IbltConfig::builder()
            .capacity(capacity)
            .num_hashes(3)
            .max_string_length(16)
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_sketch_is_empty() {
        let sketch = IbltSketch::new(config(40));
        assert!(sketch.is_empty());
        assert_eq!(sketch.capacity(), 40);
        assert_eq!(sketch.cell(0).key_sum.len(), 4);
    }

    #[test]
    fn test_insert_touches_num_hashes_cells() {
        let mut sketch = IbltSketch::new(config(60));
        sketch.insert("word").unwrap();
        let touched: Vec<usize> = (0..60).filter(|&i| sketch.cell(i).count != 0).collect();
        assert_eq!(touched, sketch.config().cell_indices(b"word"));
        for index in touched {
            assert_eq!(sketch.cell(index).count, 1);
        }
    }

    #[test]
    fn test_insert_and_delete_cancel() {
        let mut sketch = IbltSketch::new(config(60));
        sketch.insert_with_count("word", 3).unwrap();
        sketch.insert_with_count("word", -3).unwrap();
        assert!(sketch.is_empty());
    }

    #[test]
    fn test_insert_rejects_long_item() {
        let mut sketch = IbltSketch::new(config(60));
        let err = sketch.insert("seventeen bytes!!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ItemTooLong);
        assert!(sketch.is_empty());
    }

    #[test]
    fn test_merge_rejects_other_capacity() {
        let mut sketch = IbltSketch::new(config(60));
        let other = IbltSketch::new(config(61));
        let err = sketch.merge(&other).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleSketch);
    }

    #[test]
    fn test_merge_all_empty_input() {
        let merged = IbltSketch::merge_all(config(10), &[]).unwrap();
        assert!(merged.is_empty());
        assert_eq!(merged.capacity(), 10);
    }

    #[test]
    fn test_serialized_empty_sketch_is_preamble_only() {
        let sketch = IbltSketch::new(config(10));
        let bytes = sketch.serialize();
        assert_eq!(bytes.len(), PREAMBLE_LONGS as usize * 8);
        assert_eq!(bytes[3] & EMPTY_FLAG_MASK, EMPTY_FLAG_MASK);
        assert_eq!(IbltSketch::deserialize(&bytes).unwrap(), sketch);
    }
}
