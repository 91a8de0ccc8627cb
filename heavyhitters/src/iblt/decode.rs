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

//! Peeling decoder.

use tracing::debug;

use crate::iblt::IbltSketch;
use crate::iblt::field;
use crate::iblt::key;

/// An item recovered from a sketch together with its count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedEntry {
    item: Vec<u8>,
    count: i64,
}

impl DecodedEntry {
    /// Creates an entry.
    pub fn new(item: impl Into<Vec<u8>>, count: i64) -> Self {
        Self {
            item: item.into(),
            count,
        }
    }

    /// Returns the item bytes.
    pub fn item(&self) -> &[u8] {
        &self.item
    }

    /// Returns the recovered count.
    pub fn count(&self) -> i64 {
        self.count
    }

    /// Splits the entry into its item and count.
    pub fn into_parts(self) -> (Vec<u8>, i64) {
        (self.item, self.count)
    }
}

/// Result of peeling a sketch.
///
/// Decoding is best effort. When a sketch holds more distinct items than its capacity can
/// carry, the peeling stalls and the remaining items are not reported; they are
/// indistinguishable from items that were never inserted. [`is_complete`](Self::is_complete)
/// tells whether every cell was peeled back to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    entries: Vec<DecodedEntry>,
    num_undecoded_cells: usize,
    peel_steps: usize,
}

impl Decoded {
    /// Returns the recovered entries with a positive count, in peeling order.
    pub fn entries(&self) -> &[DecodedEntry] {
        &self.entries
    }

    /// Consumes the result and returns its entries.
    pub fn into_entries(self) -> Vec<DecodedEntry> {
        self.entries
    }

    /// Returns the recovered count of `item`, if it was recovered.
    pub fn count_of(&self, item: &[u8]) -> Option<i64> {
        self.entries
            .iter()
            .find(|entry| entry.item() == item)
            .map(DecodedEntry::count)
    }

    /// Returns the number of cells still non-zero after peeling stopped.
    pub fn num_undecoded_cells(&self) -> usize {
        self.num_undecoded_cells
    }

    /// Returns the number of cells peeled.
    pub fn peel_steps(&self) -> usize {
        self.peel_steps
    }

    /// Returns true if the sketch was peeled back to all zeros.
    pub fn is_complete(&self) -> bool {
        self.num_undecoded_cells == 0
    }
}

/// A key found in a pure cell.
struct Peeled {
    item: Vec<u8>,
    words: Vec<u64>,
    checksum: u64,
    count: i64,
}

impl IbltSketch {
    /// Decodes every recoverable item.
    pub fn decode(&self) -> Decoded {
        self.decode_with_limit(usize::MAX)
    }

    /// Decodes items by peeling until no pure cell remains or `limit` items with a positive
    /// count have been recovered.
    ///
    /// A cell is pure when its count is non-zero, its key sum divided by its count is a
    /// well-formed key, the checksum of that key times the count equals the cell checksum,
    /// and the cell is one of the key's cells. The recovered key is then subtracted from all
    /// of its cells, which may make neighbouring cells pure. At most `capacity` cells are
    /// peeled.
    pub fn decode_with_limit(&self, limit: usize) -> Decoded {
        let mut work = self.clone();
        let capacity = work.capacity();
        let mut indices = Vec::with_capacity(work.config().num_hashes());
        let mut entries = Vec::new();
        let mut peel_steps = 0;

        // Popping from the back visits cells in ascending order first.
        let mut pending: Vec<usize> = (0..capacity)
            .rev()
            .filter(|&index| work.cell(index).count != 0)
            .collect();

        while entries.len() < limit && peel_steps < capacity {
            let Some(index) = pending.pop() else {
                break;
            };
            let Some(peeled) = work.pure_cell(index, &mut indices) else {
                continue;
            };

            work.apply(&indices, &peeled.words, peeled.checksum, -peeled.count);
            peel_steps += 1;
            for &other in &indices {
                if other != index && work.cell(other).count != 0 {
                    pending.push(other);
                }
            }
            if peeled.count > 0 {
                entries.push(DecodedEntry::new(peeled.item, peeled.count));
            }
        }

        let num_undecoded_cells = (0..capacity)
            .filter(|&index| !work.is_cell_empty(index))
            .count();
        debug!(
            recovered = entries.len(),
            peel_steps, num_undecoded_cells, "peeled sketch"
        );
        Decoded {
            entries,
            num_undecoded_cells,
            peel_steps,
        }
    }

    /// Returns the key held by the cell at `index` if the cell is pure. On success `indices`
    /// holds the key's cells.
    fn pure_cell(&self, index: usize, indices: &mut Vec<usize>) -> Option<Peeled> {
        let cell = self.cell(index);
        let weight = field::from_i64(cell.count);
        if weight == 0 {
            return None;
        }
        let inverse = field::inv(weight);
        let words: Vec<u64> = cell
            .key_sum
            .iter()
            .map(|&sum| field::mul(sum, inverse))
            .collect();
        let item = key::decode_key(&words, self.config().max_string_length())?;
        let checksum = self.config().key_checksum(&item);
        if field::mul(weight, checksum) != cell.checksum {
            return None;
        }
        self.config().fill_cell_indices(&item, indices);
        if !indices.contains(&index) {
            return None;
        }
        Some(Peeled {
            item,
            words,
            checksum,
            count: cell.count,
        })
    }
}
