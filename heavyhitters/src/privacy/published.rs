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

use std::collections::BTreeMap;

/// The released mapping from item to noised count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishedResult {
    counts: BTreeMap<Vec<u8>, f64>,
}

impl PublishedResult {
    pub(crate) fn insert(&mut self, item: Vec<u8>, noised_count: f64) {
        self.counts.insert(item, noised_count);
    }

    /// Returns the noised count of `item`, if it was released.
    pub fn get(&self, item: &[u8]) -> Option<f64> {
        self.counts.get(item).copied()
    }

    /// Returns the number of released items.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if nothing was released.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over released items in byte order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], f64)> {
        self.counts.iter().map(|(item, &count)| (item.as_slice(), count))
    }

    /// Returns the release keyed by words, decoding items as UTF-8.
    ///
    /// Bytes that are not valid UTF-8 are dropped. Should two items map to the same word, the
    /// larger noised count is kept.
    pub fn to_word_counts(&self) -> BTreeMap<String, f64> {
        let mut words = BTreeMap::new();
        for (item, count) in self.iter() {
            let word: String = item.utf8_chunks().map(|chunk| chunk.valid()).collect();
            let slot = words.entry(word).or_insert(count);
            if count > *slot {
                *slot = count;
            }
        }
        words
    }
}
