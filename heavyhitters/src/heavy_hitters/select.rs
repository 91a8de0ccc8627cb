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

use std::cmp::Ordering;

use crate::iblt::DecodedEntry;

/// Keeps the `k` entries with the largest counts.
///
/// Entries are ordered by descending count, ties broken by ascending item bytes, so the result
/// does not depend on the order the decoder recovered them in.
///
/// # Examples
///
/// ```
/// use heavyhitters::heavy_hitters::select_top_k;
/// use heavyhitters::iblt::DecodedEntry;
///
/// let entries = vec![
///     DecodedEntry::new("b", 3),
///     DecodedEntry::new("c", 9),
///     DecodedEntry::new("a", 3),
/// ];
/// let top = select_top_k(entries, 2);
/// assert_eq!(top, vec![DecodedEntry::new("c", 9), DecodedEntry::new("a", 3)]);
/// ```
pub fn select_top_k(mut entries: Vec<DecodedEntry>, k: usize) -> Vec<DecodedEntry> {
    entries.sort_by(rank);
    entries.truncate(k);
    entries
}

fn rank(a: &DecodedEntry, b: &DecodedEntry) -> Ordering {
    b.count()
        .cmp(&a.count())
        .then_with(|| a.item().cmp(b.item()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fewer_entries_than_k() {
        let entries = vec![DecodedEntry::new("x", 1), DecodedEntry::new("y", 2)];
        let top = select_top_k(entries, 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].item(), b"y");
    }

    #[test]
    fn test_ties_are_lexicographic() {
        let entries = vec![
            DecodedEntry::new("pear", 5),
            DecodedEntry::new("apple", 5),
            DecodedEntry::new("fig", 5),
            DecodedEntry::new("kiwi", 1),
        ];
        let items: Vec<Vec<u8>> = select_top_k(entries, 3)
            .into_iter()
            .map(|entry| entry.into_parts().0)
            .collect();
        assert_eq!(items, vec![b"apple".to_vec(), b"fig".to_vec(), b"pear".to_vec()]);
    }

    #[test]
    fn test_zero_k() {
        assert!(select_top_k(vec![DecodedEntry::new("x", 1)], 0).is_empty());
    }
}
