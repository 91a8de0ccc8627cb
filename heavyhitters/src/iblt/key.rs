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

//! Fixed-width field encoding of string keys.
//!
//! Word 0 holds the byte length of the key. The bytes follow, packed seven per word in
//! little-endian order and zero padded, so every word stays below 2^56 and is a valid field
//! element.

const BYTES_PER_WORD: usize = 7;
const WORD_LIMIT: u64 = 1 << (8 * BYTES_PER_WORD);

/// Returns the number of field words used to encode keys of at most `max_string_length` bytes.
pub(super) fn words_per_key(max_string_length: usize) -> usize {
    1 + max_string_length.div_ceil(BYTES_PER_WORD)
}

/// Encodes `item` into `out`, which must hold exactly `words_per_key` words.
pub(super) fn encode_key(item: &[u8], out: &mut [u64]) {
    debug_assert!(out.len() >= words_per_key(item.len()));
    out.fill(0);
    out[0] = item.len() as u64;
    for (chunk, word) in item.chunks(BYTES_PER_WORD).zip(out[1..].iter_mut()) {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        *word = u64::from_le_bytes(buf);
    }
}

/// Decodes key words back into bytes.
///
/// Returns `None` unless the words are a well-formed encoding: a length within bounds, words
/// below 2^56 and zero padding after the last byte.
pub(super) fn decode_key(words: &[u64], max_string_length: usize) -> Option<Vec<u8>> {
    let (&len, data) = words.split_first()?;
    if len > max_string_length as u64 || data.len() < (len as usize).div_ceil(BYTES_PER_WORD) {
        return None;
    }
    let len = len as usize;
    let mut item = Vec::with_capacity(len);
    for (i, &word) in data.iter().enumerate() {
        if word >= WORD_LIMIT {
            return None;
        }
        let start = i * BYTES_PER_WORD;
        let take = len.saturating_sub(start).min(BYTES_PER_WORD);
        if take < BYTES_PER_WORD && (word >> (8 * take)) != 0 {
            return None;
        }
        item.extend_from_slice(&word.to_le_bytes()[..take]);
    }
    Some(item)
}
