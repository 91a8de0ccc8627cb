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

use googletest::assert_that;
use googletest::prelude::contains_substring;
use heavyhitters::error::ErrorKind;
use heavyhitters::iblt::IbltConfig;
use heavyhitters::iblt::IbltSketch;

const PREAMBLE_BYTES: usize = 24;
const EMPTY_FLAG: u8 = 1 << 2;

fn populated_sketch() -> IbltSketch {
    let config = IbltConfig::builder()
        .capacity(40)
        .num_hashes(3)
        .max_string_length(12)
        .seed(77)
        .build()
        .unwrap();
    let mut sketch = IbltSketch::new(config);
    sketch.insert_with_count("privacy", 9).unwrap();
    sketch.insert_with_count("sketch", 4).unwrap();
    sketch.insert_with_count("removed", -2).unwrap();
    sketch
}

#[test]
fn test_round_trip_preserves_cells_and_config() {
    let sketch = populated_sketch();
    let bytes = sketch.serialize();
    // 40 cells of count, checksum and 1 + ceil(12 / 7) key words.
    assert_eq!(bytes.len(), PREAMBLE_BYTES + 40 * (16 + 3 * 8));

    let restored = IbltSketch::deserialize(&bytes).unwrap();
    assert_eq!(restored, sketch);
    assert_eq!(restored.config().seed(), 77);

    let decoded = restored.decode();
    assert_eq!(decoded.count_of(b"privacy"), Some(9));
    assert_eq!(decoded.count_of(b"sketch"), Some(4));
    assert_eq!(decoded.count_of(b"removed"), None);
}

#[test]
fn test_round_trip_of_cancelled_sketch_is_empty() {
    let mut sketch = populated_sketch();
    sketch.insert_with_count("privacy", -9).unwrap();
    sketch.insert_with_count("sketch", -4).unwrap();
    sketch.insert_with_count("removed", 2).unwrap();
    assert!(sketch.is_empty());

    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), PREAMBLE_BYTES);
    let restored = IbltSketch::deserialize(&bytes).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.config(), sketch.config());
}

#[test]
fn test_truncated_bytes() {
    let bytes = populated_sketch().serialize();
    for len in [0, 3, 10, PREAMBLE_BYTES - 1] {
        let err = IbltSketch::deserialize(&bytes[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData, "len {len}");
    }

    let err = IbltSketch::deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
    assert_that!(err.message(), contains_substring("cells"));
}

#[test]
fn test_invalid_preamble() {
    let bytes = populated_sketch().serialize();

    let mut bad_family = bytes.clone();
    bad_family[2] = 99;
    let err = IbltSketch::deserialize(&bad_family).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
    assert_that!(err.message(), contains_substring("invalid family"));

    let mut bad_version = bytes.clone();
    bad_version[1] = 2;
    let err = IbltSketch::deserialize(&bad_version).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
    assert_that!(err.message(), contains_substring("serial version"));

    let mut bad_preamble = bytes.clone();
    bad_preamble[0] = 5;
    let err = IbltSketch::deserialize(&bad_preamble).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
    assert_that!(err.message(), contains_substring("preamble longs"));
}

#[test]
fn test_invalid_parameters() {
    let mut bytes = populated_sketch().serialize();
    // num_hashes greater than capacity
    bytes[4..6].copy_from_slice(&100u16.to_le_bytes());
    let err = IbltSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
    assert_that!(err.message(), contains_substring("invalid sketch parameters"));
}

fn preamble(flags: u8, capacity: u32, max_string_length: u32) -> Vec<u8> {
    let mut bytes = vec![3, 1, 31, flags];
    bytes.extend_from_slice(&3u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&capacity.to_le_bytes());
    bytes.extend_from_slice(&max_string_length.to_le_bytes());
    bytes.extend_from_slice(&9001u64.to_le_bytes());
    bytes
}

#[test]
fn test_huge_header_is_rejected_before_allocating() {
    for flags in [0, EMPTY_FLAG] {
        let bytes = preamble(flags, u32::MAX, u32::MAX);
        let err = IbltSketch::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData, "flags {flags}");
        assert_that!(err.message(), contains_substring("invalid sketch parameters"));
    }

    // A header within bounds still needs every cell to be present.
    let bytes = preamble(0, 1 << 20, 10);
    let err = IbltSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
    assert_eq!(err.context("expected"), Some("41943040"));
    assert_eq!(err.context("actual"), Some("0"));

    let restored = IbltSketch::deserialize(&preamble(EMPTY_FLAG, 64, 10)).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.capacity(), 64);
}

#[test]
fn test_values_outside_the_field() {
    let mut bytes = populated_sketch().serialize();
    // checksum of the first cell
    bytes[PREAMBLE_BYTES + 8..PREAMBLE_BYTES + 16].copy_from_slice(&u64::MAX.to_le_bytes());
    let err = IbltSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
    assert_that!(err.message(), contains_substring("checksum"));

    let mut bytes = populated_sketch().serialize();
    // first key word of the first cell
    let modulus: u64 = (1 << 61) - 1;
    bytes[PREAMBLE_BYTES + 16..PREAMBLE_BYTES + 24].copy_from_slice(&modulus.to_le_bytes());
    let err = IbltSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
    assert_that!(err.message(), contains_substring("key_sum"));
}
