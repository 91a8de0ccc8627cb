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
use googletest::prelude::eq;
use googletest::prelude::near;
use heavyhitters::common::random::XorShift64;
use heavyhitters::error::ErrorKind;
use heavyhitters::heavy_hitters::ContributionPolicy;
use heavyhitters::heavy_hitters::HeavyHitters;
use heavyhitters::heavy_hitters::HeavyHittersBuilder;
use heavyhitters::iblt::DecodedEntry;
use heavyhitters::iblt::IbltConfig;
use heavyhitters::iblt::IbltSketch;

fn small_computation() -> HeavyHittersBuilder {
    HeavyHitters::builder()
        .capacity(50)
        .num_hashes(3)
        .max_string_length(10)
        .max_words_per_user(8)
        .max_heavy_hitters(10)
        .multi_contribution(false)
        .privacy(20.0, 0.01)
}

fn example_clients() -> Vec<Vec<&'static str>> {
    vec![vec!["a", "a", "b"], vec!["a", "c"]]
}

#[test]
fn test_single_contribution_clips_repeats() {
    let computation = small_computation().build().unwrap();
    let encoder = computation.encoder();
    assert_eq!(
        encoder.encode(&["cat", "cat", "cat"]).unwrap(),
        encoder.encode(&["cat"]).unwrap()
    );

    let multi = small_computation().multi_contribution(true).build().unwrap();
    let decoded = multi.encoder().encode(&["cat", "cat", "cat"]).unwrap().decode();
    assert_eq!(decoded.count_of(b"cat"), Some(3));
}

#[test]
fn test_end_to_end_discovery() {
    let computation = small_computation().build().unwrap();
    let discovery = computation.discover(&example_clients()).unwrap();

    assert_eq!(
        discovery.heavy_hitters(),
        &[
            DecodedEntry::new("a", 2),
            DecodedEntry::new("b", 1),
            DecodedEntry::new("c", 1),
        ]
    );
    assert_that!(discovery.num_undecoded_cells(), eq(0));
    assert_that!(discovery.stats().encoded(), eq(2));
    assert_that!(discovery.stats().truncated(), eq(0));
    assert_that!(discovery.stats().rejected(), eq(0));
}

#[test]
fn test_end_to_end_release() {
    let computation = small_computation().build().unwrap();
    let mechanism = computation.mechanism();
    assert_that!(mechanism.scale(), near(0.4, 1e-12));
    assert_that!(mechanism.threshold(), near(3.3965858188431928, 1e-12));

    // Noise draws for a, b, c: +1.680, -0.072, -0.308.
    let published = computation
        .run(&example_clients(), &mut XorShift64::seeded(23))
        .unwrap();
    assert_that!(published.len(), eq(1));
    assert_that!(published.get(b"a").unwrap(), near(3.6804073841696407, 1e-9));

    // Noise draws for a, b, c: +0.104, -1.106, +2.966.
    let published = computation
        .run(&example_clients(), &mut XorShift64::seeded(63))
        .unwrap();
    assert_that!(published.len(), eq(1));
    assert_that!(published.get(b"c").unwrap(), near(3.965930823064129, 1e-9));
    assert!(published.get(b"a").is_none());

    // "a" lands at 3.322, just short of the threshold.
    let published = computation
        .run(&example_clients(), &mut XorShift64::seeded(42))
        .unwrap();
    assert!(published.is_empty());
}

#[test]
fn test_release_is_reproducible() {
    let computation = small_computation().build().unwrap();
    let clients: Vec<Vec<String>> = (0..30)
        .map(|i| vec![format!("w{}", i % 3), "shared".to_string()])
        .collect();

    let first = computation.run(&clients, &mut XorShift64::seeded(9)).unwrap();
    let second = computation.run(&clients, &mut XorShift64::seeded(9)).unwrap();
    assert_eq!(first, second);
    assert_that!(first.len(), eq(4));
    assert_that!(first.get(b"shared").unwrap(), near(30.0, 10.0));
}

#[test]
fn test_batched_aggregation_matches_unbatched() {
    let clients: Vec<Vec<String>> = (0..101)
        .map(|i| vec![format!("w{}", i % 5), format!("v{}", i % 2)])
        .collect();

    let unbatched = small_computation().build().unwrap();
    let batched = small_computation().batch_size(16).build().unwrap();
    let expected = unbatched.aggregate(&clients).unwrap();
    let actual = batched.aggregate(&clients).unwrap();
    assert_eq!(actual, expected);
    assert_that!(actual.stats().encoded(), eq(101));
    assert_eq!(actual.sketch().decode().count_of(b"w0"), Some(21));
}

fn invalid_clients() -> Vec<Vec<&'static str>> {
    vec![
        vec!["a"],
        vec!["w0", "w1", "w2", "w3", "w4", "w5", "w6", "w7", "w8"],
        vec!["a", "overlong-word"],
    ]
}

#[test]
fn test_truncate_policy() {
    let computation = small_computation()
        .capacity(200)
        .exhaustive_decode(true)
        .build()
        .unwrap();
    let discovery = computation.discover(&invalid_clients()).unwrap();
    let stats = discovery.stats();
    assert_that!(stats.encoded(), eq(3));
    assert_that!(stats.truncated(), eq(2));
    assert_that!(stats.rejected(), eq(0));

    let entries = discovery.heavy_hitters();
    assert_eq!(entries[0], DecodedEntry::new("a", 2));
    assert!(entries.contains(&DecodedEntry::new("overlong-w", 1)));
    assert!(!entries.contains(&DecodedEntry::new("w8", 1)));
}

#[test]
fn test_reject_policy() {
    let computation = small_computation()
        .capacity(200)
        .contribution_policy(ContributionPolicy::Reject)
        .build()
        .unwrap();
    let discovery = computation.discover(&invalid_clients()).unwrap();
    let stats = discovery.stats();
    assert_that!(stats.encoded(), eq(1));
    assert_that!(stats.truncated(), eq(0));
    assert_that!(stats.rejected(), eq(2));
    assert_eq!(discovery.heavy_hitters(), &[DecodedEntry::new("a", 1)]);
}

#[test]
fn test_abort_policy() {
    let computation = small_computation()
        .contribution_policy(ContributionPolicy::Abort)
        .build()
        .unwrap();
    let clients = vec![vec!["a"], vec!["b", "much-too-long-word"], vec!["c"]];
    let err = computation.discover(&clients).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ItemTooLong);
    assert_eq!(err.context("len"), Some("18"));

    assert!(computation.discover(&example_clients()).is_ok());
}

#[test]
fn test_discover_serialized_client_sketches() {
    let computation = small_computation().build().unwrap();
    let sketches: Vec<IbltSketch> = example_clients()
        .iter()
        .map(|words| computation.encoder().encode(words).unwrap().serialize())
        .map(|bytes| IbltSketch::deserialize(&bytes).unwrap())
        .collect();

    let from_sketches = computation.discover_sketches(&sketches).unwrap();
    let from_clients = computation.discover(&example_clients()).unwrap();
    assert_eq!(from_sketches.heavy_hitters(), from_clients.heavy_hitters());

    let foreign = IbltConfig::builder().capacity(51).build().unwrap();
    let err = computation
        .discover_sketches(&[IbltSketch::new(foreign)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompatibleSketch);
}

#[test]
fn test_exhaustive_decode_finds_largest_counts() {
    let computation = small_computation()
        .multi_contribution(true)
        .max_heavy_hitters(2)
        .exhaustive_decode(true)
        .build()
        .unwrap();
    let clients = vec![
        vec!["x", "x", "x", "y", "v"],
        vec!["x", "x", "y", "y", "y"],
        vec!["z", "w"],
    ];
    let discovery = computation.discover(&clients).unwrap();
    assert_eq!(
        discovery.heavy_hitters(),
        &[DecodedEntry::new("x", 5), DecodedEntry::new("y", 4)]
    );

    let limited = small_computation()
        .multi_contribution(true)
        .max_heavy_hitters(2)
        .build()
        .unwrap();
    let discovery = limited.discover(&clients).unwrap();
    assert_that!(discovery.heavy_hitters().len(), eq(2));
}

#[test]
fn test_builder_validation() {
    let err = HeavyHitters::builder().build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

    for builder in [
        small_computation().max_words_per_user(0),
        small_computation().max_heavy_hitters(0),
        small_computation().batch_size(0),
        small_computation().capacity(0),
        small_computation().privacy(0.0, 0.01),
        small_computation().privacy(1.0, 1.5),
    ] {
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
