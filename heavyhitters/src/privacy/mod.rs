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

//! Differentially private release of heavy-hitter counts.
//!
//! Each client contributes at most `max_words_per_user` words, so adding or removing one
//! client changes the count of any item by at most `max_words_per_user`. The mechanism adds
//! Laplace noise of scale `max_words_per_user / eps` to each count and only releases items whose
//! noised count reaches
//!
//! ```text
//! tau = 1 + (max_words_per_user / eps) * ln(max_words_per_user / (2 * delta))
//! ```
//!
//! The threshold hides items contributed by very few clients, which is where the `delta`
//! part of the guarantee is spent.
//!
//! # Usage
//!
//! ```rust
//! use heavyhitters::common::random::XorShift64;
//! use heavyhitters::iblt::DecodedEntry;
//! use heavyhitters::privacy::LaplaceThreshold;
//! use heavyhitters::privacy::PrivacyParams;
//!
//! let params = PrivacyParams::new(20.0, 0.01).unwrap();
//! let mechanism = LaplaceThreshold::new(params, 8).unwrap();
//! assert!((mechanism.threshold() - 3.3966).abs() < 1e-3);
//!
//! let entries = vec![DecodedEntry::new("common", 500), DecodedEntry::new("rare", 1)];
//! let published = mechanism.publish(&entries, &mut XorShift64::seeded(1));
//! assert!(published.get(b"common").is_some());
//! ```
//!
//! The random source is always passed in. Production code can use any `rand` generator, such
//! as `rand::rng()`; tests use a seeded [`XorShift64`](crate::common::random::XorShift64).

mod laplace;
mod published;
mod threshold;

pub use self::laplace::Laplace;
pub use self::published::PublishedResult;
pub use self::threshold::LaplaceThreshold;
pub use self::threshold::PrivacyParams;
