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

//! Heavy-hitters discovery across many clients.
//!
//! Each client encodes its words into an [`IbltSketch`](crate::iblt::IbltSketch) locally with
//! a [`SketchEncoder`]. The aggregator merges the client sketches, peels the merged sketch,
//! keeps the most frequent words with [`select_top_k`] and releases them through the
//! [`LaplaceThreshold`](crate::privacy::LaplaceThreshold) mechanism. [`HeavyHitters`] runs
//! the whole pipeline.
//!
//! # Usage
//!
//! ```rust
//! use heavyhitters::common::random::XorShift64;
//! use heavyhitters::heavy_hitters::HeavyHitters;
//!
//! let computation = HeavyHitters::builder()
//!     .capacity(50)
//!     .num_hashes(3)
//!     .max_heavy_hitters(10)
//!     .max_words_per_user(8)
//!     .multi_contribution(false)
//!     .privacy(20.0, 0.01)
//!     .build()
//!     .unwrap();
//!
//! let clients = vec![vec!["a", "a", "b"], vec!["a", "c"]];
//! let discovery = computation.discover(&clients).unwrap();
//! let counts: Vec<(&[u8], i64)> = discovery
//!     .heavy_hitters()
//!     .iter()
//!     .map(|entry| (entry.item(), entry.count()))
//!     .collect();
//! assert_eq!(counts, vec![(&b"a"[..], 2), (&b"b"[..], 1), (&b"c"[..], 1)]);
//!
//! let _published = computation.run(&clients, &mut XorShift64::seeded(1)).unwrap();
//! ```

mod aggregate;
mod computation;
mod contribution;
mod select;

pub use self::aggregate::Aggregate;
pub use self::aggregate::ClientStats;
pub use self::aggregate::aggregate_clients;
pub use self::computation::Discovery;
pub use self::computation::HeavyHitters;
pub use self::computation::HeavyHittersBuilder;
pub use self::contribution::ContributionPolicy;
pub use self::contribution::SketchEncoder;
pub use self::select::select_top_k;
