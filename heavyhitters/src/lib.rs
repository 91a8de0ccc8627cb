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

//! Differentially private heavy-hitters discovery.
//!
//! Many clients each hold a small multiset of words. Every client encodes its words into an
//! Invertible Bloom Lookup Table ([`iblt`]), the tables are merged by field-wise addition, and
//! the merged table is peeled to recover the most frequent words with their counts
//! ([`heavy_hitters`]). Before release the counts pass through a Laplace mechanism with a
//! threshold ([`privacy`]), so that the result is (eps, delta)-differentially private with
//! respect to any single client.
//!
//! # Usage
//!
//! ```rust
//! use heavyhitters::common::random::XorShift64;
//! use heavyhitters::heavy_hitters::HeavyHitters;
//!
//! let computation = HeavyHitters::builder()
//!     .capacity(100)
//!     .max_string_length(20)
//!     .max_words_per_user(8)
//!     .max_heavy_hitters(10)
//!     .multi_contribution(false)
//!     .privacy(20.0, 0.01)
//!     .build()
//!     .unwrap();
//!
//! let mut clients = Vec::new();
//! for i in 0..100 {
//!     let mut words = vec!["the", "of"];
//!     if i % 4 == 0 {
//!         words.push("rust");
//!     }
//!     clients.push(words);
//! }
//!
//! let published = computation.run(&clients, &mut XorShift64::seeded(42)).unwrap();
//! let words = published.to_word_counts();
//! assert!(words.contains_key("the") && words.contains_key("rust"));
//! ```

pub mod common;
pub mod error;
pub mod heavy_hitters;
pub mod iblt;
pub mod privacy;

mod codec;
mod hash;
