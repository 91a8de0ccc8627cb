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

//! Invertible Bloom Lookup Table (IBLT) over bounded-length byte strings.
//!
//! An IBLT is a fixed array of cells. Each item is added to `num_hashes` cells; a cell stores
//! the sum of the keys mapped to it, their count and a checksum. Sketches built with the same
//! [`IbltConfig`] merge by field-wise addition. As long as the number of distinct items stays
//! well below the capacity, all items and their exact counts can be recovered by peeling: find
//! a cell holding a single item, extract it, subtract it from its other cells, and repeat.
//!
//! Key sums and checksums are elements of GF(2^61 - 1). A cell holding `c` copies of one key
//! is reduced to the key by multiplying its key sum by the inverse of `c`, so items with high
//! multiplicity decode as reliably as singletons.
//!
//! # Usage
//!
//! ```rust
//! use heavyhitters::iblt::IbltConfig;
//! use heavyhitters::iblt::IbltSketch;
//!
//! let config = IbltConfig::builder()
//!     .capacity(100)
//!     .num_hashes(3)
//!     .max_string_length(20)
//!     .build()
//!     .unwrap();
//!
//! let mut sketch = IbltSketch::new(config);
//! sketch.insert("hello").unwrap();
//! sketch.insert_with_count("world", 4).unwrap();
//!
//! let decoded = sketch.decode();
//! assert_eq!(decoded.count_of(b"world"), Some(4));
//! ```
//!
//! # Capacity
//!
//! With three hashes, peeling succeeds with high probability while the number of distinct
//! items is below roughly `0.8 * capacity`. Beyond that the decoder returns the subset it can
//! peel; it never fails.

mod builder;
mod config;
mod decode;
mod field;
mod key;
mod serialization;
mod sketch;

pub use self::builder::IbltBuilder;
pub use self::config::IbltConfig;
pub use self::decode::Decoded;
pub use self::decode::DecodedEntry;
pub use self::sketch::Cell;
pub use self::sketch::IbltSketch;
