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

use rayon::prelude::*;
use tracing::warn;

use crate::error::Error;
use crate::heavy_hitters::ContributionPolicy;
use crate::heavy_hitters::SketchEncoder;
use crate::heavy_hitters::contribution::Encoded;
use crate::iblt::IbltSketch;

/// Counts of how client contributions were handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    encoded: usize,
    truncated: usize,
    rejected: usize,
}

impl ClientStats {
    /// Returns the number of clients whose words entered the aggregate, truncated ones
    /// included.
    pub fn encoded(&self) -> usize {
        self.encoded
    }

    /// Returns the number of clients cut down to the contribution bounds.
    pub fn truncated(&self) -> usize {
        self.truncated
    }

    /// Returns the number of clients dropped.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    fn combine(self, other: ClientStats) -> ClientStats {
        ClientStats {
            encoded: self.encoded + other.encoded,
            truncated: self.truncated + other.truncated,
            rejected: self.rejected + other.rejected,
        }
    }
}

/// The merged sketch of a set of clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    sketch: IbltSketch,
    stats: ClientStats,
}

impl Aggregate {
    /// Returns the merged sketch.
    pub fn sketch(&self) -> &IbltSketch {
        &self.sketch
    }

    /// Returns how the clients were handled.
    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    /// Consumes the aggregate and returns the merged sketch.
    pub fn into_sketch(self) -> IbltSketch {
        self.sketch
    }

    fn empty(encoder: &SketchEncoder) -> Self {
        Self {
            sketch: IbltSketch::new(*encoder.config()),
            stats: ClientStats::default(),
        }
    }

    fn combine(mut self, other: Aggregate) -> Result<Aggregate, Error> {
        self.sketch.merge(&other.sketch)?;
        self.stats = self.stats.combine(other.stats);
        Ok(self)
    }
}

/// Encodes every client and merges the results.
///
/// Clients are split into chunks of `batch_size`. Each chunk is one parallel task that
/// encodes its clients one by one and folds them into a partial sketch; partial sketches are
/// then merged pairwise. Only the read-only encoder is shared between tasks.
///
/// # Errors
///
/// Returns the validation error of the first failing client under
/// [`ContributionPolicy::Abort`].
pub fn aggregate_clients<C, T>(
    encoder: &SketchEncoder,
    clients: &[C],
    policy: ContributionPolicy,
    batch_size: usize,
) -> Result<Aggregate, Error>
where
    C: AsRef<[T]> + Sync,
    T: AsRef<[u8]> + Sync,
{
    let batch_size = batch_size.max(1);
    clients
        .par_chunks(batch_size)
        .enumerate()
        .map(|(batch, chunk)| encode_batch(encoder, batch * batch_size, chunk, policy))
        .try_reduce(|| Aggregate::empty(encoder), Aggregate::combine)
}

fn encode_batch<C, T>(
    encoder: &SketchEncoder,
    first_client: usize,
    clients: &[C],
    policy: ContributionPolicy,
) -> Result<Aggregate, Error>
where
    C: AsRef<[T]>,
    T: AsRef<[u8]>,
{
    let mut partial = Aggregate::empty(encoder);
    for (offset, words) in clients.iter().enumerate() {
        let client = first_client + offset;
        match encoder.encode_with_policy(words.as_ref(), policy)? {
            Encoded::Accepted(sketch) => {
                partial.sketch.merge(&sketch)?;
                partial.stats.encoded += 1;
            }
            Encoded::Truncated(sketch) => {
                warn!(client, "truncated client contribution to the configured bounds");
                partial.sketch.merge(&sketch)?;
                partial.stats.encoded += 1;
                partial.stats.truncated += 1;
            }
            Encoded::Rejected(err) => {
                warn!(client, error = %err, "rejected client contribution");
                partial.stats.rejected += 1;
            }
        }
    }
    Ok(partial)
}
