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

use rand::Rng;
use tracing::debug;

use crate::error::Error;
use crate::heavy_hitters::Aggregate;
use crate::heavy_hitters::ClientStats;
use crate::heavy_hitters::ContributionPolicy;
use crate::heavy_hitters::SketchEncoder;
use crate::heavy_hitters::aggregate_clients;
use crate::heavy_hitters::select_top_k;
use crate::iblt::DecodedEntry;
use crate::iblt::IbltBuilder;
use crate::iblt::IbltConfig;
use crate::iblt::IbltSketch;
use crate::privacy::LaplaceThreshold;
use crate::privacy::PrivacyParams;
use crate::privacy::PublishedResult;

const DEFAULT_MAX_WORDS_PER_USER: usize = 10;
const DEFAULT_MAX_HEAVY_HITTERS: usize = 10;
const DEFAULT_BATCH_SIZE: usize = 1;

/// Builder for a [`HeavyHitters`] computation.
///
/// Privacy parameters have no default and must be set with [`privacy`](Self::privacy).
#[derive(Debug, Clone)]
pub struct HeavyHittersBuilder {
    iblt: IbltBuilder,
    max_words_per_user: usize,
    max_heavy_hitters: usize,
    multi_contribution: bool,
    batch_size: usize,
    policy: ContributionPolicy,
    exhaustive_decode: bool,
    privacy: Option<(f64, f64)>,
}

impl Default for HeavyHittersBuilder {
    fn default() -> Self {
        Self {
            iblt: IbltBuilder::default(),
            max_words_per_user: DEFAULT_MAX_WORDS_PER_USER,
            max_heavy_hitters: DEFAULT_MAX_HEAVY_HITTERS,
            multi_contribution: true,
            batch_size: DEFAULT_BATCH_SIZE,
            policy: ContributionPolicy::default(),
            exhaustive_decode: false,
            privacy: None,
        }
    }
}

impl HeavyHittersBuilder {
    /// Sets the number of sketch cells.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.iblt = self.iblt.capacity(capacity);
        self
    }

    /// Sets the number of cells each word is inserted into.
    pub fn num_hashes(mut self, num_hashes: usize) -> Self {
        self.iblt = self.iblt.num_hashes(num_hashes);
        self
    }

    /// Sets the maximum word length in bytes.
    pub fn max_string_length(mut self, max_string_length: usize) -> Self {
        self.iblt = self.iblt.max_string_length(max_string_length);
        self
    }

    /// Sets the sketch hash seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.iblt = self.iblt.seed(seed);
        self
    }

    /// Sets the maximum number of words one client may contribute.
    pub fn max_words_per_user(mut self, max_words_per_user: usize) -> Self {
        self.max_words_per_user = max_words_per_user;
        self
    }

    /// Sets the maximum number of heavy hitters reported.
    pub fn max_heavy_hitters(mut self, max_heavy_hitters: usize) -> Self {
        self.max_heavy_hitters = max_heavy_hitters;
        self
    }

    /// Sets whether a client repeating a word contributes it more than once.
    pub fn multi_contribution(mut self, multi_contribution: bool) -> Self {
        self.multi_contribution = multi_contribution;
        self
    }

    /// Sets the number of clients encoded per parallel task.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the handling of contributions that exceed the bounds.
    pub fn contribution_policy(mut self, policy: ContributionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets whether decoding continues past `max_heavy_hitters` recovered words.
    ///
    /// By default peeling stops once `max_heavy_hitters` words are recovered, and the heavy
    /// hitters are the largest among those. Exhaustive decoding peels the whole sketch before
    /// ranking.
    pub fn exhaustive_decode(mut self, exhaustive_decode: bool) -> Self {
        self.exhaustive_decode = exhaustive_decode;
        self
    }

    /// Sets the privacy budget of the release.
    pub fn privacy(mut self, eps: f64, delta: f64) -> Self {
        self.privacy = Some((eps, delta));
        self
    }

    /// Builds the computation.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if a sketch
    /// or privacy parameter is invalid, if `max_words_per_user`, `max_heavy_hitters` or
    /// `batch_size` is zero, or if no privacy parameters were set.
    pub fn build(self) -> Result<HeavyHitters, Error> {
        if self.max_heavy_hitters == 0 {
            return Err(Error::config("max_heavy_hitters must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be at least 1"));
        }
        let (eps, delta) = self
            .privacy
            .ok_or_else(|| Error::config("privacy parameters must be set"))?;
        let config = self.iblt.build()?;
        let encoder = SketchEncoder::new(config, self.max_words_per_user, self.multi_contribution)?;
        let mechanism =
            LaplaceThreshold::new(PrivacyParams::new(eps, delta)?, self.max_words_per_user)?;
        Ok(HeavyHitters {
            encoder,
            mechanism,
            max_heavy_hitters: self.max_heavy_hitters,
            batch_size: self.batch_size,
            policy: self.policy,
            exhaustive_decode: self.exhaustive_decode,
        })
    }
}

/// A configured heavy-hitters discovery.
///
/// By default peeling stops after `max_heavy_hitters` words with a positive count, taken in
/// peeling order, and those are then ranked. A word with a larger count that would only be
/// peeled later is missed, so the result can differ from the true top-k. Enable
/// [`exhaustive_decode`](HeavyHittersBuilder::exhaustive_decode) to peel the whole sketch
/// before ranking.
///
/// # Examples
///
/// ```
/// use heavyhitters::common::random::XorShift64;
/// use heavyhitters::heavy_hitters::HeavyHitters;
///
/// let computation = HeavyHitters::builder()
///     .capacity(100)
///     .max_string_length(20)
///     .max_words_per_user(8)
///     .multi_contribution(false)
///     .privacy(20.0, 0.01)
///     .build()
///     .unwrap();
///
/// let clients: Vec<Vec<&str>> = (0..50).map(|_| vec!["hello", "world"]).collect();
/// let discovery = computation.discover(&clients).unwrap();
/// assert_eq!(discovery.heavy_hitters()[0].count(), 50);
///
/// let published = discovery.publish(computation.mechanism(), &mut XorShift64::seeded(5));
/// assert_eq!(published.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct HeavyHitters {
    encoder: SketchEncoder,
    mechanism: LaplaceThreshold,
    max_heavy_hitters: usize,
    batch_size: usize,
    policy: ContributionPolicy,
    exhaustive_decode: bool,
}

impl HeavyHitters {
    /// Returns a builder with default parameters.
    pub fn builder() -> HeavyHittersBuilder {
        HeavyHittersBuilder::default()
    }

    /// Returns the sketch configuration shared by all clients.
    pub fn config(&self) -> &IbltConfig {
        self.encoder.config()
    }

    /// Returns the client encoder.
    pub fn encoder(&self) -> &SketchEncoder {
        &self.encoder
    }

    /// Returns the release mechanism.
    pub fn mechanism(&self) -> &LaplaceThreshold {
        &self.mechanism
    }

    /// Returns the maximum number of heavy hitters reported.
    pub fn max_heavy_hitters(&self) -> usize {
        self.max_heavy_hitters
    }

    /// Encodes and merges all clients.
    pub fn aggregate<C, T>(&self, clients: &[C]) -> Result<Aggregate, Error>
    where
        C: AsRef<[T]> + Sync,
        T: AsRef<[u8]> + Sync,
    {
        aggregate_clients(&self.encoder, clients, self.policy, self.batch_size)
    }

    /// Finds the heavy hitters of the given clients without noise.
    ///
    /// # Errors
    ///
    /// Fails only under [`ContributionPolicy::Abort`] when a client is invalid.
    pub fn discover<C, T>(&self, clients: &[C]) -> Result<Discovery, Error>
    where
        C: AsRef<[T]> + Sync,
        T: AsRef<[u8]> + Sync,
    {
        let aggregate = self.aggregate(clients)?;
        let stats = aggregate.stats();
        Ok(self.discover_in(aggregate.sketch(), stats))
    }

    /// Finds the heavy hitters of sketches encoded elsewhere, such as deserialized client
    /// sketches.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IncompatibleSketch`](crate::error::ErrorKind::IncompatibleSketch)
    /// if a sketch was built with another configuration.
    pub fn discover_sketches(&self, sketches: &[IbltSketch]) -> Result<Discovery, Error> {
        let merged = IbltSketch::merge_all(*self.config(), sketches)?;
        let stats = ClientStats::default();
        Ok(self.discover_in(&merged, stats))
    }

    /// Discovers the heavy hitters and releases them with noise.
    pub fn run<C, T, R>(&self, clients: &[C], rng: &mut R) -> Result<PublishedResult, Error>
    where
        C: AsRef<[T]> + Sync,
        T: AsRef<[u8]> + Sync,
        R: Rng + ?Sized,
    {
        Ok(self.discover(clients)?.publish(&self.mechanism, rng))
    }

    fn discover_in(&self, sketch: &IbltSketch, stats: ClientStats) -> Discovery {
        let limit = if self.exhaustive_decode {
            usize::MAX
        } else {
            self.max_heavy_hitters
        };
        let decoded = sketch.decode_with_limit(limit);
        let num_undecoded_cells = decoded.num_undecoded_cells();
        let heavy_hitters = select_top_k(decoded.into_entries(), self.max_heavy_hitters);
        debug!(
            heavy_hitters = heavy_hitters.len(),
            num_undecoded_cells,
            clients = stats.encoded(),
            "discovered heavy hitters"
        );
        Discovery {
            heavy_hitters,
            num_undecoded_cells,
            stats,
        }
    }
}

/// Un-noised heavy hitters of one computation.
///
/// The counts are exact aggregates and must not leave the trusted aggregator; release them
/// with [`publish`](Self::publish).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    heavy_hitters: Vec<DecodedEntry>,
    num_undecoded_cells: usize,
    stats: ClientStats,
}

impl Discovery {
    /// Returns the heavy hitters, largest count first.
    pub fn heavy_hitters(&self) -> &[DecodedEntry] {
        &self.heavy_hitters
    }

    /// Returns the number of sketch cells left undecoded.
    pub fn num_undecoded_cells(&self) -> usize {
        self.num_undecoded_cells
    }

    /// Returns how the clients were handled.
    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    /// Noises and thresholds the heavy hitters.
    pub fn publish<R: Rng + ?Sized>(
        &self,
        mechanism: &LaplaceThreshold,
        rng: &mut R,
    ) -> PublishedResult {
        mechanism.publish(&self.heavy_hitters, rng)
    }
}
