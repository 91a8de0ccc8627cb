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

use std::collections::HashSet;

use crate::error::Error;
use crate::iblt::IbltConfig;
use crate::iblt::IbltSketch;

/// What to do with a client contribution that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContributionPolicy {
    /// Cut overlong items to `max_string_length` bytes and keep the first
    /// `max_words_per_user` words.
    #[default]
    Truncate,
    /// Drop the client's contribution.
    Reject,
    /// Fail the whole aggregation with the validation error.
    Abort,
}

/// Outcome of encoding one contribution under a [`ContributionPolicy`].
#[derive(Debug)]
pub(crate) enum Encoded {
    Accepted(IbltSketch),
    Truncated(IbltSketch),
    Rejected(Error),
}

/// Encodes one client's words into a sketch.
///
/// With `multi_contribution` disabled every distinct word is inserted once, however often the
/// client repeats it. With it enabled every occurrence is inserted.
///
/// # Examples
///
/// ```
/// use heavyhitters::heavy_hitters::SketchEncoder;
/// use heavyhitters::iblt::IbltConfig;
///
/// let config = IbltConfig::builder().capacity(50).build().unwrap();
/// let encoder = SketchEncoder::new(config, 8, false).unwrap();
///
/// let once = encoder.encode(&["cat"]).unwrap();
/// let thrice = encoder.encode(&["cat", "cat", "cat"]).unwrap();
/// assert_eq!(once, thrice);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SketchEncoder {
    config: IbltConfig,
    max_words_per_user: usize,
    multi_contribution: bool,
}

impl SketchEncoder {
    /// Creates an encoder.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if
    /// `max_words_per_user` is zero.
    pub fn new(
        config: IbltConfig,
        max_words_per_user: usize,
        multi_contribution: bool,
    ) -> Result<Self, Error> {
        if max_words_per_user == 0 {
            return Err(Error::config("max_words_per_user must be at least 1"));
        }
        Ok(Self {
            config,
            max_words_per_user,
            multi_contribution,
        })
    }

    /// Returns the hash configuration.
    pub fn config(&self) -> &IbltConfig {
        &self.config
    }

    /// Returns the maximum number of words per contribution.
    pub fn max_words_per_user(&self) -> usize {
        self.max_words_per_user
    }

    /// Returns true if repeated words are counted each time.
    pub fn multi_contribution(&self) -> bool {
        self.multi_contribution
    }

    /// Checks a contribution against the per-user and per-item bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::TooManyItems`](crate::error::ErrorKind::TooManyItems) if there are
    /// more than `max_words_per_user` words, or
    /// [`ErrorKind::ItemTooLong`](crate::error::ErrorKind::ItemTooLong) if a word is longer than
    /// `max_string_length`.
    pub fn validate<T: AsRef<[u8]>>(&self, words: &[T]) -> Result<(), Error> {
        if words.len() > self.max_words_per_user {
            return Err(Error::too_many_items(words.len(), self.max_words_per_user));
        }
        let max_string_length = self.config.max_string_length();
        if let Some((position, word)) = words
            .iter()
            .map(AsRef::as_ref)
            .enumerate()
            .find(|(_, word)| word.len() > max_string_length)
        {
            return Err(Error::item_too_long(word.len(), max_string_length)
                .with_context("position", position));
        }
        Ok(())
    }

    /// Encodes a valid contribution.
    ///
    /// # Errors
    ///
    /// Fails as [`validate`](Self::validate) does.
    pub fn encode<T: AsRef<[u8]>>(&self, words: &[T]) -> Result<IbltSketch, Error> {
        self.validate(words)?;
        Ok(self.encode_valid(words))
    }

    /// Encodes a contribution after cutting it to the configured bounds.
    ///
    /// Overlong words are cut to `max_string_length` bytes. When `multi_contribution` is
    /// disabled the words are deduplicated before the first `max_words_per_user` are kept.
    /// Returns the sketch and whether anything was cut.
    pub fn encode_truncated<T: AsRef<[u8]>>(&self, words: &[T]) -> (IbltSketch, bool) {
        let max_string_length = self.config.max_string_length();
        let mut truncated = false;
        let items: Vec<&[u8]> = words
            .iter()
            .map(|word| {
                let word = word.as_ref();
                if word.len() > max_string_length {
                    truncated = true;
                    &word[..max_string_length]
                } else {
                    word
                }
            })
            .collect();
        let mut items = self.clip(items);
        if items.len() > self.max_words_per_user {
            items.truncate(self.max_words_per_user);
            truncated = true;
        }
        (self.encode_items(items), truncated)
    }

    pub(crate) fn encode_with_policy<T: AsRef<[u8]>>(
        &self,
        words: &[T],
        policy: ContributionPolicy,
    ) -> Result<Encoded, Error> {
        match self.validate(words) {
            Ok(()) => Ok(Encoded::Accepted(self.encode_valid(words))),
            Err(err) => match policy {
                ContributionPolicy::Truncate => {
                    let (sketch, _) = self.encode_truncated(words);
                    Ok(Encoded::Truncated(sketch))
                }
                ContributionPolicy::Reject => Ok(Encoded::Rejected(err)),
                ContributionPolicy::Abort => Err(err),
            },
        }
    }

    /// Removes repeats unless every occurrence counts. Keeps first occurrences in order.
    fn clip<'a>(&self, items: Vec<&'a [u8]>) -> Vec<&'a [u8]> {
        if self.multi_contribution {
            return items;
        }
        let mut seen = HashSet::with_capacity(items.len());
        items.into_iter().filter(|item| seen.insert(*item)).collect()
    }

    fn encode_valid<T: AsRef<[u8]>>(&self, words: &[T]) -> IbltSketch {
        let items: Vec<&[u8]> = words.iter().map(AsRef::as_ref).collect();
        self.encode_items(self.clip(items))
    }

    /// Inserts items already known to fit `max_string_length`.
    fn encode_items(&self, items: Vec<&[u8]>) -> IbltSketch {
        let mut sketch = IbltSketch::new(self.config);
        for item in items {
            sketch.insert_unchecked(item, 1);
        }
        sketch
    }
}
