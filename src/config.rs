// (C) Copyright IBM Corp. 2025.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;

use serde::Deserialize;

use crate::bucketing::HashAlgorithm;
use crate::errors::{DeserializationError, Error, Result};

/// Options recognized by the library.
///
/// Read from JSON with camelCase keys, every key being optional:
///
/// ```json
/// {
///   "rolloutBucketer": { "hashAlgorithm": "polynomial31" },
///   "cache": { "ttlSeconds": 60, "maxEntries": 10000 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RolloutConfig {
    pub rollout_bucketer: BucketerConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BucketerConfig {
    /// Changing this on a live deployment re-buckets every user.
    pub hash_algorithm: HashAlgorithm,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Safety-net expiry for cached evaluations. `0` disables the cache.
    pub ttl_seconds: u64,
    /// Least recently used entries are evicted past this size. `0` disables
    /// the cache.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl_seconds > 0 && self.max_entries > 0
    }
}

impl RolloutConfig {
    /// Parses a configuration file. Missing keys take their default value.
    pub fn from_file(filepath: &std::path::Path) -> Result<Self> {
        let file = std::fs::File::open(filepath).map_err(|_| {
            Error::Other(format!(
                "File '{}' doesn't exist or cannot be read",
                filepath.display()
            ))
        })?;
        let reader = std::io::BufReader::new(file);

        serde_json::from_reader(reader).map_err(|e| {
            Error::DeserializationError(DeserializationError {
                string: format!(
                    "Error deserializing rollout configuration from file '{}'",
                    filepath.display()
                ),
                source: e.into(),
            })
        })
    }
}
