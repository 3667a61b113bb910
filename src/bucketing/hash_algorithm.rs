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

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Hash function used by the [`Bucketer`](super::Bucketer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Polynomial string hash with base 31 over UTF-16 code units and 32-bit
    /// signed wraparound (the classic Java/JavaScript string hash). Keeps the
    /// buckets users were assigned before this library existed.
    #[default]
    Polynomial31,

    /// murmur3 x86_32, seed 0, over UTF-8 bytes.
    Murmur3,
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Polynomial31 => "polynomial31",
            Self::Murmur3 => "murmur3",
        };
        write!(f, "{label}")
    }
}
