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

//! Deterministic mapping of identities to rollout buckets.
//!
//! Bucket assignment must be reproducible across processes, versions and
//! implementations in other languages, so the hash functions used here are
//! fixed and never delegate to `std::hash`. Changing the algorithm of a
//! running deployment re-buckets every user.

mod hash_algorithm;

use std::io::Cursor;

use murmur3::murmur3_32;

pub use hash_algorithm::HashAlgorithm;

/// Number of buckets. Buckets are numbered `0..BUCKET_COUNT`.
pub(crate) const BUCKET_COUNT: u32 = 100;

/// Maps an identity string to a stable bucket in `[0, 100)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucketer {
    algorithm: HashAlgorithm,
}

impl Bucketer {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Returns the bucket of `identity`.
    ///
    /// Any string is accepted, including the empty one; the quality of the
    /// identity is the caller's concern.
    pub fn bucket(&self, identity: &str) -> u32 {
        match self.algorithm {
            HashAlgorithm::Polynomial31 => Self::polynomial31_bucket(identity),
            HashAlgorithm::Murmur3 => Self::murmur3_bucket(identity),
        }
    }

    /// `h = h * 31 + unit` over the UTF-16 code units of `identity`, wrapping
    /// at 32 bits (signed), then `|h| mod 100`.
    ///
    /// The absolute value is taken in 64 bits so `i32::MIN` maps to
    /// `2147483648 mod 100 = 48` instead of overflowing.
    fn polynomial31_bucket(identity: &str) -> u32 {
        let hash = identity
            .encode_utf16()
            .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
        (i64::from(hash).unsigned_abs() % u64::from(BUCKET_COUNT)) as u32
    }

    /// murmur3 x86_32 with seed 0 over the UTF-8 bytes, scaled to `[0, 100)`.
    fn murmur3_bucket(identity: &str) -> u32 {
        let hash = murmur3_32(&mut Cursor::new(identity.as_bytes()), 0)
            .expect("Hashing an in-memory buffer cannot fail.");
        let normalized = (f64::from(hash) / f64::from(u32::MAX) * f64::from(BUCKET_COUNT)) as u32;
        // `hash == u32::MAX` would land exactly on 100.
        normalized.min(BUCKET_COUNT - 1)
    }
}
