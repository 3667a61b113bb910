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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use log::warn;

/// One monotonically increasing counter per flag name.
///
/// Flags never bumped are at generation 0. Counters are only created on the
/// first bump, so reads never take the write lock.
#[derive(Debug, Default)]
pub(crate) struct GenerationCounters {
    counters: RwLock<HashMap<String, AtomicU64>>,
}

impl GenerationCounters {
    /// Current generation of `flag_name`, or `None` if the counters cannot
    /// be read. Callers must bypass the cache in that case.
    pub(crate) fn current(&self, flag_name: &str) -> Option<u64> {
        match self.counters.read() {
            Ok(counters) => Some(
                counters
                    .get(flag_name)
                    .map_or(0, |counter| counter.load(Ordering::SeqCst)),
            ),
            Err(_) => {
                warn!("Generation counters lock poisoned, bypassing evaluation cache");
                None
            }
        }
    }

    /// Increments the generation of `flag_name` and returns the new value.
    pub(crate) fn bump(&self, flag_name: &str) -> Option<u64> {
        {
            let counters = self.counters.read().ok()?;
            if let Some(counter) = counters.get(flag_name) {
                return Some(counter.fetch_add(1, Ordering::SeqCst) + 1);
            }
        }
        let mut counters = self.counters.write().ok()?;
        let counter = counters.entry(flag_name.to_string()).or_default();
        Some(counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
