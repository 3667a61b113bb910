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

//! Memoization of evaluation results.
//!
//! The cache is an optimization only: every lookup that cannot be answered
//! with certainty falls back to evaluating again. Entries are keyed by the
//! flag's *generation*, so bumping the generation on a flag update makes all
//! previous entries for that flag unreachable at once. The TTL only guards
//! against updates that were never announced.
//!
//! Keys only hold the day of the context timestamp. Each entry remembers the
//! flag's validity window and on which side of it the result was computed,
//! and is only served to contexts on that same side.

mod generations;

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use lru::LruCache;

use crate::config::CacheConfig;
use crate::errors::Result;
use crate::models::{EvaluationResult, RequestContext, ValidityWindow, WindowPosition};
use generations::GenerationCounters;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    flag_name: String,
    generation: u64,
    user_id: String,
    company_id: String,
    role: Option<String>,
    plan: Option<String>,
    region: Option<String>,
    day: NaiveDate,
}

impl CacheKey {
    fn new(flag_name: &str, generation: u64, context: &RequestContext) -> Self {
        Self {
            flag_name: flag_name.to_string(),
            generation,
            user_id: context.user_id.clone(),
            company_id: context.company_id.clone(),
            role: context.role.clone(),
            plan: context.plan.clone(),
            region: context.region.clone(),
            day: context.timestamp.date_naive(),
        }
    }
}

#[derive(Debug)]
struct CachedEvaluation {
    result: EvaluationResult,
    window: ValidityWindow,
    position: WindowPosition,
    expires_at: Instant,
}

impl CachedEvaluation {
    fn is_valid_for(&self, timestamp: DateTime<Utc>) -> bool {
        self.expires_at > Instant::now() && self.window.position(timestamp) == self.position
    }
}

/// Counters describing how the cache has been used so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Bounded, generation-aware cache of [`EvaluationResult`]s.
#[derive(Debug)]
pub struct EvaluationCache {
    entries: Mutex<LruCache<CacheKey, CachedEvaluation>>,
    generations: GenerationCounters,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl EvaluationCache {
    /// Returns `None` when `config` disables caching (a TTL or a size of 0).
    pub fn new(config: &CacheConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        let capacity = NonZeroUsize::new(config.max_entries)?;
        Some(Self::with_ttl(capacity, config.ttl()))
    }

    pub fn with_ttl(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            generations: GenerationCounters::default(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Returns the cached result for `flag_name` and `context`, or runs
    /// `evaluate` and caches what it returns.
    ///
    /// `evaluate` returns the result together with the validity window of the
    /// flag it was computed from. Errors it returns are propagated and never
    /// cached.
    pub fn get_or_evaluate<F>(
        &self,
        flag_name: &str,
        context: &RequestContext,
        evaluate: F,
    ) -> Result<EvaluationResult>
    where
        F: FnOnce() -> Result<(EvaluationResult, ValidityWindow)>,
    {
        // The generation must be read before evaluating: an update landing
        // while `evaluate` runs leaves the result under the old generation.
        let Some(generation) = self.generations.current(flag_name) else {
            return evaluate().map(|(result, _)| result);
        };
        let key = CacheKey::new(flag_name, generation, context);

        if let Some(result) = self.lookup(&key, context.timestamp) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(result);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let (result, window) = evaluate()?;
        let cached = CachedEvaluation {
            result: result.clone(),
            window,
            position: window.position(context.timestamp),
            expires_at: Instant::now() + self.ttl,
        };
        self.insert(key, cached);
        Ok(result)
    }

    /// Makes every cached result of `flag_name` unreachable.
    pub fn invalidate(&self, flag_name: &str) {
        match self.generations.bump(flag_name) {
            Some(generation) => {
                debug!("Flag '{flag_name}' invalidated, cache generation is now {generation}")
            }
            None => warn!(
                "Could not bump cache generation of flag '{flag_name}', cache is bypassed"
            ),
        }
    }

    /// Drops every entry.
    pub fn clear(&self) {
        if let Some(mut entries) = self.lock_entries() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.lock_entries().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let (entries, capacity) = self
            .lock_entries()
            .map_or((0, 0), |entries| (entries.len(), entries.cap().get()));
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
            capacity,
        }
    }

    fn lookup(&self, key: &CacheKey, timestamp: DateTime<Utc>) -> Option<EvaluationResult> {
        let mut entries = self.lock_entries()?;
        let stale = match entries.get(key) {
            Some(cached) if cached.is_valid_for(timestamp) => return Some(cached.result.clone()),
            Some(_) => true,
            None => false,
        };
        if stale {
            entries.pop(key);
        }
        None
    }

    fn insert(&self, key: CacheKey, cached: CachedEvaluation) {
        let Some(mut entries) = self.lock_entries() else {
            return;
        };
        // Same-key races are last-writer-wins on an identical value.
        if let Some((evicted, _)) = entries.push(key.clone(), cached) {
            if evicted != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn lock_entries(&self) -> Option<MutexGuard<'_, LruCache<CacheKey, CachedEvaluation>>> {
        match self.entries.lock() {
            Ok(entries) => Some(entries),
            Err(_) => {
                warn!("Evaluation cache lock poisoned, bypassing evaluation cache");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::models::{FlagDefinition, Reason};
    use std::cell::Cell;

    fn cache(capacity: usize, ttl: Duration) -> EvaluationCache {
        EvaluationCache::with_ttl(NonZeroUsize::new(capacity).unwrap(), ttl)
    }

    fn enabled() -> EvaluationResult {
        EvaluationResult::enabled(&FlagDefinition::new("f1"))
    }

    fn disabled() -> EvaluationResult {
        EvaluationResult::disabled(&FlagDefinition::new("f1"), Reason::FlagDisabledGlobally)
    }

    fn no_window(result: EvaluationResult) -> (EvaluationResult, ValidityWindow) {
        (result, ValidityWindow::default())
    }

    #[test]
    fn test_second_lookup_is_served_from_cache() {
        let cache = cache(10, Duration::from_secs(60));
        let context = RequestContext::new("u1", "c1");
        let calls = Cell::new(0);
        let evaluate = || {
            calls.set(calls.get() + 1);
            Ok(no_window(enabled()))
        };

        assert_eq!(cache.get_or_evaluate("f1", &context, evaluate).unwrap(), enabled());
        assert_eq!(cache.get_or_evaluate("f1", &context, evaluate).unwrap(), enabled());
        assert_eq!(calls.get(), 1);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn test_contexts_do_not_share_entries() {
        let cache = cache(10, Duration::from_secs(60));
        let base = RequestContext::new("u1", "c1");
        cache.get_or_evaluate("f1", &base, || Ok(no_window(enabled()))).unwrap();

        for other in [
            RequestContext::new("u2", "c1"),
            RequestContext::new("u1", "c2"),
            base.clone().with_plan("pro"),
            base.clone().with_role("ADMIN"),
            base.clone().with_region("eu"),
        ] {
            let r = cache.get_or_evaluate("f1", &other, || Ok(no_window(disabled()))).unwrap();
            assert_eq!(r, disabled());
        }
        // Another flag with the same context is a different entry too.
        let r = cache.get_or_evaluate("f2", &base, || Ok(no_window(disabled()))).unwrap();
        assert_eq!(r, disabled());
    }

    #[test]
    fn test_same_day_shares_entry_other_day_does_not() {
        use chrono::TimeZone;
        let cache = cache(10, Duration::from_secs(60));
        let morning = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let evening = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        let next_day = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let context = RequestContext::new("u1", "c1").with_timestamp(morning);

        cache.get_or_evaluate("f1", &context, || Ok(no_window(enabled()))).unwrap();
        let r = cache
            .get_or_evaluate("f1", &context.clone().with_timestamp(evening), || Ok(no_window(disabled())))
            .unwrap();
        assert_eq!(r, enabled());
        let r = cache
            .get_or_evaluate("f1", &context.with_timestamp(next_day), || Ok(no_window(disabled())))
            .unwrap();
        assert_eq!(r, disabled());
    }

    #[test]
    fn test_invalidate_orphans_previous_entries() {
        let cache = cache(10, Duration::from_secs(60));
        let context = RequestContext::new("u1", "c1");
        cache.get_or_evaluate("f1", &context, || Ok(no_window(enabled()))).unwrap();
        cache.get_or_evaluate("f2", &context, || Ok(no_window(enabled()))).unwrap();

        cache.invalidate("f1");

        let r = cache.get_or_evaluate("f1", &context, || Ok(no_window(disabled()))).unwrap();
        assert_eq!(r, disabled());
        // Other flags keep their entries.
        let r = cache.get_or_evaluate("f2", &context, || Ok(no_window(disabled()))).unwrap();
        assert_eq!(r, enabled());
    }

    #[test]
    fn test_update_during_evaluation_is_not_served_afterwards() {
        let cache = cache(10, Duration::from_secs(60));
        let context = RequestContext::new("u1", "c1");
        // The flag gets updated while the (stale) evaluation is running.
        let r = cache
            .get_or_evaluate("f1", &context, || {
                cache.invalidate("f1");
                Ok(no_window(enabled()))
            })
            .unwrap();
        assert_eq!(r, enabled());

        let r = cache.get_or_evaluate("f1", &context, || Ok(no_window(disabled()))).unwrap();
        assert_eq!(r, disabled());
    }

    #[test]
    fn test_expired_entries_are_recomputed() {
        let cache = cache(10, Duration::from_millis(20));
        let context = RequestContext::new("u1", "c1");
        cache.get_or_evaluate("f1", &context, || Ok(no_window(enabled()))).unwrap();
        std::thread::sleep(Duration::from_millis(40));
        let r = cache.get_or_evaluate("f1", &context, || Ok(no_window(disabled()))).unwrap();
        assert_eq!(r, disabled());
    }

    #[test]
    fn test_entries_are_not_served_across_window_boundaries() {
        use chrono::TimeZone;
        let cache = cache(10, Duration::from_secs(60));
        let start = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let end = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap();
        let window = ValidityWindow {
            start_date: Some(start),
            end_date: Some(end),
        };
        let expired = EvaluationResult::disabled(&FlagDefinition::new("f1"), Reason::Expired);
        let not_yet = EvaluationResult::disabled(&FlagDefinition::new("f1"), Reason::NotYetAvailable);
        let context = |hour: u32| {
            RequestContext::new("u1", "c1")
                .with_timestamp(chrono::Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap())
        };

        let r = cache.get_or_evaluate("f1", &context(8), || Ok((not_yet.clone(), window))).unwrap();
        assert_eq!(r, not_yet);
        let r = cache.get_or_evaluate("f1", &context(12), || Ok((enabled(), window))).unwrap();
        assert_eq!(r, enabled());
        // Same day, same side of the window: served from the cache.
        let r = cache.get_or_evaluate("f1", &context(16), || Ok((disabled(), window))).unwrap();
        assert_eq!(r, enabled());
        let r = cache.get_or_evaluate("f1", &context(18), || Ok((expired.clone(), window))).unwrap();
        assert_eq!(r, expired);
    }

    #[test]
    fn test_cache_reevaluates_once_flag_expired() {
        let cache = cache(10, Duration::from_secs(60));
        let end = chrono::Utc::now() + chrono::Duration::milliseconds(100);
        let flag = FlagDefinition::new("f1").with_validity_window(None, Some(end));
        let evaluator = crate::evaluation::RuleEvaluator::default();
        let evaluate = |context: &RequestContext| -> Result<(EvaluationResult, ValidityWindow)> {
            let result = evaluator.evaluate(&flag, context);
            Ok((result, flag.validity_window()))
        };

        let context = RequestContext::new("u1", "c1");
        let r = cache.get_or_evaluate("f1", &context, || evaluate(&context)).unwrap();
        assert_eq!(r.reason, Reason::EnabledForContext);

        std::thread::sleep(Duration::from_millis(200));
        let context = RequestContext::new("u1", "c1");
        let r = cache.get_or_evaluate("f1", &context, || evaluate(&context)).unwrap();
        assert_eq!(r.reason, Reason::Expired);
    }

    #[test]
    fn test_zero_size_or_ttl_disables_cache() {
        let config = |ttl_seconds, max_entries| CacheConfig {
            ttl_seconds,
            max_entries,
        };
        assert!(EvaluationCache::new(&config(60, 10)).is_some());
        assert!(EvaluationCache::new(&config(0, 10)).is_none());
        assert!(EvaluationCache::new(&config(60, 0)).is_none());
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = cache(2, Duration::from_secs(60));
        let a = RequestContext::new("a", "c");
        let b = RequestContext::new("b", "c");
        let c = RequestContext::new("c", "c");

        cache.get_or_evaluate("f1", &a, || Ok(no_window(enabled()))).unwrap();
        cache.get_or_evaluate("f1", &b, || Ok(no_window(enabled()))).unwrap();
        // Touch `a`, so `b` becomes the oldest accessed entry.
        cache.get_or_evaluate("f1", &a, || Ok(no_window(disabled()))).unwrap();
        cache.get_or_evaluate("f1", &c, || Ok(no_window(enabled()))).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.capacity, 2);

        let r = cache.get_or_evaluate("f1", &a, || Ok(no_window(disabled()))).unwrap();
        assert_eq!(r, enabled());
        let r = cache.get_or_evaluate("f1", &b, || Ok(no_window(disabled()))).unwrap();
        assert_eq!(r, disabled());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = cache(10, Duration::from_secs(60));
        let context = RequestContext::new("u1", "c1");
        let r = cache.get_or_evaluate("f1", &context, || {
            Err(Error::FlagNotFound {
                flag_name: "f1".into(),
            })
        });
        assert!(matches!(r, Err(Error::FlagNotFound { .. })));
        assert!(cache.is_empty());

        let r = cache.get_or_evaluate("f1", &context, || Ok(no_window(enabled()))).unwrap();
        assert_eq!(r, enabled());
    }

    #[test]
    fn test_clear() {
        let cache = cache(10, Duration::from_secs(60));
        cache
            .get_or_evaluate("f1", &RequestContext::new("u1", "c1"), || Ok(no_window(enabled())))
            .unwrap();
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
