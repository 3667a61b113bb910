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

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::bucketing::{Bucketer, HashAlgorithm};
use crate::cache::{CacheStats, EvaluationCache};
use crate::config::RolloutConfig;
use crate::errors::{Error, Result};
use crate::evaluation::RuleEvaluator;
use crate::models::{
    EvaluationResult, FlagDefinition, FlagMetrics, RequestContext, ValidityWindow,
};
use crate::store::{FlagStore, WritableFlagStore};
use crate::usage::{FeedbackEvent, UsageEvent, UsageRecorderSender};

/// Entry point for evaluating feature flags.
///
/// Wires a [`FlagStore`] to the [`RuleEvaluator`], memoizes results in an
/// [`EvaluationCache`] and optionally reports evaluations, usage and feedback
/// to a [`UsageRecorder`](crate::UsageRecorder).
///
/// The client is `Send + Sync` whenever the store is, so a single instance
/// can be shared behind an `Arc` by every request handler.
#[derive(Debug)]
pub struct FeatureFlagClient<S: FlagStore> {
    store: S,
    evaluator: RuleEvaluator,
    cache: Option<EvaluationCache>,
    usage_recorder: Option<UsageRecorderSender>,
}

impl<S: FlagStore> FeatureFlagClient<S> {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `store` - Where the flag definitions are read from.
    /// * `config` - Hash algorithm and cache settings.
    pub fn new(store: S, config: &RolloutConfig) -> Self {
        let algorithm = config.rollout_bucketer.hash_algorithm;
        if algorithm != HashAlgorithm::default() {
            warn!(
                "Using '{algorithm}' for rollout bucketing, users are bucketed differently than with '{}'",
                HashAlgorithm::default()
            );
        }

        let cache = EvaluationCache::new(&config.cache);
        if cache.is_none() {
            debug!("Evaluation cache disabled");
        }

        Self {
            store,
            evaluator: RuleEvaluator::new(Bucketer::new(algorithm)),
            cache,
            usage_recorder: None,
        }
    }

    /// Reports every evaluation, usage and feedback event to `recorder`.
    pub fn with_usage_recorder(mut self, recorder: UsageRecorderSender) -> Self {
        self.usage_recorder = Some(recorder);
        self
    }

    /// Decides whether `flag_name` is active for `context`.
    ///
    /// Fails with [`Error::FlagNotFound`] for unknown flags and with
    /// [`Error::StoreUnavailable`] when the store cannot be read. A flag that
    /// exists but does not apply is not an error: the returned
    /// [`EvaluationResult`] carries the reason.
    pub fn evaluate(&self, flag_name: &str, context: &RequestContext) -> Result<EvaluationResult> {
        let evaluate = || -> Result<(EvaluationResult, ValidityWindow)> {
            let flag = self.store.get_flag(flag_name)?;
            Ok((self.evaluator.evaluate(&flag, context), flag.validity_window()))
        };
        let result = match &self.cache {
            Some(cache) => cache.get_or_evaluate(flag_name, context, evaluate)?,
            None => evaluate()?.0,
        };

        if let Some(recorder) = &self.usage_recorder {
            recorder.record_evaluation(flag_name, &result);
        }
        Ok(result)
    }

    /// Like [`evaluate`](Self::evaluate), but any error is reported as a
    /// disabled flag.
    pub fn is_enabled(&self, flag_name: &str, context: &RequestContext) -> bool {
        match self.evaluate(flag_name, context) {
            Ok(result) => result.enabled,
            Err(e) => {
                warn!("Evaluating flag '{flag_name}' failed, treating it as disabled: {e}");
                false
            }
        }
    }

    /// Evaluates every flag of the store for `context`.
    pub fn evaluate_all(&self, context: &RequestContext) -> Result<BTreeMap<String, EvaluationResult>> {
        let mut results = BTreeMap::new();
        for flag_name in self.store.get_flag_names()? {
            match self.evaluate(&flag_name, context) {
                Ok(result) => {
                    results.insert(flag_name, result);
                }
                // Removed after the names were listed.
                Err(Error::FlagNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }

    /// Must be called whenever the definition of `flag_name` changed outside
    /// of this client, so that no cached evaluation of the previous
    /// definition is served anymore.
    pub fn on_flag_updated(&self, flag_name: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(flag_name);
        }
    }

    /// Best effort: dropped silently when no recorder is configured.
    pub fn record_usage(&self, event: UsageEvent) {
        if let Some(recorder) = &self.usage_recorder {
            recorder.record_usage(event);
        }
    }

    /// Best effort: dropped silently when no recorder is configured.
    pub fn record_feedback(&self, event: FeedbackEvent) {
        if let Some(recorder) = &self.usage_recorder {
            recorder.record_feedback(event);
        }
    }

    /// `None` when the cache is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(EvaluationCache::stats)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Administrative operations. Each of them invalidates the cached
/// evaluations of the flag it touches.
impl<S: WritableFlagStore> FeatureFlagClient<S> {
    /// Inserts or replaces a flag definition.
    pub fn update_flag(&self, flag: FlagDefinition) -> Result<()> {
        let flag_name = flag.name.clone();
        self.store.put_flag(flag)?;
        self.on_flag_updated(&flag_name);
        Ok(())
    }

    pub fn set_enabled(&self, flag_name: &str, enabled: bool) -> Result<Arc<FlagDefinition>> {
        self.modify_flag(flag_name, &|flag: &mut FlagDefinition| flag.enabled = enabled)
    }

    pub fn set_rollout_percentage(
        &self,
        flag_name: &str,
        rollout_percentage: u32,
    ) -> Result<Arc<FlagDefinition>> {
        self.modify_flag(flag_name, &|flag: &mut FlagDefinition| {
            flag.rollout_percentage = rollout_percentage
        })
    }

    /// Turns the flag off for everybody: disabled and rolled out to 0%, in a
    /// single replacement of the definition.
    pub fn emergency_rollback(&self, flag_name: &str) -> Result<Arc<FlagDefinition>> {
        let flag = self.modify_flag(flag_name, &|flag: &mut FlagDefinition| {
            flag.enabled = false;
            flag.rollout_percentage = 0;
        })?;
        warn!("Emergency rollback of flag '{flag_name}'");
        Ok(flag)
    }

    pub fn remove_flag(&self, flag_name: &str) -> Result<Arc<FlagDefinition>> {
        let removed = self.store.remove_flag(flag_name)?;
        self.on_flag_updated(flag_name);
        Ok(removed)
    }

    pub fn update_metrics(&self, flag_name: &str, metrics: FlagMetrics) -> Result<()> {
        self.store.update_metrics(flag_name, metrics)?;
        self.on_flag_updated(flag_name);
        Ok(())
    }

    fn modify_flag(
        &self,
        flag_name: &str,
        change: &dyn Fn(&mut FlagDefinition),
    ) -> Result<Arc<FlagDefinition>> {
        let flag = self.store.modify_flag(flag_name, change)?;
        self.on_flag_updated(flag_name);
        Ok(flag)
    }
}
