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

//! Feature flag targeting and progressive rollout evaluation.
//!
//! A [`FeatureFlagClient`] decides, for a named flag and a [`RequestContext`],
//! whether the feature is active and why. Decisions are deterministic: the
//! same flag definition and the same context always produce the same
//! [`EvaluationResult`], including the percentage rollout, which relies on a
//! pinned hash algorithm (see [`HashAlgorithm`]).
//!
//! ```no_run
//! use feature_rollout::{
//!     FeatureFlagClient, InMemoryFlagStore, RequestContext, RolloutConfig,
//! };
//!
//! # fn main() -> feature_rollout::Result<()> {
//! let store = InMemoryFlagStore::from_file(std::path::Path::new("flags.json"))?;
//! let client = FeatureFlagClient::new(store, &RolloutConfig::default());
//!
//! let context = RequestContext::new("user-1", "acme")
//!     .with_plan("enterprise")
//!     .with_role("ADMIN");
//! let result = client.evaluate("new-dashboard", &context)?;
//! println!("enabled={} reason={}", result.enabled, result.reason);
//! # Ok(())
//! # }
//! ```

mod bucketing;
mod cache;
mod client;
mod config;
mod errors;
mod evaluation;
mod models;
mod store;
mod usage;
mod utils;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use bucketing::{Bucketer, HashAlgorithm};
pub use cache::{CacheStats, EvaluationCache};
pub use client::FeatureFlagClient;
pub use config::{BucketerConfig, CacheConfig, RolloutConfig};
pub use errors::{DefinitionError, DeserializationError, DeserializationErrorKind, Error, Result};
pub use evaluation::RuleEvaluator;
pub use models::{
    EvaluationResult, FlagDefinition, FlagMetrics, Reason, RequestContext, RiskLevel, TargetSet,
    ValidityWindow, WindowPosition,
};
pub use store::{FlagStore, InMemoryFlagStore, WritableFlagStore};
pub use usage::{
    start_usage_recording, EvaluationTallyJson, FeedbackEvent, FeedbackScoreJson, UsageClient,
    UsageClientHttp, UsageError, UsageEvent, UsageRecordJson, UsageRecorder, UsageRecorderSender,
    UsageReportJson, UsageResult,
};
pub use utils::ThreadStatus;

#[cfg(test)]
mod tests;
