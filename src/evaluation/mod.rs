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

use log::trace;

use crate::bucketing::Bucketer;
use crate::models::{EvaluationResult, FlagDefinition, Reason, RequestContext, WindowPosition};

/// Decides whether a flag is active for a request context.
///
/// Stateless: it holds only the [`Bucketer`], so a single instance can be
/// shared by any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator {
    bucketer: Bucketer,
}

impl RuleEvaluator {
    pub fn new(bucketer: Bucketer) -> Self {
        Self { bucketer }
    }

    /// Runs the checks in order and reports the first one that fails:
    /// global switch, validity window, plan, role, company, region and
    /// finally the rollout bucket. Cheap checks come first so the hash is
    /// only computed for contexts that passed everything else.
    pub fn evaluate(&self, flag: &FlagDefinition, context: &RequestContext) -> EvaluationResult {
        let result = match self.first_failing_check(flag, context) {
            Some(reason) => EvaluationResult::disabled(flag, reason),
            None => EvaluationResult::enabled(flag),
        };
        trace!(
            "Flag '{}' evaluated for '{}-{}': {}",
            flag.name,
            context.user_id,
            context.company_id,
            result.reason
        );
        result
    }

    fn first_failing_check(&self, flag: &FlagDefinition, context: &RequestContext) -> Option<Reason> {
        if !flag.enabled {
            return Some(Reason::FlagDisabledGlobally);
        }

        match flag.validity_window().position(context.timestamp) {
            WindowPosition::Before => return Some(Reason::NotYetAvailable),
            WindowPosition::After => return Some(Reason::Expired),
            WindowPosition::Within => {}
        }

        if !flag.target_plans.admits(context.plan.as_deref()) {
            return Some(Reason::PlanNotSupported);
        }
        if !flag.target_roles.admits(context.role.as_deref()) {
            return Some(Reason::RoleNotSupported);
        }
        if !flag.target_companies.admits(Some(&context.company_id)) {
            return Some(Reason::CompanyNotTargeted);
        }
        if !flag.target_regions.admits(context.region.as_deref()) {
            return Some(Reason::RegionNotSupported);
        }

        if !self.should_rollout(flag.rollout_percentage, context) {
            return Some(Reason::OutsideRolloutBucket);
        }

        None
    }

    fn should_rollout(&self, rollout_percentage: u32, context: &RequestContext) -> bool {
        match rollout_percentage {
            // Every bucket is >= 0, decide without hashing.
            0 => false,
            p if p >= 100 => true,
            p => self.bucketer.bucket(&context.rollout_identity()) < p,
        }
    }
}
