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

use super::{FlagDefinition, RiskLevel};

/// Why an evaluation ended the way it did. Exactly one reason is reported,
/// the first check that decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    FlagDisabledGlobally,
    NotYetAvailable,
    Expired,
    PlanNotSupported,
    RoleNotSupported,
    CompanyNotTargeted,
    RegionNotSupported,
    OutsideRolloutBucket,
    EnabledForContext,
}

impl Reason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FlagDisabledGlobally => "FLAG_DISABLED_GLOBALLY",
            Self::NotYetAvailable => "NOT_YET_AVAILABLE",
            Self::Expired => "EXPIRED",
            Self::PlanNotSupported => "PLAN_NOT_SUPPORTED",
            Self::RoleNotSupported => "ROLE_NOT_SUPPORTED",
            Self::CompanyNotTargeted => "COMPANY_NOT_TARGETED",
            Self::RegionNotSupported => "REGION_NOT_SUPPORTED",
            Self::OutsideRolloutBucket => "OUTSIDE_ROLLOUT_BUCKET",
            Self::EnabledForContext => "ENABLED_FOR_CONTEXT",
        }
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Outcome of evaluating one flag for one [`RequestContext`](super::RequestContext).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub enabled: bool,
    pub reason: Reason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_impact: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

impl EvaluationResult {
    pub(crate) fn enabled(flag: &FlagDefinition) -> Self {
        Self::from_flag(flag, true, Reason::EnabledForContext)
    }

    pub(crate) fn disabled(flag: &FlagDefinition, reason: Reason) -> Self {
        Self::from_flag(flag, false, reason)
    }

    fn from_flag(flag: &FlagDefinition, enabled: bool, reason: Reason) -> Self {
        Self {
            enabled,
            reason,
            performance_impact: flag.metrics.performance_impact,
            risk_level: flag.metrics.risk_level,
        }
    }
}
