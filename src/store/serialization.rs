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

//! Exchange format of flag files and admin payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::errors::DefinitionError;
use crate::models::{FlagDefinition, FlagMetrics, TargetSet};

#[derive(Debug, Deserialize)]
pub(crate) struct FlagsFileJson {
    pub flags: Vec<FlagDefinitionJson>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub(crate) struct FlagDefinitionJson {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    // Signed, so out of range values are reported as such instead of as a
    // parse failure.
    pub rollout_percentage: i64,
    #[serde(default)]
    pub target_plans: TargetSet,
    #[serde(default)]
    pub target_roles: TargetSet,
    #[serde(default)]
    pub target_companies: TargetSet,
    #[serde(default)]
    pub target_regions: TargetSet,
    #[serde(default)]
    pub metrics: FlagMetrics,
}

impl TryFrom<FlagDefinitionJson> for FlagDefinition {
    type Error = DefinitionError;

    fn try_from(value: FlagDefinitionJson) -> std::result::Result<Self, Self::Error> {
        let rollout_percentage = u32::try_from(value.rollout_percentage)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| DefinitionError::RolloutPercentageOutOfRange {
                flag_name: value.name.clone(),
                value: value.rollout_percentage,
            })?;

        let flag = FlagDefinition {
            name: value.name,
            description: value.description,
            enabled: value.enabled,
            start_date: value.start_date,
            end_date: value.end_date,
            rollout_percentage,
            target_plans: value.target_plans,
            target_roles: value.target_roles,
            target_companies: value.target_companies,
            target_regions: value.target_regions,
            metrics: value.metrics,
        };
        flag.validate()?;
        Ok(flag)
    }
}
