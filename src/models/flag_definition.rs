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

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DefinitionError;

/// Set of accepted values for one targeting dimension (plan, role, company
/// or region).
///
/// An empty set means "no restriction on this dimension", never "target
/// nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSet(BTreeSet<String>);

impl TargetSet {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    /// `true` when the dimension is unrestricted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns whether a context value satisfies this dimension.
    ///
    /// A missing value only passes an unrestricted dimension: absence never
    /// satisfies a restriction.
    pub fn admits(&self, value: Option<&str>) -> bool {
        if self.0.is_empty() {
            return true;
        }
        value.is_some_and(|v| self.0.contains(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TargetSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Aggregate counters maintained by the usage pipeline. The evaluator only
/// echoes `performance_impact` and `risk_level` back to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagMetrics {
    pub usage_count: u64,
    pub error_rate: f64,
    pub adoption_rate: f64,
    /// Mean feedback rating, from 1 to 5.
    pub user_feedback_score: Option<f64>,
    pub performance_impact: Option<f64>,
    pub risk_level: Option<RiskLevel>,
}

/// Where an instant lies relative to a [`ValidityWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowPosition {
    Before,
    Within,
    After,
}

/// The period during which a flag can be active. Both ends are inclusive and
/// optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    pub fn position(&self, at: DateTime<Utc>) -> WindowPosition {
        if self.start_date.is_some_and(|start| at < start) {
            WindowPosition::Before
        } else if self.end_date.is_some_and(|end| at > end) {
            WindowPosition::After
        } else {
            WindowPosition::Within
        }
    }
}

/// A feature flag as held by the flag store.
///
/// Instances are validated on construction through [`FlagDefinition::validate`]
/// by every store write, and replaced as a whole on update.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagDefinition {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub rollout_percentage: u32,
    pub target_plans: TargetSet,
    pub target_roles: TargetSet,
    pub target_companies: TargetSet,
    pub target_regions: TargetSet,
    pub metrics: FlagMetrics,
}

impl FlagDefinition {
    /// Creates an enabled flag, fully rolled out, without any targeting.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            enabled: true,
            start_date: None,
            end_date: None,
            rollout_percentage: 100,
            target_plans: TargetSet::default(),
            target_roles: TargetSet::default(),
            target_companies: TargetSet::default(),
            target_regions: TargetSet::default(),
            metrics: FlagMetrics::default(),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_rollout_percentage(mut self, rollout_percentage: u32) -> Self {
        self.rollout_percentage = rollout_percentage;
        self
    }

    pub fn with_validity_window(
        mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    pub fn with_target_plans<I: IntoIterator<Item = S>, S: Into<String>>(mut self, plans: I) -> Self {
        self.target_plans = TargetSet::new(plans);
        self
    }

    pub fn with_target_roles<I: IntoIterator<Item = S>, S: Into<String>>(mut self, roles: I) -> Self {
        self.target_roles = TargetSet::new(roles);
        self
    }

    pub fn with_target_companies<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        companies: I,
    ) -> Self {
        self.target_companies = TargetSet::new(companies);
        self
    }

    pub fn with_target_regions<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        regions: I,
    ) -> Self {
        self.target_regions = TargetSet::new(regions);
        self
    }

    pub fn with_metrics(mut self, metrics: FlagMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn validity_window(&self) -> ValidityWindow {
        ValidityWindow {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Checks the invariants every stored definition must hold.
    pub fn validate(&self) -> std::result::Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if self.rollout_percentage > 100 {
            return Err(DefinitionError::RolloutPercentageOutOfRange {
                flag_name: self.name.clone(),
                value: i64::from(self.rollout_percentage),
            });
        }
        if let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) {
            if end_date < start_date {
                return Err(DefinitionError::InvalidValidityWindow {
                    flag_name: self.name.clone(),
                    start_date,
                    end_date,
                });
            }
        }
        Ok(())
    }
}
