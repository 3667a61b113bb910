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

use chrono::{DateTime, Utc};

/// Everything the evaluator knows about the caller of one evaluation.
///
/// Built fresh for every request. Optional dimensions that are `None` never
/// satisfy a flag restricted on that dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: String,
    pub company_id: String,
    pub role: Option<String>,
    pub plan: Option<String>,
    pub region: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for the given tenant identity, evaluated now.
    pub fn new(user_id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            company_id: company_id.into(),
            role: None,
            plan: None,
            region: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The string hashed for percentage rollout: `"{user_id}-{company_id}"`.
    pub fn rollout_identity(&self) -> String {
        format!("{}-{}", self.user_id, self.company_id)
    }
}
