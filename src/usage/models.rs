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
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Something a user did with a feature, reported by the application.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent {
    pub flag_name: String,
    pub user_id: String,
    pub company_id: String,
    pub action: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(
        flag_name: impl Into<String>,
        user_id: impl Into<String>,
        company_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            flag_name: flag_name.into(),
            user_id: user_id.into(),
            company_id: company_id.into(),
            action: action.into(),
            metadata: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A rating (1 to 5) a user gave to a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub flag_name: String,
    pub user_id: String,
    pub company_id: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEvent {
    pub fn new(
        flag_name: impl Into<String>,
        user_id: impl Into<String>,
        company_id: impl Into<String>,
        rating: u8,
    ) -> Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidFeedback { rating });
        }
        Ok(Self {
            flag_name: flag_name.into(),
            user_id: user_id.into(),
            company_id: company_id.into(),
            rating,
            comment: None,
            timestamp: Utc::now(),
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EvaluationEvent {
    pub flag_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RecorderEvent {
    Usage(UsageEvent),
    Feedback(FeedbackEvent),
    Evaluation(EvaluationEvent),
}

/// Usage events with the same flag, user, company and action, merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecordJson {
    pub flag_name: String,
    pub user_id: String,
    pub company_id: String,
    pub action: String,
    // how often this was reported
    pub count: u32,
    // when this was last reported
    pub last_seen: DateTime<Utc>,
    // metadata of the last event
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Evaluation outcomes of one flag since the previous report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTallyJson {
    pub flag_name: String,
    pub enabled_count: u64,
    pub disabled_count: u64,
    /// Percentage of evaluations that came out enabled.
    pub adoption_rate: f64,
}

impl EvaluationTallyJson {
    pub(crate) fn new(flag_name: String, enabled_count: u64, disabled_count: u64) -> Self {
        let total = enabled_count + disabled_count;
        let adoption_rate = if total == 0 {
            0.0
        } else {
            enabled_count as f64 / total as f64 * 100.0
        };
        Self {
            flag_name,
            enabled_count,
            disabled_count,
            adoption_rate,
        }
    }
}

/// Feedback ratings of one flag since the previous report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackScoreJson {
    pub flag_name: String,
    pub rating_count: u64,
    /// Mean rating, from 1 to 5. Feeds `FlagMetrics::user_feedback_score`.
    pub user_feedback_score: f64,
}

impl FeedbackScoreJson {
    pub(crate) fn new(flag_name: String, rating_count: u64, rating_sum: u64) -> Self {
        let user_feedback_score = if rating_count == 0 {
            0.0
        } else {
            rating_sum as f64 / rating_count as f64
        };
        Self {
            flag_name,
            rating_count,
            user_feedback_score,
        }
    }
}

/// Represents usage data in a structure for data exchange used for sending
/// to the analytics collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageReportJson {
    pub usages: Vec<UsageRecordJson>,
    pub feedback: Vec<FeedbackEvent>,
    pub feedback_scores: Vec<FeedbackScoreJson>,
    pub evaluations: Vec<EvaluationTallyJson>,
}

impl UsageReportJson {
    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
            && self.feedback.is_empty()
            && self.feedback_scores.is_empty()
            && self.evaluations.is_empty()
    }
}
