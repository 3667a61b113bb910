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

use reqwest::blocking::Client;
use url::Url;

use super::{UsageClient, UsageError, UsageReportJson, UsageResult};

const USER_AGENT: &str = concat!("feature-rollout/", env!("CARGO_PKG_VERSION"));

/// [`UsageClient`] posting every report as JSON to an HTTP endpoint.
#[derive(Debug)]
pub struct UsageClientHttp {
    endpoint: Url,
    bearer_token: Option<String>,
    client: Client,
}

impl UsageClientHttp {
    /// # Arguments
    ///
    /// * `endpoint` - Full URL the reports are posted to.
    /// * `bearer_token` - Sent in the `Authorization` header when present.
    pub fn new(endpoint: &str, bearer_token: Option<String>) -> UsageResult<Self> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| UsageError::UrlParseError(endpoint.to_string()))?;
        Ok(Self {
            endpoint,
            bearer_token,
            client: Client::new(),
        })
    }
}

impl UsageClient for UsageClientHttp {
    fn push_usage_report(&self, report: &UsageReportJson) -> UsageResult<()> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("User-Agent", USER_AGENT)
            .json(report);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(UsageError::DataNotAccepted(status.to_string()))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use crate::usage::{FeedbackEvent, FeedbackScoreJson};
    use chrono::TimeZone;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    /// Tests the good-case and asserts that the HTTP request sent to the server is well-formed:
    /// - Correct endpoint
    /// - Correct content-type
    /// - Correct authorization
    /// - Correct json serialization
    #[test]
    fn test_well_formed_post_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/events/v1/usage")
                .header("content-type", "application/json")
                .header("Authorization", "Bearer mocked_token")
                .json_body(json!(
                    {
                    "usages": [],
                    "feedback": [{
                        "flag_name": "f1",
                        "user_id": "u1",
                        "company_id": "c1",
                        "rating": 4,
                        "timestamp": "2024-01-01T00:00:00Z"
                    }],
                    "feedback_scores": [{
                        "flag_name": "f1",
                        "rating_count": 1,
                        "user_feedback_score": 4.0
                    }],
                    "evaluations": []
                    }
                ));
            then.status(200);
        });

        let client = UsageClientHttp::new(
            &server.url("/events/v1/usage"),
            Some("mocked_token".to_string()),
        )
        .unwrap();

        let mut feedback = FeedbackEvent::new("f1", "u1", "c1", 4).unwrap();
        feedback.timestamp = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let report = UsageReportJson {
            feedback: vec![feedback],
            feedback_scores: vec![FeedbackScoreJson::new("f1".into(), 1, 4)],
            ..Default::default()
        };

        let result = client.push_usage_report(&report);

        assert!(result.is_ok(), "{:?}", result);
        mock.assert();
    }

    /// In case of the server returning a bad status, `push_usage_report` should fail.
    #[test]
    fn test_error_handling() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(400);
        });

        let client = UsageClientHttp::new(&server.url("/events/v1/usage"), None).unwrap();
        let result = client.push_usage_report(&UsageReportJson::default());

        assert!(matches!(result, Err(UsageError::DataNotAccepted(_))));
        mock.assert();
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = UsageClientHttp::new("not a url", None);
        assert!(matches!(result, Err(UsageError::UrlParseError(_))));
    }
}
