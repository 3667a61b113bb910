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

//! Fire-and-forget telemetry: usage events, feedback ratings and evaluation
//! counts.
//!
//! Events are queued on a channel and aggregated by a background thread that
//! periodically hands a [`UsageReportJson`] to a [`UsageClient`]. Nothing in
//! here can fail or slow down an evaluation.

mod client;
mod client_http;
mod errors;
mod models;
mod recorder;

pub use client::UsageClient;
pub use client_http::UsageClientHttp;
pub use errors::{UsageError, UsageResult};
pub use models::{
    EvaluationTallyJson, FeedbackEvent, FeedbackScoreJson, UsageEvent, UsageRecordJson,
    UsageReportJson,
};
pub use recorder::{start_usage_recording, UsageRecorder, UsageRecorderSender};
