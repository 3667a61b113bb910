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

//! Helpers for tests of this crate and of applications using it.
//! Available with the `test_utils` feature.

use std::sync::mpsc;
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::models::FlagDefinition;
use crate::store::FlagStore;
use crate::usage::{UsageClient, UsageReportJson, UsageResult};

/// [`UsageClient`] forwarding every pushed report to a channel.
#[derive(Debug)]
pub struct RecordingUsageClient {
    report_sender: mpsc::Sender<UsageReportJson>,
}

impl RecordingUsageClient {
    /// Returns the client and the receiving end of its reports.
    pub fn new() -> (Self, mpsc::Receiver<UsageReportJson>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                report_sender: sender,
            },
            receiver,
        )
    }
}

impl UsageClient for RecordingUsageClient {
    fn push_usage_report(&self, report: &UsageReportJson) -> UsageResult<()> {
        // The receiver may be gone already, reports are then discarded.
        let _ = self.report_sender.send(report.clone());
        Ok(())
    }
}

/// [`FlagStore`] whose backing storage cannot be reached.
#[derive(Debug, Default)]
pub struct UnavailableFlagStore;

impl FlagStore for UnavailableFlagStore {
    fn get_flag_names(&self) -> Result<Vec<String>> {
        Err(Error::StoreUnavailable("connection refused".to_string()))
    }

    fn get_flag(&self, _flag_name: &str) -> Result<Arc<FlagDefinition>> {
        Err(Error::StoreUnavailable("connection refused".to_string()))
    }
}
