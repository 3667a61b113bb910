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

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use feature_rollout::UsageReportJson;

pub fn example_flags_path() -> PathBuf {
    let mut mocked_data = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    mocked_data.push("data/flags-example.json");
    mocked_data
}

/// Writes `content` to a fresh file under the target directory and returns
/// its path.
pub fn write_temp_file(name: &str, content: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_TARGET_TMPDIR"));
    path.push(format!("{}-{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

/// Collects reports until the sending side is gone.
pub fn collect_reports(receiver: &Receiver<UsageReportJson>) -> Vec<UsageReportJson> {
    let mut reports = Vec::new();
    while let Ok(report) = receiver.recv_timeout(Duration::from_secs(5)) {
        reports.push(report);
    }
    reports
}
