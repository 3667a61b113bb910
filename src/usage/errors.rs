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

use thiserror::Error;

pub type UsageResult<T> = std::result::Result<T, UsageError>;

/// Failures while transmitting usage reports. They are logged by the
/// recorder and never reach evaluation callers.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Usage report not accepted by the server: {0}")]
    DataNotAccepted(String),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error("Cannot parse usage endpoint '{0}'")]
    UrlParseError(String),
}
