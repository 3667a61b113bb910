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

use std::sync::PoisonError;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The store holds no definition under that name. This is different from
    /// a flag that exists and evaluates to disabled.
    #[error("Flag '{flag_name}' does not exist")]
    FlagNotFound { flag_name: String },

    /// The backing storage could not be read. Callers should fail closed.
    #[error("Flag store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    InvalidDefinition(#[from] DefinitionError),

    #[error(transparent)]
    DeserializationError(#[from] DeserializationError),

    #[error("Feedback rating must be between 1 and 5, got {rating}")]
    InvalidFeedback { rating: u8 },

    #[error("{0}")]
    Other(String),
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_value: PoisonError<T>) -> Self {
        Error::StoreUnavailable("Cannot acquire flag store lock".to_string())
    }
}

/// Reasons for rejecting a flag definition before it reaches the store.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DefinitionError {
    #[error("Flag name cannot be empty")]
    EmptyName,

    #[error("Flag '{flag_name}' has rollout percentage {value}, expected a value in [0, 100]")]
    RolloutPercentageOutOfRange { flag_name: String, value: i64 },

    #[error("Flag '{flag_name}' ends ({end_date}) before it starts ({start_date})")]
    InvalidValidityWindow {
        flag_name: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    },

    #[error("Flag '{flag_name}' is defined more than once")]
    DuplicateFlag { flag_name: String },
}

/// An error that can be returned when deserializing data.
#[derive(Debug, Error)]
#[error("Cannot deserialize string '{string}': {source}")]
pub struct DeserializationError {
    pub string: String,
    pub source: DeserializationErrorKind,
}

/// Additional information for [`DeserializationError`] error
#[derive(Debug, Error)]
pub enum DeserializationErrorKind {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
}
