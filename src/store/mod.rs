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

mod in_memory;
mod serialization;

use std::sync::Arc;

use crate::errors::Result;
use crate::models::{FlagDefinition, FlagMetrics};

pub use in_memory::InMemoryFlagStore;

/// Read access to flag definitions.
///
/// Implementations must hand out whole definitions: a reader never observes
/// a partially updated flag.
pub trait FlagStore: Send + Sync {
    /// Returns the list of flag names.
    ///
    /// The names can be used in [`get_flag`](FlagStore::get_flag).
    fn get_flag_names(&self) -> Result<Vec<String>>;

    /// Returns the current definition of a flag.
    ///
    /// Fails with [`Error::FlagNotFound`](crate::Error::FlagNotFound) when
    /// there is no such flag and with
    /// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable) when the
    /// backing storage cannot be read.
    fn get_flag(&self, flag_name: &str) -> Result<Arc<FlagDefinition>>;
}

/// Administrative writes. Every write replaces a definition as a whole and
/// validates it first.
pub trait WritableFlagStore: FlagStore {
    /// Inserts or replaces a flag. Invalid definitions are rejected with
    /// [`Error::InvalidDefinition`](crate::Error::InvalidDefinition).
    fn put_flag(&self, flag: FlagDefinition) -> Result<()>;

    /// Removes a flag, returning the definition it had.
    fn remove_flag(&self, flag_name: &str) -> Result<Arc<FlagDefinition>>;

    /// Applies `change` to a copy of the current definition and stores the
    /// copy, atomically with respect to other writers.
    fn modify_flag(
        &self,
        flag_name: &str,
        change: &dyn Fn(&mut FlagDefinition),
    ) -> Result<Arc<FlagDefinition>>;

    /// Replaces the metrics of a flag, leaving the rest untouched.
    fn update_metrics(&self, flag_name: &str, metrics: FlagMetrics) -> Result<()> {
        self.modify_flag(flag_name, &|flag: &mut FlagDefinition| flag.metrics = metrics.clone())
            .map(|_| ())
    }
}
