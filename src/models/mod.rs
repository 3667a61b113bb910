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

//! Application internal models.
//!
//! Flag files and any other input are converted to these models as soon as
//! possible (see `store::serialization`) and all the evaluation runs on them.
//! They can evolve without breaking the exchange format.

mod evaluation_result;
mod flag_definition;
mod request_context;

pub use evaluation_result::{EvaluationResult, Reason};
pub use flag_definition::{
    FlagDefinition, FlagMetrics, RiskLevel, TargetSet, ValidityWindow, WindowPosition,
};
pub use request_context::RequestContext;
