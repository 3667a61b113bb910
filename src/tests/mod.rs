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


use crate::client::FeatureFlagClient;
use crate::config::RolloutConfig;
use crate::store::InMemoryFlagStore;
use rstest::fixture;

#[fixture]
fn example_flags_path() -> PathBuf {
    let mut mocked_data = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    mocked_data.push("data/flags-example.json");
    mocked_data
}

#[fixture]
fn client_example(example_flags_path: PathBuf) -> FeatureFlagClient<InMemoryFlagStore> {
    let store = InMemoryFlagStore::from_file(&example_flags_path).unwrap();
    FeatureFlagClient::new(store, &RolloutConfig::default())
}
