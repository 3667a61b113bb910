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

use std::{env, path::PathBuf, time::Duration};

use dotenvy::dotenv;
use feature_rollout::{
    start_usage_recording, FeatureFlagClient, InMemoryFlagStore, RequestContext, RolloutConfig,
    UsageClientHttp, UsageEvent,
};
use std::error::Error;

fn main() -> std::result::Result<(), Box<dyn Error>> {
    dotenv().ok();
    let flags_file = env::var("FLAGS_FILE").expect("FLAGS_FILE should be set.");
    let config = match env::var("ROLLOUT_CONFIG") {
        Ok(path) => RolloutConfig::from_file(&PathBuf::from(path))?,
        Err(_) => RolloutConfig::default(),
    };

    let store = InMemoryFlagStore::from_file(&PathBuf::from(flags_file))?;
    let mut client = FeatureFlagClient::new(store, &config);

    // Reports go nowhere unless an endpoint is configured.
    let recorder = match env::var("USAGE_ENDPOINT") {
        Ok(endpoint) => {
            let usage_client = UsageClientHttp::new(&endpoint, env::var("USAGE_TOKEN").ok())?;
            Some(start_usage_recording(Duration::from_secs(10), usage_client))
        }
        Err(_) => None,
    };
    if let Some(recorder) = &recorder {
        client = client.with_usage_recorder(recorder.sender());
    }

    let contexts = [
        RequestContext::new("user-1", "acme")
            .with_plan("enterprise")
            .with_role("ADMIN")
            .with_region("eu"),
        RequestContext::new("alice", "globex").with_plan("free"),
    ];

    for context in &contexts {
        println!("Context {}:", context.rollout_identity());
        for (flag_name, result) in client.evaluate_all(context)? {
            println!("  {flag_name:<20} enabled={:<5} reason={}", result.enabled, result.reason);
        }
    }

    client.record_usage(UsageEvent::new("new-dashboard", "user-1", "acme", "opened"));

    let flag = client.emergency_rollback("new-dashboard")?;
    println!("Rolled back '{}'", flag.name);
    let result = client.evaluate("new-dashboard", &contexts[0])?;
    println!("new-dashboard is now enabled={} reason={}", result.enabled, result.reason);

    if let Some(stats) = client.cache_stats() {
        println!(
            "Cache: {} hits, {} misses, {} entries",
            stats.hits, stats.misses, stats.entries
        );
    }
    Ok(())
}
