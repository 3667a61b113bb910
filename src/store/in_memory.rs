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

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use super::serialization::FlagsFileJson;
use super::{FlagStore, WritableFlagStore};
use crate::errors::{DefinitionError, DeserializationError, Error, Result};
use crate::models::FlagDefinition;

/// [`FlagStore`] keeping every definition in memory.
///
/// Definitions are shared as `Arc`s: a write swaps the `Arc` stored under the
/// flag name, readers holding the previous one keep a consistent snapshot.
#[derive(Debug, Default)]
pub struct InMemoryFlagStore {
    flags: RwLock<HashMap<String, Arc<FlagDefinition>>>,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from already built definitions, validating each of
    /// them.
    pub fn from_definitions(flags: impl IntoIterator<Item = FlagDefinition>) -> Result<Self> {
        let mut indexed = HashMap::new();
        for flag in flags {
            flag.validate()?;
            if indexed.contains_key(&flag.name) {
                return Err(DefinitionError::DuplicateFlag {
                    flag_name: flag.name,
                }
                .into());
            }
            indexed.insert(flag.name.clone(), Arc::new(flag));
        }
        Ok(Self {
            flags: RwLock::new(indexed),
        })
    }

    /// Creates a store from a JSON flags file.
    ///
    /// # Arguments
    ///
    /// * `filepath` - The file with the flag definitions, `{"flags": [...]}`.
    pub fn from_file(filepath: &std::path::Path) -> Result<Self> {
        let file = std::fs::File::open(filepath).map_err(|_| {
            Error::Other(format!(
                "File '{}' doesn't exist or cannot be read",
                filepath.display()
            ))
        })?;
        let reader = std::io::BufReader::new(file);

        let flags_json: FlagsFileJson = serde_json::from_reader(reader).map_err(|e| {
            Error::DeserializationError(DeserializationError {
                string: format!(
                    "Error deserializing flags from file '{}'",
                    filepath.display()
                ),
                source: e.into(),
            })
        })?;
        let flags = flags_json
            .flags
            .into_iter()
            .map(FlagDefinition::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(
            "Loaded {} flag definitions from '{}'",
            flags.len(),
            filepath.display()
        );
        Self::from_definitions(flags)
    }
}

impl FlagStore for InMemoryFlagStore {
    fn get_flag_names(&self) -> Result<Vec<String>> {
        Ok(self.flags.read()?.keys().cloned().collect())
    }

    fn get_flag(&self, flag_name: &str) -> Result<Arc<FlagDefinition>> {
        self.flags
            .read()?
            .get(flag_name)
            .cloned()
            .ok_or_else(|| Error::FlagNotFound {
                flag_name: flag_name.to_string(),
            })
    }
}

impl WritableFlagStore for InMemoryFlagStore {
    fn put_flag(&self, flag: FlagDefinition) -> Result<()> {
        flag.validate()?;
        self.flags.write()?.insert(flag.name.clone(), Arc::new(flag));
        Ok(())
    }

    fn remove_flag(&self, flag_name: &str) -> Result<Arc<FlagDefinition>> {
        self.flags
            .write()?
            .remove(flag_name)
            .ok_or_else(|| Error::FlagNotFound {
                flag_name: flag_name.to_string(),
            })
    }

    fn modify_flag(
        &self,
        flag_name: &str,
        change: &dyn Fn(&mut FlagDefinition),
    ) -> Result<Arc<FlagDefinition>> {
        let mut flags = self.flags.write()?;
        let current = flags.get(flag_name).ok_or_else(|| Error::FlagNotFound {
            flag_name: flag_name.to_string(),
        })?;

        let mut modified = FlagDefinition::clone(current);
        change(&mut modified);
        if modified.name != flag_name {
            return Err(Error::Other(format!(
                "Flag '{flag_name}' cannot be renamed to '{}'",
                modified.name
            )));
        }
        modified.validate()?;

        let modified = Arc::new(modified);
        flags.insert(flag_name.to_string(), modified.clone());
        Ok(modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlagMetrics;
    use rstest::*;
    use std::path::PathBuf;

    #[fixture]
    // Provides the path to the example flags file
    pub(crate) fn example_flags_path() -> PathBuf {
        let mut mocked_data = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        mocked_data.push("data/flags-example.json");
        mocked_data
    }

    #[rstest]
    fn test_from_file(example_flags_path: PathBuf) {
        let store = InMemoryFlagStore::from_file(&example_flags_path).unwrap();
        let mut names = store.get_flag_names().unwrap();
        names.sort();
        assert_eq!(
            names,
            vec![
                "ai-assistant",
                "billing-v2",
                "cms-migration",
                "legacy-reports",
                "new-dashboard",
                "regional-pricing"
            ]
        );

        let flag = store.get_flag("new-dashboard").unwrap();
        assert!(flag.enabled);
        assert_eq!(flag.rollout_percentage, 50);
        assert!(flag.target_plans.admits(Some("pro")));
        assert!(!flag.target_plans.admits(Some("free")));
    }

    #[test]
    fn test_from_missing_file() {
        let r = InMemoryFlagStore::from_file(std::path::Path::new("nowhere/flags.json"));
        assert!(matches!(r, Err(Error::Other(_))));
    }

    #[test]
    fn test_unknown_flag() {
        let store = InMemoryFlagStore::new();
        let r = store.get_flag("f1");
        assert!(matches!(r, Err(Error::FlagNotFound { flag_name }) if flag_name == "f1"));
    }

    #[test]
    fn test_duplicate_definitions_are_rejected() {
        let r = InMemoryFlagStore::from_definitions([
            FlagDefinition::new("f1"),
            FlagDefinition::new("f1").with_enabled(false),
        ]);
        assert!(matches!(
            r,
            Err(Error::InvalidDefinition(DefinitionError::DuplicateFlag { .. }))
        ));
    }

    #[test]
    fn test_put_replaces_whole_definition() {
        let store = InMemoryFlagStore::new();
        store
            .put_flag(FlagDefinition::new("f1").with_target_roles(["ADMIN"]))
            .unwrap();
        let before = store.get_flag("f1").unwrap();

        store
            .put_flag(FlagDefinition::new("f1").with_rollout_percentage(10))
            .unwrap();
        let after = store.get_flag("f1").unwrap();

        // Readers holding the old snapshot are not affected.
        assert!(!before.target_roles.is_empty());
        assert_eq!(before.rollout_percentage, 100);
        assert!(after.target_roles.is_empty());
        assert_eq!(after.rollout_percentage, 10);
    }

    #[test]
    fn test_put_rejects_invalid_definition() {
        let store = InMemoryFlagStore::new();
        let r = store.put_flag(FlagDefinition::new("f1").with_rollout_percentage(150));
        assert!(matches!(r, Err(Error::InvalidDefinition(_))));
        assert!(store.get_flag("f1").is_err());
    }

    #[test]
    fn test_modify_flag() {
        let store = InMemoryFlagStore::from_definitions([FlagDefinition::new("f1")]).unwrap();
        let modified = store
            .modify_flag("f1", &|flag: &mut FlagDefinition| flag.rollout_percentage = 25)
            .unwrap();
        assert_eq!(modified.rollout_percentage, 25);
        assert_eq!(store.get_flag("f1").unwrap().rollout_percentage, 25);

        // An invalid change leaves the stored flag untouched.
        let r = store.modify_flag("f1", &|flag: &mut FlagDefinition| flag.rollout_percentage = 101);
        assert!(r.is_err());
        assert_eq!(store.get_flag("f1").unwrap().rollout_percentage, 25);

        let r = store.modify_flag("f1", &|flag: &mut FlagDefinition| flag.name = "f2".into());
        assert!(matches!(r, Err(Error::Other(_))));
    }

    #[test]
    fn test_update_metrics() {
        let store = InMemoryFlagStore::from_definitions([FlagDefinition::new("f1")]).unwrap();
        let metrics = FlagMetrics {
            usage_count: 12,
            adoption_rate: 40.0,
            user_feedback_score: Some(4.5),
            ..Default::default()
        };
        store.update_metrics("f1", metrics.clone()).unwrap();
        assert_eq!(store.get_flag("f1").unwrap().metrics, metrics);
    }

    #[test]
    fn test_remove_flag() {
        let store = InMemoryFlagStore::from_definitions([FlagDefinition::new("f1")]).unwrap();
        assert_eq!(store.remove_flag("f1").unwrap().name, "f1");
        assert!(matches!(
            store.remove_flag("f1"),
            Err(Error::FlagNotFound { .. })
        ));
    }

    #[test]
    fn test_concurrent_readers_see_whole_definitions() {
        let store = Arc::new(
            InMemoryFlagStore::from_definitions([FlagDefinition::new("f1")
                .with_enabled(true)
                .with_rollout_percentage(100)])
            .unwrap(),
        );
        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    // Both fields always change together.
                    let flag = if i % 2 == 0 {
                        FlagDefinition::new("f1").with_enabled(false).with_rollout_percentage(0)
                    } else {
                        FlagDefinition::new("f1").with_enabled(true).with_rollout_percentage(100)
                    };
                    store.put_flag(flag).unwrap();
                }
            })
        };
        for _ in 0..500 {
            let flag = store.get_flag("f1").unwrap();
            assert_eq!(flag.enabled, flag.rollout_percentage == 100);
        }
        writer.join().unwrap();
    }
}
