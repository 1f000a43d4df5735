// dbc-diff is a tool for comparing CAN database files
// Copyright (C) 2025  Peoples Grocers LLC
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// To purchase a license under different terms contact admin@peoplesgrocers.com
// To request changes, report bugs, or give user feedback contact
// marxism@peoplesgrocers.com
//

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::Catalog;
use crate::collection::FileCollection;
use crate::diff::{diff_catalogs, reconcile, Action, CatalogDiff, EntityChange, VersionInfo};
use crate::error::DiffError;
use crate::reader::CatalogReader;

/// Source of parsed catalogs.
pub trait CatalogLoader {
    fn load(&self, path: &Path) -> Result<Catalog, DiffError>;
}

/// Reads DBC files from disk. Reader warnings are logged, not returned.
#[derive(Debug, Default, Clone, Copy)]
pub struct DbcLoader;

impl CatalogLoader for DbcLoader {
    fn load(&self, path: &Path) -> Result<Catalog, DiffError> {
        let result = CatalogReader::new(path).read()?;
        for diagnostic in result.diagnostics.diagnostics() {
            tracing::warn!("{}", diagnostic.to_string().trim_end());
        }
        Ok(result.catalog)
    }
}

/// Change record for one catalog file.
///
/// Serializes as `{"action": <a>, <a>: {messages}, "new_version": ..,
/// "old_version": .., "same_version": ..}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileChange {
    pub action: Action,
    pub messages: BTreeMap<String, EntityChange>,
    pub versions: VersionInfo,
}

impl FileChange {
    fn new(action: Action, diff: CatalogDiff) -> Self {
        Self {
            action,
            messages: diff.messages,
            versions: diff.versions,
        }
    }
}

impl Serialize for FileChange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("action", &self.action)?;
        map.serialize_entry(self.action.as_str(), &self.messages)?;
        if let Some(version) = &self.versions.new_version {
            map.serialize_entry("new_version", version)?;
        }
        if let Some(version) = &self.versions.old_version {
            map.serialize_entry("old_version", version)?;
        }
        map.serialize_entry("same_version", &self.versions.same_version)?;
        map.end()
    }
}

/// The whole comparison, keyed by file name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Report {
    pub files: BTreeMap<String, FileChange>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Compares every file in `old` with its namesake in `new`.
///
/// Files whose catalogs are identical (same messages, same version) are
/// left out unless `include_unchanged` is set.
pub fn diff_file_sets<L: CatalogLoader>(
    old: &FileCollection,
    new: &FileCollection,
    include_unchanged: bool,
    loader: &L,
) -> Result<Report, DiffError> {
    let mut files = BTreeMap::new();
    let keys = reconcile(old.files(), new.files());

    for name in keys.added {
        tracing::debug!(file = %name, "comparing added file");
        let new_catalog = loader.load(&new.files()[name])?;
        let diff = diff_catalogs(None, Some(&new_catalog))?;
        files.insert(name.clone(), FileChange::new(Action::Added, diff));
    }

    for name in keys.removed {
        tracing::debug!(file = %name, "comparing removed file");
        let old_catalog = loader.load(&old.files()[name])?;
        let diff = diff_catalogs(Some(&old_catalog), None)?;
        files.insert(name.clone(), FileChange::new(Action::Removed, diff));
    }

    for name in keys.common {
        tracing::debug!(file = %name, "comparing file");
        let old_catalog = loader.load(&old.files()[name])?;
        let new_catalog = loader.load(&new.files()[name])?;
        let diff = diff_catalogs(Some(&old_catalog), Some(&new_catalog))?;

        if !diff.is_empty() || !diff.versions.same_version {
            files.insert(name.clone(), FileChange::new(Action::Changed, diff));
        } else if include_unchanged {
            files.insert(name.clone(), FileChange::new(Action::Unchanged, diff));
        } else {
            tracing::debug!(file = %name, "no differences");
        }
    }

    Ok(Report { files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Message, Signal};
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Serves catalogs from memory, keyed by path.
    #[derive(Default)]
    struct MemoryLoader {
        catalogs: HashMap<PathBuf, Catalog>,
    }

    impl MemoryLoader {
        fn with(mut self, path: &str, catalog: Catalog) -> Self {
            self.catalogs.insert(PathBuf::from(path), catalog);
            self
        }
    }

    impl CatalogLoader for MemoryLoader {
        fn load(&self, path: &Path) -> Result<Catalog, DiffError> {
            self.catalogs
                .get(path)
                .cloned()
                .ok_or_else(|| DiffError::SourceNotFound {
                    path: path.to_path_buf(),
                })
        }
    }

    fn collection(entries: &[(&str, &str)]) -> FileCollection {
        let mut collection = FileCollection::new();
        for (name, path) in entries {
            collection.insert(name.to_string(), PathBuf::from(path));
        }
        collection
    }

    fn catalog(version: &str, messages: &[(&str, u32, &[&str])]) -> Catalog {
        Catalog {
            version: Some(version.to_string()),
            messages: messages
                .iter()
                .map(|(name, frame_id, signals)| {
                    let message = Message {
                        frame_id: *frame_id,
                        length: 8,
                        signals: signals
                            .iter()
                            .map(|s| {
                                (
                                    s.to_string(),
                                    Signal {
                                        length: 8,
                                        ..Signal::default()
                                    },
                                )
                            })
                            .collect(),
                        ..Message::default()
                    };
                    (name.to_string(), message)
                })
                .collect(),
        }
    }

    #[test]
    fn test_unchanged_files_are_omitted_by_default() -> Result<(), DiffError> {
        let same = catalog("1", &[("M1", 1, &["S1"])]);
        let loader = MemoryLoader::default()
            .with("old/body.dbc", same.clone())
            .with("new/body.dbc", same);
        let old = collection(&[("body.dbc", "old/body.dbc")]);
        let new = collection(&[("body.dbc", "new/body.dbc")]);

        assert!(diff_file_sets(&old, &new, false, &loader)?.is_empty());

        let report = diff_file_sets(&old, &new, true, &loader)?;
        assert_eq!(
            serde_json::to_value(&report)?,
            json!({
                "body.dbc": {
                    "action": "unchanged",
                    "unchanged": {},
                    "new_version": "1",
                    "old_version": "1",
                    "same_version": true
                }
            })
        );
        Ok(())
    }

    #[test]
    fn test_version_bump_alone_is_a_change() -> Result<(), DiffError> {
        let loader = MemoryLoader::default()
            .with("old.dbc", catalog("1", &[("M1", 1, &[])]))
            .with("new.dbc", catalog("2", &[("M1", 1, &[])]));
        let old = collection(&[("body.dbc", "old.dbc")]);
        let new = collection(&[("body.dbc", "new.dbc")]);

        let report = diff_file_sets(&old, &new, false, &loader)?;
        let change = &report.files["body.dbc"];
        assert_eq!(change.action, Action::Changed);
        assert!(change.messages.is_empty());
        assert!(!change.versions.same_version);
        Ok(())
    }

    #[test]
    fn test_added_and_removed_files() -> Result<(), DiffError> {
        let loader = MemoryLoader::default()
            .with("old/gone.dbc", catalog("1", &[("M1", 0x10, &["S1"])]))
            .with("new/fresh.dbc", catalog("1", &[("M2", 0x20, &["S2"])]));
        let old = collection(&[("gone.dbc", "old/gone.dbc")]);
        let new = collection(&[("fresh.dbc", "new/fresh.dbc")]);

        let report = diff_file_sets(&old, &new, false, &loader)?;
        let value = serde_json::to_value(&report)?;

        assert_eq!(value["gone.dbc"]["action"], "removed");
        assert_eq!(value["gone.dbc"]["removed"]["M1"]["action"], "removed");
        assert_eq!(value["gone.dbc"]["removed"]["M1"]["signals"]["S1"]["action"], "removed");
        assert_eq!(value["gone.dbc"]["old_version"], "1");
        assert!(value["gone.dbc"].get("new_version").is_none());

        assert_eq!(value["fresh.dbc"]["action"], "added");
        assert_eq!(value["fresh.dbc"]["added"]["M2"]["added"][0]["name"], "frame_id");
        assert_eq!(value["fresh.dbc"]["added"]["M2"]["added"][0]["new"], "0x20");
        assert_eq!(value["fresh.dbc"]["added"]["M2"]["added"][0]["old"], serde_json::Value::Null);
        assert_eq!(value["fresh.dbc"]["new_version"], "1");
        assert!(value["fresh.dbc"].get("old_version").is_none());
        Ok(())
    }

    #[test]
    fn test_renamed_single_file_is_one_entry() -> Result<(), DiffError> {
        let loader = MemoryLoader::default()
            .with("a.dbc", catalog("1", &[("M1", 1, &["S1"])]))
            .with("b.dbc", catalog("1", &[("M1", 2, &["S1"])]));
        let old = collection(&[("a.dbc -> b.dbc", "a.dbc")]);
        let new = collection(&[("a.dbc -> b.dbc", "b.dbc")]);

        let report = diff_file_sets(&old, &new, false, &loader)?;
        assert_eq!(report.files.len(), 1);
        let change = &report.files["a.dbc -> b.dbc"];
        assert_eq!(change.action, Action::Changed);
        assert_eq!(change.messages["M1"].properties[0].name, "frame_id");
        Ok(())
    }

    #[test]
    fn test_load_failure_aborts() {
        let loader = MemoryLoader::default();
        let old = collection(&[("x.dbc", "missing.dbc")]);
        let result = diff_file_sets(&old, &FileCollection::new(), false, &loader);
        assert!(matches!(result, Err(DiffError::SourceNotFound { .. })));
    }
}
