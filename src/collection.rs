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

//! Turning `--old` / `--new` arguments into named sets of DBC files.
//!
//! Files are keyed by base name only, so `a/body.dbc` in the old tree and
//! `b/body.dbc` in the new tree are compared with each other regardless of
//! which subdirectory they live in. The flip side is that two files with the
//! same base name in one tree collide: the collision is logged and the file
//! walked later wins. Walk order is sorted by file name so the winner is the
//! same on every run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::DiffError;

pub const CATALOG_EXTENSION: &str = ".dbc";

/// Two paths under one directory that share a base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateFile {
    pub name: String,
    pub kept: PathBuf,
    pub replaced: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCollection {
    files: BTreeMap<String, PathBuf>,
    duplicates: Vec<DuplicateFile>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory is walked recursively; a file stands for itself.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DiffError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DiffError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        if path.is_dir() {
            Self::from_directory(path)
        } else if path.is_file() {
            Self::from_file(path)
        } else {
            Err(DiffError::UnknownSource {
                path: path.to_path_buf(),
            })
        }
    }

    pub fn from_directory<P: AsRef<Path>>(dir: P) -> Result<Self, DiffError> {
        let dir = dir.as_ref();
        let mut collection = Self::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| DiffError::Read {
                path: e.path().unwrap_or(dir).to_path_buf(),
                source: e.into(),
            })?;
            // Symlinked files count; the walk itself does not follow links.
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(CATALOG_EXTENSION) {
                collection.insert(name, entry.into_path());
            }
        }

        tracing::debug!(
            dir = %dir.display(),
            files = collection.len(),
            "enumerated DBC files"
        );
        Ok(collection)
    }

    /// Any file name is accepted here; the extension filter only applies to
    /// directory walks.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DiffError> {
        let path = path.as_ref();
        let name = base_name(path).ok_or_else(|| DiffError::UnknownSource {
            path: path.to_path_buf(),
        })?;
        let mut collection = Self::new();
        collection.insert(name, path.to_path_buf());
        Ok(collection)
    }

    /// Later paths replace earlier ones under the same name.
    pub fn insert(&mut self, name: String, path: PathBuf) {
        if let Some(previous) = self.files.insert(name.clone(), path.clone()) {
            tracing::error!(
                "same DBC file found more than once: {} and {}",
                previous.display(),
                path.display()
            );
            self.duplicates.push(DuplicateFile {
                name,
                kept: path,
                replaced: previous,
            });
        }
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.files.get(name).map(PathBuf::as_path)
    }

    pub fn files(&self) -> &BTreeMap<String, PathBuf> {
        &self.files
    }

    pub fn duplicates(&self) -> &[DuplicateFile] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn rename(&mut self, from: &str, to: String) {
        if let Some(path) = self.files.remove(from) {
            self.files.insert(to, path);
        }
    }
}

fn base_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Builds both collections for one run.
///
/// When both arguments are single files with different names they are paired
/// under `"<old> -> <new>"` so the report shows one renamed entry rather than
/// a removal plus an addition. Directory arguments are never paired this way.
pub fn collect_sources<P: AsRef<Path>, Q: AsRef<Path>>(
    old: P,
    new: Q,
) -> Result<(FileCollection, FileCollection), DiffError> {
    let old = old.as_ref();
    let new = new.as_ref();
    let mut old_files = FileCollection::from_path(old)?;
    let mut new_files = FileCollection::from_path(new)?;

    if old.is_file() && new.is_file() {
        if let (Some(old_name), Some(new_name)) = (base_name(old), base_name(new)) {
            if old_name != new_name {
                let paired = format!("{} -> {}", old_name, new_name);
                old_files.rename(&old_name, paired.clone());
                new_files.rename(&new_name, paired);
            }
        }
    }

    Ok((old_files, new_files))
}
