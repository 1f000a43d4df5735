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

use std::path::PathBuf;

use crate::diff::Action;

/// Everything that can stop a comparison run.
///
/// Library functions return this; the command line converts it into a fatal
/// [`crate::Diagnostic`] before printing.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("path does not exist: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("path is neither a file nor a directory: {}", path.display())]
    UnknownSource { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Only `added` and `removed` describe a whole entity.
    #[error("cannot build a property inventory for action '{0}'")]
    UnexpectedAction(Action),

    #[error("report template \"{name}\" is not found in {}", dir.display())]
    TemplateNotFound { name: String, dir: PathBuf },

    #[error("failed to render template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
