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

pub mod catalog;
pub mod collection;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod output;
pub mod property;
pub mod reader;
pub mod report;

pub use catalog::{ByteOrder, Catalog, Message, Number, Signal};
pub use collection::{collect_sources, FileCollection};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollector, DiagnosticLevel};
pub use diff::{diff_catalogs, reconcile, Action, CatalogDiff, EntityChange, VersionInfo};
pub use error::DiffError;
pub use output::{write_json_report, write_reports, OutputOptions, ReportKind};
pub use reader::{CatalogReader, ReadResult};
pub use report::{diff_file_sets, CatalogLoader, DbcLoader, FileChange, Report};
