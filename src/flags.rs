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

xflags::xflags! {
    /// Compare two sets of CAN database (.dbc) files and write change reports.
    cmd dbc-diff {
        /// Old DBC file, or a directory searched recursively for .dbc files
        required -f, --old old: PathBuf

        /// New DBC file, or a directory searched recursively for .dbc files
        required -t, --new new: PathBuf

        /// Include files that have no differences in the report
        optional -u, --unchanged

        /// Reports to create, comma separated (json,html,md ...)
        required -r, --reports reports: String

        /// Text shown as build info in template reports (defaults to the current time)
        optional -i, --info info: String

        /// Report base file name; reports are written as <name>.json, <name>.html ...
        optional -n, --name name: String

        /// Existing directory to write reports into (defaults to the current directory)
        optional -o, --output output: PathBuf

        /// Directory holding dbc-diff.<kind>.jinja2 templates (defaults to the executable's directory)
        optional --templates templates: PathBuf

        /// Log debug output
        optional -v, --verbose

        /// Only log errors
        optional -q, --quiet
    }
}
