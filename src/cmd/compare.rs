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

use crate::flags;
use chrono::Local;
use dbc_diff::{
    collect_sources, diff_file_sets, write_reports, Action, DbcLoader, Diagnostic, DiagnosticCode,
    DiagnosticLevel, OutputOptions, Report, ReportKind,
};
use std::path::{Path, PathBuf};

const DEFAULT_REPORT_NAME: &str = "dbc-diff";
const BUILD_INFO_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn run(flags: &flags::DbcDiff) -> Vec<Diagnostic> {
    let kinds = ReportKind::parse_list(&flags.reports);
    if kinds.is_empty() {
        return vec![Diagnostic::new(
            DiagnosticLevel::Fatal,
            DiagnosticCode::NoReportKinds,
            format!(
                "I need at least one report kind in --reports, but \"{}\" doesn't name any.",
                flags.reports
            ),
        )
        .with_advice(
            "Pass a comma separated list, for example: dbc-diff -f old/ -t new/ -r json,html"
                .to_string(),
        )];
    }

    let output_dir = flags.output.clone().unwrap_or_else(|| PathBuf::from("."));
    if !output_dir.is_dir() {
        return vec![Diagnostic::new(
            DiagnosticLevel::Fatal,
            DiagnosticCode::PathNotFound,
            format!("I couldn't find the output directory: {}", output_dir.display()),
        )
        .with_advice("The directory given to --output must already exist.".to_string())];
    }

    let templates_dir = flags.templates.clone().unwrap_or_else(default_templates_dir);

    let (old_files, new_files) = match collect_sources(&flags.old, &flags.new) {
        Ok(collections) => collections,
        Err(e) => return vec![e.into()],
    };
    tracing::debug!(
        old = old_files.len(),
        new = new_files.len(),
        "collected DBC files"
    );

    let report = match diff_file_sets(&old_files, &new_files, flags.unchanged, &DbcLoader) {
        Ok(report) => report,
        Err(e) => return vec![e.into()],
    };

    let options = OutputOptions {
        name: flags
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_REPORT_NAME.to_string()),
        output_dir,
        templates_dir,
        build_info: flags
            .info
            .clone()
            .unwrap_or_else(|| Local::now().format(BUILD_INFO_FORMAT).to_string()),
    };

    if let Err(e) = write_reports(&report, &kinds, &options) {
        return vec![e.into()];
    }

    println!("{}", summary(&report));
    Vec::new()
}

fn default_templates_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn summary(report: &Report) -> String {
    let count = |action: Action| {
        report
            .files
            .values()
            .filter(|change| change.action == action)
            .count()
    };
    format!(
        "Compared DBC files: {} added, {} removed, {} changed, {} unchanged",
        count(Action::Added),
        count(Action::Removed),
        count(Action::Changed),
        count(Action::Unchanged)
    )
}
