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

use minijinja::{context, path_loader, Environment};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DiffError;
use crate::report::Report;

pub const TEMPLATE_PREFIX: &str = "dbc-diff";
pub const TEMPLATE_SUFFIX: &str = ".jinja2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportKind {
    Json,
    /// Rendered from `dbc-diff.<extension>.jinja2`.
    Template(String),
}

impl ReportKind {
    /// Parses a comma separated list such as `"json, html,md"`. Blank
    /// entries are skipped.
    pub fn parse_list(list: &str) -> Vec<ReportKind> {
        list.split(',')
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(|kind| match kind {
                "json" => ReportKind::Json,
                other => ReportKind::Template(other.to_string()),
            })
            .collect()
    }

    pub fn extension(&self) -> &str {
        match self {
            ReportKind::Json => "json",
            ReportKind::Template(extension) => extension,
        }
    }

    pub fn template_name(&self) -> Option<String> {
        match self {
            ReportKind::Json => None,
            ReportKind::Template(extension) => {
                Some(format!("{}.{}{}", TEMPLATE_PREFIX, extension, TEMPLATE_SUFFIX))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Base file name; reports land at `<output_dir>/<name>.<extension>`.
    pub name: String,
    pub output_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub build_info: String,
}

/// Fails on the first template kind whose file is missing.
pub fn check_templates(kinds: &[ReportKind], templates_dir: &Path) -> Result<(), DiffError> {
    for name in kinds.iter().filter_map(ReportKind::template_name) {
        if !templates_dir.join(&name).is_file() {
            return Err(DiffError::TemplateNotFound {
                name,
                dir: templates_dir.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Writes compact JSON. `.json` is appended when the path lacks it.
pub fn write_json_report(report: &Report, path: &Path) -> Result<PathBuf, DiffError> {
    let path = if path.to_string_lossy().ends_with(".json") {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    };

    let content = serde_json::to_string(report)?;
    fs::write(&path, content).map_err(|source| DiffError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn render_template(
    report: &Report,
    templates_dir: &Path,
    template_name: &str,
    build_info: &str,
) -> Result<String, DiffError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_loader(path_loader(templates_dir));

    let template = env.get_template(template_name)?;
    let rendered = template.render(context! {
        files => report,
        dbc_files => report,
        build_info => build_info,
    })?;
    Ok(rendered)
}

/// Writes one file per kind, in the order given.
///
/// Every template is checked before anything is written, so a missing
/// template leaves the output directory untouched.
pub fn write_reports(
    report: &Report,
    kinds: &[ReportKind],
    options: &OutputOptions,
) -> Result<Vec<PathBuf>, DiffError> {
    check_templates(kinds, &options.templates_dir)?;

    let mut written = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let path = options
            .output_dir
            .join(format!("{}.{}", options.name, kind.extension()));

        let saved = match kind.template_name() {
            None => write_json_report(report, &path)?,
            Some(template_name) => {
                let content =
                    render_template(report, &options.templates_dir, &template_name, &options.build_info)?;
                fs::write(&path, content).map_err(|source| DiffError::Write {
                    path: path.clone(),
                    source,
                })?;
                path
            }
        };

        tracing::info!("Report saved: {}", saved.display());
        written.push(saved);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{Action, VersionInfo};
    use crate::report::FileChange;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_report() -> Report {
        let mut files = BTreeMap::new();
        files.insert(
            "body.dbc".to_string(),
            FileChange {
                action: Action::Changed,
                messages: BTreeMap::new(),
                versions: VersionInfo {
                    old_version: Some("1.0".to_string()),
                    new_version: Some("1.1".to_string()),
                    same_version: false,
                },
            },
        );
        Report { files }
    }

    fn options(dir: &TempDir) -> OutputOptions {
        OutputOptions {
            name: "report".to_string(),
            output_dir: dir.path().to_path_buf(),
            templates_dir: dir.path().to_path_buf(),
            build_info: "nightly 42".to_string(),
        }
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            ReportKind::parse_list(" json, html ,,md\n"),
            vec![
                ReportKind::Json,
                ReportKind::Template("html".to_string()),
                ReportKind::Template("md".to_string()),
            ]
        );
        assert!(ReportKind::parse_list(" , ").is_empty());
        assert_eq!(
            ReportKind::Template("md".to_string()).template_name().as_deref(),
            Some("dbc-diff.md.jinja2")
        );
    }

    #[test]
    fn test_json_extension_appended_once() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let report = sample_report();

        let bare = write_json_report(&report, &dir.path().join("out"))?;
        assert_eq!(bare, dir.path().join("out.json"));

        let suffixed = write_json_report(&report, &dir.path().join("again.json"))?;
        assert_eq!(suffixed, dir.path().join("again.json"));

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&bare)?)?;
        assert_eq!(value["body.dbc"]["action"], "changed");
        assert_eq!(value["body.dbc"]["old_version"], "1.0");
        Ok(())
    }

    #[test]
    fn test_template_receives_report_and_build_info() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("dbc-diff.txt.jinja2"),
            "{{ build_info }}\n{% for name, change in files|items %}\n{{ name }}={{ change.action }} {{ dbc_files[name].new_version }}\n{% endfor %}\n",
        )?;

        let kinds = ReportKind::parse_list("json,txt");
        let written = write_reports(&sample_report(), &kinds, &options(&dir))?;
        assert_eq!(
            written,
            vec![dir.path().join("report.json"), dir.path().join("report.txt")]
        );

        let text = fs::read_to_string(dir.path().join("report.txt"))?;
        assert_eq!(text, "nightly 42\nbody.dbc=changed 1.1\n");
        Ok(())
    }

    #[test]
    fn test_missing_template_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let kinds = ReportKind::parse_list("json,html");

        let result = write_reports(&sample_report(), &kinds, &options(&dir));
        match result {
            Err(DiffError::TemplateNotFound { name, .. }) => {
                assert_eq!(name, "dbc-diff.html.jinja2")
            }
            other => panic!("expected TemplateNotFound, got {:?}", other),
        }
        assert!(!dir.path().join("report.json").exists());
        Ok(())
    }
}
