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

use std::fmt;

use crate::error::DiffError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Fatal,
    Warning,
    Info,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Fatal => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticCode {
    PathNotFound,
    UnknownSource,
    ReadFailed,

    EmptyCatalog,
    InvalidEncoding,
    MalformedStatement,
    OrphanSignal,
    UnknownFrameId,
    DuplicateMessage,
    DuplicateSignal,

    UnexpectedAction,

    NoReportKinds,
    TemplateNotFound,
    TemplateRender,
    ReportWrite,
    ReportSerialize,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::PathNotFound => "E001",
            DiagnosticCode::UnknownSource => "E002",
            DiagnosticCode::ReadFailed => "E003",

            DiagnosticCode::EmptyCatalog => "E010",
            DiagnosticCode::InvalidEncoding => "W011",
            DiagnosticCode::MalformedStatement => "W012",
            DiagnosticCode::OrphanSignal => "W013",
            DiagnosticCode::UnknownFrameId => "W014",
            DiagnosticCode::DuplicateMessage => "W015",
            DiagnosticCode::DuplicateSignal => "W016",

            DiagnosticCode::UnexpectedAction => "E020",

            DiagnosticCode::NoReportKinds => "E030",
            DiagnosticCode::TemplateNotFound => "E031",
            DiagnosticCode::TemplateRender => "E032",
            DiagnosticCode::ReportWrite => "E033",
            DiagnosticCode::ReportSerialize => "E034",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DiagnosticCode::PathNotFound => "Path not found",
            DiagnosticCode::UnknownSource => "Unknown source",
            DiagnosticCode::ReadFailed => "Unreadable file",

            DiagnosticCode::EmptyCatalog => "No DBC content",
            DiagnosticCode::InvalidEncoding => "Invalid UTF-8 encoding",
            DiagnosticCode::MalformedStatement => "Malformed statement",
            DiagnosticCode::OrphanSignal => "Signal outside of a message",
            DiagnosticCode::UnknownFrameId => "Unknown frame id",
            DiagnosticCode::DuplicateMessage => "Duplicate message name",
            DiagnosticCode::DuplicateSignal => "Duplicate signal name",

            DiagnosticCode::UnexpectedAction => "Unexpected change action",

            DiagnosticCode::NoReportKinds => "No report kinds",
            DiagnosticCode::TemplateNotFound => "Report template not found",
            DiagnosticCode::TemplateRender => "Template rendering failed",
            DiagnosticCode::ReportWrite => "Report write failed",
            DiagnosticCode::ReportSerialize => "Report serialization failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub filename: Option<String>,
    pub line_number: Option<usize>,
    pub level: DiagnosticLevel,
    pub code: DiagnosticCode,
    pub description: String,
    pub code_snippet: Option<String>,
    pub advice: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, code: DiagnosticCode, description: String) -> Self {
        Self {
            filename: None,
            line_number: None,
            level,
            code,
            description,
            code_snippet: None,
            advice: None,
        }
    }

    pub fn with_location(mut self, filename: String, line_number: usize) -> Self {
        self.filename = Some(filename);
        self.line_number = Some(line_number);
        self
    }

    pub fn with_snippet(mut self, snippet: String) -> Self {
        self.code_snippet = Some(snippet);
        self
    }

    pub fn with_advice(mut self, advice: String) -> Self {
        self.advice = Some(advice);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.level == DiagnosticLevel::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(filename), Some(line)) = (&self.filename, self.line_number) {
            write!(f, "{}:{} - ", filename, line)?;
        }

        writeln!(
            f,
            "{} {}: {}",
            self.level,
            self.code.as_str(),
            self.code.title()
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.description)?;

        if let Some(snippet) = &self.code_snippet {
            writeln!(f)?;
            writeln!(f, "{}", snippet)?;
        }

        if let Some(advice) = &self.advice {
            writeln!(f)?;
            writeln!(f, "{}", advice)?;
        }

        Ok(())
    }
}

impl From<DiffError> for Diagnostic {
    fn from(error: DiffError) -> Self {
        match error {
            DiffError::SourceNotFound { path } => Diagnostic::new(
                DiagnosticLevel::Fatal,
                DiagnosticCode::PathNotFound,
                format!("I couldn't find the input path: {}", path.display()),
            )
            .with_advice(
                "Make sure the path is correct and exists. Both --old and --new accept \
                 a single .dbc file or a directory that contains .dbc files."
                    .to_string(),
            ),
            DiffError::UnknownSource { path } => Diagnostic::new(
                DiagnosticLevel::Fatal,
                DiagnosticCode::UnknownSource,
                format!(
                    "I found {}, but it is neither a regular file nor a directory.",
                    path.display()
                ),
            ),
            DiffError::Read { path, source } => Diagnostic::new(
                DiagnosticLevel::Fatal,
                DiagnosticCode::ReadFailed,
                format!("I couldn't read {}: {}", path.display(), source),
            )
            .with_advice("Check that you have read permission for the file.".to_string()),
            DiffError::Parse { path, message } => Diagnostic::new(
                DiagnosticLevel::Fatal,
                DiagnosticCode::EmptyCatalog,
                format!("I couldn't load {} as a DBC file: {}", path.display(), message),
            )
            .with_advice(
                "A DBC file contains statements such as VERSION, BU_, BO_ and SG_. \
                 Make sure the file is a CAN database and not some other format \
                 that happens to use the .dbc extension."
                    .to_string(),
            ),
            DiffError::UnexpectedAction(action) => Diagnostic::new(
                DiagnosticLevel::Fatal,
                DiagnosticCode::UnexpectedAction,
                format!(
                    "I was asked to list every property of an entity for action '{}', \
                     but only 'added' and 'removed' describe a whole entity.",
                    action
                ),
            ),
            DiffError::TemplateNotFound { name, dir } => Diagnostic::new(
                DiagnosticLevel::Fatal,
                DiagnosticCode::TemplateNotFound,
                format!(
                    "Report template \"{}\" is not found in {}",
                    name,
                    dir.display()
                ),
            )
            .with_advice(
                "Every report kind other than json needs a template named \
                 dbc-diff.<kind>.jinja2. Pass --templates to point at the directory \
                 that holds them, or drop the kind from --reports."
                    .to_string(),
            ),
            DiffError::Template(e) => Diagnostic::new(
                DiagnosticLevel::Fatal,
                DiagnosticCode::TemplateRender,
                format!("I couldn't render the report template: {}", e),
            ),
            DiffError::Write { path, source } => Diagnostic::new(
                DiagnosticLevel::Fatal,
                DiagnosticCode::ReportWrite,
                format!("I couldn't write the report {}: {}", path.display(), source),
            )
            .with_advice(
                "Make sure you have write permission in the output directory and that the path is valid."
                    .to_string(),
            ),
            DiffError::Serialize(e) => Diagnostic::new(
                DiagnosticLevel::Fatal,
                DiagnosticCode::ReportSerialize,
                format!("I couldn't serialize the report to JSON: {}", e),
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_fatal())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}
