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

//! Lenient DBC reader.
//!
//! Only the statements that feed the message and signal schemas are
//! interpreted. Everything else is skipped. A statement that is recognized
//! but malformed becomes a warning and is dropped; the rest of the file is
//! still read. The only fatal outcome is a file with no DBC statements at all.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::catalog::{ByteOrder, Catalog, Message, Number, Signal};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollector, DiagnosticLevel};
use crate::error::DiffError;

const EXTENDED_FRAME_FLAG: u32 = 0x8000_0000;
const EXTENDED_FRAME_MASK: u32 = 0x1FFF_FFFF;
const NO_NODE: &str = "Vector__XXX";

/// Statements that end at the end of their line rather than at `;`.
const LINE_STATEMENTS: &[&str] = &["VERSION", "BS_", "BU_", "BO_", "SG_"];

const KNOWN_STATEMENTS: &[&str] = &[
    "VERSION",
    "NS_",
    "BS_",
    "BU_",
    "BO_",
    "SG_",
    "CM_",
    "BA_DEF_",
    "BA_DEF_DEF_",
    "BA_",
    "BA_DEF_REL_",
    "BA_DEF_DEF_REL_",
    "BA_REL_",
    "VAL_",
    "VAL_TABLE_",
    "BO_TX_BU_",
    "SIG_VALTYPE_",
    "SIG_GROUP_",
    "SIG_TYPE_REF_",
    "SGTYPE_",
    "SGTYPE_VAL_",
    "SG_MUL_VAL_",
    "EV_",
    "ENVVAR_DATA_",
    "CAT_DEF_",
    "CAT_",
    "FILTER",
];

pub struct CatalogReader {
    path: PathBuf,
    filename: String,
}

#[derive(Debug)]
pub struct ReadResult {
    pub catalog: Catalog,
    pub diagnostics: DiagnosticCollector,
}

impl CatalogReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let filename = path.display().to_string();
        Self { path, filename }
    }

    /// Reads the whole file, then parses it. The handle is closed before
    /// parsing starts.
    pub fn read(&self) -> Result<ReadResult, DiffError> {
        let bytes = std::fs::read(&self.path).map_err(|source| DiffError::Read {
            path: self.path.clone(),
            source,
        })?;

        let mut encoding_warning = None;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                encoding_warning = Some(
                    Diagnostic::new(
                        DiagnosticLevel::Warning,
                        DiagnosticCode::InvalidEncoding,
                        "I found bytes that are not valid UTF-8, so I read the file as Latin-1."
                            .to_string(),
                    )
                    .with_location(self.filename.clone(), 1)
                    .with_advice(
                        "Many DBC editors save files as Windows-1252. Names and units with \
                         accented characters may look different from what the editor shows."
                            .to_string(),
                    ),
                );
                e.into_bytes().iter().map(|&b| b as char).collect()
            }
        };

        let mut result = self.parse(&content);
        if let Some(warning) = encoding_warning {
            result.diagnostics.add(warning);
        }

        if let Some(fatal) = result.diagnostics.diagnostics().iter().find(|d| d.is_fatal()) {
            return Err(DiffError::Parse {
                path: self.path.clone(),
                message: fatal.description.clone(),
            });
        }
        Ok(result)
    }

    pub fn parse(&self, content: &str) -> ReadResult {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let source_lines: Vec<&str> = content.lines().collect();
        let tokens = tokenize(content);
        let statements = split_statements(&tokens);

        let mut builder = CatalogBuilder::default();
        let mut diagnostics = DiagnosticCollector::new();
        let mut recognized = 0;

        for statement in &statements {
            if !KNOWN_STATEMENTS.contains(&statement.keyword.as_str()) {
                continue;
            }
            recognized += 1;

            let outcome = builder.apply(statement);
            if let Err(problem) = outcome {
                let snippet = source_lines
                    .get(statement.line - 1)
                    .map(|line| line.trim_end().to_string())
                    .unwrap_or_default();
                diagnostics.add(
                    Diagnostic::new(DiagnosticLevel::Warning, problem.code, problem.description)
                        .with_location(self.filename.clone(), statement.line)
                        .with_snippet(snippet),
                );
            }
        }

        if recognized == 0 {
            diagnostics.add(
                Diagnostic::new(
                    DiagnosticLevel::Fatal,
                    DiagnosticCode::EmptyCatalog,
                    "I couldn't find any DBC statements in this file.".to_string(),
                )
                .with_location(self.filename.clone(), 1),
            );
        }

        let catalog = builder.finish(&self.filename, &mut diagnostics);
        ReadResult {
            catalog,
            diagnostics,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(String),
    Text(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
}

fn tokenize(content: &str) -> Vec<Spanned> {
    let chars: Vec<char> = content.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '\n' {
            line += 1;
            i += 1;
        } else if c.is_whitespace() {
            i += 1;
        } else if c == '"' {
            let start_line = line;
            let mut text = String::new();
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    i += 1;
                }
                if chars[i] == '\n' {
                    line += 1;
                }
                text.push(chars[i]);
                i += 1;
            }
            i += 1;
            tokens.push(Spanned {
                token: Token::Text(text),
                line: start_line,
            });
        } else if c.is_ascii_digit()
            || ((c == '-' || c == '+' || c == '.') && next.is_some_and(|n| n.is_ascii_digit()))
        {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            tokens.push(Spanned {
                token: Token::Number(chars[start..i].iter().collect()),
                line,
            });
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Spanned {
                token: Token::Ident(chars[start..i].iter().collect()),
                line,
            });
        } else {
            tokens.push(Spanned {
                token: Token::Punct(c),
                line,
            });
            i += 1;
        }
    }
    tokens
}

#[derive(Debug)]
struct Statement {
    keyword: String,
    line: usize,
    tokens: Vec<Token>,
}

fn split_statements(tokens: &[Spanned]) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let line = tokens[i].line;
        let keyword = match &tokens[i].token {
            Token::Ident(keyword) => keyword.clone(),
            _ => {
                i = skip_line(tokens, i);
                continue;
            }
        };
        i += 1;

        if keyword == "NS_" {
            i = skip_new_symbols(tokens, skip_line(tokens, i - 1));
            statements.push(Statement {
                keyword,
                line,
                tokens: Vec::new(),
            });
            continue;
        }

        let mut body = Vec::new();
        if LINE_STATEMENTS.contains(&keyword.as_str()) {
            while i < tokens.len() && tokens[i].line == line {
                body.push(tokens[i].token.clone());
                i += 1;
            }
        } else {
            while i < tokens.len() {
                if tokens[i].token == Token::Punct(';') {
                    i += 1;
                    break;
                }
                // A missing `;` must not swallow the next statement.
                if tokens[i].line != tokens[i - 1].line && starts_statement(&tokens[i].token) {
                    break;
                }
                body.push(tokens[i].token.clone());
                i += 1;
            }
        }

        statements.push(Statement {
            keyword,
            line,
            tokens: body,
        });
    }
    statements
}

fn starts_statement(token: &Token) -> bool {
    matches!(token, Token::Ident(word) if KNOWN_STATEMENTS.contains(&word.as_str()))
}

fn skip_line(tokens: &[Spanned], i: usize) -> usize {
    let line = tokens[i].line;
    let mut j = i;
    while j < tokens.len() && tokens[j].line == line {
        j += 1;
    }
    j
}

/// The `NS_` block lists one symbol per line.
fn skip_new_symbols(tokens: &[Spanned], mut i: usize) -> usize {
    while i < tokens.len() {
        let end = skip_line(tokens, i);
        let single_symbol = end - i == 1 && matches!(tokens[i].token, Token::Ident(_));
        if !single_symbol {
            break;
        }
        i = end;
    }
    i
}

struct Problem {
    code: DiagnosticCode,
    description: String,
}

impl Problem {
    fn malformed(what: &str) -> Self {
        Self {
            code: DiagnosticCode::MalformedStatement,
            description: format!("I couldn't understand this {}, so I skipped it.", what),
        }
    }
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn ident(&mut self) -> Option<&'a str> {
        match self.next()? {
            Token::Ident(word) => Some(word),
            _ => None,
        }
    }

    fn number(&mut self) -> Option<Number> {
        match self.next()? {
            Token::Number(text) => Number::parse(text),
            _ => None,
        }
    }

    fn frame_id(&mut self) -> Option<u32> {
        match self.next()? {
            Token::Number(text) => text.parse::<u32>().ok(),
            _ => None,
        }
    }

    fn unsigned(&mut self) -> Option<u64> {
        match self.next()? {
            Token::Number(text) => text.parse::<u64>().ok(),
            _ => None,
        }
    }

    fn text(&mut self) -> Option<&'a str> {
        match self.next()? {
            Token::Text(text) => Some(text),
            _ => None,
        }
    }

    fn punct(&mut self, expected: char) -> Option<()> {
        match self.next()? {
            Token::Punct(c) if *c == expected => Some(()),
            _ => None,
        }
    }

    fn skip_punct(&mut self, expected: char) {
        if self.peek() == Some(&Token::Punct(expected)) {
            self.pos += 1;
        }
    }

    fn attribute_value(&mut self) -> Option<AttributeValue> {
        match self.next()? {
            Token::Number(text) => Number::parse(text).map(AttributeValue::Number),
            Token::Text(text) => Some(AttributeValue::Text(text.clone())),
            _ => None,
        }
    }

    /// Identifiers separated by commas or whitespace, up to the end.
    fn names(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        while let Some(token) = self.next() {
            if let Token::Ident(name) = token {
                names.push(name.clone());
            }
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq)]
enum AttributeValue {
    Number(Number),
    Text(String),
}

struct PendingMessage {
    raw_id: u32,
    name: String,
    length: u64,
    sender: Option<String>,
    signals: Vec<PendingSignal>,
    line: usize,
}

struct PendingSignal {
    name: String,
    signal: Signal,
    receivers: Vec<String>,
    line: usize,
}

#[derive(Default)]
struct CatalogBuilder {
    version: Option<String>,
    messages: Vec<PendingMessage>,
    transmitters: HashMap<u32, (usize, Vec<String>)>,
    choices: HashMap<(u32, String), (usize, Vec<(Number, String)>)>,
    float_signals: HashMap<(u32, String), bool>,
    enum_definitions: HashMap<String, Vec<String>>,
    attribute_defaults: HashMap<String, AttributeValue>,
    message_attributes: HashMap<(u32, String), AttributeValue>,
    signal_attributes: HashMap<(u32, String, String), AttributeValue>,
}

impl CatalogBuilder {
    fn apply(&mut self, statement: &Statement) -> Result<(), Problem> {
        let mut cursor = Cursor::new(&statement.tokens);
        match statement.keyword.as_str() {
            "VERSION" => {
                self.version = Some(cursor.text().unwrap_or_default().to_string());
                Ok(())
            }
            "BO_" => self
                .message(&mut cursor, statement.line)
                .ok_or_else(|| Problem::malformed("message definition")),
            "SG_" => self.signal(&mut cursor, statement.line),
            "BO_TX_BU_" => self
                .transmitters(&mut cursor, statement.line)
                .ok_or_else(|| Problem::malformed("transmitter list")),
            "VAL_" => self
                .value_descriptions(&mut cursor, statement.line)
                .ok_or_else(|| Problem::malformed("value description")),
            "SIG_VALTYPE_" => self
                .signal_value_type(&mut cursor)
                .ok_or_else(|| Problem::malformed("signal value type")),
            "BA_DEF_" => self
                .attribute_definition(&mut cursor)
                .ok_or_else(|| Problem::malformed("attribute definition")),
            "BA_DEF_DEF_" => self
                .attribute_default(&mut cursor)
                .ok_or_else(|| Problem::malformed("attribute default")),
            "BA_" => self
                .attribute(&mut cursor)
                .ok_or_else(|| Problem::malformed("attribute value")),
            _ => Ok(()),
        }
    }

    // BO_ <id> <name>: <length> <sender>
    fn message(&mut self, cursor: &mut Cursor<'_>, line: usize) -> Option<()> {
        let raw_id = cursor.frame_id()?;
        let name = cursor.ident()?.to_string();
        cursor.punct(':')?;
        let length = cursor.unsigned()?;
        let sender = cursor.ident().filter(|s| *s != NO_NODE).map(str::to_string);
        self.messages.push(PendingMessage {
            raw_id,
            name,
            length,
            sender,
            signals: Vec::new(),
            line,
        });
        Some(())
    }

    // SG_ <name> [mux] : <start>|<length>@<order><sign> (<scale>,<offset>) [<min>|<max>] "<unit>" <receivers>
    fn signal(&mut self, cursor: &mut Cursor<'_>, line: usize) -> Result<(), Problem> {
        let parsed = parse_signal(cursor).ok_or_else(|| Problem::malformed("signal definition"))?;
        let message = self.messages.last_mut().ok_or_else(|| Problem {
            code: DiagnosticCode::OrphanSignal,
            description: format!(
                "I found signal '{}' before any BO_ message definition, so I skipped it.",
                parsed.name
            ),
        })?;
        message.signals.push(PendingSignal { line, ..parsed });
        Ok(())
    }

    // BO_TX_BU_ <id> : <node>,<node>;
    fn transmitters(&mut self, cursor: &mut Cursor<'_>, line: usize) -> Option<()> {
        let raw_id = cursor.frame_id()?;
        cursor.punct(':')?;
        let nodes = cursor.names();
        let entry = self.transmitters.entry(raw_id).or_insert((line, Vec::new()));
        entry.1.extend(nodes);
        Some(())
    }

    // VAL_ <id> <signal> <code> "<label>" ... ;
    fn value_descriptions(&mut self, cursor: &mut Cursor<'_>, line: usize) -> Option<()> {
        // Environment variable descriptions have no frame id.
        if !matches!(cursor.peek(), Some(Token::Number(_))) {
            return Some(());
        }
        let raw_id = cursor.frame_id()?;
        let signal = cursor.ident()?.to_string();
        let mut pairs = Vec::new();
        while cursor.peek().is_some() {
            let code = cursor.number()?;
            let label = cursor.text()?.to_string();
            pairs.push((code, label));
        }
        self.choices.insert((raw_id, signal), (line, pairs));
        Some(())
    }

    // SIG_VALTYPE_ <id> <signal> : <1|2>;
    fn signal_value_type(&mut self, cursor: &mut Cursor<'_>) -> Option<()> {
        let raw_id = cursor.frame_id()?;
        let signal = cursor.ident()?.to_string();
        cursor.skip_punct(':');
        let kind = cursor.unsigned()?;
        self.float_signals.insert((raw_id, signal), kind == 1 || kind == 2);
        Some(())
    }

    // BA_DEF_ [BU_|BO_|SG_|EV_] "<name>" <type> ...;
    fn attribute_definition(&mut self, cursor: &mut Cursor<'_>) -> Option<()> {
        if matches!(cursor.peek(), Some(Token::Ident(_))) {
            cursor.next();
        }
        let name = cursor.text()?.to_string();
        if cursor.ident()? == "ENUM" {
            let mut labels = Vec::new();
            while let Some(token) = cursor.next() {
                if let Token::Text(label) = token {
                    labels.push(label.clone());
                }
            }
            self.enum_definitions.insert(name, labels);
        }
        Some(())
    }

    // BA_DEF_DEF_ "<name>" <value>;
    fn attribute_default(&mut self, cursor: &mut Cursor<'_>) -> Option<()> {
        let name = cursor.text()?.to_string();
        let value = cursor.attribute_value()?;
        self.attribute_defaults.insert(name, value);
        Some(())
    }

    // BA_ "<name>" [BO_ <id> | SG_ <id> <signal> | BU_ <node> | EV_ <var>] <value>;
    fn attribute(&mut self, cursor: &mut Cursor<'_>) -> Option<()> {
        let name = cursor.text()?.to_string();
        match cursor.peek()? {
            Token::Ident(object) if object == "BO_" => {
                cursor.next();
                let raw_id = cursor.frame_id()?;
                let value = cursor.attribute_value()?;
                self.message_attributes.insert((raw_id, name), value);
            }
            Token::Ident(object) if object == "SG_" => {
                cursor.next();
                let raw_id = cursor.frame_id()?;
                let signal = cursor.ident()?.to_string();
                let value = cursor.attribute_value()?;
                self.signal_attributes.insert((raw_id, signal, name), value);
            }
            _ => {}
        }
        Some(())
    }

    fn message_attribute(&self, raw_id: u32, name: &str) -> Option<&AttributeValue> {
        self.message_attributes
            .get(&(raw_id, name.to_string()))
            .or_else(|| self.attribute_defaults.get(name))
    }

    fn signal_attribute(&self, raw_id: u32, signal: &str, name: &str, use_default: bool) -> Option<&AttributeValue> {
        let explicit = self
            .signal_attributes
            .get(&(raw_id, signal.to_string(), name.to_string()));
        if use_default {
            explicit.or_else(|| self.attribute_defaults.get(name))
        } else {
            explicit
        }
    }

    /// Enum attributes may be stored as an index or as the label itself.
    fn enum_label(&self, name: &str, value: &AttributeValue) -> Option<String> {
        match value {
            AttributeValue::Text(label) => Some(label.clone()),
            AttributeValue::Number(index) => {
                let index = usize::try_from(index.as_i64()?).ok()?;
                self.enum_definitions.get(name)?.get(index).cloned()
            }
        }
    }

    fn finish(mut self, filename: &str, diagnostics: &mut DiagnosticCollector) -> Catalog {
        let pending = std::mem::take(&mut self.messages);
        let mut messages = BTreeMap::new();
        let mut seen_ids = Vec::new();

        for pending_message in pending {
            seen_ids.push(pending_message.raw_id);
            let name = pending_message.name.clone();
            let line = pending_message.line;
            let message = self.build_message(pending_message, filename, diagnostics);
            if messages.insert(name.clone(), message).is_some() {
                diagnostics.add(
                    Diagnostic::new(
                        DiagnosticLevel::Warning,
                        DiagnosticCode::DuplicateMessage,
                        format!(
                            "I found message '{}' more than once. The later definition replaces the earlier one.",
                            name
                        ),
                    )
                    .with_location(filename.to_string(), line),
                );
            }
        }

        let mut dangling: Vec<usize> = self
            .transmitters
            .iter()
            .filter(|(raw_id, _)| !seen_ids.contains(*raw_id))
            .map(|(_, (line, _))| *line)
            .chain(
                self.choices
                    .iter()
                    .filter(|((raw_id, _), _)| !seen_ids.contains(raw_id))
                    .map(|(_, (line, _))| *line),
            )
            .collect();
        dangling.sort_unstable();
        for line in dangling {
            diagnostics.add(
                Diagnostic::new(
                    DiagnosticLevel::Warning,
                    DiagnosticCode::UnknownFrameId,
                    "I found a statement that refers to a frame id with no BO_ definition, so I ignored it."
                        .to_string(),
                )
                .with_location(filename.to_string(), line),
            );
        }

        Catalog {
            messages,
            version: self.version,
        }
    }

    fn build_message(
        &mut self,
        pending: PendingMessage,
        filename: &str,
        diagnostics: &mut DiagnosticCollector,
    ) -> Message {
        let raw_id = pending.raw_id;
        let is_extended_frame = raw_id & EXTENDED_FRAME_FLAG != 0;
        let frame_id = if is_extended_frame {
            raw_id & EXTENDED_FRAME_MASK
        } else {
            raw_id
        };

        let mut senders: Vec<String> = pending.sender.into_iter().collect();
        if let Some((_, extra)) = self.transmitters.get(&raw_id) {
            for node in extra {
                if node != NO_NODE && !senders.contains(node) {
                    senders.push(node.clone());
                }
            }
        }

        let cycle_time = self
            .message_attribute(raw_id, "GenMsgCycleTime")
            .and_then(|value| match value {
                AttributeValue::Number(n) => n.as_i64(),
                AttributeValue::Text(_) => None,
            });
        let send_type = self
            .message_attribute(raw_id, "GenMsgSendType")
            .and_then(|value| self.enum_label("GenMsgSendType", value));
        let is_fd = self
            .message_attribute(raw_id, "VFrameFormat")
            .and_then(|value| self.enum_label("VFrameFormat", value))
            .is_some_and(|format| format.ends_with("CAN_FD"));

        let mut receivers: Vec<String> = Vec::new();
        let mut signals = BTreeMap::new();
        for pending_signal in pending.signals {
            for receiver in &pending_signal.receivers {
                if receiver != NO_NODE && !receivers.contains(receiver) {
                    receivers.push(receiver.clone());
                }
            }
            let name = pending_signal.name.clone();
            let signal = self.complete_signal(raw_id, pending_signal.signal, &name);
            if signals.insert(name.clone(), signal).is_some() {
                diagnostics.add(
                    Diagnostic::new(
                        DiagnosticLevel::Warning,
                        DiagnosticCode::DuplicateSignal,
                        format!(
                            "I found signal '{}' twice in message '{}'. The later definition replaces the earlier one.",
                            name, pending.name
                        ),
                    )
                    .with_location(filename.to_string(), pending_signal.line),
                );
            }
        }
        receivers.sort();

        Message {
            frame_id,
            is_extended_frame,
            is_fd,
            length: pending.length,
            send_type,
            cycle_time,
            senders,
            receivers,
            signals,
        }
    }

    fn complete_signal(&mut self, raw_id: u32, mut signal: Signal, name: &str) -> Signal {
        let key = (raw_id, name.to_string());
        signal.is_float = self.float_signals.get(&key).copied().unwrap_or(false);
        signal.choices = self.choices.remove(&key).map(|(_, pairs)| pairs);

        signal.initial = match self.signal_attribute(raw_id, name, "GenSigStartValue", true) {
            Some(AttributeValue::Number(raw)) => Some(raw.scaled(signal.scale, signal.offset)),
            _ => None,
        };
        signal.invalid = match self.signal_attribute(raw_id, name, "GenSigInvalidValue", false) {
            Some(AttributeValue::Number(raw)) => Some(*raw),
            _ => None,
        };
        signal.spn = match self.signal_attribute(raw_id, name, "SPN", false) {
            Some(AttributeValue::Number(spn)) => spn.as_i64(),
            _ => None,
        };
        signal
    }
}

fn parse_signal(cursor: &mut Cursor<'_>) -> Option<PendingSignal> {
    let name = cursor.ident()?.to_string();
    // Multiplexer indicator (M, m0, m0M) sits between the name and the colon.
    if matches!(cursor.peek(), Some(Token::Ident(_))) {
        cursor.next();
    }
    cursor.punct(':')?;
    let start = cursor.unsigned()?;
    cursor.punct('|')?;
    let length = cursor.unsigned()?;
    cursor.punct('@')?;
    let byte_order = match cursor.unsigned()? {
        0 => ByteOrder::BigEndian,
        _ => ByteOrder::LittleEndian,
    };
    let is_signed = match cursor.next()? {
        Token::Punct('-') => true,
        Token::Punct('+') => false,
        _ => return None,
    };
    cursor.punct('(')?;
    let scale = cursor.number()?;
    cursor.punct(',')?;
    let offset = cursor.number()?;
    cursor.punct(')')?;
    cursor.punct('[')?;
    let minimum = cursor.number()?;
    cursor.punct('|')?;
    let maximum = cursor.number()?;
    cursor.punct(']')?;
    let unit = cursor.text()?;
    let receivers = cursor.names();

    let (minimum, maximum) = if minimum.is_zero() && maximum.is_zero() {
        (None, None)
    } else {
        (Some(minimum), Some(maximum))
    };

    Some(PendingSignal {
        name,
        signal: Signal {
            minimum,
            maximum,
            start,
            length,
            byte_order,
            is_signed,
            unit: if unit.is_empty() {
                None
            } else {
                Some(unit.to_string())
            },
            scale,
            offset,
            ..Signal::default()
        },
        receivers,
        line: 0,
    })
}
