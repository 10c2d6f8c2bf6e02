use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::parser::Parser;

/// One key/value pair. Both are plain strings; the value may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

/// A named group of entries. The empty name is the default section that
/// holds entries appearing before any `[section]` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub entries: Vec<Entry>,
}

/// An ordered tree of sections and entries.
///
/// Section and entry order is insertion order, which the serializer
/// preserves. Keys may repeat within a section; [`Config::read`] returns
/// the first match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    sections: Vec<Section>,
    // Construction cursor: where add_entry appends. Not config data.
    #[serde(skip)]
    current: Option<usize>,
}

/// Read configuration from a string.
pub fn from_str(text: impl Into<String>) -> Parsed {
    Parser::from_string(text).parse()
}

/// Read configuration from any byte stream. The caller keeps the reader.
pub fn from_reader(reader: &mut dyn io::Read) -> Parsed {
    Parser::from_reader(reader).parse()
}

/// Read configuration from a file.
pub fn from_file(name: impl AsRef<Path>) -> Result<Parsed> {
    let name = name.as_ref().to_string_lossy().into_owned();
    let data = fs::read(&name).map_err(|e| {
        let mut err = Error::new(ErrorKind::InvalidSource, e.to_string(), 0);
        err.file_name = name.clone();
        err
    })?;
    let mut parsed = Parser::from_bytes(data).parse();
    for e in parsed.errors.iter_mut() {
        e.file_name = name.clone();
    }
    Ok(parsed)
}

/// The outcome of a parse: everything that was successfully assembled,
/// plus one diagnostic per discarded line.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub config: Config,
    pub errors: Vec<Error>,
}

impl Parsed {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The most recent diagnostic.
    pub fn last_error(&self) -> Option<&Error> {
        self.errors.last()
    }

    pub fn into_config(self) -> Config {
        self.config
    }
}

impl Config {
    /// An empty configuration with no sections and no current section.
    pub fn new() -> Config {
        Config::default()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    /// Append a new section and make it current. Duplicate names are
    /// permitted and open a second, independent section.
    pub fn add_section(&mut self, name: impl Into<String>) -> &mut Section {
        self.sections.push(Section {
            name: name.into(),
            entries: Vec::new(),
        });
        let idx = self.sections.len() - 1;
        self.current = Some(idx);
        &mut self.sections[idx]
    }

    /// Append an entry to the current section. No duplicate-key check.
    pub fn add_entry(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let idx = match self.current {
            Some(idx) => idx,
            None => {
                return Err(Error::new(
                    ErrorKind::SectionNotFound,
                    "no current section",
                    0,
                ));
            }
        };
        self.sections[idx].entries.push(Entry {
            key: key.into(),
            value: value.into(),
        });
        Ok(())
    }

    /// Append a key/value pair to the named section, which becomes
    /// current. Unlike [`Config::add_entry`], the key must not already
    /// exist in that section.
    pub fn add_key_value(
        &mut self,
        section: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let key = key.into();
        let idx = self
            .sections
            .iter()
            .position(|s| s.name == section)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::SectionNotFound,
                    format!("section not found: [{}]", section),
                    0,
                )
            })?;
        if self.sections[idx].entries.iter().any(|e| e.key == key) {
            return Err(Error::new(
                ErrorKind::DuplicateKey,
                format!("key already added: {}", key),
                0,
            ));
        }
        self.current = Some(idx);
        self.add_entry(key, value)
    }

    /// Look up a value.
    ///
    /// With `Some(name)`, only the first section with that name is
    /// searched. With `None`, all entries are searched in order across
    /// section boundaries and the first key match wins.
    pub fn read(&self, section: Option<&str>, key: &str) -> Option<&str> {
        match section {
            Some(name) => {
                let sec = self.sections.iter().find(|s| s.name == name)?;
                sec.entries
                    .iter()
                    .find(|e| e.key == key)
                    .map(|e| e.value.as_str())
            }
            None => self
                .sections
                .iter()
                .flat_map(|s| s.entries.iter())
                .find(|e| e.key == key)
                .map(|e| e.value.as_str()),
        }
    }

    /// Render back to INI text.
    ///
    /// Sections appear in stored order. The default section's entries
    /// are emitted without a header. Values are double-quoted with
    /// escapes re-applied, so the output reparses to the same data.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for sec in &self.sections {
            if sec.name.is_empty() && sec.entries.is_empty() {
                continue;
            }
            if !sec.name.is_empty() {
                out.push('[');
                out.push_str(&sec.name);
                out.push_str("]\n");
            }
            for e in &sec.entries {
                out.push_str(&e.key);
                out.push_str(" = \"");
                escape_into(&mut out, &e.value);
                out.push_str("\"\n");
            }
            out.push('\n');
        }
        // blank line between sections only, not after the last one.
        if out.ends_with("\n\n") {
            out.pop();
        }
        out
    }

    /// Write the serialized configuration to a file.
    pub fn write_file(&self, name: impl AsRef<Path>) -> io::Result<()> {
        fs::write(name, self.to_text())
    }
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}
