use std::io::Read;

use log::debug;

use crate::cfg::{Config, Parsed};
use crate::error::{Error, ErrorKind, Result};
use crate::source::Source;
use crate::tokenizer::Tokenizer;

/// Drives the tokenizer over one input and assembles a [`Config`].
///
/// Syntax errors are recovered at line granularity: the offending line is
/// recorded as a diagnostic and discarded, and parsing resumes on the next
/// line. A parse therefore never aborts because of one bad line.
pub struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    errors: Vec<Error>,
}

impl Parser<'static> {
    pub fn from_string(s: impl Into<String>) -> Parser<'static> {
        Parser::new(Source::from_text(s))
    }

    pub fn from_bytes(data: Vec<u8>) -> Parser<'static> {
        Parser::new(Source::from_bytes(data))
    }
}

impl<'a> Parser<'a> {
    pub fn from_reader(reader: &'a mut dyn Read) -> Parser<'a> {
        Parser::new(Source::from_reader(reader))
    }

    pub fn new(src: Source<'a>) -> Parser<'a> {
        Parser {
            tokenizer: Tokenizer::new(src),
            errors: Vec::new(),
        }
    }

    /// Consume the whole input. Returns everything successfully parsed
    /// plus the diagnostics for every line that was discarded.
    pub fn parse(mut self) -> Parsed {
        let mut config = Config::new();
        // Entries before the first [section] header land here.
        config.add_section("");

        loop {
            while self.tokenizer.skip_blank_or_comment() {}

            match self.tokenizer.read_section() {
                Ok(Some(name)) => {
                    debug!("line {}: section [{}]", self.tokenizer.line(), name);
                    // A repeated name opens a second, independent section.
                    config.add_section(name);
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    if !self.recover(e) {
                        break;
                    }
                    continue;
                }
            }

            self.tokenizer.skip_space();
            if self.tokenizer.at_eof() {
                break;
            }

            let entry_start = self.tokenizer.save_pos();
            if let Err(e) = self.parse_entry(&mut config) {
                // An unterminated quote can run away to end-of-input.
                // Rewind to the start of the entry when the source
                // allows it, so the following lines are reparsed.
                if let Some(pos) = entry_start {
                    self.tokenizer.restore_pos(pos);
                }
                if !self.recover(e) {
                    break;
                }
            }
        }

        Parsed {
            config,
            errors: self.errors,
        }
    }

    // One `key = value` line. The remainder of the line is discarded.
    fn parse_entry(&mut self, config: &mut Config) -> Result<()> {
        let line = self.tokenizer.line();
        let key = self.tokenizer.read_key()?;

        self.tokenizer.skip_space();
        match self.tokenizer.peek() {
            Some(b'=') => {
                self.tokenizer.bump();
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::ExpectedEquals,
                    "expected '=' after key",
                    self.tokenizer.line(),
                ));
            }
        }

        let value = self.tokenizer.read_value()?;
        debug!("line {}: {} = {:?}", line, key, value);
        config.add_entry(key, value)?;

        self.tokenizer.skip_line();
        Ok(())
    }

    // Record the error and skip the bad line. Returns false when the
    // input is exhausted and the parse should stop.
    fn recover(&mut self, err: Error) -> bool {
        debug!("recovering: {}", err);
        self.errors.push(err);
        if self.tokenizer.at_eof() {
            return false;
        }
        self.tokenizer.skip_line();
        true
    }
}
