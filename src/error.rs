use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What went wrong, independent of the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The input file or stream could not be read.
    InvalidSource,
    /// A quoted key or value was never closed.
    UnclosedQuote,
    /// A `[section` header without the closing `]`.
    MissingBracket,
    /// A key was not followed by `=`.
    ExpectedEquals,
    /// `add_key_value` found the key already present in the section.
    DuplicateKey,
    /// The named section does not exist, or no section is current.
    SectionNotFound,
}

#[derive(Clone, Debug)]
pub struct Error {
    pub kind: ErrorKind,
    /// 1-based input line, or 0 when there is no position (programmatic ops).
    pub line: u32,
    pub msg: String,
    pub file_name: String,
}

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>, line: u32) -> Error {
        Error {
            kind,
            line,
            msg: msg.into(),
            file_name: "config-text".to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}: {}", self.file_name, self.msg)
        } else {
            write!(f, "{}:{}: {}", self.file_name, self.line, self.msg)
        }
    }
}

impl std::error::Error for Error {}
