use crate::error::{Error, ErrorKind, Result};
use crate::source::Source;

/// A saved tokenizer position. Only text-backed sources can produce one.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    offset: usize,
    line: u32,
}

/// Scans one syntactic unit at a time from a [`Source`].
///
/// Every scanner peeks before it consumes, so a byte that does not belong
/// to the current unit is left for the next scanner.
pub struct Tokenizer<'a> {
    src: Source<'a>,
    line: u32,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: Source<'a>) -> Tokenizer<'a> {
        Tokenizer { src, line: 1 }
    }

    /// Current 1-based input line.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn peek(&mut self) -> Option<u8> {
        self.src.peek()
    }

    pub fn at_eof(&mut self) -> bool {
        self.src.peek().is_none()
    }

    // Consume one byte, keeping the line count current.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.src.next();
        if b == Some(b'\n') {
            self.line += 1;
        }
        b
    }

    pub fn save_pos(&self) -> Option<Cursor> {
        let offset = self.src.checkpoint()?;
        Some(Cursor {
            offset,
            line: self.line,
        })
    }

    pub fn restore_pos(&mut self, cursor: Cursor) {
        self.src.rewind(cursor.offset);
        self.line = cursor.line;
    }

    /// Consume space, tab and CR. Never a newline.
    pub fn skip_space(&mut self) {
        while let Some(b) = self.src.peek() {
            match b {
                b' ' | b'\t' | b'\r' => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    /// Consume one blank or comment line, newline included.
    /// Returns false (and consumes nothing past the whitespace)
    /// when the line holds an actual unit.
    pub fn skip_blank_or_comment(&mut self) -> bool {
        self.skip_space();
        match self.src.peek() {
            Some(b'\n') => {
                self.bump();
                true
            }
            Some(b'#') | Some(b';') => {
                self.skip_line();
                true
            }
            _ => false,
        }
    }

    /// Consume through the end of the current line, newline included.
    pub fn skip_line(&mut self) {
        while let Some(b) = self.bump() {
            if b == b'\n' {
                break;
            }
        }
    }

    /// Try to read a `[name]` header. `Ok(None)` means the lookahead byte
    /// was not `[`; nothing was consumed and the caller may reparse it.
    /// The rest of the header line is discarded.
    pub fn read_section(&mut self) -> Result<Option<String>> {
        self.skip_space();
        match self.src.peek() {
            Some(b'[') => {}
            _ => return Ok(None),
        }
        self.bump();

        let mut name = Vec::new();
        loop {
            match self.src.peek() {
                None | Some(b'\n') => {
                    return Err(Error::new(
                        ErrorKind::MissingBracket,
                        "missing ']' in section header",
                        self.line,
                    ));
                }
                Some(b']') => {
                    self.bump();
                    break;
                }
                Some(b) => {
                    self.bump();
                    name.push(b);
                }
            }
        }
        self.skip_line();

        trim_trailing(&mut name);
        Ok(Some(into_string(name)))
    }

    /// Read a key: bytes up to unquoted whitespace, `=`, or newline.
    /// An optional pair of `"` or `'` quotes may wrap all or part of the
    /// key; the quotes themselves are not part of it.
    pub fn read_key(&mut self) -> Result<String> {
        self.skip_space();

        let mut key = Vec::new();
        let mut quote: Option<u8> = None;
        while let Some(b) = self.src.peek() {
            if b == b'\n' {
                break;
            }
            if quote.is_none() && (b == b'=' || b == b' ' || b == b'\t' || b == b'\r') {
                break;
            }
            self.bump();
            match quote {
                None if b == b'"' || b == b'\'' => quote = Some(b),
                Some(q) if b == q => quote = None,
                _ => key.push(b),
            }
        }

        if quote.is_some() {
            return Err(Error::new(
                ErrorKind::UnclosedQuote,
                "unclosed quote in key",
                self.line,
            ));
        }

        trim_trailing(&mut key);
        Ok(into_string(key))
    }

    /// Read a value, quoted or simple, based on the lookahead byte.
    pub fn read_value(&mut self) -> Result<String> {
        self.skip_space();
        match self.src.peek() {
            Some(q) if q == b'"' || q == b'\'' => self.read_quoted_value(q),
            _ => Ok(self.read_simple_value()),
        }
    }

    // Unquoted value: everything up to newline or comment, right-trimmed.
    // No escape processing.
    fn read_simple_value(&mut self) -> String {
        let mut value = Vec::new();
        while let Some(b) = self.src.peek() {
            if b == b'\n' || b == b'#' || b == b';' {
                break;
            }
            self.bump();
            value.push(b);
        }
        trim_trailing(&mut value);
        into_string(value)
    }

    // Quoted value with escape sequences and multiline continuation.
    fn read_quoted_value(&mut self, quote: u8) -> Result<String> {
        self.bump(); // opening quote

        let mut value = Vec::new();
        let mut escape = false;
        loop {
            let b = match self.bump() {
                Some(b) => b,
                None => {
                    return Err(Error::new(
                        ErrorKind::UnclosedQuote,
                        "unclosed quote",
                        self.line,
                    ));
                }
            };

            if escape {
                escape = false;
                value.push(match b {
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'r' => b'\r',
                    // anything else: drop the backslash, keep the byte.
                    other => other,
                });
                continue;
            }
            if b == b'\\' {
                escape = true;
                continue;
            }
            if b == quote {
                break;
            }

            if b == b'\n' {
                // A literal newline may continue the value on the next
                // line. If it does, the break is joined with one space.
                self.skip_space();
                match self.src.peek() {
                    Some(n) if n != quote
                        && n != b'\n'
                        && n != b'#'
                        && n != b';'
                        && n != b'[' =>
                    {
                        value.push(b' ');
                    }
                    _ => value.push(b'\n'),
                }
                continue;
            }

            value.push(b);
        }

        Ok(into_string(value))
    }
}

fn trim_trailing(buf: &mut Vec<u8>) {
    while let Some(&b) = buf.last() {
        if b.is_ascii_whitespace() {
            buf.pop();
        } else {
            break;
        }
    }
}

// Scanning is byte-oriented; well-formed UTF-8 passes through unchanged.
fn into_string(buf: Vec<u8>) -> String {
    match String::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(s: &str) -> Tokenizer<'static> {
        Tokenizer::new(Source::from_text(s))
    }

    #[test]
    fn test_skip_space_stops_at_newline() {
        let mut t = tok("  \t \nx");
        t.skip_space();
        assert_eq!(t.peek(), Some(b'\n'));
    }

    #[test]
    fn test_skip_blank_or_comment() {
        let mut t = tok("\n# comment\n  ; also\nkey");
        assert!(t.skip_blank_or_comment());
        assert!(t.skip_blank_or_comment());
        assert!(t.skip_blank_or_comment());
        assert!(!t.skip_blank_or_comment());
        assert_eq!(t.peek(), Some(b'k'));
        assert_eq!(t.line(), 4);
    }

    #[test]
    fn test_read_section() {
        let mut t = tok("[ main section ] trailing junk\nnext");
        let name = t.read_section().unwrap().unwrap();
        assert_eq!(name, " main section");
        assert_eq!(t.peek(), Some(b'n'));
    }

    #[test]
    fn test_read_section_not_a_section() {
        let mut t = tok("  key = 1");
        assert!(t.read_section().unwrap().is_none());
        // lookahead byte still available for read_key.
        assert_eq!(t.peek(), Some(b'k'));
    }

    #[test]
    fn test_read_section_missing_bracket() {
        let mut t = tok("[oops\n");
        let err = t.read_section().unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingBracket);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_read_key_plain() {
        let mut t = tok("  name = value");
        assert_eq!(t.read_key().unwrap(), "name");
        assert_eq!(t.peek(), Some(b' '));
    }

    #[test]
    fn test_read_key_quoted() {
        let mut t = tok("\"my key = x\" = 1");
        assert_eq!(t.read_key().unwrap(), "my key = x");
    }

    #[test]
    fn test_read_key_partial_quote() {
        let mut t = tok("pre'fix x'post = 1");
        assert_eq!(t.read_key().unwrap(), "prefix xpost");
    }

    #[test]
    fn test_read_key_unclosed_quote() {
        let mut t = tok("\"oops = 1\n");
        let err = t.read_key().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnclosedQuote);
    }

    #[test]
    fn test_simple_value_trims_and_stops_at_comment() {
        let mut t = tok("  hello world   # note\n");
        assert_eq!(t.read_value().unwrap(), "hello world");
        assert_eq!(t.peek(), Some(b'#'));
    }

    #[test]
    fn test_simple_value_may_be_empty() {
        let mut t = tok("   \n");
        assert_eq!(t.read_value().unwrap(), "");
    }

    #[test]
    fn test_quoted_value_escapes() {
        let mut t = tok(r#""a\tb\"c\\d\x""#);
        assert_eq!(t.read_value().unwrap(), "a\tb\"c\\dx");
    }

    #[test]
    fn test_quoted_value_single_quotes() {
        let mut t = tok("'it has \"quotes\"' rest");
        assert_eq!(t.read_value().unwrap(), "it has \"quotes\"");
    }

    #[test]
    fn test_quoted_multiline_joins_with_space() {
        let mut t = tok("\"line one\n   line two\"");
        assert_eq!(t.read_value().unwrap(), "line one line two");
        assert_eq!(t.line(), 2);
    }

    #[test]
    fn test_quoted_multiline_keeps_newline_before_blank_line() {
        let mut t = tok("\"a\n\n  b\"");
        assert_eq!(t.read_value().unwrap(), "a\n b");
    }

    #[test]
    fn test_quoted_multiline_not_continued_before_quote() {
        // indentation directly before the closing quote is not a
        // continuation line; the newline stays.
        let mut t = tok("\"a\n  \"");
        assert_eq!(t.read_value().unwrap(), "a\n");
    }

    #[test]
    fn test_quoted_value_unclosed() {
        let mut t = tok("\"never ends");
        let err = t.read_value().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnclosedQuote);
    }

    #[test]
    fn test_save_restore_pos() {
        let mut t = tok("a\nb");
        let pos = t.save_pos().unwrap();
        t.skip_line();
        assert_eq!(t.line(), 2);
        t.restore_pos(pos);
        assert_eq!(t.line(), 1);
        assert_eq!(t.peek(), Some(b'a'));
    }
}
