use std::io::{ErrorKind, Read};

/// Byte-oriented input for the tokenizer.
///
/// Exactly one backing variant is live per parse session. A `Text` source
/// owns a private copy of the input; a `Stream` source borrows the reader,
/// so the caller keeps the descriptor and the source never closes it.
pub enum Source<'a> {
    Text {
        data: Vec<u8>,
        pos: usize,
    },
    Stream {
        reader: &'a mut dyn Read,
        // one-byte lookahead, so peek() costs at most one real read.
        peeked: Option<u8>,
        consumed: u64,
    },
}

impl Source<'static> {
    pub fn from_text(s: impl Into<String>) -> Source<'static> {
        Source::from_bytes(s.into().into_bytes())
    }

    pub fn from_bytes(data: Vec<u8>) -> Source<'static> {
        Source::Text { data, pos: 0 }
    }
}

impl<'a> Source<'a> {
    pub fn from_reader(reader: &'a mut dyn Read) -> Source<'a> {
        Source::Stream {
            reader,
            peeked: None,
            consumed: 0,
        }
    }

    /// Next byte without consuming it. `None` on end-of-input.
    pub fn peek(&mut self) -> Option<u8> {
        match self {
            Source::Text { data, pos } => data.get(*pos).copied(),
            Source::Stream { reader, peeked, .. } => {
                if peeked.is_none() {
                    *peeked = read_one(&mut **reader);
                }
                *peeked
            }
        }
    }

    /// Consume and return one byte. `None` on end-of-input.
    pub fn next(&mut self) -> Option<u8> {
        match self {
            Source::Text { data, pos } => {
                let b = data.get(*pos).copied()?;
                *pos += 1;
                Some(b)
            }
            Source::Stream {
                reader,
                peeked,
                consumed,
            } => {
                let b = peeked.take().or_else(|| read_one(&mut **reader))?;
                *consumed += 1;
                Some(b)
            }
        }
    }

    /// Bytes consumed so far. Diagnostics only.
    #[allow(dead_code)]
    pub fn offset(&self) -> u64 {
        match self {
            Source::Text { pos, .. } => *pos as u64,
            Source::Stream { consumed, .. } => *consumed,
        }
    }

    /// Save the current position. A stream cannot rewind, so only
    /// text-backed sources return a checkpoint.
    pub fn checkpoint(&self) -> Option<usize> {
        match self {
            Source::Text { pos, .. } => Some(*pos),
            Source::Stream { .. } => None,
        }
    }

    pub fn rewind(&mut self, checkpoint: usize) {
        if let Source::Text { pos, .. } = self {
            *pos = checkpoint;
        }
    }
}

// Read errors count as end-of-input, same as a short read.
fn read_one(reader: &mut dyn Read) -> Option<u8> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return None,
            Ok(_) => return Some(buf[0]),
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_peek_does_not_advance() {
        let mut src = Source::from_text("ab");
        assert_eq!(src.peek(), Some(b'a'));
        assert_eq!(src.peek(), Some(b'a'));
        assert_eq!(src.next(), Some(b'a'));
        assert_eq!(src.next(), Some(b'b'));
        assert_eq!(src.peek(), None);
        assert_eq!(src.next(), None);
    }

    #[test]
    fn test_stream_lookahead() {
        let mut data: &[u8] = b"xy";
        let mut src = Source::from_reader(&mut data);
        assert_eq!(src.peek(), Some(b'x'));
        assert_eq!(src.offset(), 0);
        assert_eq!(src.next(), Some(b'x'));
        assert_eq!(src.offset(), 1);
        assert_eq!(src.next(), Some(b'y'));
        assert_eq!(src.next(), None);
        assert_eq!(src.peek(), None);
    }

    #[test]
    fn test_checkpoint_rewind() {
        let mut src = Source::from_text("abc");
        let cp = src.checkpoint().unwrap();
        src.next();
        src.next();
        src.rewind(cp);
        assert_eq!(src.next(), Some(b'a'));

        let mut data: &[u8] = b"abc";
        let src = Source::from_reader(&mut data);
        assert!(src.checkpoint().is_none());
    }
}
