mod cfg;
mod error;
mod parser;
mod source;
mod tokenizer;

pub use cfg::{from_file, from_reader, from_str, Config, Entry, Parsed, Section};
pub use error::{Error, ErrorKind, Result};
pub use parser::Parser;
pub use source::Source;
