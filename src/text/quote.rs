//! CSV-style quoting of delimited cells.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// How cells of a delimited line are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    /// Cells are written verbatim and never unquoted on read.
    Never,
    /// Standard RFC 4180 behaviour: quote only cells that need it.
    #[default]
    AsNeeded,
    /// Every cell is quoted; embedded quotes are prefixed with the escape character.
    Always,
    /// Every cell is quoted; embedded quotes are doubled.
    AlwaysRfc,
}

/// Encodes and decodes always-quoted cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quoter {
    quote: char,
    escape: char,
    rfc: bool,
    max_len: Option<usize>,
}

impl Quoter {
    /// Escape with a distinct escape character. The escape character itself is escaped too,
    /// so any value survives a round trip.
    pub fn always(quote: char, escape: char) -> Self {
        Self {
            quote,
            escape,
            rfc: false,
            max_len: None,
        }
    }

    /// Escape by doubling the quote character (RFC 4180).
    pub fn always_rfc(quote: char) -> Self {
        Self {
            quote,
            escape: quote,
            rfc: true,
            max_len: None,
        }
    }

    /// Bound the total encoded length, quotes and escapes included.
    pub fn with_max_len(mut self, max_len: Option<usize>) -> CodecResult<Self> {
        if let Some(max) = max_len {
            if max < 2 {
                return Err(CodecError::config(format!(
                    "maximum quoted length {max} cannot hold the quote characters"
                )));
            }
        }
        self.max_len = max_len;
        Ok(self)
    }

    pub fn quote_char(&self) -> char {
        self.quote
    }

    pub fn escape_char(&self) -> char {
        self.escape
    }

    pub fn is_rfc(&self) -> bool {
        self.rfc
    }

    fn needs_escape(&self, c: char) -> bool {
        c == self.quote || (!self.rfc && c == self.escape)
    }

    /// Wrap `value` in quotes, escaping embedded quote (and escape) characters.
    ///
    /// With a maximum length the value is cut so that the whole output fits; an escaped
    /// character is never split from its escape.
    pub fn encode(&self, value: &str) -> String {
        let budget = self.max_len.map(|m| m - 2);
        let mut out = String::with_capacity(value.len() + 2);
        out.push(self.quote);
        let mut used = 0usize;
        for c in value.chars() {
            let escaped = self.needs_escape(c);
            let cost = if escaped { 2 } else { 1 };
            if budget.is_some_and(|b| used + cost > b) {
                break;
            }
            if escaped {
                out.push(if self.rfc { self.quote } else { self.escape });
            }
            out.push(c);
            used += cost;
        }
        out.push(self.quote);
        out
    }

    /// Inverse of [`Quoter::encode`]. Text that does not start and end with the quote
    /// character, or contains an unescaped quote, is a [`CodecError::Format`].
    pub fn decode(&self, text: &str) -> CodecResult<String> {
        let malformed = |message: &str| CodecError::Format {
            message: format!("{message} in {text:?}"),
        };
        let inner = text
            .strip_prefix(self.quote)
            .and_then(|rest| rest.strip_suffix(self.quote))
            .ok_or_else(|| malformed("missing enclosing quote characters"))?;

        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if self.rfc {
                if c == self.quote {
                    match chars.next() {
                        Some(next) if next == self.quote => out.push(next),
                        _ => return Err(malformed("unescaped quote character")),
                    }
                } else {
                    out.push(c);
                }
            } else if c == self.escape {
                match chars.peek() {
                    Some(&next) if next == self.quote || next == self.escape => {
                        out.push(next);
                        chars.next();
                    }
                    // A lone escape character before anything else is literal text.
                    Some(_) if self.escape != self.quote => out.push(c),
                    _ => return Err(malformed("dangling escape character")),
                }
            } else if c == self.quote {
                return Err(malformed("unescaped quote character"));
            } else {
                out.push(c);
            }
        }
        Ok(out)
    }
}
